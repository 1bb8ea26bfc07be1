//! Workbook reading and header normalization

mod reader;

pub use reader::{Sheet, read_workbook};
