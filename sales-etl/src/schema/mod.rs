//! Destination schema: table descriptors and their load order

pub mod ordering;
pub mod registry;

pub use ordering::check_order;
pub use registry::{ColumnSpec, ColumnType, Registry, TableDescriptor};
