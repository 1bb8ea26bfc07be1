//! Read every sheet of an xlsx workbook
//!
//! The first row of each sheet is the header row. Headers are normalized
//! (spaces replaced with the filler character, lower-cased) so they can be
//! matched against destination column names.

use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};

use crate::error::{EtlError, Result};

/// One worksheet with normalized headers
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    /// Data rows, header excluded
    pub rows: Vec<Vec<Data>>,
}

impl Sheet {
    /// Index of the first column whose normalized header is `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (`row`, `col`), empty when the row is shorter than the header
    pub fn cell(&self, row: usize, col: usize) -> &Data {
        static EMPTY: Data = Data::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// All sheets of a workbook, in workbook order
#[derive(Debug, Clone)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Replace spaces with `filler` and lower-case
pub fn normalize_header(raw: &str, filler: char) -> String {
    raw.replace(' ', &filler.to_string()).to_lowercase()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Read every sheet of the workbook at `path`
pub fn read_workbook(path: &Path, filler: char) -> Result<Workbook> {
    if !path.is_file() {
        return Err(EtlError::WorkbookNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: calamine::XlsxError| EtlError::WorkbookParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| EtlError::WorkbookParse {
                path: path.to_path_buf(),
                message: format!("sheet '{}': {}", sheet_name, e),
            })?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .map(|c| normalize_header(&header_text(c), filler))
                .collect(),
            None => Vec::new(),
        };
        let rows: Vec<Vec<Data>> = rows.map(|r| r.to_vec()).collect();

        log::debug!(
            "{}: sheet '{}' has {} columns, {} rows",
            path.display(),
            sheet_name,
            headers.len(),
            rows.len()
        );

        sheets.push(Sheet {
            name: sheet_name,
            headers,
            rows,
        });
    }

    Ok(Workbook { sheets })
}
