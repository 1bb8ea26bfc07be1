//! Table loader
//!
//! Reads the descriptor's workbook, keeps the include-list columns of the
//! first sheet, coerces and deduplicates the rows, and appends them to the
//! destination table. Sheets after the first are read but never loaded.

pub mod value;

use std::collections::HashSet;

use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::{Connection, SqliteConnection};

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::excel::{Sheet, read_workbook};
use crate::schema::{ColumnSpec, TableDescriptor};

pub use value::SqlValue;

/// Outcome of loading one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub table: String,
    /// Sheet the rows came from
    pub sheet: String,
    /// Data rows in the sheet
    pub rows_read: usize,
    pub blank_rows: usize,
    pub duplicates: usize,
    pub inserted: usize,
    /// Include-list columns missing from the sheet
    pub missing_columns: Vec<String>,
    /// Sheets read but not loaded
    pub discarded_sheets: Vec<String>,
}

/// Rows of one sheet restricted, coerced and deduplicated for a table
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<SqlValue>>,
    pub rows_read: usize,
    pub blank_rows: usize,
    pub duplicates: usize,
    pub missing_columns: Vec<String>,
}

/// Restrict `sheet` to the descriptor's include-list, coerce every cell to
/// its declared type and drop exact duplicate rows, keeping first occurrences
pub fn prepare_rows(descriptor: &TableDescriptor, sheet: &Sheet) -> Result<PreparedTable> {
    let mut selected: Vec<(&ColumnSpec, usize)> = Vec::new();
    let mut missing_columns = Vec::new();

    for column in descriptor.columns {
        match sheet.column_index(column.name) {
            Some(idx) => selected.push((column, idx)),
            None => missing_columns.push(column.name.to_string()),
        }
    }

    let mut seen: HashSet<Vec<SqlValue>> = HashSet::new();
    let mut rows = Vec::new();
    let mut blank_rows = 0;
    let mut duplicates = 0;

    for row_idx in 0..sheet.rows.len() {
        let mut values = Vec::with_capacity(selected.len());
        for (column, col_idx) in &selected {
            let cell = sheet.cell(row_idx, *col_idx);
            let value = value::coerce(cell, column.ty).ok_or_else(|| EtlError::CellType {
                table: descriptor.table.to_string(),
                column: column.name.to_string(),
                // 1-based, after the header row
                row: row_idx + 2,
                expected: column.ty,
                found: value::describe(cell),
            })?;
            values.push(value);
        }

        if values.iter().all(SqlValue::is_null) {
            blank_rows += 1;
            continue;
        }

        if seen.contains(&values) {
            duplicates += 1;
            continue;
        }
        seen.insert(values.clone());
        rows.push(values);
    }

    Ok(PreparedTable {
        columns: selected.iter().map(|(c, _)| c.name).collect(),
        rows,
        rows_read: sheet.rows.len(),
        blank_rows,
        duplicates,
        missing_columns,
    })
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT INTO "table" ("a", "b") VALUES (?, ?)`
pub fn insert_statement(table: &str, columns: &[&str]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        names.join(", "),
        placeholders
    )
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Real(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
    }
}

/// Append prepared rows to `table` in one transaction, in row order
pub async fn insert_rows(
    conn: &mut SqliteConnection,
    table: &str,
    prepared: &PreparedTable,
) -> Result<usize> {
    if prepared.columns.is_empty() || prepared.rows.is_empty() {
        return Ok(0);
    }

    let sql = insert_statement(table, &prepared.columns);
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| EtlError::database(format!("starting load of '{}'", table), e))?;

    for row in &prepared.rows {
        let mut query = sqlx::query(&sql);
        for value in row {
            query = bind_value(query, value);
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| EtlError::from_insert(table, e))?;
    }

    tx.commit()
        .await
        .map_err(|e| EtlError::from_insert(table, e))?;

    Ok(prepared.rows.len())
}

/// Load the descriptor's workbook into its table
pub async fn load(
    conn: &mut SqliteConnection,
    descriptor: &TableDescriptor,
    config: &EtlConfig,
) -> Result<LoadReport> {
    let path = config.workbook_path(descriptor);
    log::debug!("Loading '{}' from {}", descriptor.table, path.display());

    let workbook = read_workbook(&path, config.filler)?;
    let (sheet, rest) = workbook
        .sheets
        .split_first()
        .ok_or_else(|| EtlError::EmptyWorkbook { path: path.clone() })?;

    for extra in rest.iter().filter(|s| !s.rows.is_empty()) {
        log::warn!(
            "{}: sheet '{}' has {} rows that are not loaded into '{}' (only the first sheet is loaded)",
            path.display(),
            extra.name,
            extra.rows.len(),
            descriptor.table
        );
    }

    let prepared = prepare_rows(descriptor, sheet)?;

    if !prepared.missing_columns.is_empty() {
        log::debug!(
            "'{}': columns not in sheet '{}': {}",
            descriptor.table,
            sheet.name,
            prepared.missing_columns.join(", ")
        );
    }
    if prepared.columns.is_empty() {
        log::warn!(
            "'{}': sheet '{}' has none of the table's columns, nothing to load",
            descriptor.table,
            sheet.name
        );
    }

    let inserted = insert_rows(conn, descriptor.table, &prepared).await?;

    log::info!(
        "'{}': {} rows read, {} blank, {} duplicates dropped, {} inserted",
        descriptor.table,
        prepared.rows_read,
        prepared.blank_rows,
        prepared.duplicates,
        inserted
    );

    Ok(LoadReport {
        table: descriptor.table.to_string(),
        sheet: sheet.name.clone(),
        rows_read: prepared.rows_read,
        blank_rows: prepared.blank_rows,
        duplicates: prepared.duplicates,
        inserted,
        missing_columns: prepared.missing_columns,
        discarded_sheets: rest.iter().map(|s| s.name.clone()).collect(),
    })
}
