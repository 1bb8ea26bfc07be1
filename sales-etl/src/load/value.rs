//! Typed cell coercion
//!
//! Each destination column has a declared type. Cells are coerced to that
//! type instead of letting SQLite apply column affinity, so a sheet whose
//! contents drift between runs fails loudly instead of loading different
//! storage classes.

use std::hash::{Hash, Hasher};
use std::str::FromStr;

use calamine::Data;
use chrono::{DateTime, Datelike, Month, NaiveDate, NaiveDateTime, TimeDelta};

use crate::schema::ColumnType;

/// Storage format for `timestamp` columns
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A value bound into an INSERT
#[derive(Debug, Clone)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

// Reals compare by bit pattern so rows can be hashed for dedup
impl PartialEq for SqlValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SqlValue::Null, SqlValue::Null) => true,
            (SqlValue::Integer(a), SqlValue::Integer(b)) => a == b,
            (SqlValue::Real(a), SqlValue::Real(b)) => a.to_bits() == b.to_bits(),
            (SqlValue::Text(a), SqlValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SqlValue {}

impl Hash for SqlValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            SqlValue::Null => {}
            SqlValue::Integer(i) => i.hash(state),
            SqlValue::Real(f) => f.to_bits().hash(state),
            SqlValue::Text(s) => s.hash(state),
        }
    }
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// True for cells that load as NULL
pub fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Coerce a cell to `ty`; `None` when the cell cannot be represented
pub fn coerce(cell: &Data, ty: ColumnType) -> Option<SqlValue> {
    if is_blank(cell) {
        return Some(SqlValue::Null);
    }

    match ty {
        ColumnType::Integer => to_integer(cell).map(SqlValue::Integer),
        ColumnType::Real => to_real(cell).map(SqlValue::Real),
        ColumnType::Text => Some(SqlValue::Text(to_text(cell))),
        ColumnType::Timestamp => {
            to_timestamp(cell).map(|dt| SqlValue::Text(dt.format(TIMESTAMP_FORMAT).to_string()))
        }
        ColumnType::Year => to_year(cell).map(|y| SqlValue::Integer(y as i64)),
        ColumnType::Month => to_month(cell).map(|m| SqlValue::Integer(m as i64)),
    }
}

/// Render a cell for error messages
pub fn describe(cell: &Data) -> String {
    match cell {
        Data::String(s) => format!("{:?}", s),
        Data::Bool(b) => format!("boolean {}", b),
        Data::DateTime(dt) => format!("date serial {}", dt.as_f64()),
        other => other.to_string(),
    }
}

fn whole(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(whole))
}

fn to_integer(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        Data::Float(f) => whole(*f),
        Data::String(s) => parse_integer(s),
        _ => None,
    }
}

fn to_real(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => match whole(*f) {
            Some(i) => i.to_string(),
            None => f.to_string(),
        },
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
    }
}

/// Convert a bare number holding an Excel serial date (1900 date system) to a
/// timestamp. Cells formatted as dates go through calamine instead, which
/// knows the workbook's date system.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // Excel serial 2958465 is 9999-12-31
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    // Excel counts a 1900-02-29 that never existed, shifting serials from 60 on
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    }
    .and_hms_opt(0, 0, 0)?;
    epoch
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn to_timestamp(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) if dt.is_datetime() => dt.as_datetime(),
        Data::DateTimeIso(s) | Data::String(s) => parse_timestamp(s),
        Data::Float(f) => serial_to_datetime(*f),
        Data::Int(i) => serial_to_datetime(*i as f64),
        _ => None,
    }
}

fn to_year(cell: &Data) -> Option<i32> {
    let year = match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => return to_timestamp(cell).map(|ts| ts.year()),
        other => to_integer(other)?,
    };
    (1..=9999).contains(&year).then_some(year as i32)
}

fn to_month(cell: &Data) -> Option<u32> {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => to_timestamp(cell).map(|ts| ts.month()),
        Data::String(s) if parse_integer(s).is_none() => Month::from_str(s.trim())
            .ok()
            .map(|m| m.number_from_month()),
        other => {
            let month = to_integer(other)?;
            (1..=12).contains(&month).then_some(month as u32)
        }
    }
}
