//! Table descriptors for the five destination tables
//!
//! The registry is an ordered list. Parent tables (customers,
//! product_categories) come before the tables that reference them, because
//! rows are loaded in registry order and foreign keys are enforced on insert.

use std::fmt;
use std::path::{Path, PathBuf};

/// Declared type of a destination column, matching the DDL type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `integer`
    Integer,
    /// `VARCHAR`
    Text,
    /// `float`
    Real,
    /// `timestamp`, stored as `YYYY-MM-DD HH:MM:SS`
    Timestamp,
    /// `year`, stored as an integer
    Year,
    /// `month`, stored as an integer 1-12
    Month,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Text => write!(f, "VARCHAR"),
            ColumnType::Real => write!(f, "float"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Year => write!(f, "year"),
            ColumnType::Month => write!(f, "month"),
        }
    }
}

/// A column retained from the source sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// Foreign key clause of a table, as declared in its DDL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub columns: &'static [&'static str],
    pub parent: &'static str,
    pub parent_columns: &'static [&'static str],
}

/// Everything needed to create and populate one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Human label, also the workbook name before filler substitution
    pub label: &'static str,
    /// Destination table name
    pub table: &'static str,
    /// Include-list, in insert order
    pub columns: &'static [ColumnSpec],
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
    /// CREATE TABLE IF NOT EXISTS statement
    pub ddl: &'static str,
}

impl TableDescriptor {
    /// Workbook file name: label with spaces replaced by `filler`, plus extension
    pub fn workbook_file_name(&self, filler: char, extension: &str) -> String {
        format!("{}.{}", self.label.replace(' ', &filler.to_string()), extension)
    }

    pub fn workbook_path(&self, source_dir: &Path, filler: char, extension: &str) -> PathBuf {
        source_dir.join(self.workbook_file_name(filler, extension))
    }

    /// Tables this one references through its foreign keys
    pub fn parents(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.foreign_keys.iter().map(|fk| fk.parent)
    }
}

/// Ordered, immutable list of table descriptors
#[derive(Debug, Clone)]
pub struct Registry {
    tables: Vec<TableDescriptor>,
}

impl Registry {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }

    /// The five sales tables in load order
    pub fn standard() -> Self {
        Self::new(vec![
            CUSTOMERS.clone(),
            PRODUCT_CATEGORIES.clone(),
            PRODUCT_PRICES.clone(),
            SALES.clone(),
            BUDGETS.clone(),
        ])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableDescriptor> {
        self.tables.iter()
    }

    pub fn position(&self, table: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.table == table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a TableDescriptor;
    type IntoIter = std::slice::Iter<'a, TableDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

// =============================================================================
// Independent tables
// =============================================================================

pub static CUSTOMERS: TableDescriptor = TableDescriptor {
    label: "Customer Data",
    table: "customers",
    columns: &[
        ColumnSpec::new("customer_number", ColumnType::Integer),
        ColumnSpec::new("customer_name", ColumnType::Text),
        ColumnSpec::new("country", ColumnType::Text),
        ColumnSpec::new("region", ColumnType::Text),
    ],
    primary_key: &["customer_number"],
    foreign_keys: &[],
    ddl: r#"
CREATE TABLE IF NOT EXISTS customers (
 customer_number integer,
 customer_name VARCHAR,
 country VARCHAR,
 region VARCHAR,
 PRIMARY KEY (customer_number)
)
"#,
};

pub static PRODUCT_CATEGORIES: TableDescriptor = TableDescriptor {
    label: "Product data",
    table: "product_categories",
    columns: &[
        ColumnSpec::new("product_category", ColumnType::Text),
        ColumnSpec::new("product_category_code", ColumnType::Integer),
    ],
    primary_key: &["product_category_code"],
    foreign_keys: &[],
    ddl: r#"
CREATE TABLE IF NOT EXISTS product_categories (
 product_category VARCHAR,
 product_category_code integer,
 PRIMARY KEY (product_category_code)
)
"#,
};

// =============================================================================
// Dependent tables
// =============================================================================

pub static PRODUCT_PRICES: TableDescriptor = TableDescriptor {
    label: "Product data",
    table: "product_prices",
    columns: &[
        ColumnSpec::new("product_code", ColumnType::Integer),
        ColumnSpec::new("product", ColumnType::Text),
        ColumnSpec::new("product_category_code", ColumnType::Integer),
        ColumnSpec::new("standard_price", ColumnType::Real),
        ColumnSpec::new("variable_cost", ColumnType::Real),
        ColumnSpec::new("gross_margin", ColumnType::Real),
        ColumnSpec::new("year", ColumnType::Year),
    ],
    primary_key: &["year", "product_code"],
    foreign_keys: &[ForeignKey {
        columns: &["product_category_code"],
        parent: "product_categories",
        parent_columns: &["product_category_code"],
    }],
    ddl: r#"
CREATE TABLE IF NOT EXISTS product_prices (
 product_code integer,
 product VARCHAR,
 product_category_code integer,
 standard_price float,
 variable_cost float,
 gross_margin float,
 year year,
 PRIMARY KEY (year, product_code),
 FOREIGN KEY (product_category_code) REFERENCES product_categories (product_category_code) 
 ON DELETE CASCADE ON UPDATE NO ACTION
)
"#,
};

pub static SALES: TableDescriptor = TableDescriptor {
    label: "Sales Data",
    table: "sales",
    columns: &[
        ColumnSpec::new("product", ColumnType::Integer),
        ColumnSpec::new("account", ColumnType::Integer),
        ColumnSpec::new("invoice_number", ColumnType::Integer),
        ColumnSpec::new("invoice_date", ColumnType::Timestamp),
        ColumnSpec::new("year", ColumnType::Year),
        ColumnSpec::new("month", ColumnType::Month),
        ColumnSpec::new("quantity", ColumnType::Integer),
        ColumnSpec::new("invoice_amount", ColumnType::Real),
    ],
    primary_key: &["year", "month", "invoice_date", "invoice_number"],
    foreign_keys: &[
        ForeignKey {
            columns: &["year", "product"],
            parent: "product_prices",
            parent_columns: &["year", "product_code"],
        },
        ForeignKey {
            columns: &["account"],
            parent: "customers",
            parent_columns: &["customer_number"],
        },
    ],
    ddl: r#"
CREATE TABLE IF NOT EXISTS sales (
 product integer,
 account integer,
 invoice_number integer,
 invoice_date timestamp,
 year year,
 month month,
 quantity integer,
 invoice_amount float,
 PRIMARY KEY (year, month, invoice_date, invoice_number),
 FOREIGN KEY (year, product) REFERENCES product_prices (year, product_code) 
 ON DELETE CASCADE ON UPDATE NO ACTION,
 FOREIGN KEY (account) REFERENCES customers (customer_number) 
 ON DELETE CASCADE ON UPDATE NO ACTION
)
"#,
};

pub static BUDGETS: TableDescriptor = TableDescriptor {
    label: "Sales budgets",
    table: "budgets",
    columns: &[
        ColumnSpec::new("product_code", ColumnType::Integer),
        ColumnSpec::new("account", ColumnType::Integer),
        ColumnSpec::new("year", ColumnType::Year),
        ColumnSpec::new("month", ColumnType::Month),
        ColumnSpec::new("budget", ColumnType::Real),
    ],
    primary_key: &["year", "product_code", "account", "month"],
    foreign_keys: &[
        ForeignKey {
            columns: &["year", "product_code"],
            parent: "product_prices",
            parent_columns: &["year", "product_code"],
        },
        ForeignKey {
            columns: &["account"],
            parent: "customers",
            parent_columns: &["customer_number"],
        },
    ],
    ddl: r#"
CREATE TABLE IF NOT EXISTS budgets (
 product_code integer,
 account integer,
 year year,
 month month,
 budget float,
 PRIMARY KEY (year, product_code, account, month),
 FOREIGN KEY (year, product_code) REFERENCES product_prices (year, product_code) 
 ON DELETE CASCADE ON UPDATE NO ACTION,
 FOREIGN KEY (account) REFERENCES customers (customer_number) 
 ON DELETE CASCADE ON UPDATE NO ACTION
)
"#,
};
