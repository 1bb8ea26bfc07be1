//! Database initializer and view builder
//!
//! One SQLite connection, opened with foreign key enforcement, carries the
//! whole run: table creation, inserts and the final view.

use std::path::{Path, PathBuf};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, SqliteConnection};

use crate::error::{EtlError, Result};
use crate::schema::TableDescriptor;

pub const VIEW_NAME: &str = "V_Customer_Sales";

/// Sales joined with their product price, category and customer
pub const VIEW_DDL: &str = r#"
CREATE VIEW V_Customer_Sales AS
SELECT *
FROM product_prices
JOIN product_categories USING (product_category_code)
JOIN sales ON sales.product = product_prices.product_code AND sales.year = product_prices.year
JOIN customers ON customers.customer_number = sales.account;
"#;

/// Journal files SQLite may leave next to the database
const SIDECAR_SUFFIXES: &[&str] = &["-journal", "-wal", "-shm"];

/// An open connection and whether the geospatial extension came with it
#[derive(Debug)]
pub struct OpenedDatabase {
    pub conn: SqliteConnection,
    pub extension_loaded: bool,
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Delete the database file at `path` and any journal files beside it.
///
/// Fails when the database file is absent or cannot be removed; the caller
/// decides whether a missing file matters.
pub async fn reset(path: &Path) -> Result<()> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|source| EtlError::Reset {
            path: path.to_path_buf(),
            source,
        })?;

    for suffix in SIDECAR_SUFFIXES {
        let sidecar = sidecar_path(path, suffix);
        match tokio::fs::remove_file(&sidecar).await {
            Ok(()) => log::debug!("Removed {}", sidecar.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(EtlError::Reset {
                    path: sidecar,
                    source,
                });
            }
        }
    }

    Ok(())
}

fn connect_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
}

/// Open a connection to `path`, loading `extension` when it is available.
///
/// A missing extension only disables geospatial queries, so the connection
/// is retried without it.
pub async fn open(path: &Path, extension: Option<&str>) -> Result<OpenedDatabase> {
    if let Some(extension) = extension {
        match connect_options(path)
            .extension(extension.to_string())
            .connect()
            .await
        {
            Ok(conn) => {
                log::info!("Loaded SQLite extension '{}'", extension);
                return Ok(OpenedDatabase {
                    conn,
                    extension_loaded: true,
                });
            }
            Err(e) => {
                log::warn!(
                    "SQLite extension '{}' unavailable, geospatial queries disabled: {}",
                    extension,
                    e
                );
            }
        }
    }

    let conn = connect_options(path)
        .connect()
        .await
        .map_err(|source| EtlError::Connect {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(OpenedDatabase {
        conn,
        extension_loaded: false,
    })
}

/// Execute the descriptor's CREATE TABLE IF NOT EXISTS statement
pub async fn create_table(conn: &mut SqliteConnection, descriptor: &TableDescriptor) -> Result<()> {
    sqlx::query(descriptor.ddl)
        .execute(&mut *conn)
        .await
        .map_err(|source| EtlError::Schema {
            table: descriptor.table.to_string(),
            source,
        })?;
    log::debug!("Created table '{}'", descriptor.table);
    Ok(())
}

/// Create `V_Customer_Sales`; run after every table is loaded
pub async fn create_view(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(VIEW_DDL.trim())
        .execute(&mut *conn)
        .await
        .map_err(|source| EtlError::View {
            view: VIEW_NAME.to_string(),
            source,
        })?;
    log::info!("Created view '{}'", VIEW_NAME);
    Ok(())
}

/// Number of rows currently in `table` (or view)
pub async fn row_count(conn: &mut SqliteConnection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
    sqlx::query_scalar::<_, i64>(&sql)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| EtlError::database(format!("counting rows of '{}'", table), e))
}
