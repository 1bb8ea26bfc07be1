//! Reset, create, load and view, in that order
//!
//! The connection opened here is closed before `run` returns, whether the
//! steps succeeded or not.

use std::path::PathBuf;

use colored::*;
use sqlx::{Connection, SqliteConnection};

use crate::config::EtlConfig;
use crate::db;
use crate::error::{EtlError, Result};
use crate::load::{self, LoadReport};
use crate::schema::{Registry, check_order};

/// A CREATE TABLE that failed and was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFailure {
    pub table: String,
    pub message: String,
}

/// What a completed run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub database: PathBuf,
    pub extension_loaded: bool,
    pub schema_failures: Vec<SchemaFailure>,
    pub reports: Vec<LoadReport>,
    /// Rows in the view after all loads
    pub view_rows: i64,
}

impl RunSummary {
    #[cfg(test)]
    pub fn report(&self, table: &str) -> Option<&LoadReport> {
        self.reports.iter().find(|r| r.table == table)
    }

    pub fn total_inserted(&self) -> usize {
        self.reports.iter().map(|r| r.inserted).sum()
    }

    pub fn print(&self) {
        println!(
            "{} {}",
            "Database:".bold(),
            self.database.display().to_string().cyan()
        );
        for report in &self.reports {
            let mut line = format!(
                "  {:<20} {:>6} inserted  ({} read, {} duplicates",
                report.table.bright_green(),
                report.inserted,
                report.rows_read,
                report.duplicates
            );
            if report.blank_rows > 0 {
                line.push_str(&format!(", {} blank", report.blank_rows));
            }
            line.push(')');
            if !report.discarded_sheets.is_empty() {
                line.push_str(
                    &format!("  skipped sheets: {}", report.discarded_sheets.join(", "))
                        .yellow()
                        .to_string(),
                );
            }
            println!("{}", line);
        }
        for failure in &self.schema_failures {
            println!(
                "  {} {}: {}",
                "schema error".red(),
                failure.table,
                failure.message
            );
        }
        println!(
            "  {:<20} {:>6} rows",
            db::VIEW_NAME.bright_green(),
            self.view_rows
        );
        if !self.extension_loaded {
            println!("{}", "Geospatial extension not loaded".dimmed());
        }
    }
}

/// Rebuild the database described by `registry` from scratch
pub async fn run(config: &EtlConfig, registry: &Registry) -> Result<RunSummary> {
    log::info!(
        "Building {} tables into {}",
        registry.len(),
        config.database.display()
    );
    for violation in check_order(registry) {
        log::warn!("Load order: {}", violation);
    }

    match db::reset(&config.database).await {
        Ok(()) => log::info!("Removed previous database {}", config.database.display()),
        Err(e) if e.is_missing_file() && !config.require_existing_db => {
            log::info!("No previous database at {}", config.database.display());
        }
        Err(e) => return Err(e),
    }

    let opened = db::open(&config.database, config.spatialite.as_deref()).await?;
    let mut conn = opened.conn;
    let mut summary = RunSummary {
        database: config.database.clone(),
        extension_loaded: opened.extension_loaded,
        ..RunSummary::default()
    };

    let result = build(&mut conn, config, registry, &mut summary).await;

    if let Err(e) = conn.close().await {
        log::warn!("Failed to close {}: {}", config.database.display(), e);
    }

    result.map(|()| summary)
}

async fn build(
    conn: &mut SqliteConnection,
    config: &EtlConfig,
    registry: &Registry,
    summary: &mut RunSummary,
) -> Result<()> {
    for descriptor in registry {
        if let Err(e) = db::create_table(conn, descriptor).await {
            // Loads into this table fail at insert time instead
            log::error!("{}", e);
            summary.schema_failures.push(SchemaFailure {
                table: descriptor.table.to_string(),
                message: match &e {
                    EtlError::Schema { source, .. } => source.to_string(),
                    other => other.to_string(),
                },
            });
        }
    }

    for descriptor in registry {
        let report = load::load(conn, descriptor, config).await?;
        summary.reports.push(report);
    }

    db::create_view(conn).await?;
    summary.view_rows = db::row_count(conn, db::VIEW_NAME).await?;

    log::info!(
        "Loaded {} rows into {} tables",
        summary.total_inserted(),
        summary.reports.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintKind;
    use crate::schema::registry::{BUDGETS, CUSTOMERS, PRODUCT_CATEGORIES, PRODUCT_PRICES, SALES};
    use crate::test_support::*;

    fn config_for(dir: &std::path::Path) -> EtlConfig {
        EtlConfig {
            database: dir.join("Database.sql"),
            source_dir: dir.to_path_buf(),
            spatialite: None,
            ..EtlConfig::default()
        }
    }

    async fn table_counts(config: &EtlConfig) -> Vec<(String, i64)> {
        let mut conn = db::open(&config.database, None).await.unwrap().conn;
        let mut counts = Vec::new();
        for table in &Registry::standard() {
            counts.push((
                table.table.to_string(),
                db::row_count(&mut conn, table.table).await.unwrap(),
            ));
        }
        conn.close().await.unwrap();
        counts
    }

    #[tokio::test]
    async fn test_full_run() {
        let dir = tempfile::tempdir().unwrap();
        write_standard_workbooks(dir.path());
        let config = config_for(dir.path());

        let summary = run(&config, &Registry::standard()).await.unwrap();
        assert!(summary.schema_failures.is_empty());
        assert!(!summary.extension_loaded);

        let inserted: Vec<_> = summary
            .reports
            .iter()
            .map(|r| (r.table.as_str(), r.inserted))
            .collect();
        assert_eq!(
            inserted,
            vec![
                ("customers", 2),
                ("product_categories", 2),
                ("product_prices", 3),
                ("sales", 3),
                ("budgets", 2),
            ]
        );
        assert_eq!(summary.report("sales").unwrap().discarded_sheets, vec!["Archive"]);

        // One view row per sale
        assert_eq!(summary.view_rows, 3);
    }

    #[tokio::test]
    async fn test_second_run_rebuilds_from_scratch() {
        let dir = tempfile::tempdir().unwrap();
        write_standard_workbooks(dir.path());
        let config = config_for(dir.path());

        run(&config, &Registry::standard()).await.unwrap();
        let first = table_counts(&config).await;

        run(&config, &Registry::standard()).await.unwrap();
        let second = table_counts(&config).await;

        assert_eq!(first, second);
        assert_eq!(second[0], ("customers".to_string(), 2));
    }

    #[tokio::test]
    async fn test_require_existing_db() {
        let dir = tempfile::tempdir().unwrap();
        write_standard_workbooks(dir.path());
        let config = EtlConfig {
            require_existing_db: true,
            ..config_for(dir.path())
        };

        let err = run(&config, &Registry::standard()).await.unwrap_err();
        assert!(err.is_missing_file());
        assert!(!config.database.exists());
    }

    #[tokio::test]
    async fn test_missing_workbook_aborts() {
        let dir = tempfile::tempdir().unwrap();
        write_standard_workbooks(dir.path());
        std::fs::remove_file(dir.path().join("Sales_budgets.xlsx")).unwrap();
        let config = config_for(dir.path());

        let err = run(&config, &Registry::standard()).await.unwrap_err();
        assert!(matches!(err, EtlError::WorkbookNotFound { .. }));

        // Earlier tables were committed before the abort; the file is released
        let counts = table_counts(&config).await;
        assert_eq!(counts[3], ("sales".to_string(), 3));
        assert_eq!(counts[4], ("budgets".to_string(), 0));
        db::reset(&config.database).await.unwrap();
    }

    #[tokio::test]
    async fn test_misordered_registry_fails_on_foreign_key() {
        let dir = tempfile::tempdir().unwrap();
        write_standard_workbooks(dir.path());
        let registry = Registry::new(vec![
            CUSTOMERS.clone(),
            PRODUCT_PRICES.clone(),
            PRODUCT_CATEGORIES.clone(),
            SALES.clone(),
            BUDGETS.clone(),
        ]);

        let err = run(&config_for(dir.path()), &registry).await.unwrap_err();
        assert!(matches!(
            err,
            EtlError::Constraint {
                kind: ConstraintKind::ForeignKey,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_view_empty_without_sales() {
        let dir = tempfile::tempdir().unwrap();
        write_standard_workbooks(dir.path());
        // Header-only sales sheet: every parent loads, nothing to join
        write_workbook(
            &dir.path().join("Sales_Data.xlsx"),
            &[SheetFixture {
                name: "Sales",
                headers: SALES_HEADERS,
                rows: Vec::new(),
            }],
        );

        let summary = run(&config_for(dir.path()), &Registry::standard()).await.unwrap();
        assert_eq!(summary.report("sales").unwrap().inserted, 0);
        assert_eq!(summary.view_rows, 0);
    }

    #[tokio::test]
    async fn test_schema_failure_is_not_fatal_until_insert() {
        let dir = tempfile::tempdir().unwrap();
        write_standard_workbooks(dir.path());
        let broken_budgets = crate::schema::TableDescriptor {
            ddl: "CREATE TABLE IF NOT EXISTS budgets (product_code integer,",
            ..BUDGETS.clone()
        };
        let registry = Registry::new(vec![
            CUSTOMERS.clone(),
            PRODUCT_CATEGORIES.clone(),
            PRODUCT_PRICES.clone(),
            SALES.clone(),
            broken_budgets,
        ]);

        let err = run(&config_for(dir.path()), &registry).await.unwrap_err();
        // Every table before budgets was still created and loaded
        assert!(matches!(err, EtlError::Database { .. }), "{err}");
        let mut conn = db::open(&config_for(dir.path()).database, None).await.unwrap().conn;
        assert_eq!(db::row_count(&mut conn, "sales").await.unwrap(), 3);
        assert!(db::row_count(&mut conn, "budgets").await.is_err());
    }
}
