//! Command line interface

use std::path::PathBuf;

use clap::Parser;

/// Rebuild the sales database from the source workbooks
#[derive(Debug, Parser)]
#[command(name = "sales-etl", version, about)]
pub struct Cli {
    /// Destination SQLite file, deleted and recreated on every run
    #[arg(long, env = "SALES_ETL_DATABASE", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Directory containing the source workbooks
    #[arg(long, env = "SALES_ETL_SOURCE_DIR", value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// TOML file with run settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite extension loaded for geospatial queries
    #[arg(long, env = "SALES_ETL_SPATIALITE", value_name = "NAME")]
    pub spatialite: Option<String>,

    /// Do not try to load the geospatial extension; wins over --spatialite
    #[arg(long)]
    pub no_spatialite: bool,

    /// Abort when there is no previous database file to delete
    #[arg(long)]
    pub require_existing_db: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
