//! Rebuild the sales SQLite database from its source workbooks

mod cli;
mod config;
mod db;
mod error;
mod excel;
mod load;
mod pipeline;
mod schema;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use config::EtlConfig;
use schema::Registry;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "sales_etl=debug" } else { "sales_etl=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // .env is optional; it only seeds the SALES_ETL_* variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = EtlConfig::resolve(&cli).context("Failed to resolve settings")?;
    let registry = Registry::standard();

    let summary = pipeline::run(&config, &registry)
        .await
        .with_context(|| format!("Failed to build {}", config.database.display()))?;

    summary.print();
    Ok(())
}
