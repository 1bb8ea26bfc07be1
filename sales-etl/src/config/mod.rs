//! Run settings
//!
//! Resolved once at startup from, in increasing precedence: built-in
//! defaults, an optional TOML file, environment variables and flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{EtlError, Result};
use crate::schema::TableDescriptor;

pub const DEFAULT_DATABASE: &str = "Database.sql";
pub const DEFAULT_SPATIALITE: &str = "mod_spatialite";

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlConfig {
    /// Destination database file
    pub database: PathBuf,
    /// Directory holding the source workbooks
    pub source_dir: PathBuf,
    /// Replaces spaces in workbook names and column headers
    pub filler: char,
    pub workbook_extension: String,
    /// Geospatial extension, `None` to skip
    pub spatialite: Option<String>,
    /// Treat a missing previous database as fatal
    pub require_existing_db: bool,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            source_dir: PathBuf::from("."),
            filler: '_',
            workbook_extension: "xlsx".to_string(),
            spatialite: Some(DEFAULT_SPATIALITE.to_string()),
            require_existing_db: false,
        }
    }
}

/// Optional settings file, every key may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub filler: Option<char>,
    pub workbook_extension: Option<String>,
    /// Empty string disables the extension
    pub spatialite: Option<String>,
    pub require_existing_db: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EtlError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl EtlConfig {
    /// Resolve settings from the command line and the file it names
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                log::debug!("Reading settings from {}", path.display());
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };
        Ok(Self::default().with_file(file).with_cli(cli))
    }

    fn with_file(mut self, file: FileConfig) -> Self {
        if let Some(database) = file.database {
            self.database = database;
        }
        if let Some(source_dir) = file.source_dir {
            self.source_dir = source_dir;
        }
        if let Some(filler) = file.filler {
            self.filler = filler;
        }
        if let Some(extension) = file.workbook_extension {
            self.workbook_extension = extension;
        }
        if let Some(spatialite) = file.spatialite {
            self.spatialite = (!spatialite.is_empty()).then_some(spatialite);
        }
        if let Some(require) = file.require_existing_db {
            self.require_existing_db = require;
        }
        self
    }

    fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(database) = &cli.database {
            self.database = database.clone();
        }
        if let Some(source_dir) = &cli.source_dir {
            self.source_dir = source_dir.clone();
        }
        if let Some(spatialite) = &cli.spatialite {
            self.spatialite = Some(spatialite.clone());
        }
        if cli.no_spatialite {
            self.spatialite = None;
        }
        if cli.require_existing_db {
            self.require_existing_db = true;
        }
        self
    }

    /// Location of the workbook feeding `descriptor`
    pub fn workbook_path(&self, descriptor: &TableDescriptor) -> PathBuf {
        descriptor.workbook_path(&self.source_dir, self.filler, &self.workbook_extension)
    }
}
