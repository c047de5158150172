// Load settings: defaults, optional TOML file, then command-line/env overrides
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::EtlError;

pub const DEFAULT_PNR_XML: &str = "./PNR.xml";
pub const DEFAULT_AIRPORTS: &str = "iata.txt";
pub const DEFAULT_PROCEDURES: [&str; 2] = ["run_setup_inserts", "reserve_seats"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pnr_xml: PathBuf,
    pub airports: PathBuf,
    pub database: DatabaseSettings,
    pub tables: TableSettings,
    /// Stored procedures called after the load, each in its own commit.
    pub procedures: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub pnr: String,
    pub airports: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pnr_xml: PathBuf::from(DEFAULT_PNR_XML),
            airports: PathBuf::from(DEFAULT_AIRPORTS),
            database: DatabaseSettings::default(),
            tables: TableSettings::default(),
            procedures: DEFAULT_PROCEDURES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            pnr: "Pnr".to_string(),
            airports: "Airports".to_string(),
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub pnr_xml: Option<PathBuf>,
    pub airports: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self, EtlError> {
        toml::from_str(contents).map_err(|e| EtlError::ConfigError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EtlError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Defaults, or the given file, with overrides applied on top.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, EtlError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply(overrides);
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.pnr_xml {
            self.pnr_xml = path;
        }
        if let Some(path) = overrides.airports {
            self.airports = path;
        }
        if let Some(url) = overrides.database_url {
            self.database.url = Some(url);
        }
    }

    /// Table and procedure names end up in SQL text, so they must be identifiers.
    pub fn validate(&self) -> Result<(), EtlError> {
        validate_identifier(&self.tables.pnr)?;
        validate_identifier(&self.tables.airports)?;
        for procedure in &self.procedures {
            validate_identifier(procedure)?;
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str, EtlError> {
        self.database
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| EtlError::ConfigError("database url is not set".to_string()))
    }
}

/// Accepts `name` or `schema.name`, each part ASCII letters, digits and underscores.
pub fn validate_identifier(name: &str) -> Result<(), EtlError> {
    let parts: Vec<&str> = name.split('.').collect();
    let valid_part = |part: &&str| {
        !part.is_empty()
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    if parts.len() > 2 || !parts.iter().all(valid_part) {
        return Err(EtlError::ConfigError(format!(
            "invalid SQL identifier: {:?}",
            name
        )));
    }
    Ok(())
}
