use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reading, parsing or writing a PO file failed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write catalog {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Loading the settings file failed.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that abort a translation run.
///
/// Per-entry translation failures are not here: the driver reports them
/// and moves on.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("i18n framework is disabled")]
    I18nDisabled,
    #[error("locale paths are not configured")]
    NoLocalePaths,
    #[error("requests per window must be at least 1, got {0}")]
    InvalidRateLimit(u32),
    #[error("invalid source language: {0}")]
    InvalidSourceLanguage(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
