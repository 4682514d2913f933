//! Project settings.
//!
//! ```toml
//! use_i18n = true
//! locale_paths = ["locale", "apps/shop/locale"]
//!
//! [translator]
//! provider = "google"
//! ```
//!
//! Relative locale paths are resolved against the settings file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SettingsError;

/// Which translation backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
    /// Appends the target locale to the source text; no network.
    Mock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorSettings {
    pub provider: ProviderKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub use_i18n: bool,
    pub locale_paths: Vec<PathBuf>,
    pub translator: TranslatorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_i18n: true,
            locale_paths: Vec::new(),
            translator: TranslatorSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings =
            toml::from_str(&text).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(base) = path.parent() {
            settings.locale_paths = settings
                .locale_paths
                .into_iter()
                .map(|p| if p.is_relative() { base.join(p) } else { p })
                .collect();
        }
        Ok(settings)
    }

    /// Loads `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
