//! Machine translation for gettext catalogs.
//!
//! Walks `<root>/<locale>/LC_MESSAGES/*.po` trees and fills empty or fuzzy
//! entries through a [`MachineTranslator`], throttled to a fixed number of
//! requests per 10 seconds and optionally capped in total.
//!
//! # Example
//!
//! ```ignore
//! use po_autotranslate::{
//!     GoogleTranslateProvider, RunOptions, Settings, TracingReporter, TranslationDriver,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(std::path::Path::new("autotranslate.toml"))?;
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let options = RunOptions {
//!         skip_translated: true,
//!         limit_translations: Some(100),
//!         ..RunOptions::default()
//!     };
//!     let summary = TranslationDriver::new(&provider, &TracingReporter)
//!         .run(&settings, &options)
//!         .await?;
//!     println!("{} entries translated", summary.translated);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod driver;
pub mod error;
pub mod mt;
pub mod rate_limit;
pub mod reporter;
pub mod selector;
pub mod settings;
pub mod walker;

#[cfg(test)]
mod integration_tests;

pub use catalog::{Catalog, Entry};
pub use driver::{RunOptions, RunSummary, TranslationDriver};
pub use error::{CatalogError, DriverError, SettingsError};
pub use mt::{GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator, MtError};
pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
pub use reporter::{ProgressEvent, ProgressReporter, RecordingReporter, TracingReporter};
pub use selector::EntrySelector;
pub use settings::{ProviderKind, Settings};
pub use walker::{CatalogFile, CatalogWalker, WalkItem};
