//! Machine Translation Module
//!
//! The narrow translation capability the catalog driver consumes:
//! a `MachineTranslator` trait, its error type, a Google Translate v2
//! provider and a deterministic mock for tests and dry runs.
pub mod error;
pub mod google_translate;
pub mod mock;
pub mod translator;

pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use translator::{MachineTranslator, normalize_locale, validate_locale};
