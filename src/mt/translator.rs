//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! so the catalog driver can talk to Google Translate, a mock, or any other
//! backend through the same narrow `translate` capability.
//!
//! # Example
//!
//! ```ignore
//! use po_autotranslate::mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!     let result = provider.translate("Hello, world!", "en", "fr").await?;
//!     println!("{}", result); // "Bonjour, le monde!"
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use async_trait::async_trait;

/// Generic trait for machine translation providers
///
/// Implementations of this trait handle the actual translation work,
/// whether through an API (Google Translate) or deterministic logic (Mock).
///
/// All methods are async to support I/O-bound operations like network requests.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `source_locale` - Source language code (e.g., "en", "en-US")
    /// * `target_locale` - Target language code (e.g., "fr", "pt_BR")
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(MtError)` - If translation fails for any reason
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String>;

    /// Get the name of this translation provider
    ///
    /// Used for logging to identify which provider handled a run.
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code for provider APIs
///
/// Catalog directories use gettext names (`pt_BR`, `sr@latin`), providers
/// expect BCP 47 tags. Region and script subtags are kept, only the
/// `@modifier` is dropped:
/// - `pt_BR` → `pt-BR`
/// - `zh_Hant` → `zh-Hant`
/// - `sr@latin` → `sr`
/// - `EN` → `en`
pub fn normalize_locale(locale: &str) -> String {
    let base = locale.split('@').next().unwrap_or(locale);
    base.split(['-', '_'])
        .filter(|subtag| !subtag.is_empty())
        .enumerate()
        .map(|(index, subtag)| match (index, subtag.len()) {
            (0, _) => subtag.to_ascii_lowercase(),
            // script, e.g. Hant
            (_, 4) if subtag.is_ascii() => {
                let (first, rest) = subtag.split_at(1);
                first.to_ascii_uppercase() + &rest.to_ascii_lowercase()
            }
            (_, 2) => subtag.to_ascii_uppercase(),
            _ => subtag.to_string(),
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Validate that a locale code is in acceptable format
///
/// Accepts alphanumerics, hyphens, underscores and the gettext `@modifier`
/// separator.
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '@')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale_keeps_region() {
        assert_eq!(normalize_locale("en-US"), "en-US");
        assert_eq!(normalize_locale("pt_BR"), "pt-BR");
        assert_eq!(normalize_locale("pt_PT"), "pt-PT");
        assert_eq!(normalize_locale("zh_TW"), "zh-TW");
        assert_eq!(normalize_locale("es_419"), "es-419");
    }

    #[test]
    fn test_normalize_locale_keeps_script() {
        assert_eq!(normalize_locale("zh_Hant"), "zh-Hant");
        assert_eq!(normalize_locale("sr_latn"), "sr-Latn");
        assert_eq!(normalize_locale("zh_hans_cn"), "zh-Hans-CN");
    }

    #[test]
    fn test_normalize_locale_with_modifier() {
        assert_eq!(normalize_locale("sr@latin"), "sr");
        assert_eq!(normalize_locale("ca@valencia"), "ca");
        assert_eq!(normalize_locale("sr_RS@latin"), "sr-RS");
    }

    #[test]
    fn test_normalize_locale_already_simple() {
        assert_eq!(normalize_locale("de"), "de");
        assert_eq!(normalize_locale("EN"), "en");
    }

    #[test]
    fn test_validate_locale_valid_codes() {
        assert!(validate_locale("en").is_ok());
        assert!(validate_locale("en-US").is_ok());
        assert!(validate_locale("pt_BR").is_ok());
        assert!(validate_locale("sr@latin").is_ok());
    }

    #[test]
    fn test_validate_locale_invalid_codes() {
        assert!(validate_locale("").is_err());
        assert!(validate_locale("fr#bad").is_err());
        assert!(validate_locale("es!error").is_err());
        assert!(validate_locale("en US").is_err());
    }

    #[test]
    fn test_validate_locale_error_messages() {
        match validate_locale("en/US") {
            Err(MtError::InvalidLocale(msg)) => {
                assert!(msg.contains("Invalid characters"));
            }
            _ => panic!("Expected InvalidLocale error"),
        }
    }
}
