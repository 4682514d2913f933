//! Mock Machine Translator for testing
//!
//! A deterministic, API-free translator for exercising the catalog driver
//! without API keys or network access. It counts every call so tests can
//! assert how many requests a run issued.
//!
//! # Example
//!
//! ```ignore
//! use po_autotranslate::mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! let mock = MockTranslator::new(MockMode::Suffix);
//! let result = mock.translate("hello", "en", "fr").await.unwrap();
//! assert_eq!(result, "hello_fr");
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hello" → "hello_fr"
    Suffix,

    /// Use predefined mappings for realistic translations
    /// (text, target_locale) → translation; unmapped texts fall back to Suffix
    Mappings(HashMap<(String, String), String>),

    /// Fail for the listed source texts, Suffix for everything else
    FailOn(HashSet<String>),

    /// Simulate API errors for every request
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    /// Every (text, source, target) the translator was asked for, in order
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor for a fixed `text → translation` table for one locale
    pub fn with_mappings(target_locale: &str, pairs: &[(&str, &str)]) -> Self {
        let map = pairs
            .iter()
            .map(|(text, translation)| {
                (
                    (text.to_string(), target_locale.to_string()),
                    translation.to_string(),
                )
            })
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    /// Convenience constructor failing on the given source texts
    pub fn failing_on(texts: &[&str]) -> Self {
        Self::new(MockMode::FailOn(
            texts.iter().map(|t| t.to_string()).collect(),
        ))
    }

    /// Source texts requested so far, in call order
    pub fn requested_texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|(text, _, _)| text.clone()).collect())
            .unwrap_or_default()
    }

    /// Full (text, source, target) call log
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of translate calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::FailOn(texts) if texts.contains(text) => Err(MtError::TranslationError(
                format!("mock failure for {:?}", text),
            )),
            MockMode::FailOn(_) => Ok(format!("{}_{}", text, target)),
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((
                text.to_string(),
                source_locale.to_string(),
                target_locale.to_string(),
            ));
        }
        self.apply_translation(text, target_locale)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
