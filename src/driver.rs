//! The batch translation driver.
//!
//! Walks every configured catalog root, picks the entries that need a
//! translation and sends them one by one through the rate limiter to the
//! translation provider. Each successful translation is saved to disk
//! before the next request is made, so an interrupted run loses at most
//! the request in flight.

use std::ops::ControlFlow;

use crate::catalog::{Catalog, FUZZY_FLAG};
use crate::error::DriverError;
use crate::mt::{MachineTranslator, MtResult, validate_locale};
use crate::rate_limit::{Clock, RateLimiter, SystemClock};
use crate::reporter::{ProgressEvent, ProgressReporter};
use crate::selector::EntrySelector;
use crate::settings::Settings;
use crate::walker::{CatalogFile, CatalogWalker, WalkItem};

/// Default ceiling for requests per 10 second window.
pub const DEFAULT_REQUESTS_PER_WINDOW: u32 = 10;

/// Knobs for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Only translate these locales; empty means all.
    pub locales: Vec<String>,
    /// Only fill in empty and fuzzy entries.
    pub skip_translated: bool,
    /// Mark every new translation as fuzzy.
    pub set_fuzzy: bool,
    pub source_language: String,
    /// Stop after this many translated entries.
    pub limit_translations: Option<usize>,
    pub requests_per_window: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            locales: Vec::new(),
            skip_translated: false,
            set_fuzzy: false,
            source_language: "en".to_string(),
            limit_translations: None,
            requests_per_window: DEFAULT_REQUESTS_PER_WINDOW,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub translated: usize,
    pub failed: usize,
    pub catalogs_processed: usize,
    pub catalogs_unreadable: usize,
    pub locales_skipped: usize,
    /// The translation limit stopped the run.
    pub limit_reached: bool,
}

/// Counters for the run in progress.
struct RunState {
    limit: Option<usize>,
    summary: RunSummary,
}

/// New text for an entry.
enum Translation {
    Singular(String),
    Plural(Vec<String>),
}

impl Translation {
    fn preview(&self) -> &str {
        match self {
            Translation::Singular(text) => text,
            Translation::Plural(texts) => texts.first().map(String::as_str).unwrap_or(""),
        }
    }
}

pub struct TranslationDriver<'a> {
    translator: &'a dyn MachineTranslator,
    reporter: &'a dyn ProgressReporter,
    clock: &'a dyn Clock,
}

impl<'a> TranslationDriver<'a> {
    pub fn new(translator: &'a dyn MachineTranslator, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            translator,
            reporter,
            clock: &SystemClock,
        }
    }

    /// Replaces the wall clock used for rate limiting.
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run(
        &self,
        settings: &Settings,
        options: &RunOptions,
    ) -> Result<RunSummary, DriverError> {
        validate(settings, options)?;

        let mut limiter = RateLimiter::new(options.requests_per_window, self.clock)?;
        let selector = EntrySelector::new(options.skip_translated);
        let walker = CatalogWalker::new(settings.locale_paths.clone(), options.locales.clone());
        let mut state = RunState {
            limit: options.limit_translations,
            summary: RunSummary::default(),
        };

        self.reporter.report(&ProgressEvent::RunStarted {
            provider: self.translator.provider_name().to_string(),
            limit: options.limit_translations,
            requests_per_window: options.requests_per_window,
            window: limiter.window(),
        });

        'roots: for root in walker.roots() {
            if self.limit_reached(&mut state) {
                break;
            }
            for item in walker.walk_root(root) {
                if self.limit_reached(&mut state) {
                    break 'roots;
                }
                match item {
                    WalkItem::Catalog(file) => {
                        let flow = self
                            .translate_catalog(&file, selector, &mut limiter, &mut state, options)
                            .await?;
                        if flow.is_break() {
                            break 'roots;
                        }
                    }
                    WalkItem::LocaleSkipped { path, locale } => {
                        state.summary.locales_skipped += 1;
                        self.reporter
                            .report(&ProgressEvent::LocaleSkipped { locale, path });
                    }
                    WalkItem::Unresolved { path } => {
                        self.reporter
                            .report(&ProgressEvent::LayoutUnresolved { path });
                    }
                    WalkItem::Unreadable { path, error } => {
                        self.reporter.report(&ProgressEvent::PathUnreadable {
                            path,
                            error: error.to_string(),
                        });
                    }
                }
            }
        }

        self.reporter.report(&ProgressEvent::RunFinished {
            summary: state.summary.clone(),
        });
        Ok(state.summary)
    }

    async fn translate_catalog(
        &self,
        file: &CatalogFile,
        selector: EntrySelector,
        limiter: &mut RateLimiter<'_>,
        state: &mut RunState,
        options: &RunOptions,
    ) -> Result<ControlFlow<()>, DriverError> {
        self.reporter.report(&ProgressEvent::CatalogStarted {
            locale: file.locale.clone(),
            path: file.path.clone(),
        });

        let mut catalog = match Catalog::load(&file.path) {
            Ok(catalog) => catalog,
            Err(err) => {
                state.summary.catalogs_unreadable += 1;
                self.reporter.report(&ProgressEvent::CatalogUnreadable {
                    path: file.path.clone(),
                    error: err.to_string(),
                });
                return Ok(ControlFlow::Continue(()));
            }
        };
        state.summary.catalogs_processed += 1;

        for index in 0..catalog.len() {
            let Some(entry) = catalog.entry(index) else {
                continue;
            };
            if !selector.should_translate(entry) {
                continue;
            }
            if self.limit_reached(state) {
                return Ok(ControlFlow::Break(()));
            }

            let source = entry.msgid().to_string();
            let plural_source = entry.msgid_plural().map(str::to_string);
            let slots = entry.msgstr_plural().len().max(1);

            let result = match plural_source.as_deref() {
                None => self
                    .translate_text(&source, &file.locale, limiter, options)
                    .await
                    .map(Translation::Singular),
                Some(plural) => self
                    .translate_plural(&source, plural, slots, &file.locale, limiter, options)
                    .await
                    .map(Translation::Plural),
            };

            match result {
                Ok(translation) => {
                    let Some(entry) = catalog.entry_mut(index) else {
                        continue;
                    };
                    let translated = translation.preview().to_string();
                    match translation {
                        Translation::Singular(text) => entry.set_msgstr(text),
                        Translation::Plural(texts) => entry.set_msgstr_plural(texts),
                    }
                    if options.set_fuzzy {
                        entry.add_flag(FUZZY_FLAG);
                    }
                    state.summary.translated += 1;
                    catalog.save()?;

                    self.reporter.report(&ProgressEvent::EntryTranslated {
                        count: state.summary.translated,
                        source,
                        translation: translated,
                    });
                }
                Err(err) => {
                    state.summary.failed += 1;
                    self.reporter.report(&ProgressEvent::EntryFailed {
                        source,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    /// One throttled provider call.
    async fn translate_text(
        &self,
        text: &str,
        target_locale: &str,
        limiter: &mut RateLimiter<'_>,
        options: &RunOptions,
    ) -> MtResult<String> {
        if let Some(duration) = limiter.wait_time() {
            self.reporter
                .report(&ProgressEvent::RateLimitWait { duration });
        }
        limiter.acquire().await;
        self.translator
            .translate(text, &options.source_language, target_locale)
            .await
    }

    /// `msgstr[0]` from the singular source, every other slot from the plural.
    async fn translate_plural(
        &self,
        singular: &str,
        plural: &str,
        slots: usize,
        target_locale: &str,
        limiter: &mut RateLimiter<'_>,
        options: &RunOptions,
    ) -> MtResult<Vec<String>> {
        let one = self
            .translate_text(singular, target_locale, limiter, options)
            .await?;
        if slots == 1 {
            return Ok(vec![one]);
        }
        let many = self
            .translate_text(plural, target_locale, limiter, options)
            .await?;

        let mut translations = Vec::with_capacity(slots);
        translations.push(one);
        translations.resize(slots, many);
        Ok(translations)
    }

    /// True once the translated count has hit the limit; reports it once.
    fn limit_reached(&self, state: &mut RunState) -> bool {
        let Some(limit) = state.limit else {
            return false;
        };
        if state.summary.translated < limit {
            return false;
        }
        if !state.summary.limit_reached {
            state.summary.limit_reached = true;
            self.reporter.report(&ProgressEvent::LimitReached { limit });
        }
        true
    }
}

fn validate(settings: &Settings, options: &RunOptions) -> Result<(), DriverError> {
    if !settings.use_i18n {
        return Err(DriverError::I18nDisabled);
    }
    if settings.locale_paths.is_empty() {
        return Err(DriverError::NoLocalePaths);
    }
    if options.requests_per_window == 0 {
        return Err(DriverError::InvalidRateLimit(options.requests_per_window));
    }
    validate_locale(&options.source_language)
        .map_err(|err| DriverError::InvalidSourceLanguage(err.to_string()))
}
