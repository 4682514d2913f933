//! Progress reporting.
//!
//! The driver emits [`ProgressEvent`]s; a [`ProgressReporter`] decides how
//! they are shown. Reporters never influence the run.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::driver::RunSummary;

/// Texts in log lines are cut to this many characters.
pub const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    RunStarted {
        provider: String,
        limit: Option<usize>,
        requests_per_window: u32,
        window: Duration,
    },
    LocaleSkipped {
        locale: String,
        path: PathBuf,
    },
    LayoutUnresolved {
        path: PathBuf,
    },
    PathUnreadable {
        path: Option<PathBuf>,
        error: String,
    },
    CatalogStarted {
        locale: String,
        path: PathBuf,
    },
    CatalogUnreadable {
        path: PathBuf,
        error: String,
    },
    LimitReached {
        limit: usize,
    },
    RateLimitWait {
        duration: Duration,
    },
    EntryTranslated {
        count: usize,
        source: String,
        translation: String,
    },
    EntryFailed {
        source: String,
        error: String,
    },
    RunFinished {
        summary: RunSummary,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Renders events as `tracing` log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                provider,
                limit,
                requests_per_window,
                window,
            } => {
                info!("Using provider: {}", provider);
                if let Some(limit) = limit {
                    info!("Translation limit set to: {}", limit);
                }
                info!(
                    "Rate limit: {} requests per {} seconds",
                    requests_per_window,
                    window.as_secs()
                );
            }
            ProgressEvent::LocaleSkipped { locale, path } => {
                info!(path = %path.display(), "skipping translation for locale `{}`", locale);
            }
            ProgressEvent::LayoutUnresolved { path } => {
                warn!(
                    "cannot derive a locale for {}: expected <locale>/LC_MESSAGES/<file>.po",
                    path.display()
                );
            }
            ProgressEvent::PathUnreadable { path, error } => match path {
                Some(path) => warn!("cannot access {}: {}", path.display(), error),
                None => warn!("cannot access path: {}", error),
            },
            ProgressEvent::CatalogStarted { locale, path } => {
                info!(path = %path.display(), "filling up translations for locale `{}`", locale);
            }
            ProgressEvent::CatalogUnreadable { path, error } => {
                error!(path = %path.display(), "skipping unreadable catalog: {}", error);
            }
            ProgressEvent::LimitReached { limit } => {
                info!("Translation limit of {} reached. Stopping.", limit);
            }
            ProgressEvent::RateLimitWait { duration } => {
                info!(
                    "Rate limit reached, waiting {:.2} seconds...",
                    duration.as_secs_f64()
                );
            }
            ProgressEvent::EntryTranslated {
                count,
                source,
                translation,
            } => {
                info!(
                    "Translated entry #{}: \"{}\" -> \"{}\"",
                    count,
                    preview(source),
                    preview(translation)
                );
            }
            ProgressEvent::EntryFailed { source, error } => {
                error!("Error translating \"{}\": {}", preview(source), error);
            }
            ProgressEvent::RunFinished { summary } => {
                info!(
                    "Finished: {} translated, {} failed, {} catalogs processed",
                    summary.translated, summary.failed, summary.catalogs_processed
                );
                debug!(?summary, "run summary");
            }
        }
    }
}

/// Keeps every event, for tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, with `...` when cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
