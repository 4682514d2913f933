use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use po_autotranslate::driver::DEFAULT_REQUESTS_PER_WINDOW;
use po_autotranslate::{
    GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator, ProviderKind,
    RunOptions, Settings, TracingReporter, TranslationDriver,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Autotranslate all the message files that have been generated by `makemessages`.
#[derive(Debug, Parser)]
#[command(name = "po-autotranslate", version, about)]
struct Cli {
    /// Autotranslate the message files for the given locale(s) (e.g. pt_BR).
    /// Can be used multiple times.
    #[arg(short, long = "locale", value_name = "LOCALE")]
    locales: Vec<String>,

    /// Autotranslate the fuzzy and empty messages only.
    #[arg(short = 'u', long = "untranslated")]
    skip_translated: bool,

    /// Set the fuzzy flag on autotranslated messages.
    #[arg(short = 'f', long)]
    set_fuzzy: bool,

    /// Source language used for translation.
    #[arg(short, long, default_value = "en")]
    source_language: String,

    /// Limit the number of translations to perform (default: no limit).
    #[arg(long, value_name = "N")]
    limit_translations: Option<usize>,

    /// Maximum number of translation requests per 10 seconds.
    #[arg(long = "requests-per-10s", value_name = "N", default_value_t = DEFAULT_REQUESTS_PER_WINDOW)]
    requests_per_10s: u32,

    /// Settings file with `use_i18n`, `locale_paths` and `[translator]`.
    #[arg(long, env = "PO_AUTOTRANSLATE_SETTINGS", default_value = "autotranslate.toml")]
    settings: PathBuf,

    /// Extra catalog root, appended to the configured `locale_paths`.
    #[arg(long = "locale-path", value_name = "DIR")]
    locale_paths: Vec<PathBuf>,

    /// Translation provider; overrides the settings file.
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Show debug output.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            locales: self.locales.clone(),
            skip_translated: self.skip_translated,
            set_fuzzy: self.set_fuzzy,
            source_language: self.source_language.clone(),
            limit_translations: self.limit_translations,
            requests_per_window: self.requests_per_10s,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_translator(kind: ProviderKind) -> Result<Box<dyn MachineTranslator>> {
    Ok(match kind {
        ProviderKind::Google => Box::new(
            GoogleTranslateProvider::from_env()
                .context("Failed to initialize Google Translate provider")?,
        ),
        ProviderKind::Mock => Box::new(MockTranslator::new(MockMode::Suffix)),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = Settings::load_or_default(&cli.settings)?;
    settings.locale_paths.extend(cli.locale_paths.iter().cloned());
    let provider = cli.provider.unwrap_or(settings.translator.provider);

    let translator = build_translator(provider)?;
    let summary = TranslationDriver::new(translator.as_ref(), &TracingReporter)
        .run(&settings, &cli.run_options())
        .await?;

    if summary.limit_reached {
        info!("Stopped early at the translation limit");
    }
    Ok(())
}
