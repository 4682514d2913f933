//! End-to-end tests for the translation driver
//!
//! Each test builds a throwaway `<root>/<locale>/LC_MESSAGES/*.po` tree,
//! runs the driver against the mock translator on virtual time, and checks
//! both the reported events and the bytes written back to disk.
//!
//! # Running the live provider test
//!
//! ```bash
//! export GOOGLE_TRANSLATE_API_KEY=...
//! cargo test --lib integration_tests -- --ignored --nocapture
//! ```

#[cfg(test)]
mod tests {
    use crate::catalog::Catalog;
    use crate::driver::{RunOptions, RunSummary, TranslationDriver};
    use crate::error::{CatalogError, DriverError};
    use crate::mt::{GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator};
    use crate::rate_limit::ManualClock;
    use crate::reporter::{ProgressEvent, RecordingReporter};
    use crate::settings::Settings;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const HEADER: &str = "msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n";

    /// Writes `<root>/<locale>/LC_MESSAGES/<name>` and returns its path.
    fn write_catalog(root: &Path, locale: &str, name: &str, body: &str) -> PathBuf {
        let dir = root.join(locale).join("LC_MESSAGES");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, format!("{}\n{}", HEADER, body)).unwrap();
        path
    }

    fn untranslated(ids: &[&str]) -> String {
        ids.iter()
            .map(|id| format!("msgid \"{}\"\nmsgstr \"\"\n", id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn settings_for(roots: &[&Path]) -> Settings {
        Settings {
            locale_paths: roots.iter().map(|r| r.to_path_buf()).collect(),
            ..Settings::default()
        }
    }

    struct Harness {
        translator: MockTranslator,
        reporter: RecordingReporter,
        clock: ManualClock,
    }

    impl Harness {
        fn new(translator: MockTranslator) -> Self {
            Self {
                translator,
                reporter: RecordingReporter::new(),
                clock: ManualClock::new(),
            }
        }

        async fn run(&self, settings: &Settings, options: &RunOptions) -> RunSummary {
            TranslationDriver::new(&self.translator, &self.reporter)
                .with_clock(&self.clock)
                .run(settings, options)
                .await
                .unwrap()
        }

        fn count(&self, predicate: impl Fn(&ProgressEvent) -> bool) -> usize {
            self.reporter.events().iter().filter(|e| predicate(e)).count()
        }
    }

    // ============================================================================
    // Single catalog
    // ============================================================================

    #[tokio::test]
    async fn test_fills_entry_and_preserves_everything_else() {
        let dir = tempfile::tempdir().unwrap();
        let body = "#: app.py:1\nmsgid \"Hello\"\nmsgstr \"\"\n\n\
                    #, python-format\nmsgid \"Yes\"\nmsgstr \"Oui\"\n\n\
                    #~ msgid \"Gone\"\n#~ msgstr \"Parti\"\n";
        let path = write_catalog(dir.path(), "fr", "x.po", body);
        let before = fs::read_to_string(&path).unwrap();

        let harness = Harness::new(MockTranslator::with_mappings("fr", &[("Hello", "Bonjour")]));
        let options = RunOptions {
            skip_translated: true,
            ..RunOptions::default()
        };
        let summary = harness.run(&settings_for(&[dir.path()]), &options).await;

        assert_eq!(summary.translated, 1);
        assert_eq!(summary.catalogs_processed, 1);
        assert_eq!(
            harness.translator.calls(),
            vec![("Hello".to_string(), "en".to_string(), "fr".to_string())]
        );

        let after = fs::read_to_string(&path).unwrap();
        let expected = before.replacen(
            "msgid \"Hello\"\nmsgstr \"\"",
            "msgid \"Hello\"\nmsgstr \"Bonjour\"",
            1,
        );
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn test_exactly_selected_entries_are_attempted() {
        let dir = tempfile::tempdir().unwrap();
        let body = "msgid \"A\"\nmsgstr \"\"\n\n\
                    msgid \" \"\nmsgstr \"\"\n\n\
                    msgid \"B\"\nmsgstr \"b\"\n\n\
                    #, fuzzy\nmsgid \"C\"\nmsgstr \"c\"\n\n\
                    msgid \"D\"\nmsgstr \"\"\n";
        write_catalog(dir.path(), "de", "x.po", body);
        let settings = settings_for(&[dir.path()]);

        let only_missing = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            skip_translated: true,
            ..RunOptions::default()
        };
        only_missing.run(&settings, &options).await;
        assert_eq!(only_missing.translator.requested_texts(), vec!["A", "C", "D"]);

        // second pass only revisits C, which keeps its fuzzy flag
        let again = Harness::new(MockTranslator::new(MockMode::Suffix));
        let summary = again.run(&settings, &options).await;
        assert_eq!(summary.translated, 1);
        assert_eq!(again.translator.requested_texts(), vec!["C"]);

        let everything = Harness::new(MockTranslator::new(MockMode::Suffix));
        let summary = everything.run(&settings, &RunOptions::default()).await;
        assert_eq!(everything.translator.requested_texts(), vec!["A", "B", "C", "D"]);
        assert_eq!(summary.translated, 4);
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["Hello", "World"]));

        let harness = Harness::new(MockTranslator::failing_on(&["Hello"]));
        let summary = harness
            .run(&settings_for(&[dir.path()]), &RunOptions::default())
            .await;

        assert_eq!(summary.translated, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(harness.translator.requested_texts(), vec!["Hello", "World"]);

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.find("Hello").unwrap().msgstr(), "");
        assert!(!catalog.find("Hello").unwrap().is_modified());
        assert_eq!(catalog.find("World").unwrap().msgstr(), "World_fr");

        let failures: Vec<ProgressEvent> = harness
            .reporter
            .events()
            .into_iter()
            .filter(|e| matches!(e, ProgressEvent::EntryFailed { .. }))
            .collect();
        assert_eq!(failures.len(), 1);
        match &failures[0] {
            ProgressEvent::EntryFailed { source, error } => {
                assert_eq!(source, "Hello");
                assert!(error.contains("mock failure"));
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_set_fuzzy_marks_new_translations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["One", "Two"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            set_fuzzy: true,
            ..RunOptions::default()
        };
        harness.run(&settings_for(&[dir.path()]), &options).await;

        let catalog = Catalog::load(&path).unwrap();
        for id in ["One", "Two"] {
            let entry = catalog.find(id).unwrap();
            assert!(entry.is_fuzzy());
            assert_eq!(entry.msgstr(), format!("{}_fr", id));
        }
        assert!(fs::read_to_string(&path).unwrap().contains("#, fuzzy\nmsgid \"One\""));

        // fuzzy entries are picked up again by an untranslated-only pass
        let rerun = Harness::new(MockTranslator::new(MockMode::Suffix));
        let rerun_options = RunOptions {
            skip_translated: true,
            ..RunOptions::default()
        };
        let summary = rerun.run(&settings_for(&[dir.path()]), &rerun_options).await;
        assert_eq!(summary.translated, 2);
    }

    #[tokio::test]
    async fn test_plural_entries_fill_every_slot() {
        let dir = tempfile::tempdir().unwrap();
        let body = "msgid \"One file\"\nmsgid_plural \"%d files\"\n\
                    msgstr[0] \"\"\nmsgstr[1] \"\"\nmsgstr[2] \"\"\n";
        let path = write_catalog(dir.path(), "ru", "x.po", body);

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let summary = harness
            .run(&settings_for(&[dir.path()]), &RunOptions::default())
            .await;

        assert_eq!(summary.translated, 1);
        assert_eq!(harness.translator.requested_texts(), vec!["One file", "%d files"]);
        let catalog = Catalog::load(&path).unwrap();
        let entry = catalog.entry(1).unwrap();
        assert_eq!(
            entry.msgstr_plural(),
            ["One file_ru", "%d files_ru", "%d files_ru"]
        );
    }

    // ============================================================================
    // Limits
    // ============================================================================

    #[tokio::test]
    async fn test_translation_limit_stops_across_catalogs() {
        let dir = tempfile::tempdir().unwrap();
        let de = write_catalog(dir.path(), "de", "x.po", &untranslated(&["A", "B"]));
        let fr = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["C", "D"]));
        let fr_before = fs::read_to_string(&fr).unwrap();
        let es = write_catalog(dir.path(), "es", "x.po", &untranslated(&["E"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            limit_translations: Some(3),
            ..RunOptions::default()
        };
        let summary = harness.run(&settings_for(&[dir.path()]), &options).await;

        // walk order: de, es, fr
        assert_eq!(summary.translated, 3);
        assert!(summary.limit_reached);
        assert_eq!(harness.translator.requested_texts(), vec!["A", "B", "E"]);
        assert_eq!(Catalog::load(&de).unwrap().find("B").unwrap().msgstr(), "B_de");
        assert_eq!(Catalog::load(&es).unwrap().find("E").unwrap().msgstr(), "E_es");
        assert_eq!(fs::read_to_string(&fr).unwrap(), fr_before);
        assert_eq!(
            harness.count(|e| matches!(e, ProgressEvent::LimitReached { limit: 3 })),
            1
        );
    }

    #[tokio::test]
    async fn test_limit_mid_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["A", "B", "C"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            limit_translations: Some(1),
            ..RunOptions::default()
        };
        let summary = harness.run(&settings_for(&[dir.path()]), &options).await;

        assert_eq!(summary.translated, 1);
        assert!(summary.limit_reached);
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.find("A").unwrap().msgstr(), "A_fr");
        assert_eq!(catalog.find("B").unwrap().msgstr(), "");
    }

    #[tokio::test]
    async fn test_failures_do_not_consume_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "fr", "x.po", &untranslated(&["A", "B", "C"]));

        let harness = Harness::new(MockTranslator::failing_on(&["A"]));
        let options = RunOptions {
            limit_translations: Some(2),
            ..RunOptions::default()
        };
        let summary = harness.run(&settings_for(&[dir.path()]), &options).await;

        assert_eq!(summary.translated, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(harness.translator.requested_texts(), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_zero_limit_translates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "fr", "x.po", &untranslated(&["A"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            limit_translations: Some(0),
            ..RunOptions::default()
        };
        let summary = harness.run(&settings_for(&[dir.path()]), &options).await;

        assert_eq!(summary.translated, 0);
        assert!(summary.limit_reached);
        assert_eq!(harness.translator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_limit_is_checked_between_roots() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_catalog(first.path(), "fr", "x.po", &untranslated(&["A"]));
        let untouched = write_catalog(second.path(), "fr", "x.po", &untranslated(&["B"]));
        let untouched_before = fs::read_to_string(&untouched).unwrap();

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            limit_translations: Some(1),
            ..RunOptions::default()
        };
        let summary = harness
            .run(&settings_for(&[first.path(), second.path()]), &options)
            .await;

        assert_eq!(summary.translated, 1);
        assert!(summary.limit_reached);
        assert_eq!(summary.catalogs_processed, 1);
        assert_eq!(fs::read_to_string(&untouched).unwrap(), untouched_before);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "fr", "x.po", &untranslated(&["A", "B", "C", "D", "E"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            requests_per_window: 2,
            ..RunOptions::default()
        };
        let summary = harness.run(&settings_for(&[dir.path()]), &options).await;

        assert_eq!(summary.translated, 5);
        // 2 at t=0, 2 at t=10, 1 at t=20
        assert_eq!(
            harness.clock.sleeps(),
            vec![Duration::from_secs(10), Duration::from_secs(10)]
        );
        assert_eq!(
            harness.count(|e| matches!(e, ProgressEvent::RateLimitWait { .. })),
            2
        );
    }

    // ============================================================================
    // Discovery
    // ============================================================================

    #[tokio::test]
    async fn test_locale_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let it = write_catalog(dir.path(), "it", "x.po", &untranslated(&["Ciao"]));
        let it_before = fs::read_to_string(&it).unwrap();
        write_catalog(dir.path(), "de", "x.po", &untranslated(&["Hallo"]));
        write_catalog(dir.path(), "fr", "x.po", &untranslated(&["Salut"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            locales: vec!["fr".to_string(), "de".to_string()],
            ..RunOptions::default()
        };
        let summary = harness.run(&settings_for(&[dir.path()]), &options).await;

        assert_eq!(summary.translated, 2);
        assert_eq!(summary.locales_skipped, 1);
        assert_eq!(harness.translator.requested_texts(), vec!["Hallo", "Salut"]);
        assert_eq!(fs::read_to_string(&it).unwrap(), it_before);
        assert_eq!(
            harness.count(|e| matches!(
                e,
                ProgressEvent::LocaleSkipped { locale, .. } if locale == "it"
            )),
            1
        );
    }

    #[tokio::test]
    async fn test_unreadable_catalog_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "de", "broken.po", "this is not a catalog\n");
        let good = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["A"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let summary = harness
            .run(&settings_for(&[dir.path()]), &RunOptions::default())
            .await;

        assert_eq!(summary.catalogs_unreadable, 1);
        assert_eq!(summary.translated, 1);
        assert_eq!(Catalog::load(&good).unwrap().find("A").unwrap().msgstr(), "A_fr");
    }

    #[tokio::test]
    async fn test_save_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["A", "B"]));
        let before = fs::read_to_string(&path).unwrap();
        // the temp file slot is taken by a directory, so the write fails
        fs::create_dir(path.with_file_name("x.po.tmp")).unwrap();

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let result = TranslationDriver::new(&harness.translator, &harness.reporter)
            .with_clock(&harness.clock)
            .run(&settings_for(&[dir.path()]), &RunOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(DriverError::Catalog(CatalogError::Write { .. }))
        ));
        assert_eq!(harness.translator.call_count(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(
            harness.count(|e| matches!(e, ProgressEvent::RunFinished { .. })),
            0
        );
    }

    #[tokio::test]
    async fn test_locale_comes_from_grandparent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("locale");
        fs::create_dir_all(&root).unwrap();
        let path = root.join("stray.po");
        fs::write(&path, untranslated(&["A"])).unwrap();

        // `stray.po` sits directly under the root; its grandparent is the tempdir
        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let summary = harness
            .run(&settings_for(&[root.as_path()]), &RunOptions::default())
            .await;

        let grandparent = dir
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert_eq!(summary.translated, 1);
        assert_eq!(
            harness.translator.calls()[0].2,
            grandparent,
            "locale comes from the grandparent directory name"
        );
    }

    #[tokio::test]
    async fn test_source_language_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "fr", "x.po", &untranslated(&["Hallo"]));

        let harness = Harness::new(MockTranslator::new(MockMode::Suffix));
        let options = RunOptions {
            source_language: "de".to_string(),
            ..RunOptions::default()
        };
        harness.run(&settings_for(&[dir.path()]), &options).await;

        assert_eq!(
            harness.translator.calls(),
            vec![("Hallo".to_string(), "de".to_string(), "fr".to_string())]
        );
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["Hello"]));

        let harness = Harness::new(MockTranslator::with_mappings("fr", &[("Hello", "Bonjour")]));
        let summary = harness
            .run(&settings_for(&[dir.path()]), &RunOptions::default())
            .await;

        assert_eq!(
            harness.reporter.events(),
            vec![
                ProgressEvent::RunStarted {
                    provider: "Mock Translator".to_string(),
                    limit: None,
                    requests_per_window: 10,
                    window: Duration::from_secs(10),
                },
                ProgressEvent::CatalogStarted {
                    locale: "fr".to_string(),
                    path: path.clone(),
                },
                ProgressEvent::EntryTranslated {
                    count: 1,
                    source: "Hello".to_string(),
                    translation: "Bonjour".to_string(),
                },
                ProgressEvent::RunFinished { summary },
            ]
        );
    }

    // ============================================================================
    // Live provider
    // ============================================================================

    #[tokio::test]
    #[ignore]
    async fn test_google_translate_live() {
        if std::env::var("GOOGLE_TRANSLATE_API_KEY").is_err() {
            eprintln!("Skipping: GOOGLE_TRANSLATE_API_KEY not set");
            return;
        }
        let provider = GoogleTranslateProvider::from_env().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(dir.path(), "fr", "x.po", &untranslated(&["Good morning"]));

        let reporter = RecordingReporter::new();
        let summary = TranslationDriver::new(&provider, &reporter)
            .run(&settings_for(&[dir.path()]), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.translated, 1, "{:?}", reporter.events());
        assert_eq!(provider.provider_name(), "Google Translate");
        let translated = Catalog::load(&path).unwrap();
        assert!(!translated.find("Good morning").unwrap().msgstr().is_empty());
    }
}
