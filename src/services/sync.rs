//! Store ⇄ catalog synchronization. Each language is handled by its own
//! scoped thread; a run returns once every language task has been joined.

use serde::Serialize;

use std::collections::HashSet;
use std::thread;

use crate::error::{Result, SyncError};
use crate::model::config::AppConfig;
use crate::model::record::{RecordKey, TranslationRecord};
use crate::services::store::TranslationStore;
use crate::services::{attribution, catalog};

#[derive(Debug, Serialize, Clone)]
pub struct ExportReport {
    pub language: String,
    pub path: String,
    pub entries: usize,
    pub records: usize,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Imported,
    Stale,
    Missing,
    Failed,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TagFailure {
    pub tag: String,
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ImportReport {
    pub language: String,
    pub status: ImportStatus,
    pub written: usize,
    pub failed: usize,
    pub failures: Vec<TagFailure>,
    pub error: Option<String>,
}

impl ImportReport {
    fn new(language: &str, status: ImportStatus) -> Self {
        ImportReport {
            language: language.to_string(),
            status,
            written: 0,
            failed: 0,
            failures: Vec::new(),
            error: None,
        }
    }
}

/// Exports `locale`, or every configured language when `None`.
pub fn export(
    store: &dyn TranslationStore,
    config: &AppConfig,
    locale: Option<&str>,
) -> Result<Vec<ExportReport>> {
    let languages: Vec<&str> = match locale {
        Some(l) => {
            config.require_language(l)?;
            vec![l]
        }
        None => config.languages.iter().map(String::as_str).collect(),
    };

    Ok(per_language(
        &languages,
        |lang| export_language(store, config, lang),
        |lang, e| ExportReport {
            language: lang.to_string(),
            path: config.catalog_path(lang).display().to_string(),
            entries: 0,
            records: 0,
            error: Some(e.to_string()),
        },
    ))
}

pub fn export_language(
    store: &dyn TranslationStore,
    config: &AppConfig,
    language: &str,
) -> Result<ExportReport> {
    let _span = tracing::info_span!("export", language).entered();

    let path = config.catalog_path(language);
    let mut po = catalog::load(&path)?;
    let kinds = store.entity_kinds();

    // Sources whose translation was already set by this run; later records
    // sharing the same source only add their tag.
    let mut set_this_run: HashSet<String> = HashSet::new();
    let mut records = 0usize;

    for entity in store.list_translatable_entities()? {
        let Some(kind) = kinds.iter().find(|k| k.name == entity.kind) else {
            continue;
        };
        let existing = store.list_translation_records(&entity)?;

        for (field, source) in kind.translatable_values(&entity) {
            let record = existing
                .iter()
                .find(|r| r.key.field == field && r.key.language == language)
                .cloned()
                .unwrap_or_else(|| {
                    let mut blank = TranslationRecord::blank(RecordKey::new(
                        &entity.kind,
                        &entity.id,
                        field,
                        language,
                    ));
                    if language == config.primary_language {
                        blank.text = source.to_string();
                    }
                    blank
                });

            let entry = po.entry_or_insert(source);
            entry.add_tag(&record.key.tag());

            if !record.text.is_empty() && set_this_run.insert(source.to_string()) {
                entry.set_translation(record.text);
            } else if !entry.is_translated() {
                // keeps a translator's catalog edit when the store has nothing
                entry.set_translation("");
            }
            entry.fuzzy = !entry.is_translated();

            records += 1;
        }
    }

    po.reset_metadata();
    catalog::save(&path, &po)?;

    tracing::info!(entries = po.len(), records, path = %path.display(), "catalog exported");

    Ok(ExportReport {
        language: language.to_string(),
        path: path.display().to_string(),
        entries: po.len(),
        records,
        error: None,
    })
}

/// Imports every non-primary language.
pub fn import(store: &dyn TranslationStore, config: &AppConfig) -> Vec<ImportReport> {
    let languages: Vec<&str> = config.secondary_languages().collect();

    per_language(
        &languages,
        |lang| import_language(store, config, lang),
        |lang, e| {
            let mut report = ImportReport::new(lang, ImportStatus::Failed);
            report.error = Some(e.to_string());
            report
        },
    )
}

pub fn import_language(
    store: &dyn TranslationStore,
    config: &AppConfig,
    language: &str,
) -> Result<ImportReport> {
    let _span = tracing::info_span!("import", language).entered();

    let path = config.catalog_path(language);
    let Some(modified) = catalog::modified_at(&path)? else {
        tracing::info!(path = %path.display(), "no catalog, nothing to import");
        return Ok(ImportReport::new(language, ImportStatus::Missing));
    };

    if let Some(latest) = store.latest_update_timestamp(language)? {
        if modified <= latest {
            tracing::info!(
                catalog_modified = %modified,
                store_updated = %latest,
                "catalog not newer than store, skipping"
            );
            return Ok(ImportReport::new(language, ImportStatus::Stale));
        }
    }

    let po = catalog::load(&path)?;
    let kinds = store.entity_kinds();
    let mut report = ImportReport::new(language, ImportStatus::Imported);

    for entry in po.entries().iter().filter(|e| e.is_translated()) {
        let comment = entry.comment();
        for tag in attribution::split_comment(&comment) {
            let written = attribution::parse_known(tag, &kinds)
                .map_err(SyncError::from)
                .and_then(|attr| {
                    let key = RecordKey::new(attr.kind, attr.id, attr.field, language);
                    store
                        .upsert_translation_record(&key, &entry.translation)
                        .map_err(SyncError::from)
                });

            match written {
                Ok(_) => report.written += 1,
                Err(e) => {
                    tracing::warn!(tag, error = %e, "skipping attribution");
                    report.failed += 1;
                    report.failures.push(TagFailure {
                        tag: tag.to_string(),
                        source: entry.source.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(written = report.written, failed = report.failed, "catalog imported");
    Ok(report)
}

/// Runs `task` for every language on its own scoped thread and joins them
/// all; a failed or panicked task becomes that language's report via
/// `on_error`.
pub(crate) fn per_language<T, F, E>(languages: &[&str], task: F, on_error: E) -> Vec<T>
where
    T: Send,
    F: Fn(&str) -> Result<T> + Sync,
    E: Fn(&str, SyncError) -> T,
{
    let task = &task;
    let results: Vec<(&str, Result<T>)> = thread::scope(|s| {
        let handles: Vec<_> = languages
            .iter()
            .map(|&lang| (lang, s.spawn(move || task(lang))))
            .collect();

        handles
            .into_iter()
            .map(|(lang, h)| {
                let res = h.join().unwrap_or_else(|_| {
                    Err(SyncError::Catalog(format!("{lang} task panicked")))
                });
                (lang, res)
            })
            .collect()
    });

    results
        .into_iter()
        .map(|(lang, res)| match res {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(language = lang, error = %e, "language task failed");
                on_error(lang, e)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::Catalog;
    use crate::model::entity::{EntityKind, TranslatableEntity};
    use crate::services::store::MemoryStore;
    use chrono::{Duration, Utc};

    fn setup() -> (tempfile::TempDir, AppConfig, MemoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            primary_language: "en".into(),
            languages: vec!["en".into(), "es".into(), "de".into()],
            locale_dir: dir.path().join("locale"),
            ..Default::default()
        };

        let store = MemoryStore::new("en");
        store.add_kind(EntityKind::new("button", &["label", "help"]));
        store.add_kind(EntityKind::new("page", &["title"]));
        store.add_entity(
            TranslatableEntity::new("button", "1")
                .with_value("label", "Save")
                .with_value("help", "Stores the {item}"),
        );
        store.add_entity(TranslatableEntity::new("button", "2").with_value("label", "Save"));
        store.add_entity(
            TranslatableEntity::new("page", "9")
                .with_value("title", "Welcome")
                .with_value("help", "not declared"),
        );
        store.add_entity(TranslatableEntity::new("page", "10").with_value("title", ""));

        (dir, config, store)
    }

    fn write_catalog(config: &AppConfig, language: &str, catalog: &Catalog) {
        catalog::save(&config.catalog_path(language), catalog).unwrap();
    }

    #[test]
    fn shared_source_text_becomes_one_entry() {
        let (_dir, config, store) = setup();

        let reports = export(&store, &config, Some("es")).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].error, None);
        assert_eq!(reports[0].records, 4);

        let po = catalog::load(&config.catalog_path("es")).unwrap();
        assert_eq!(po.len(), 3);

        let save = po.find("Save").unwrap();
        assert_eq!(save.tags, vec!["button__label__1", "button__label__2"]);
        assert!(save.fuzzy);
        assert!(save.translation.is_empty());
        assert!(po.find("not declared").is_none());
    }

    #[test]
    fn primary_language_catalog_carries_source_text() {
        let (_dir, config, store) = setup();
        export(&store, &config, Some("en")).unwrap();

        let po = catalog::load(&config.catalog_path("en")).unwrap();
        let welcome = po.find("Welcome").unwrap();
        assert_eq!(welcome.translation, "Welcome");
        assert!(!welcome.fuzzy);
    }

    #[test]
    fn export_writes_store_text_and_keeps_translator_edits() {
        let (_dir, config, store) = setup();
        store
            .upsert_translation_record(&RecordKey::new("page", "9", "title", "es"), "Bienvenido")
            .unwrap();

        let mut existing = Catalog::new();
        let e = existing.entry_or_insert("Save");
        e.set_translation("Guardar");
        e.add_tag("button__label__1");
        let e = existing.entry_or_insert("Obsolete");
        e.set_translation("Obsoleto");
        write_catalog(&config, "es", &existing);

        export(&store, &config, Some("es")).unwrap();
        let po = catalog::load(&config.catalog_path("es")).unwrap();

        let save = po.find("Save").unwrap();
        assert_eq!(save.translation, "Guardar");
        assert!(!save.fuzzy);
        assert_eq!(save.tags, vec!["button__label__1", "button__label__2"]);

        let welcome = po.find("Welcome").unwrap();
        assert_eq!(welcome.translation, "Bienvenido");
        assert!(!welcome.fuzzy);

        assert_eq!(po.find("Obsolete").unwrap().translation, "Obsoleto");
    }

    #[test]
    fn export_clears_fuzzy_on_kept_translations() {
        let (_dir, config, store) = setup();

        let mut existing = Catalog::new();
        let e = existing.entry_or_insert("Welcome");
        e.set_translation("Bienvenido");
        e.add_tag("page__title__9");
        e.fuzzy = true;
        write_catalog(&config, "es", &existing);
        assert!(catalog::load(&config.catalog_path("es")).unwrap().find("Welcome").unwrap().fuzzy);

        export(&store, &config, Some("es")).unwrap();
        let po = catalog::load(&config.catalog_path("es")).unwrap();

        let welcome = po.find("Welcome").unwrap();
        assert_eq!(welcome.translation, "Bienvenido");
        assert!(!welcome.fuzzy);
        assert!(po.entries().iter().all(|e| e.fuzzy != e.is_translated()));
        assert!(crate::services::qa::run(&po)
            .iter()
            .all(|i| i.code != "FUZZY_WITH_TRANSLATION"));
    }

    #[test]
    fn export_all_languages_in_parallel() {
        let (_dir, config, store) = setup();
        let reports = export(&store, &config, None).unwrap();

        let langs: Vec<&str> = reports.iter().map(|r| r.language.as_str()).collect();
        assert_eq!(langs, vec!["en", "es", "de"]);
        for lang in ["en", "es", "de"] {
            assert!(config.catalog_path(lang).exists());
        }
    }

    #[test]
    fn export_unknown_locale_is_configuration_error() {
        let (_dir, config, store) = setup();
        let err = export(&store, &config, Some("fr")).unwrap_err();
        assert!(err.is_configuration());
        assert!(!config.catalog_path("fr").exists());
    }

    #[test]
    fn round_trip_through_edited_catalog() {
        let (_dir, config, store) = setup();
        export(&store, &config, Some("es")).unwrap();

        let path = config.catalog_path("es");
        let mut po = catalog::load(&path).unwrap();
        po.find_mut("Welcome").unwrap().set_translation("Bienvenido");
        po.find_mut("Stores the {item}")
            .unwrap()
            .set_translation("Guarda el {item}");
        catalog::save(&path, &po).unwrap();

        let reports = import(&store, &config);
        let es = reports.iter().find(|r| r.language == "es").unwrap();
        assert_eq!(es.status, ImportStatus::Imported);
        assert_eq!(es.written, 2);
        assert_eq!(es.failed, 0);

        let de = reports.iter().find(|r| r.language == "de").unwrap();
        assert_eq!(de.status, ImportStatus::Missing);
        assert!(reports.iter().all(|r| r.language != "en"));

        assert_eq!(
            store
                .record(&RecordKey::new("page", "9", "title", "es"))
                .unwrap()
                .text,
            "Bienvenido"
        );
        assert_eq!(
            store
                .record(&RecordKey::new("button", "1", "help", "es"))
                .unwrap()
                .text,
            "Guarda el {item}"
        );

        // the store is now newer than the catalog
        let again = import_language(&store, &config, "es").unwrap();
        assert_eq!(again.status, ImportStatus::Stale);
    }

    #[test]
    fn shared_entry_import_writes_every_attribution() {
        let (_dir, config, store) = setup();
        export(&store, &config, Some("es")).unwrap();

        let path = config.catalog_path("es");
        let mut po = catalog::load(&path).unwrap();
        po.find_mut("Save").unwrap().set_translation("Guardar");
        catalog::save(&path, &po).unwrap();

        let report = import_language(&store, &config, "es").unwrap();
        assert_eq!(report.written, 2);
        for id in ["1", "2"] {
            let rec = store
                .record(&RecordKey::new("button", id, "label", "es"))
                .unwrap();
            assert_eq!(rec.text, "Guardar");
        }
    }

    #[test]
    fn staleness_gate() {
        let (_dir, config, store) = setup();

        let mut po = Catalog::new();
        let e = po.entry_or_insert("Welcome");
        e.set_translation("Bienvenido");
        e.add_tag("page__title__9");
        write_catalog(&config, "es", &po);

        let mut seeded = TranslationRecord::blank(RecordKey::new("button", "1", "label", "es"));
        seeded.text = "Guardar".into();
        seeded.updated_at = Utc::now() + Duration::hours(1);
        store.insert_record(seeded.clone());

        let report = import_language(&store, &config, "es").unwrap();
        assert_eq!(report.status, ImportStatus::Stale);
        assert_eq!(report.written, 0);
        assert_eq!(store.record_count(), 1);

        seeded.updated_at = Utc::now() - Duration::hours(1);
        store.insert_record(seeded);

        let report = import_language(&store, &config, "es").unwrap();
        assert_eq!(report.status, ImportStatus::Imported);
        assert_eq!(report.written, 1);
        assert_eq!(store.record_count(), 2);
    }

    #[test]
    fn malformed_tags_fail_individually() {
        let (_dir, config, store) = setup();

        let mut po = Catalog::new();
        let e = po.entry_or_insert("Welcome");
        e.set_translation("Bienvenido");
        e.add_tag("page__title");
        e.add_tag("widget__title__9");
        e.add_tag("page__title__404");
        e.add_tag("page__title__9");
        let untranslated = po.entry_or_insert("Save");
        untranslated.add_tag("button__label__1");
        write_catalog(&config, "es", &po);

        let report = import_language(&store, &config, "es").unwrap();
        assert_eq!(report.status, ImportStatus::Imported);
        assert_eq!(report.written, 1);
        assert_eq!(report.failed, 3);
        assert_eq!(
            report.failures.iter().map(|f| f.tag.as_str()).collect::<Vec<_>>(),
            vec!["page__title", "widget__title__9", "page__title__404"]
        );
        assert!(store
            .record(&RecordKey::new("button", "1", "label", "es"))
            .is_none());
    }
}
