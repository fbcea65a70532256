//! Adopts an existing, unmanaged gettext catalog: entries whose msgid is the
//! primary-language value of some entity field are copied into the managed
//! catalog with attribution tags.

use serde::Serialize;

use std::path::Path;

use crate::error::Result;
use crate::model::catalog::CONTENT_TYPE;
use crate::model::config::{catalog_path_in, AppConfig};
use crate::services::attribution::Resolver;
use crate::services::store::TranslationStore;
use crate::services::{catalog, sync};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConvertStatus {
    Converted,
    Missing,
    Failed,
}

#[derive(Debug, Serialize, Clone)]
pub struct ConvertReport {
    pub language: String,
    pub status: ConvertStatus,
    pub matched: usize,
    pub unmatched: usize,
    pub removed: usize,
    pub error: Option<String>,
}

impl ConvertReport {
    fn new(language: &str, status: ConvertStatus) -> Self {
        ConvertReport {
            language: language.to_string(),
            status,
            matched: 0,
            unmatched: 0,
            removed: 0,
            error: None,
        }
    }
}

pub fn convert(
    store: &dyn TranslationStore,
    config: &AppConfig,
    source_dir: &Path,
    remove_used: bool,
) -> Vec<ConvertReport> {
    let languages: Vec<&str> = config.languages.iter().map(String::as_str).collect();
    let resolver = Resolver::new(store);

    sync::per_language(
        &languages,
        |lang| convert_language(&resolver, config, source_dir, lang, remove_used),
        |lang, e| {
            let mut report = ConvertReport::new(lang, ConvertStatus::Failed);
            report.error = Some(e.to_string());
            report
        },
    )
}

fn convert_language(
    resolver: &Resolver<'_>,
    config: &AppConfig,
    source_dir: &Path,
    language: &str,
    remove_used: bool,
) -> Result<ConvertReport> {
    let _span = tracing::info_span!("convert", language).entered();

    let source_path = catalog_path_in(source_dir, language, &config.catalog_domain);
    if !source_path.exists() {
        tracing::warn!(path = %source_path.display(), "no catalog to convert");
        return Ok(ConvertReport::new(language, ConvertStatus::Missing));
    }

    let mut source = catalog::load(&source_path)?;
    let target_path = config.catalog_path(language);
    let mut target = catalog::load(&target_path)?;
    let mut report = ConvertReport::new(language, ConvertStatus::Converted);
    let mut used: Vec<String> = Vec::new();

    for entry in source.entries() {
        let found = resolver.resolve(&entry.source)?;
        if found.is_empty() {
            report.unmatched += 1;
            continue;
        }

        let managed = target.entry_or_insert(&entry.source);
        for attr in &found {
            managed.add_tag(&attr.tag());
        }
        if !managed.is_translated() {
            managed.set_translation(entry.translation.clone());
        }

        report.matched += 1;
        used.push(entry.source.clone());
    }

    target.reset_metadata();
    catalog::save(&target_path, &target)?;

    if remove_used && !used.is_empty() {
        for s in &used {
            if source.remove(s).is_some() {
                report.removed += 1;
            }
        }
        // rewritten as UTF-8 whatever it was read as
        source.set_metadata("Content-Type", CONTENT_TYPE);
        catalog::save(&source_path, &source)?;
    }

    tracing::info!(
        matched = report.matched,
        unmatched = report.unmatched,
        removed = report.removed,
        "catalog converted"
    );
    Ok(report)
}
