//! Machine translation of pending records through a [`TranslationProvider`].
//!
//! Pending records are grouped by the provider's batch size and the groups
//! run on a bounded rayon pool. A failing group never affects its siblings;
//! every item ends up `Done` or `Failed` in the returned report.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ProviderError, Result, SyncError};
use crate::model::config::AppConfig;
use crate::model::record::{RecordKey, RecordState};
use crate::services::placeholder;
use crate::services::providers::{ProviderRegistry, TranslationProvider};
use crate::services::store::TranslationStore;

#[derive(Debug, Deserialize, Clone)]
pub struct TranslateRequest {
    /// Language the records are stored under.
    pub language: String,

    /// Code sent to the provider when it differs from `language`.
    #[serde(default)]
    pub target_language: Option<String>,

    pub provider: String,

    /// Re-translate records that already have text.
    #[serde(default)]
    pub all: bool,

    #[serde(default)]
    pub workers: Option<usize>,

    #[serde(default)]
    pub without_batch: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source_language: String,
    pub language: String,
    pub target_language: String,
    pub force: bool,
    pub workers: usize,
    pub without_batch: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct ItemResult {
    pub kind: String,
    pub id: String,
    pub field: String,
    pub state: RecordState,
    pub error: Option<String>,
}

impl ItemResult {
    fn pending(key: &RecordKey) -> Self {
        ItemResult {
            kind: key.kind.clone(),
            id: key.id.clone(),
            field: key.field.clone(),
            state: RecordState::Pending,
            error: None,
        }
    }

    fn start(mut self) -> Self {
        self.state = RecordState::InFlight;
        self
    }

    fn done(mut self) -> Self {
        self.state = RecordState::Done;
        self
    }

    fn failed(mut self, error: impl ToString) -> Self {
        self.state = RecordState::Failed;
        self.error = Some(error.to_string());
        self
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct PipelineReport {
    pub language: String,
    pub target_language: String,
    pub provider: String,
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub provider_calls: usize,
    pub items: Vec<ItemResult>,
}

#[derive(Debug, Clone)]
struct PendingItem {
    key: RecordKey,
    source: String,
}

/// Validates the request, builds the provider and runs the pipeline.
/// Configuration problems are returned before any record is touched.
pub fn run(
    store: &dyn TranslationStore,
    config: &AppConfig,
    registry: &ProviderRegistry,
    req: &TranslateRequest,
) -> Result<PipelineReport> {
    config.require_language(&req.language)?;
    if req.language == config.primary_language {
        return Err(SyncError::SameLanguage(req.language.clone()));
    }

    let workers = req.workers.unwrap_or(config.workers);
    if workers == 0 {
        return Err(SyncError::Config("workers must be at least 1".into()));
    }

    let settings = config
        .providers
        .get(&req.provider)
        .cloned()
        .unwrap_or_default();
    let provider = registry.create(&req.provider, &settings)?;

    let opts = PipelineOptions {
        source_language: config.primary_language.clone(),
        language: req.language.clone(),
        target_language: req
            .target_language
            .clone()
            .unwrap_or_else(|| req.language.clone()),
        force: req.all,
        workers,
        without_batch: req.without_batch,
    };

    run_with_provider(store, provider.as_ref(), &opts)
}

pub fn run_with_provider(
    store: &dyn TranslationStore,
    provider: &dyn TranslationProvider,
    opts: &PipelineOptions,
) -> Result<PipelineReport> {
    let _span = tracing::info_span!(
        "translate",
        language = %opts.language,
        provider = provider.name()
    )
    .entered();

    let pending = collect_pending(store, &opts.language, opts.force)?;
    let batch_size = if opts.without_batch {
        1
    } else {
        provider.batch_size().max(1)
    };

    tracing::info!(
        pending = pending.len(),
        batch_size,
        workers = opts.workers,
        "starting translation run"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.workers)
        .thread_name(|i| format!("drt-translate-{i}"))
        .build()
        .map_err(|e| SyncError::Config(format!("worker pool: {e}")))?;

    let calls = AtomicUsize::new(0);
    let groups: Vec<&[PendingItem]> = pending.chunks(batch_size).collect();

    let items: Vec<ItemResult> = pool.install(|| {
        groups
            .par_iter()
            .map(|group| {
                panic::catch_unwind(AssertUnwindSafe(|| {
                    run_group(store, provider, opts, group, &calls)
                }))
                .unwrap_or_else(|_| {
                    tracing::error!(items = group.len(), "translation task panicked");
                    group
                        .iter()
                        .map(|item| ItemResult::pending(&item.key).failed("translation task panicked"))
                        .collect()
                })
            })
            .collect::<Vec<Vec<ItemResult>>>()
            .into_iter()
            .flatten()
            .collect()
    });

    let succeeded = items
        .iter()
        .filter(|i| i.state == RecordState::Done)
        .count();

    let report = PipelineReport {
        language: opts.language.clone(),
        target_language: opts.target_language.clone(),
        provider: provider.name().to_string(),
        submitted: pending.len(),
        succeeded,
        failed: items.len() - succeeded,
        provider_calls: calls.load(Ordering::Relaxed),
        items,
    };

    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        provider_calls = report.provider_calls,
        "translation run finished"
    );
    Ok(report)
}

/// Reads every entity and field once. A record is pending when it is missing
/// or empty, or always when `force` is set.
fn collect_pending(
    store: &dyn TranslationStore,
    language: &str,
    force: bool,
) -> Result<Vec<PendingItem>> {
    let kinds = store.entity_kinds();
    let mut pending = Vec::new();

    for entity in store.list_translatable_entities()? {
        let Some(kind) = kinds.iter().find(|k| k.name == entity.kind) else {
            continue;
        };
        let records = store.list_translation_records(&entity)?;

        for (field, value) in kind.translatable_values(&entity) {
            let has_text = records.iter().any(|r| {
                r.key.field == field && r.key.language == language && !r.text.is_empty()
            });
            if has_text && !force {
                continue;
            }
            pending.push(PendingItem {
                key: RecordKey::new(&entity.kind, &entity.id, field, language),
                source: value.to_string(),
            });
        }
    }

    Ok(pending)
}

fn run_group(
    store: &dyn TranslationStore,
    provider: &dyn TranslationProvider,
    opts: &PipelineOptions,
    group: &[PendingItem],
    calls: &AtomicUsize,
) -> Vec<ItemResult> {
    let (texts, maps): (Vec<String>, Vec<placeholder::TokenMap>) = group
        .iter()
        .map(|item| placeholder::tokenize(&item.source))
        .unzip();
    let started: Vec<ItemResult> = group
        .iter()
        .map(|item| ItemResult::pending(&item.key).start())
        .collect();

    calls.fetch_add(1, Ordering::Relaxed);
    let translated = match texts.as_slice() {
        [single] => provider
            .translate(single, &opts.source_language, &opts.target_language)
            .map(|t| vec![t]),
        _ => provider
            .translate_batch(&texts, &opts.source_language, &opts.target_language)
            .and_then(|out| {
                if out.len() == texts.len() {
                    Ok(out)
                } else {
                    Err(ProviderError::CountMismatch {
                        sent: texts.len(),
                        received: out.len(),
                    })
                }
            }),
    };

    match translated {
        Ok(results) => group
            .iter()
            .zip(maps.iter())
            .zip(results)
            .zip(started)
            .map(|(((item, map), text), result)| finish_item(store, opts, item, map, &text, result))
            .collect(),
        Err(e) => group
            .iter()
            .zip(started)
            .map(|(item, result)| {
                tracing::warn!(
                    kind = %item.key.kind,
                    field = %item.key.field,
                    id = %item.key.id,
                    target = %opts.target_language,
                    error = %e,
                    "provider call failed"
                );
                result.failed(&e)
            })
            .collect(),
    }
}

fn finish_item(
    store: &dyn TranslationStore,
    opts: &PipelineOptions,
    item: &PendingItem,
    map: &placeholder::TokenMap,
    translated: &str,
    result: ItemResult,
) -> ItemResult {
    let text = placeholder::unescape_html(&placeholder::detokenize(translated, map));

    if text.trim().is_empty() {
        tracing::warn!(
            kind = %item.key.kind,
            field = %item.key.field,
            id = %item.key.id,
            target = %opts.target_language,
            "provider returned an empty translation"
        );
        return result.failed(ProviderError::InvalidResponse("empty translation".into()));
    }

    let missing = placeholder::missing_placeholders(&item.source, &text);
    if !missing.is_empty() {
        tracing::warn!(
            kind = %item.key.kind,
            field = %item.key.field,
            id = %item.key.id,
            missing = ?missing,
            "translation lost placeholders"
        );
    }

    match store.upsert_translation_record(&item.key, &text) {
        Ok(_) => result.done(),
        Err(e) => {
            tracing::warn!(
                kind = %item.key.kind,
                field = %item.key.field,
                id = %item.key.id,
                error = %e,
                "could not store translation"
            );
            result.failed(e)
        }
    }
}
