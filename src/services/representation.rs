//! Read and write shapes of an entity's translatable fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::collections::BTreeMap;

use crate::error::{Result, StoreError, SyncError};
use crate::model::catalog::Catalog;
use crate::model::config::AppConfig;
use crate::model::entity::TranslatableEntity;
use crate::model::record::{RecordKey, TranslationRecord};
use crate::services::catalog;
use crate::services::store::TranslationStore;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// One value per field: the stored translation for the language, falling
    /// back to the primary value.
    DatabaseBacked,
    /// `{language: text}` per field, primary language included.
    DictionaryBacked,
    /// One value per field, looked up in the language's catalog by source text.
    CatalogBacked,
}

impl Representation {
    pub fn render(
        &self,
        store: &dyn TranslationStore,
        config: &AppConfig,
        entity: &TranslatableEntity,
        language: &str,
    ) -> Result<Map<String, Value>> {
        let kind = store.kind(&entity.kind).ok_or_else(|| {
            SyncError::Store(StoreError::UnknownEntity {
                kind: entity.kind.clone(),
                id: entity.id.clone(),
            })
        })?;

        let records = store.list_translation_records(entity)?;
        let po = match self {
            Representation::CatalogBacked if language != config.primary_language => {
                Some(catalog::load(&config.catalog_path(language))?)
            }
            _ => None,
        };

        let mut out = Map::new();
        for field in &kind.translatable_fields {
            let primary = entity.value(field);
            let value = match self {
                Representation::DatabaseBacked => {
                    text_value(database_value(&records, field, language, config, primary))
                }
                Representation::DictionaryBacked => {
                    Value::Object(dictionary_value(&records, field, config, primary))
                }
                Representation::CatalogBacked => {
                    text_value(catalog_value(po.as_ref(), primary))
                }
            };
            out.insert(field.clone(), value);
        }

        Ok(out)
    }
}

fn text_value(text: Option<&str>) -> Value {
    text.map(|t| Value::String(t.to_string()))
        .unwrap_or(Value::Null)
}

fn database_value<'a>(
    records: &'a [TranslationRecord],
    field: &str,
    language: &str,
    config: &AppConfig,
    primary: Option<&'a str>,
) -> Option<&'a str> {
    if language == config.primary_language {
        return primary;
    }
    records
        .iter()
        .find(|r| r.key.field == field && r.key.language == language && !r.text.is_empty())
        .map(|r| r.text.as_str())
        .or(primary)
}

fn dictionary_value(
    records: &[TranslationRecord],
    field: &str,
    config: &AppConfig,
    primary: Option<&str>,
) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(config.primary_language.clone(), text_value(primary));
    for r in records.iter().filter(|r| r.key.field == field) {
        map.insert(r.key.language.clone(), Value::String(r.text.clone()));
    }
    map
}

fn catalog_value<'a>(po: Option<&'a Catalog>, primary: Option<&'a str>) -> Option<&'a str> {
    let source = primary?;
    po.and_then(|c| c.find(source))
        .filter(|e| e.is_translated())
        .map(|e| e.translation.as_str())
        .or(Some(source))
}

/// Applies a `{language: text}` write to one field. The primary language is
/// written onto the entity; every other language becomes a record. All
/// languages are checked before anything is written.
pub fn write_dictionary(
    store: &dyn TranslationStore,
    config: &AppConfig,
    kind: &str,
    id: &str,
    field: &str,
    values: &BTreeMap<String, String>,
) -> Result<usize> {
    for lang in values.keys() {
        config.require_language(lang)?;
    }

    let mut written = 0usize;
    for (lang, text) in values {
        if *lang == config.primary_language {
            store.set_primary_value(kind, id, field, text)?;
        } else {
            store.upsert_translation_record(&RecordKey::new(kind, id, field, lang), text)?;
        }
        written += 1;
    }
    Ok(written)
}
