use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::TranslationStore;
use crate::error::StoreError;
use crate::model::entity::{EntityKind, TranslatableEntity};
use crate::model::record::{RecordKey, TranslationRecord};

/// Serialized shape of a store.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StoreData {
    #[serde(default)]
    pub kinds: Vec<EntityKind>,

    #[serde(default)]
    pub entities: Vec<TranslatableEntity>,

    #[serde(default)]
    pub records: Vec<TranslationRecord>,
}

#[derive(Default)]
struct Tables {
    kinds: BTreeMap<String, EntityKind>,
    entities: BTreeMap<(String, String), TranslatableEntity>,
    records: BTreeMap<RecordKey, TranslationRecord>,
}

pub struct MemoryStore {
    primary_language: String,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(primary_language: impl Into<String>) -> Self {
        MemoryStore {
            primary_language: primary_language.into(),
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Later duplicates of a record key replace earlier ones.
    pub fn from_data(primary_language: impl Into<String>, data: StoreData) -> Self {
        let store = MemoryStore::new(primary_language);
        {
            let mut t = store.write();
            for k in data.kinds {
                t.kinds.insert(k.name.clone(), k);
            }
            for e in data.entities {
                t.entities.insert((e.kind.clone(), e.id.clone()), e);
            }
            for r in data.records {
                t.records.insert(r.key.clone(), r);
            }
        }
        store
    }

    pub fn snapshot(&self) -> StoreData {
        let t = self.read();
        StoreData {
            kinds: t.kinds.values().cloned().collect(),
            entities: t.entities.values().cloned().collect(),
            records: t.records.values().cloned().collect(),
        }
    }

    pub fn add_kind(&self, kind: EntityKind) {
        self.write().kinds.insert(kind.name.clone(), kind);
    }

    pub fn add_entity(&self, entity: TranslatableEntity) {
        self.write()
            .entities
            .insert((entity.kind.clone(), entity.id.clone()), entity);
    }

    /// Stores a record as given, timestamp included.
    pub fn insert_record(&self, record: TranslationRecord) {
        self.write().records.insert(record.key.clone(), record);
    }

    pub fn record(&self, key: &RecordKey) -> Option<TranslationRecord> {
        self.read().records.get(key).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.read().records.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_target(t: &Tables, kind: &str, id: &str, field: &str) -> Result<(), StoreError> {
    if !t.entities.contains_key(&(kind.to_string(), id.to_string())) {
        return Err(StoreError::UnknownEntity {
            kind: kind.to_string(),
            id: id.to_string(),
        });
    }
    let declared = t.kinds.get(kind).map(|k| k.declares(field)).unwrap_or(false);
    if !declared {
        return Err(StoreError::UnknownField {
            kind: kind.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

impl TranslationStore for MemoryStore {
    fn primary_language(&self) -> &str {
        &self.primary_language
    }

    fn entity_kinds(&self) -> Vec<EntityKind> {
        self.read().kinds.values().cloned().collect()
    }

    fn list_translatable_entities(&self) -> Result<Vec<TranslatableEntity>, StoreError> {
        let t = self.read();
        Ok(t.entities
            .values()
            .filter(|e| t.kinds.contains_key(&e.kind))
            .cloned()
            .collect())
    }

    fn get_entity(&self, kind: &str, id: &str) -> Result<Option<TranslatableEntity>, StoreError> {
        Ok(self
            .read()
            .entities
            .get(&(kind.to_string(), id.to_string()))
            .cloned())
    }

    fn list_translation_records(
        &self,
        entity: &TranslatableEntity,
    ) -> Result<Vec<TranslationRecord>, StoreError> {
        Ok(self
            .read()
            .records
            .values()
            .filter(|r| r.key.kind == entity.kind && r.key.id == entity.id)
            .cloned()
            .collect())
    }

    fn upsert_translation_record(
        &self,
        key: &RecordKey,
        text: &str,
    ) -> Result<TranslationRecord, StoreError> {
        if key.language == self.primary_language {
            return Err(StoreError::PrimaryLanguage(key.language.clone()));
        }

        let mut t = self.write();
        check_target(&t, &key.kind, &key.id, &key.field)?;

        let record = t
            .records
            .entry(key.clone())
            .or_insert_with(|| TranslationRecord::blank(key.clone()));
        record.text = text.to_string();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn latest_update_timestamp(
        &self,
        language: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .read()
            .records
            .values()
            .filter(|r| r.key.language == language)
            .map(|r| r.updated_at)
            .max())
    }

    fn set_primary_value(
        &self,
        kind: &str,
        id: &str,
        field: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        let mut t = self.write();
        check_target(&t, kind, id, field)?;
        if let Some(e) = t.entities.get_mut(&(kind.to_string(), id.to_string())) {
            e.values.insert(field.to_string(), text.to_string());
        }
        Ok(())
    }
}
