//! Datastore seam. The sync engine and the batch pipeline only see
//! [`TranslationStore`]; every write is an upsert keyed by [`RecordKey`].

pub mod json;
pub mod memory;

pub use json::JsonStore;
pub use memory::{MemoryStore, StoreData};

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::entity::{EntityKind, TranslatableEntity};
use crate::model::record::{RecordKey, TranslationRecord};

pub trait TranslationStore: Send + Sync {
    fn primary_language(&self) -> &str;

    fn entity_kinds(&self) -> Vec<EntityKind>;

    fn list_translatable_entities(&self) -> Result<Vec<TranslatableEntity>, StoreError>;

    fn get_entity(&self, kind: &str, id: &str) -> Result<Option<TranslatableEntity>, StoreError>;

    fn list_translation_records(
        &self,
        entity: &TranslatableEntity,
    ) -> Result<Vec<TranslationRecord>, StoreError>;

    fn upsert_translation_record(
        &self,
        key: &RecordKey,
        text: &str,
    ) -> Result<TranslationRecord, StoreError>;

    fn latest_update_timestamp(&self, language: &str)
        -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Writes a primary-language value onto the entity itself.
    fn set_primary_value(
        &self,
        kind: &str,
        id: &str,
        field: &str,
        text: &str,
    ) -> Result<(), StoreError>;

    fn kind(&self, name: &str) -> Option<EntityKind> {
        self.entity_kinds().into_iter().find(|k| k.name == name)
    }
}
