use serde::Serialize;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{StoreError, TagError};
use crate::model::entity::EntityKind;
use crate::services::store::TranslationStore;

pub const DELIMITER: &str = "__";

/// The (entity, field) a catalog line was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Attribution {
    pub kind: String,
    pub field: String,
    pub id: String,
}

impl Attribution {
    pub fn tag(&self) -> String {
        format(&self.kind, &self.field, &self.id)
    }
}

/// `{kind}__{field}__{id}`
pub fn format(kind: &str, field: &str, id: &str) -> String {
    format!("{kind}{DELIMITER}{field}{DELIMITER}{id}")
}

pub fn parse_tag(tag: &str) -> Result<Attribution, TagError> {
    let parts: Vec<&str> = tag.trim().split(DELIMITER).collect();
    let [kind, field, id] = parts.as_slice() else {
        return Err(TagError::WrongPartCount {
            tag: tag.to_string(),
            parts: parts.len(),
        });
    };

    if kind.is_empty() || field.is_empty() || id.is_empty() {
        return Err(TagError::EmptyPart(tag.to_string()));
    }

    Ok(Attribution {
        kind: kind.to_string(),
        field: field.to_string(),
        id: id.to_string(),
    })
}

/// Tags of a newline-joined comment; blank lines are dropped.
pub fn split_comment(comment: &str) -> impl Iterator<Item = &str> {
    comment.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Parses a tag and checks it names a declared field of a known kind.
pub fn parse_known(tag: &str, kinds: &[EntityKind]) -> Result<Attribution, TagError> {
    let attr = parse_tag(tag)?;
    let kind = kinds
        .iter()
        .find(|k| k.name == attr.kind)
        .ok_or_else(|| TagError::UnknownKind(attr.kind.clone()))?;
    if !kind.declares(&attr.field) {
        return Err(TagError::UnknownField {
            kind: attr.kind,
            field: attr.field,
        });
    }
    Ok(attr)
}

/// Reverse lookup from primary-language text to every (entity, field)
/// holding exactly that text. Results are memoised for the resolver's
/// lifetime, which is one synchronization run; each distinct text is scanned
/// at most once even when several threads ask for it together.
pub struct Resolver<'a> {
    store: &'a dyn TranslationStore,
    cache: Mutex<HashMap<String, Slot>>,
}

type Slot = Arc<Mutex<Option<Vec<Attribution>>>>;

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn TranslationStore) -> Self {
        Resolver {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, source: &str) -> Result<Vec<Attribution>, StoreError> {
        let slot = Arc::clone(
            self.cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(source.to_string())
                .or_default(),
        );

        // later callers for the same text block here until the first scan lands
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cached.as_ref() {
            return Ok(hit.clone());
        }

        let found = self.scan(source)?;
        *cached = Some(found.clone());
        Ok(found)
    }

    fn scan(&self, source: &str) -> Result<Vec<Attribution>, StoreError> {
        let kinds = self.store.entity_kinds();
        let mut found = Vec::new();

        for entity in self.store.list_translatable_entities()? {
            let Some(kind) = kinds.iter().find(|k| k.name == entity.kind) else {
                continue;
            };
            for field in &kind.translatable_fields {
                if entity.value(field) == Some(source) {
                    found.push(Attribution {
                        kind: entity.kind.clone(),
                        field: field.clone(),
                        id: entity.id.clone(),
                    });
                }
            }
        }

        Ok(found)
    }
}
