use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

/// A kind of content entity and the fields of it that carry translatable text.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EntityKind {
    pub name: String,

    #[serde(default)]
    pub translatable_fields: Vec<String>,
}

impl EntityKind {
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        EntityKind {
            name: name.into(),
            translatable_fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn declares(&self, field: &str) -> bool {
        self.translatable_fields.iter().any(|f| f == field)
    }

    /// Declared fields of `entity` with a non-empty primary-language value,
    /// in declaration order.
    pub fn translatable_values<'a>(
        &'a self,
        entity: &'a TranslatableEntity,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.translatable_fields.iter().filter_map(move |field| {
            entity
                .value(field)
                .filter(|v| !v.is_empty())
                .map(|v| (field.as_str(), v))
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslatableEntity {
    pub kind: String,
    pub id: String,

    /// Primary-language field values.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl TranslatableEntity {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        TranslatableEntity {
            kind: kind.into(),
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}
