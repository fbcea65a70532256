use serde::{Deserialize, Serialize};

use std::collections::HashMap;

pub const CONTENT_TYPE: &str = "text/plain; charset=UTF-8";
pub const TRANSFER_ENCODING: &str = "8bit";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CatalogEntry {
    pub source: String,

    #[serde(default)]
    pub translation: String,

    /// Translator comment lines; on managed catalogs each line is an
    /// attribution tag.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub fuzzy: bool,
}

impl CatalogEntry {
    pub fn new(source: impl Into<String>) -> Self {
        CatalogEntry {
            source: source.into(),
            fuzzy: true,
            ..Default::default()
        }
    }

    /// Returns false when the tag was already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn set_translation(&mut self, text: impl Into<String>) {
        self.translation = text.into();
        self.fuzzy = self.translation.is_empty();
    }

    pub fn comment(&self) -> String {
        self.tags.join("\n")
    }

    pub fn is_translated(&self) -> bool {
        !self.translation.is_empty()
    }
}

/// Entries of one per-language catalog, keyed by source text.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub metadata: Vec<(String, String)>,
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            metadata: default_metadata(),
            ..Default::default()
        }
    }

    /// Builds a catalog, folding entries that repeat a source text into the
    /// first one (tags unioned, first translation kept).
    pub fn from_entries(metadata: Vec<(String, String)>, entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Catalog {
            metadata,
            ..Default::default()
        };
        for e in entries {
            catalog.merge(e);
        }
        catalog
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, source: &str) -> Option<&CatalogEntry> {
        self.index.get(source).map(|&i| &self.entries[i])
    }

    pub fn find_mut(&mut self, source: &str) -> Option<&mut CatalogEntry> {
        match self.index.get(source) {
            Some(&i) => Some(&mut self.entries[i]),
            None => None,
        }
    }

    pub fn entry_or_insert(&mut self, source: &str) -> &mut CatalogEntry {
        let i = match self.index.get(source) {
            Some(&i) => i,
            None => {
                self.entries.push(CatalogEntry::new(source));
                let i = self.entries.len() - 1;
                self.index.insert(source.to_string(), i);
                i
            }
        };
        &mut self.entries[i]
    }

    /// Attribution-only merge: tags are unioned, an existing entry keeps its
    /// translation and fuzzy flag.
    pub fn merge(&mut self, entry: CatalogEntry) {
        match self.find_mut(&entry.source) {
            Some(existing) => {
                for tag in &entry.tags {
                    existing.add_tag(tag);
                }
            }
            None => {
                self.index.insert(entry.source.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn remove(&mut self, source: &str) -> Option<CatalogEntry> {
        let i = self.index.remove(source)?;
        let removed = self.entries.remove(i);
        for idx in self.index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(removed)
    }

    pub fn reset_metadata(&mut self) {
        self.metadata = default_metadata();
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_metadata(&mut self, key: &str, value: &str) {
        match self.metadata.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.metadata.push((key.to_string(), value.to_string())),
        }
    }
}

pub fn default_metadata() -> Vec<(String, String)> {
    vec![
        ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
        (
            "Content-Transfer-Encoding".to_string(),
            TRANSFER_ENCODING.to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_follows_translation() {
        let mut e = CatalogEntry::new("Save");
        assert!(e.fuzzy);
        e.set_translation("Guardar");
        assert!(!e.fuzzy);
        e.set_translation("");
        assert!(e.fuzzy);
    }

    #[test]
    fn merge_unions_tags_without_touching_translation() {
        let mut catalog = Catalog::new();
        let mut first = CatalogEntry::new("Save");
        first.set_translation("Guardar");
        first.add_tag("button__label__1");
        catalog.merge(first);

        let mut second = CatalogEntry::new("Save");
        second.add_tag("button__label__1");
        second.add_tag("button__label__2");
        catalog.merge(second);

        assert_eq!(catalog.len(), 1);
        let e = catalog.find("Save").unwrap();
        assert_eq!(e.translation, "Guardar");
        assert!(!e.fuzzy);
        assert_eq!(e.tags, vec!["button__label__1", "button__label__2"]);
    }

    #[test]
    fn remove_keeps_index_consistent() {
        let mut catalog = Catalog::new();
        catalog.entry_or_insert("a");
        catalog.entry_or_insert("b");
        catalog.entry_or_insert("c");

        assert!(catalog.remove("a").is_some());
        assert_eq!(catalog.find("c").unwrap().source, "c");
        assert_eq!(catalog.entry_or_insert("b").source, "b");
        assert_eq!(catalog.len(), 2);
    }
}
