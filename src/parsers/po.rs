//! Conversion between `polib` catalogs and the keyed [`Catalog`] the sync
//! engine works on. Message comments carry the attribution tags, one per
//! line; the `fuzzy` flag maps to [`CatalogEntry::fuzzy`]. Contexts are
//! ignored and plural messages contribute their first form.

use polib::catalog::Catalog as PoCatalog;
use polib::message::{Message, MessageFlags, MessageView};
use polib::metadata::CatalogMetadata;

use crate::model::catalog::{Catalog, CatalogEntry};

const FUZZY: &str = "fuzzy";

pub fn from_polib(po: &PoCatalog) -> Catalog {
    let entries = po
        .messages()
        .filter(|m| !m.msgid().is_empty())
        .map(|m| CatalogEntry {
            source: m.msgid().to_string(),
            translation: translation_of(m),
            tags: m
                .comments()
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            fuzzy: m.is_fuzzy(),
        })
        .collect();

    Catalog::from_entries(metadata_pairs(&po.metadata), entries)
}

pub fn to_polib(catalog: &Catalog) -> PoCatalog {
    let mut po = PoCatalog::new(header(&catalog.metadata));

    for e in catalog.entries() {
        let mut flags = MessageFlags::new();
        if e.fuzzy {
            flags.add_flag(FUZZY);
        }
        let message = Message::build_singular()
            .with_comments(e.comment())
            .with_msgid(e.source.clone())
            .with_msgstr(e.translation.clone())
            .with_flags(flags)
            .done();
        po.append_or_update(message);
    }

    po
}

fn translation_of(m: &dyn MessageView) -> String {
    if m.is_plural() {
        m.msgstr_plural()
            .ok()
            .and_then(|forms| forms.first().cloned())
            .unwrap_or_default()
    } else {
        m.msgstr().unwrap_or_default().to_string()
    }
}

fn metadata_pairs(m: &CatalogMetadata) -> Vec<(String, String)> {
    [
        ("Project-Id-Version", &m.project_id_version),
        ("POT-Creation-Date", &m.pot_creation_date),
        ("PO-Revision-Date", &m.po_revision_date),
        ("Last-Translator", &m.last_translator),
        ("Language-Team", &m.language_team),
        ("Language", &m.language),
        ("MIME-Version", &m.mime_version),
        ("Content-Type", &m.content_type),
        ("Content-Transfer-Encoding", &m.content_transfer_encoding),
    ]
    .into_iter()
    .filter(|(_, v)| !v.is_empty())
    .map(|(k, v)| (k.to_string(), v.clone()))
    .collect()
}

/// Header keys outside the standard gettext set are not kept.
fn header(pairs: &[(String, String)]) -> CatalogMetadata {
    let mut m = CatalogMetadata::new();
    for (key, value) in pairs {
        let slot = match key.as_str() {
            "Project-Id-Version" => &mut m.project_id_version,
            "POT-Creation-Date" => &mut m.pot_creation_date,
            "PO-Revision-Date" => &mut m.po_revision_date,
            "Last-Translator" => &mut m.last_translator,
            "Language-Team" => &mut m.language_team,
            "Language" => &mut m.language,
            "MIME-Version" => &mut m.mime_version,
            "Content-Type" => &mut m.content_type,
            "Content-Transfer-Encoding" => &mut m.content_transfer_encoding,
            _ => continue,
        };
        *slot = value.clone();
    }
    m
}
