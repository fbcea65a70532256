use serde::{Deserialize, Serialize};

use crate::model::catalog::Catalog;
use crate::services::placeholder;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QaIssue {
    pub source: String,
    pub code: String,
    pub message: String,
}

fn issue(source: &str, code: &str, message: String) -> QaIssue {
    QaIssue {
        source: source.to_string(),
        code: code.to_string(),
        message,
    }
}

pub fn run(catalog: &Catalog) -> Vec<QaIssue> {
    let mut issues: Vec<QaIssue> = Vec::new();

    for e in catalog.entries() {
        if e.tags.iter().all(|t| t.trim().is_empty()) {
            issues.push(issue(
                &e.source,
                "NO_ATTRIBUTION",
                "Entry has no attribution tag and will not be imported".to_string(),
            ));
        }

        if !e.is_translated() {
            if !e.fuzzy {
                issues.push(issue(
                    &e.source,
                    "UNTRANSLATED_NOT_FUZZY",
                    "Empty translation is not flagged fuzzy".to_string(),
                ));
            }
            continue;
        }

        if e.fuzzy {
            issues.push(issue(
                &e.source,
                "FUZZY_WITH_TRANSLATION",
                "Translated entry is still flagged fuzzy".to_string(),
            ));
        }

        if e.translation.trim() == e.source.trim() {
            issues.push(issue(
                &e.source,
                "SAME_AS_SOURCE",
                "Translation is identical to the source text".to_string(),
            ));
        }

        for p in placeholder::missing_placeholders(&e.source, &e.translation) {
            issues.push(issue(
                &e.source,
                "MISSING_PLACEHOLDER",
                format!("Placeholder {p} is missing from the translation"),
            ));
        }

        for p in placeholder::extra_placeholders(&e.source, &e.translation) {
            issues.push(issue(
                &e.source,
                "EXTRA_PLACEHOLDER",
                format!("Placeholder {p} does not appear in the source"),
            ));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::CatalogEntry;

    fn entry(source: &str, translation: &str, fuzzy: bool) -> CatalogEntry {
        CatalogEntry {
            source: source.into(),
            translation: translation.into(),
            tags: vec!["page__title__1".into()],
            fuzzy,
        }
    }

    fn codes(issues: &[QaIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn clean_catalog_has_no_issues() {
        let catalog = Catalog::from_entries(
            Vec::new(),
            vec![
                entry("Hello {name}", "Hola {name}", false),
                entry("Bye", "", true),
            ],
        );
        assert!(run(&catalog).is_empty());
    }

    #[test]
    fn reports_each_problem() {
        let mut untagged = entry("Orphan", "Huérfano", false);
        untagged.tags.clear();

        let catalog = Catalog::from_entries(
            Vec::new(),
            vec![
                entry("Hi {name}", "Hola", true),
                entry("OK", "OK", false),
                entry("Total", "Total {x}", false),
                entry("Later", "", false),
                untagged,
            ],
        );

        let issues = run(&catalog);
        assert_eq!(
            codes(&issues),
            vec![
                "FUZZY_WITH_TRANSLATION",
                "MISSING_PLACEHOLDER",
                "SAME_AS_SOURCE",
                "EXTRA_PLACEHOLDER",
                "UNTRANSLATED_NOT_FUZZY",
                "NO_ATTRIBUTION",
            ]
        );
        assert_eq!(issues[1].message, "Placeholder {name} is missing from the translation");
    }
}
