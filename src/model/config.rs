use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

fn default_primary_language() -> String {
    "en".to_string()
}

fn default_languages() -> Vec<String> {
    vec![default_primary_language()]
}

fn default_locale_dir() -> PathBuf {
    PathBuf::from("drt_locale")
}

fn default_catalog_domain() -> String {
    "messages".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("drt_store.json")
}

fn default_workers() -> usize {
    4
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_primary_language", alias = "language_code")]
    pub primary_language: String,

    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    #[serde(default = "default_locale_dir")]
    pub locale_dir: PathBuf,

    #[serde(default = "default_catalog_domain")]
    pub catalog_domain: String,

    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: String,

    /// Environment variable read when `api_key` is empty.
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub batch_size: Option<usize>,
}

impl ProviderSettings {
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            primary_language: default_primary_language(),
            languages: default_languages(),
            locale_dir: default_locale_dir(),
            catalog_domain: default_catalog_domain(),
            store_path: default_store_path(),
            workers: default_workers(),
            providers: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("failed to read {}: {e}", path.display())))?;
        let cfg: AppConfig = serde_json::from_str(&data)
            .map_err(|e| SyncError::Config(format!("invalid {}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SyncError::Config("workers must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for lang in &self.languages {
            if !seen.insert(lang.as_str()) {
                return Err(SyncError::Config(format!("duplicate language `{lang}`")));
            }
        }

        if !self.is_configured(&self.primary_language) {
            return Err(SyncError::Config(format!(
                "primary language `{}` is not listed in languages",
                self.primary_language
            )));
        }

        Ok(())
    }

    pub fn is_configured(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }

    pub fn require_language(&self, language: &str) -> Result<()> {
        if self.is_configured(language) {
            Ok(())
        } else {
            Err(SyncError::UnknownLanguage(language.to_string()))
        }
    }

    pub fn secondary_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .map(String::as_str)
            .filter(move |l| *l != self.primary_language)
    }

    /// `<locale_dir>/<lang>/LC_MESSAGES/<domain>.po`
    pub fn catalog_path(&self, language: &str) -> PathBuf {
        catalog_path_in(&self.locale_dir, language, &self.catalog_domain)
    }
}

pub fn catalog_path_in(dir: &Path, language: &str, domain: &str) -> PathBuf {
    dir.join(language)
        .join("LC_MESSAGES")
        .join(format!("{domain}.po"))
}
