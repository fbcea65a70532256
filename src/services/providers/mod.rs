//! Machine-translation providers and the name → constructor registry.

pub mod chat;
pub mod deepl;
pub mod http;

use std::collections::BTreeMap;

use crate::error::{ProviderError, SyncError};
use crate::model::config::ProviderSettings;

pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Maximum number of texts accepted by one [`translate_batch`] call.
    ///
    /// [`translate_batch`]: TranslationProvider::translate_batch
    fn batch_size(&self) -> usize {
        1
    }

    fn translate(&self, text: &str, source_lang: &str, target_lang: &str)
        -> Result<String, ProviderError>;

    /// Results must come back in input order, one per input.
    fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        texts
            .iter()
            .map(|t| self.translate(t, source_lang, target_lang))
            .collect()
    }
}

pub type ProviderFactory = Box<
    dyn Fn(&ProviderSettings) -> Result<Box<dyn TranslationProvider>, ProviderError> + Send + Sync,
>;

#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_builtin(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ProviderSettings) -> Result<Box<dyn TranslationProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn create(
        &self,
        name: &str,
        settings: &ProviderSettings,
    ) -> Result<Box<dyn TranslationProvider>, SyncError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SyncError::UnknownProvider(name.to_string()))?;
        Ok(factory(settings)?)
    }
}

pub fn register_builtin(registry: &mut ProviderRegistry) {
    registry.register("openai", |s| Ok(Box::new(chat::ChatProvider::openai(s)?)));
    registry.register("deepseek", |s| Ok(Box::new(chat::ChatProvider::deepseek(s)?)));
    registry.register("deepl", |s| Ok(Box::new(deepl::DeeplProvider::new(s)?)));
}

pub(crate) fn require_api_key(provider: &str, settings: &ProviderSettings) -> Result<String, ProviderError> {
    settings.resolved_api_key().ok_or_else(|| {
        ProviderError::Configuration(format!("{provider}: api_key (or api_key_env) is required"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl TranslationProvider for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, ProviderError> {
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn registry_creates_registered_providers() {
        let mut registry = ProviderRegistry::new();
        registry.register("upper", |_| Ok(Box::new(Upper)));

        let p = registry.create("upper", &ProviderSettings::default()).unwrap();
        assert_eq!(p.batch_size(), 1);
        assert_eq!(
            p.translate_batch(&["a".into(), "b".into()], "en", "es").unwrap(),
            vec!["A", "B"]
        );
    }

    #[test]
    fn unknown_provider_and_missing_key_are_configuration_errors() {
        let registry = ProviderRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["deepl", "deepseek", "openai"]);

        let err = registry.create("bing", &ProviderSettings::default()).err().unwrap();
        assert!(matches!(err, SyncError::UnknownProvider(_)));
        assert!(err.is_configuration());

        let err = registry.create("deepl", &ProviderSettings::default()).err().unwrap();
        assert!(err.is_configuration());
    }
}
