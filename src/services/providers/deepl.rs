use reqwest::blocking::Client;
use serde_json::{json, Value};

use super::{http, require_api_key, TranslationProvider};
use crate::error::ProviderError;
use crate::model::config::ProviderSettings;

const FREE_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";
const PRO_ENDPOINT: &str = "https://api.deepl.com/v2/translate";
const DEFAULT_BATCH_SIZE: usize = 50;

pub struct DeeplProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    batch_size: usize,
}

impl DeeplProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = require_api_key("deepl", settings)?;

        // free-plan keys carry a ":fx" suffix
        let endpoint = settings.endpoint.clone().unwrap_or_else(|| {
            if api_key.ends_with(":fx") {
                FREE_ENDPOINT.to_string()
            } else {
                PRO_ENDPOINT.to_string()
            }
        });

        Ok(DeeplProvider {
            client: http::client()?,
            endpoint,
            api_key,
            batch_size: settings.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
        })
    }
}

impl TranslationProvider for DeeplProvider {
    fn name(&self) -> &str {
        "deepl"
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ProviderError> {
        let mut out = self.translate_batch(&[text.to_string()], source_lang, target_lang)?;
        out.pop()
            .ok_or_else(|| ProviderError::InvalidResponse("empty translations".into()))
    }

    fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let body = json!({
            "text": texts,
            "source_lang": source_code(source_lang),
            "target_lang": target_code(target_lang),
        });

        let resp = http::send_json(|| {
            self.client
                .post(&self.endpoint)
                .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
                .json(&body)
        })?;

        extract_translations(&resp)
    }
}

/// Source languages are accepted without region.
fn source_code(lang: &str) -> String {
    lang.split(['-', '_'])
        .next()
        .unwrap_or(lang)
        .to_uppercase()
}

fn target_code(lang: &str) -> String {
    lang.replace('_', "-").to_uppercase()
}

fn extract_translations(resp: &Value) -> Result<Vec<String>, ProviderError> {
    let items = resp
        .get("translations")
        .and_then(|t| t.as_array())
        .ok_or_else(|| ProviderError::InvalidResponse("missing translations".into()))?;

    items
        .iter()
        .map(|item| {
            item.get("text")
                .and_then(|t| t.as_str())
                .map(str::to_string)
                .ok_or_else(|| ProviderError::InvalidResponse("translation without text".into()))
        })
        .collect()
}
