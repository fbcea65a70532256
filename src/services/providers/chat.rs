use reqwest::blocking::Client;
use serde_json::{json, Value};

use super::{http, require_api_key, TranslationProvider};
use crate::error::ProviderError;
use crate::model::config::ProviderSettings;

const SYSTEM_PROMPT: &str = "You are a professional software localization translator.";

/// Chat-completions endpoint, one text per request.
pub struct ChatProvider {
    name: String,
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatProvider {
    pub fn openai(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Self::new(
            "openai",
            "https://api.openai.com/v1/chat/completions",
            "gpt-4o-mini",
            settings,
        )
    }

    pub fn deepseek(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Self::new(
            "deepseek",
            "https://api.deepseek.com/v1/chat/completions",
            "deepseek-chat",
            settings,
        )
    }

    fn new(
        name: &str,
        default_endpoint: &str,
        default_model: &str,
        settings: &ProviderSettings,
    ) -> Result<Self, ProviderError> {
        let api_key = require_api_key(name, settings)?;
        let model = if settings.model.trim().is_empty() {
            default_model.to_string()
        } else {
            settings.model.trim().to_string()
        };

        Ok(ChatProvider {
            name: name.to_string(),
            client: http::client()?,
            endpoint: settings
                .endpoint
                .clone()
                .unwrap_or_else(|| default_endpoint.to_string()),
            api_key,
            model,
        })
    }
}

impl TranslationProvider for ChatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(text, source_lang, target_lang) }
            ],
            "temperature": 0.3
        });

        let resp = http::send_json(|| {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
        })?;

        extract_content(&resp)
    }
}

fn build_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    let mut p = String::new();
    p.push_str(&format!("Translate from {source_lang} to {target_lang}.\n"));
    p.push_str("Copy markers such as __TOKEN1__ unchanged.\n");
    p.push_str("Reply with the translation only.\n");
    p.push_str("Text:\n");
    p.push_str(text);
    p
}

fn extract_content(resp: &Value) -> Result<String, ProviderError> {
    resp.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| {
            ProviderError::InvalidResponse("missing choices[0].message.content".into())
        })
}
