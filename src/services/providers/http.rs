use rand::{thread_rng, Rng};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde_json::Value;

use std::{thread, time::Duration};

use crate::error::ProviderError;

const MAX_RETRIES: usize = 3;
const BASE_DELAY_MS: u64 = 800;
const TIMEOUT_SECS: u64 = 60;

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

pub fn client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::Configuration(e.to_string()))
}

/// Sends the request built by `build` and parses the JSON body, retrying
/// transport errors, 408/429/5xx and unparseable bodies with jittered
/// exponential backoff.
pub fn send_json(build: impl Fn() -> RequestBuilder) -> Result<Value, ProviderError> {
    let mut last_err = ProviderError::Http("no attempt made".into());

    for attempt in 0..MAX_RETRIES {
        let last_attempt = attempt + 1 == MAX_RETRIES;

        let resp = match build().send() {
            Ok(r) => r,
            Err(err) => {
                last_err = ProviderError::Http(err.to_string());
                if !last_attempt {
                    thread::sleep(backoff(attempt));
                }
                continue;
            }
        };

        let status = resp.status();

        // read as text first so an error body survives a JSON failure
        let text = match resp.text() {
            Ok(t) => t,
            Err(err) => {
                last_err = ProviderError::Http(err.to_string());
                if !last_attempt {
                    thread::sleep(backoff(attempt));
                }
                continue;
            }
        };

        if !status.is_success() {
            last_err = ProviderError::Status {
                status: status.as_u16(),
                message: extract_error_message(&text),
            };
            if should_retry_http(status) && !last_attempt {
                thread::sleep(backoff(attempt));
                continue;
            }
            break;
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(json) => return Ok(json),
            Err(_) => {
                last_err = ProviderError::InvalidResponse("invalid JSON body".into());
                if !last_attempt {
                    thread::sleep(backoff(attempt));
                }
            }
        }
    }

    Err(last_err)
}

fn should_retry_http(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// `{"error": {"message"}}`, `{"message"}`, else a trimmed body snippet.
pub(crate) fn extract_error_message(body_text: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body_text.trim();
    match trimmed.char_indices().nth(400) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
