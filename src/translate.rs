use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

/// Upper bound on in-flight translation requests; keeps the fan-out polite
/// toward the third-party rate limit.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com";

/// External machine-translation service.
pub trait TranslationProvider {
    fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> impl std::future::Future<Output = Result<String>>;
}

/// Google's public translate endpoint, the same one the original export
/// tooling talks to. No API key; the response is a nested JSON array.
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslateProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl TranslationProvider for GoogleTranslateProvider {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("Failed to send translation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Translation service error ({}): {}", status, body);
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse translation response")?;

        parse_gtx_payload(&payload)
    }
}

/// The gtx response is `[[["translated","original",..], ..], ..]`; the
/// translation is the concatenation of the first element of each segment.
fn parse_gtx_payload(payload: &serde_json::Value) -> Result<String> {
    let segments = payload
        .get(0)
        .and_then(|v| v.as_array())
        .context("Translation response missing segment list")?;

    let mut translated = String::new();
    for segment in segments {
        if let Some(piece) = segment.get(0).and_then(|v| v.as_str()) {
            translated.push_str(piece);
        }
    }

    anyhow::ensure!(
        !translated.is_empty(),
        "Translation response contained no text"
    );
    Ok(translated)
}

type CacheKey = (String, String, String);

/// Run-scoped memoizing translator.
///
/// Cache keys are (text, source, target). Entries live for one process run
/// and are never evicted. A provider failure is absorbed: the original text
/// comes back unchanged and the run continues.
pub struct Translator<P> {
    provider: P,
    cache: RwLock<HashMap<CacheKey, String>>,
    max_in_flight: usize,
}

impl<P: TranslationProvider> Translator<P> {
    pub fn new(provider: P, max_in_flight: usize) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Translate one text. Blank input is the identity and never reaches the
    /// provider or the cache.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let key = (text.to_string(), source.to_string(), target.to_string());

        if let Some(hit) = self.cache.read().await.get(&key) {
            return hit.clone();
        }

        // Duplicate texts racing past the read above may both call the
        // provider; the second insert overwrites with an equivalent value.
        match self.provider.translate(text, source, target).await {
            Ok(translated) => {
                self.cache.write().await.insert(key, translated.clone());
                translated
            }
            Err(e) => {
                warn!("Error translating text: {:#}", e);
                text.to_string()
            }
        }
    }

    /// Translate every element, at most `max_in_flight` requests at a time.
    /// Output order and length always match the input.
    pub async fn batch_translate(
        &self,
        texts: &[String],
        source: &str,
        target: &str,
    ) -> Vec<String> {
        stream::iter(texts.iter())
            .map(|text| self.translate(text, source, target))
            .buffered(self.max_in_flight)
            .collect()
            .await
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }
}
