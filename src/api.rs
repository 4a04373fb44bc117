//! Translation API interaction with exponential backoff retry logic.
//!
//! This module talks to the Rapid Translate Multi Traduction API on RapidAPI.
//! It includes automatic retry logic with exponential backoff and jitter to
//! ride out transient failures; callers that still get an error degrade to
//! the untranslated text, so nothing here is ever fatal to a run.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`TranslateAsync`]: Core trait defining async translation
//! - [`RapidTranslateClient`]: Talks to the RapidAPI endpoint over reqwest
//! - [`RetryTranslate`]: Decorator that adds retry logic to any `TranslateAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 3 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{rng, Rng};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Endpoint of the Rapid Translate Multi Traduction API.
const RAPID_TRANSLATE_URL: &str = "https://rapid-translate-multi-traduction.p.rapidapi.com/t";
/// Host header value RapidAPI routes on.
const RAPID_TRANSLATE_HOST: &str = "rapid-translate-multi-traduction.p.rapidapi.com";

/// Settings for the translation service, injected at construction time.
///
/// Core logic never reads credentials from ambient state; the key and the
/// fixed language pair travel in this struct from the CLI to the client.
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// RapidAPI key.
    pub api_key: String,
    /// Language the input text is written in (e.g. "es").
    pub source_lang: String,
    /// Language to translate into (e.g. "en").
    pub target_lang: String,
}

/// Trait for async translation.
///
/// Implementors take a piece of text and return its translation. The
/// abstraction allows decorators (like retry logic) and test doubles.
pub trait TranslateAsync {
    /// The type of response returned by the service.
    type Response;

    /// Translate `text`, returning the translated form or an error.
    async fn translate(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`TranslateAsync`]
/// implementation.
///
/// This decorator transparently retries transient API failures. It is
/// designed to be resilient against rate limiting, network issues, and
/// temporary server errors.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryTranslate<T> {
    /// The underlying client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryTranslate<T>
where
    T: TranslateAsync,
{
    /// Create a new retry wrapper around an existing [`TranslateAsync`]
    /// implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying client to wrap
    /// * `max_retries` - Maximum number of retry attempts
    /// * `base_delay` - Initial delay between retries
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryTranslate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTranslate")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> TranslateAsync for RetryTranslate<T>
where
    T: TranslateAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn translate(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.translate(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "translate() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "translate() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Request body the endpoint expects: fixed language pair plus the text to
/// translate, wrapped in a one-element array.
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    from: &'a str,
    to: &'a str,
    q: [&'a str; 1],
}

/// [`TranslateAsync`] implementation backed by the RapidAPI endpoint.
///
/// Holds references to the shared HTTP client and the injected
/// [`TranslatorConfig`]; one instance serves a whole run.
#[derive(Debug)]
pub struct RapidTranslateClient<'a> {
    /// Shared HTTP client.
    pub client: &'a reqwest::Client,
    /// Credentials and language pair for the service.
    pub config: &'a TranslatorConfig,
}

impl TranslateAsync for RapidTranslateClient<'_> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn translate(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let body = TranslateRequest {
            from: &self.config.source_lang,
            to: &self.config.target_lang,
            q: [text],
        };

        let response = self
            .client
            .post(RAPID_TRANSLATE_URL)
            .header("x-rapidapi-host", RAPID_TRANSLATE_HOST)
            .header("x-rapidapi-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let value: Value = response.json().await?;
        let dt = t0.elapsed();

        match parse_translation(&value) {
            Some(translated) => Ok(translated),
            None => {
                warn!(
                    elapsed_ms = dt.as_millis() as u128,
                    response = %value,
                    "Translation response had no usable first element"
                );
                Err("translation response missing first element".into())
            }
        }
    }
}

/// The API answers with a JSON array whose first element is the translation.
fn parse_translation(value: &Value) -> Option<String> {
    value.get(0).and_then(|v| v.as_str()).map(str::to_string)
}
