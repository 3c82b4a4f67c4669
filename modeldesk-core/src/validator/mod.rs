//! Credential validation probes.
//!
//! Each provider type gets exactly one bounded-timeout request. The outcome is
//! always a [`TestConnectionResult`]; network and upstream failures never
//! surface as errors. There are no retries.

mod credentials;

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::providers::registry::ANTHROPIC_FALLBACK_MODEL;
use crate::providers::{
    AnthropicConfig, AuthType, CustomConfig, OpenAiConfig, ProviderConfig, ProviderType,
};

pub use credentials::{CredentialsRequest, CredentialsValidation};

/// Timeout applied to every probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const SUCCESS_MESSAGE: &str = "Connection successful";

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConnectionResult {
    pub success: bool,
    pub message: String,
    /// Elapsed time, absent when the probe was rejected before any request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl TestConnectionResult {
    fn succeeded(message: impl Into<String>, started: Instant) -> Self {
        Self {
            success: true,
            message: message.into(),
            latency_ms: Some(elapsed_ms(started)),
        }
    }

    fn failed(message: impl Into<String>, started: Instant) -> Self {
        Self {
            success: false,
            message: message.into(),
            latency_ms: Some(elapsed_ms(started)),
        }
    }

    /// Input rejected before any network call.
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            latency_ms: None,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Anthropic error envelope: `{"type": "error", "error": {"type": "..."}}`.
#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    kind: String,
}

/// Issues provider probes over a shared HTTP client.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for CredentialValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialValidator {
    /// Create a validator with the default 10 second probe timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a validator whose probes give up after `timeout`.
    ///
    /// The timeout applies per request; a probe that runs out of time is
    /// reported as a failed result, not an error.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe the provider described by `config`.
    pub async fn test(&self, config: &ProviderConfig) -> TestConnectionResult {
        let provider_type = config.provider_type();

        if provider_type.requires_api_key() && config.api_key().is_none() {
            return TestConnectionResult::rejected(format!(
                "API key is required for {}",
                provider_type.label()
            ));
        }

        let Some(base_url) = config.effective_base_url() else {
            return TestConnectionResult::rejected("Base URL is required for custom provider");
        };

        debug!(provider = %provider_type, base_url = %base_url, "Probing provider");
        let started = Instant::now();

        let result = match config {
            ProviderConfig::OpenAi(c) => self.probe_openai(c, &base_url, started).await,
            ProviderConfig::Anthropic(c) => self.probe_anthropic(c, &base_url, started).await,
            ProviderConfig::Mistral(c) => {
                let request = self
                    .client
                    .get(format!("{base_url}/models"))
                    .bearer_auth(c.common.api_key.as_deref().unwrap_or_default())
                    .header(CONTENT_TYPE, "application/json");
                self.probe_listing(ProviderType::Mistral, request, started).await
            }
            ProviderConfig::Ollama(_) => self.probe_ollama(&base_url, started).await,
            ProviderConfig::Custom(c) => self.probe_custom(c, &base_url, started).await,
        };

        if result.success {
            info!(provider = %provider_type, latency_ms = ?result.latency_ms, "Provider probe succeeded");
        } else {
            warn!(provider = %provider_type, latency_ms = ?result.latency_ms, message = %result.message, "Provider probe failed");
        }
        result
    }

    async fn probe_openai(
        &self,
        config: &OpenAiConfig,
        base_url: &str,
        started: Instant,
    ) -> TestConnectionResult {
        let mut request = self
            .client
            .get(format!("{base_url}/models"))
            .bearer_auth(config.common.api_key.as_deref().unwrap_or_default())
            .header(CONTENT_TYPE, "application/json");

        if let Some(org) = config.organization.as_deref().filter(|o| !o.trim().is_empty()) {
            request = request.header("OpenAI-Organization", org);
        }

        self.probe_listing(ProviderType::OpenAi, request, started).await
    }

    /// Authenticated model listing: success iff 2xx.
    async fn probe_listing(
        &self,
        provider_type: ProviderType,
        request: RequestBuilder,
        started: Instant,
    ) -> TestConnectionResult {
        let label = provider_type.label();
        match request.timeout(self.timeout).send().await {
            Ok(response) if response.status().is_success() => {
                TestConnectionResult::succeeded(SUCCESS_MESSAGE, started)
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                TestConnectionResult::failed(
                    format!("{label} API error: {} {}", status.as_u16(), body.trim()),
                    started,
                )
            }
            Err(e) => TestConnectionResult::failed(self.transport_message(label, &e), started),
        }
    }

    async fn probe_anthropic(
        &self,
        config: &AnthropicConfig,
        base_url: &str,
        started: Instant,
    ) -> TestConnectionResult {
        let model = Some(config.common.model.trim())
            .filter(|m| !m.is_empty())
            .unwrap_or(ANTHROPIC_FALLBACK_MODEL);

        let body = json!({
            "model": model,
            "max_tokens": 1,
            "messages": [{"role": "user", "content": "test"}],
        });

        let response = self
            .client
            .post(anthropic_messages_url(base_url))
            .header("x-api-key", config.common.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return TestConnectionResult::failed(
                    self.transport_message(ProviderType::Anthropic.label(), &e),
                    started,
                )
            }
        };

        let status = response.status();
        if status.is_success() {
            return TestConnectionResult::succeeded(SUCCESS_MESSAGE, started);
        }

        let text = response.text().await.unwrap_or_default();
        // invalid_request_error is only reported after the key was accepted.
        if status == StatusCode::BAD_REQUEST && is_invalid_request_error(&text) {
            debug!("Anthropic rejected probe payload after authenticating");
            return TestConnectionResult::succeeded(SUCCESS_MESSAGE, started);
        }

        TestConnectionResult::failed(
            format!("Anthropic API error: {} {}", status.as_u16(), text.trim()),
            started,
        )
    }

    async fn probe_ollama(&self, base_url: &str, started: Instant) -> TestConnectionResult {
        let response = self
            .client
            .get(format!("{base_url}/api/tags"))
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                TestConnectionResult::succeeded(SUCCESS_MESSAGE, started)
            }
            Ok(response) => TestConnectionResult::failed(
                format!("Ollama server error: {}", response.status().as_u16()),
                started,
            ),
            Err(e) => {
                debug!(error = %e, "Ollama probe transport failure");
                let message = if e.is_timeout() {
                    self.transport_message(ProviderType::Ollama.label(), &e)
                } else {
                    "Failed to connect to Ollama server. Make sure it's running.".to_string()
                };
                TestConnectionResult::failed(message, started)
            }
        }
    }

    /// Reachability only: any HTTP response counts as success.
    async fn probe_custom(
        &self,
        config: &CustomConfig,
        base_url: &str,
        started: Instant,
    ) -> TestConnectionResult {
        let headers = match custom_headers(config) {
            Ok(headers) => headers,
            Err(message) => return TestConnectionResult::rejected(message),
        };

        match self
            .client
            .get(base_url)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => TestConnectionResult::succeeded(
                format!(
                    "Connection test completed (status: {})",
                    response.status().as_u16()
                ),
                started,
            ),
            Err(e) => TestConnectionResult::failed(
                self.transport_message(ProviderType::Custom.label(), &e),
                started,
            ),
        }
    }

    fn transport_message(&self, label: &str, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!(
                "{label} request timed out after {}ms",
                self.timeout.as_millis()
            )
        } else {
            format!("{label} request failed: {error}")
        }
    }
}

/// Canonical messages endpoint: `{base}/v1/messages`, or `{base}/messages`
/// when the base URL already carries the `/v1` segment.
pub fn anthropic_messages_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/messages")
    } else {
        format!("{base}/v1/messages")
    }
}

fn is_invalid_request_error(body: &str) -> bool {
    serde_json::from_str::<AnthropicErrorBody>(body)
        .map(|b| b.error.kind == "invalid_request_error")
        .unwrap_or(false)
}

/// Content type, then user headers, then the auth header (last wins).
fn custom_headers(config: &CustomConfig) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in config.headers.iter().flatten() {
        insert_header(&mut headers, name, value)?;
    }

    let Some(key) = config.common.api_key.as_deref().filter(|k| !k.is_empty()) else {
        return Ok(headers);
    };

    match config.auth_type.unwrap_or_default() {
        AuthType::None => {}
        AuthType::Bearer => insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Bearer {key}"))?,
        AuthType::ApiKey => insert_header(&mut headers, "X-API-Key", key)?,
        AuthType::Custom => {
            if let Some(name) = config
                .custom_auth_header
                .as_deref()
                .filter(|n| !n.trim().is_empty())
            {
                insert_header(&mut headers, name.trim(), key)?;
            }
        }
    }

    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), String> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| format!("Invalid header name: {name}"))?;
    let mut value =
        HeaderValue::from_str(value).map_err(|_| format!("Invalid value for header {name}"))?;
    if name == AUTHORIZATION || name.as_str().contains("key") {
        value.set_sensitive(true);
    }
    headers.insert(name, value);
    Ok(())
}
