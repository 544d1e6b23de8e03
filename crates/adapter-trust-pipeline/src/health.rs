// crates/adapter-trust-pipeline/src/health.rs
// ============================================================================
// Module: Health Prober
// Description: Best-effort HTTP probes of adapter status endpoints.
// Purpose: Attach liveness data to smoke rows without failing the run.
// Dependencies: reqwest, url
// ============================================================================

//! ## Overview
//! [`HealthProber::probe`] issues a single GET with an explicit timeout and
//! reports `ok` only for a 2xx response. Every other outcome, including
//! refused connections, timeouts, redirects, and disallowed schemes, is a
//! `fail` result. The prober never returns an error.
//!
//! Security posture: redirects are not followed and `http://` targets are
//! refused unless enabled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use adapter_trust_config::HealthConfig;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// 2xx response within the timeout.
    Ok,
    /// Anything else.
    Fail,
}

/// Result of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthProbeResult {
    /// Probe outcome.
    pub status: HealthStatus,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
    /// Failure detail, when failed.
    pub detail: Option<String>,
}

/// Errors building a prober.
#[derive(Debug, Error)]
pub enum HealthProbeError {
    /// The HTTP client could not be built.
    #[error("failed to build health probe client: {0}")]
    Client(String),
}

/// HTTP health prober.
pub struct HealthProber {
    /// HTTP client without redirects.
    client: Client,
    /// Whether plain HTTP targets are allowed.
    allow_http: bool,
    /// Timeout applied by [`Self::probe_default`].
    default_timeout: Duration,
}

// ============================================================================
// SECTION: Prober
// ============================================================================

impl HealthProber {
    /// Builds a prober.
    ///
    /// # Errors
    ///
    /// Returns [`HealthProbeError::Client`] when the client cannot be built.
    pub fn new(
        allow_http: bool,
        default_timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, HealthProbeError> {
        let client = Client::builder()
            .timeout(default_timeout)
            .user_agent(user_agent.to_string())
            .redirect(Policy::none())
            .build()
            .map_err(|err| HealthProbeError::Client(err.to_string()))?;
        Ok(Self {
            client,
            allow_http,
            default_timeout,
        })
    }

    /// Builds a prober from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HealthProbeError::Client`] when the client cannot be built.
    pub fn from_config(config: &HealthConfig) -> Result<Self, HealthProbeError> {
        Self::new(config.allow_http, Duration::from_millis(config.timeout_ms), &config.user_agent)
    }

    /// Probes `url` with the configured timeout.
    pub async fn probe_default(&self, url: &str) -> HealthProbeResult {
        self.probe(url, self.default_timeout).await
    }

    /// Probes `url` once, bounded by `timeout`.
    pub async fn probe(&self, url: &str, timeout: Duration) -> HealthProbeResult {
        let started = Instant::now();
        let outcome = self.fetch(url, timeout).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => HealthProbeResult {
                status: HealthStatus::Ok,
                elapsed_ms,
                detail: None,
            },
            Err(detail) => HealthProbeResult {
                status: HealthStatus::Fail,
                elapsed_ms,
                detail: Some(detail),
            },
        }
    }

    /// Performs the request; errors are failure details.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<(), String> {
        let parsed = Url::parse(url).map_err(|err| format!("invalid url: {err}"))?;
        match parsed.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            scheme => return Err(format!("scheme {scheme} is not allowed")),
        }
        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        let status = response.status();
        if status.is_success() { Ok(()) } else { Err(format!("status {}", status.as_u16())) }
    }
}
