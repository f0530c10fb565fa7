//! Cloudlet probe
//!
//! Asks one candidate for its live resource and cache state for an
//! application:
//!
//! ```text
//! GET http://<ip_address>:<rest_api_port><rest_api_url>
//! {"application": {"app-id": "moped", "required-cpu-clocks": 1600, ...}}
//! ```
//!
//! The JSON object in the reply becomes the candidate's snapshot for that
//! application id. Any failure (transport, timeout, status, bad body) leaves
//! the candidate without a snapshot; nothing is raised to the caller.

use crate::config::DiscoveryConfig;
use crate::error::Result;
use cloudlet_core::{AppInfo, CandidateCloudlet, CandidateEndpoint, ResourceSnapshot};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Why a probe produced no snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cloudlet answered with status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty resource snapshot")]
    Empty,
}

/// What a probe did to its candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Snapshot attached
    Attached { elapsed: Duration },
    /// Candidate left without a snapshot
    Failed(ProbeFailure),
    /// Candidate already had a snapshot for this application; no request sent
    AlreadyProbed,
}

impl ProbeOutcome {
    pub fn is_attached(&self) -> bool {
        matches!(self, ProbeOutcome::Attached { .. })
    }
}

/// HTTP client for cloudlet resource queries
#[derive(Debug, Clone)]
pub struct CloudletProbe {
    client: reqwest::Client,
}

impl CloudletProbe {
    /// Build a probe client. Timeouts are applied per call.
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Probe `candidate` and attach the snapshot under the application id
    pub async fn probe(
        &self,
        candidate: &mut CandidateCloudlet,
        app: &AppInfo,
        timeout: Duration,
    ) -> ProbeOutcome {
        let app_id = app.app_id();
        if candidate.snapshot(app_id).is_some() {
            return ProbeOutcome::AlreadyProbed;
        }

        let start = Instant::now();
        match self.fetch_snapshot(&candidate.endpoint, app, timeout).await {
            Ok(snapshot) => {
                candidate.attach_snapshot(app_id, snapshot);
                ProbeOutcome::Attached {
                    elapsed: start.elapsed(),
                }
            }
            Err(failure) => {
                debug!(candidate = %candidate.endpoint, error = %failure, "Probe failed");
                ProbeOutcome::Failed(failure)
            }
        }
    }

    /// Fetch a snapshot without touching any candidate
    ///
    /// The request future is dropped when `timeout` elapses, so a late
    /// reply can never be observed.
    pub async fn fetch_snapshot(
        &self,
        endpoint: &CandidateEndpoint,
        app: &AppInfo,
        timeout: Duration,
    ) -> std::result::Result<ResourceSnapshot, ProbeFailure> {
        match tokio::time::timeout(timeout, self.request(endpoint, app)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeFailure::TimedOut(timeout)),
        }
    }

    async fn request(
        &self,
        endpoint: &CandidateEndpoint,
        app: &AppInfo,
    ) -> std::result::Result<ResourceSnapshot, ProbeFailure> {
        let response = self
            .client
            .get(endpoint.url())
            .json(&app.probe_body())
            .send()
            .await
            .map_err(|e| ProbeFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProbeFailure::Transport(e.to_string()))?;

        parse_snapshot(&bytes)
    }
}

/// Parse a probe reply; it must be a non-empty JSON object
pub fn parse_snapshot(body: &[u8]) -> std::result::Result<ResourceSnapshot, ProbeFailure> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ProbeFailure::Malformed(e.to_string()))?;

    match value {
        Value::Object(fields) if fields.is_empty() => Err(ProbeFailure::Empty),
        Value::Object(fields) => Ok(ResourceSnapshot::from_map(fields)),
        other => Err(ProbeFailure::Malformed(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
