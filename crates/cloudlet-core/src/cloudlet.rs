//! Candidate cloudlets and their per-application resource snapshots

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{CloudletError, Result};
use crate::keys;

/// Network endpoint of a cloudlet's REST API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateEndpoint {
    host: String,
    port: u16,
    path: String,
}

impl CandidateEndpoint {
    /// Validate and build an endpoint. Host and path must be non-empty and
    /// the port non-zero; a missing leading `/` on the path is added.
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Result<Self> {
        let host = host.into().trim().to_string();
        let path = path.into().trim().to_string();

        if host.is_empty() {
            return Err(CloudletError::InvalidEndpoint("empty host".to_string()));
        }
        if port == 0 {
            return Err(CloudletError::InvalidEndpoint(format!("{host}: port 0")));
        }
        if path.is_empty() {
            return Err(CloudletError::InvalidEndpoint(format!("{host}:{port}: empty path")));
        }

        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        Ok(Self { host, port, path })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full URL of the REST resource
    pub fn url(&self) -> String {
        if self.host.contains(':') {
            format!("http://[{}]:{}{}", self.host, self.port, self.path)
        } else {
            format!("http://{}:{}{}", self.host, self.port, self.path)
        }
    }
}

impl std::fmt::Display for CandidateEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Live resource and cache state of one cloudlet, for one application
///
/// The probe response object is kept whole; typed accessors read the
/// well-known keys and tolerate numbers sent as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceSnapshot(serde_json::Map<String, serde_json::Value>);

impl ResourceSnapshot {
    pub fn from_map(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    fn numeric(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// CPU clock speed in MHz
    pub fn cpu_clock_mhz(&self) -> Option<f64> {
        self.numeric(keys::resource::CLOCK_SPEED)
    }

    /// How much of the application's required content is already cached
    pub fn cache_score(&self) -> Option<f64> {
        self.numeric(keys::resource::APP_CACHE_TOTAL_SCORE)
    }

    /// Round-trip time estimate between client and cloudlet (ms)
    pub fn rtt_ms(&self) -> Option<f64> {
        self.numeric(keys::resource::RTT_BETWEEN_CLIENT)
    }

    pub fn total_cpu_num(&self) -> Option<f64> {
        self.numeric(keys::resource::TOTAL_CPU_NUMBER)
    }

    pub fn total_mem_mb(&self) -> Option<f64> {
        self.numeric(keys::resource::TOTAL_MEM_MB)
    }

    pub fn cpu_usage_percent(&self) -> Option<f64> {
        self.numeric(keys::resource::TOTAL_CPU_PERCENT)
    }

    pub fn free_mem_mb(&self) -> Option<f64> {
        self.numeric(keys::resource::TOTAL_MEM_FREE_MB)
    }
}

/// A cloudlet returned by the directory, enriched by its probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCloudlet {
    pub endpoint: CandidateEndpoint,

    /// Directory entry as returned by the server
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Snapshots keyed by application id
    #[serde(default)]
    snapshots: BTreeMap<String, ResourceSnapshot>,
}

impl CandidateCloudlet {
    pub fn new(
        endpoint: CandidateEndpoint,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            endpoint,
            metadata,
            snapshots: BTreeMap::new(),
        }
    }

    /// Attach a snapshot for `app_id`.
    ///
    /// Write-once: returns `false` and leaves the candidate untouched if a
    /// snapshot for that application is already present.
    pub fn attach_snapshot(&mut self, app_id: &str, snapshot: ResourceSnapshot) -> bool {
        if self.snapshots.contains_key(app_id) {
            return false;
        }
        self.snapshots.insert(app_id.to_string(), snapshot);
        true
    }

    /// Builder form of [`attach_snapshot`](Self::attach_snapshot)
    pub fn with_snapshot(mut self, app_id: &str, snapshot: ResourceSnapshot) -> Self {
        self.attach_snapshot(app_id, snapshot);
        self
    }

    pub fn snapshot(&self, app_id: &str) -> Option<&ResourceSnapshot> {
        self.snapshots.get(app_id)
    }

    /// Has a non-empty snapshot for `app_id`
    pub fn has_snapshot(&self, app_id: &str) -> bool {
        self.snapshot(app_id).is_some_and(|s| !s.is_empty())
    }

    /// What a provisioning collaborator receives for this cloudlet
    pub fn handoff(&self) -> CloudletHandoff {
        CloudletHandoff {
            endpoint: self.endpoint.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Endpoint and directory metadata of a chosen cloudlet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudletHandoff {
    pub endpoint: CandidateEndpoint,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of a successful selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "cloudlet", rename_all = "snake_case")]
pub enum SelectionOutcome {
    /// One cloudlet was chosen
    Selected(CandidateCloudlet),
    /// Every candidate was filtered out; not an error
    NoneAvailable,
}

impl SelectionOutcome {
    pub fn selected(&self) -> Option<&CandidateCloudlet> {
        match self {
            SelectionOutcome::Selected(c) => Some(c),
            SelectionOutcome::NoneAvailable => None,
        }
    }

    pub fn into_selected(self) -> Option<CandidateCloudlet> {
        match self {
            SelectionOutcome::Selected(c) => Some(c),
            SelectionOutcome::NoneAvailable => None,
        }
    }

    pub fn is_none_available(&self) -> bool {
        matches!(self, SelectionOutcome::NoneAvailable)
    }
}
