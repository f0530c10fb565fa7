//! Core traits for cloudlet discovery
//!
//! `SelectionStrategy` is the seam for selection policies: the discovery
//! engine works through this interface only, so alternative policies
//! (latency-weighted, multi-factor) plug in without touching the engine.
//!
//! `Provisioner` is the narrow interface of the out-of-core provisioning
//! collaborator. Discovery never calls it; callers hand it the chosen
//! cloudlet together with an overlay source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cloudlet::{CandidateCloudlet, CloudletHandoff};
use crate::error::Result;
use crate::types::AppInfo;

/// Picks at most one cloudlet out of a probed candidate list
///
/// Implementations receive the candidates in directory order and return
/// `None` when nothing is suitable. The engine guarantees the slice is
/// non-empty.
pub trait SelectionStrategy: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &str {
        "custom"
    }

    fn select<'a>(
        &self,
        candidates: &'a [CandidateCloudlet],
        app: &AppInfo,
    ) -> Option<&'a CandidateCloudlet>;
}

/// Strategy backed by a plain function or closure
pub struct FnStrategy<F> {
    name: String,
    f: F,
}

/// Wrap a closure as a [`SelectionStrategy`]
///
/// ```
/// use cloudlet_core::{from_fn, SelectionStrategy};
///
/// let last = from_fn("last", |candidates, _app| candidates.last());
/// assert_eq!(last.name(), "last");
/// ```
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnStrategy<F>
where
    F: for<'a> Fn(&'a [CandidateCloudlet], &AppInfo) -> Option<&'a CandidateCloudlet>
        + Send
        + Sync,
{
    FnStrategy {
        name: name.into(),
        f,
    }
}

impl<F> SelectionStrategy for FnStrategy<F>
where
    F: for<'a> Fn(&'a [CandidateCloudlet], &AppInfo) -> Option<&'a CandidateCloudlet>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn select<'a>(
        &self,
        candidates: &'a [CandidateCloudlet],
        app: &AppInfo,
    ) -> Option<&'a CandidateCloudlet> {
        (self.f)(candidates, app)
    }
}

/// Where the VM overlay to provision comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySource {
    File(PathBuf),
    Url(String),
}

/// Everything a provisioning collaborator needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub handoff: CloudletHandoff,
    pub overlay: OverlaySource,
}

impl ProvisionRequest {
    pub fn new(cloudlet: &CandidateCloudlet, overlay: OverlaySource) -> Self {
        Self {
            handoff: cloudlet.handoff(),
            overlay,
        }
    }
}

/// VM instance provisioned on a cloudlet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedVm {
    pub uuid: String,
    pub ip_address: Option<String>,
}

/// Provisioning collaborator (VM synthesis from an overlay)
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedVm>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudlet::CandidateEndpoint;
    use crate::error::CloudletError;
    use std::sync::Mutex;

    fn candidate(host: &str) -> CandidateCloudlet {
        let endpoint = CandidateEndpoint::new(host, 8022, "/api/v1/resource").unwrap();
        let mut metadata = serde_json::Map::new();
        metadata.insert("name".to_string(), serde_json::json!(host));
        CandidateCloudlet::new(endpoint, metadata)
    }

    #[test]
    fn test_fn_strategy() {
        let candidates = vec![candidate("10.0.0.1"), candidate("10.0.0.2")];
        let last = from_fn("last", |candidates, _app| candidates.last());

        let chosen = last.select(&candidates, &AppInfo::new("moped")).unwrap();
        assert_eq!(chosen.endpoint.host(), "10.0.0.2");
    }

    struct RecordingProvisioner {
        seen: Mutex<Vec<ProvisionRequest>>,
    }

    #[async_trait]
    impl Provisioner for RecordingProvisioner {
        async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedVm> {
            if let OverlaySource::Url(url) = &request.overlay {
                if url.is_empty() {
                    return Err(CloudletError::Provisioning("empty overlay URL".to_string()));
                }
            }
            self.seen.lock().unwrap().push(request.clone());
            Ok(ProvisionedVm {
                uuid: "vm-1".to_string(),
                ip_address: Some(request.handoff.endpoint.host().to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_provisioner_receives_handoff() {
        let provisioner = RecordingProvisioner {
            seen: Mutex::new(Vec::new()),
        };
        let chosen = candidate("10.0.0.7");
        let request = ProvisionRequest::new(
            &chosen,
            OverlaySource::File(PathBuf::from("/tmp/overlay-face.zip")),
        );

        let vm = provisioner.provision(&request).await.unwrap();
        assert_eq!(vm.ip_address.as_deref(), Some("10.0.0.7"));

        let seen = provisioner.seen.lock().unwrap();
        assert_eq!(seen[0].handoff.metadata["name"], "10.0.0.7");

        let bad = ProvisionRequest::new(&chosen, OverlaySource::Url(String::new()));
        drop(seen);
        assert!(provisioner.provision(&bad).await.is_err());
    }

    #[test]
    fn test_provision_request_serialization() {
        let request = ProvisionRequest::new(
            &candidate("10.0.0.7"),
            OverlaySource::Url("http://overlay.example/face.zip".to_string()),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["overlay"]["url"], "http://overlay.example/face.zip");
        assert_eq!(json["handoff"]["endpoint"]["port"], 8022);
    }
}
