//! Directory client
//!
//! Asks the central directory server for a coarse shortlist of cloudlets
//! near the client.
//!
//! ## Query
//!
//! ```text
//! GET <directory>/api/v1/Cloudlet/search/?n=<max>[&latitude=<lat>&longitude=<lon> | &client_ip=<ip>]
//! ```
//!
//! Exactly one location mode is used per call, in priority order:
//! 1. GPS coordinates (client descriptor first, then application descriptor)
//! 2. Explicit client IP
//! 3. Nothing: the directory falls back to the caller's observed address
//!
//! ## Response
//!
//! ```json
//! {"cloudlet": [{"ip_address": "10.0.0.1", "rest_api_port": 8022, "rest_api_url": "/api/v1/resource/"}]}
//! ```
//!
//! Entries missing any of the three fields cannot be probed and are dropped.
//! The query is sent once; retry policy belongs to the caller.

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};
use cloudlet_core::keys;
use cloudlet_core::{AppInfo, CandidateCloudlet, CandidateEndpoint, ClientInfo};
use serde_json::Value;
use tracing::{debug, info};

/// Search resource path, relative to the directory base URL
pub const SEARCH_PATH: &str = "/api/v1/Cloudlet/search/";

/// Location hint sent to the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationQuery {
    Coordinates { latitude: String, longitude: String },
    ClientIp(String),
    /// No hint; the directory uses the address it sees
    Observed,
}

impl LocationQuery {
    /// Pick the location mode from the descriptors
    pub fn from_descriptors(client: &ClientInfo, app: &AppInfo) -> Self {
        if let Some((latitude, longitude)) = client.coordinates().or_else(|| app.coordinates()) {
            return LocationQuery::Coordinates {
                latitude,
                longitude,
            };
        }

        match client.ip_address() {
            Some(ip) if !ip.trim().is_empty() => LocationQuery::ClientIp(ip.trim().to_string()),
            _ => LocationQuery::Observed,
        }
    }

    /// Query string pairs, `n` first
    pub fn query_pairs(&self, max_results: u32) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("n", max_results.to_string())];
        match self {
            LocationQuery::Coordinates {
                latitude,
                longitude,
            } => {
                pairs.push(("latitude", latitude.clone()));
                pairs.push(("longitude", longitude.clone()));
            }
            LocationQuery::ClientIp(ip) => pairs.push(("client_ip", ip.clone())),
            LocationQuery::Observed => {}
        }
        pairs
    }
}

/// Strip a single trailing `/` from the directory endpoint
pub fn normalize_endpoint(endpoint: &str) -> &str {
    endpoint.strip_suffix('/').unwrap_or(endpoint)
}

/// Full search URL for a directory endpoint
pub fn search_url(directory_endpoint: &str) -> String {
    format!("{}{}", normalize_endpoint(directory_endpoint), SEARCH_PATH)
}

/// Parse a directory response body into candidates, in directory order
///
/// Returns `NoCandidates` when no entry survives.
pub fn parse_directory_response(body: &Value) -> Result<Vec<CandidateCloudlet>> {
    let entries = body
        .get(keys::directory::CLOUDLET_LIST)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DiscoveryError::invalid_response(format!(
                "missing \"{}\" list",
                keys::directory::CLOUDLET_LIST
            ))
        })?;

    let candidates: Vec<CandidateCloudlet> = entries.iter().filter_map(parse_entry).collect();

    debug!(
        entries = entries.len(),
        usable = candidates.len(),
        "Parsed directory response"
    );

    if candidates.is_empty() {
        return Err(DiscoveryError::NoCandidates);
    }

    Ok(candidates)
}

/// Parse one directory entry; `None` if it cannot be queried
fn parse_entry(entry: &Value) -> Option<CandidateCloudlet> {
    let metadata = entry.as_object()?;

    let host = metadata.get(keys::directory::IP_ADDRESS)?.as_str()?;
    let path = metadata.get(keys::directory::REST_API_URL)?.as_str()?;
    let port = match metadata.get(keys::directory::REST_API_PORT)? {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok())?,
        Value::String(s) => s.trim().parse::<u16>().ok()?,
        _ => return None,
    };

    match CandidateEndpoint::new(host, port, path) {
        Ok(endpoint) => Some(CandidateCloudlet::new(endpoint, metadata.clone())),
        Err(e) => {
            debug!(error = %e, "Dropping directory entry");
            None
        }
    }
}

/// HTTP client for the directory server
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: reqwest::Client,
}

impl DirectoryClient {
    /// Build a client whose requests are bounded by the directory timeout
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.directory_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Query the directory for candidates near the client
    pub async fn list_candidates(
        &self,
        directory_endpoint: &str,
        client_info: &ClientInfo,
        app_info: &AppInfo,
        max_results: u32,
    ) -> Result<Vec<CandidateCloudlet>> {
        let url = search_url(directory_endpoint);
        let location = LocationQuery::from_descriptors(client_info, app_info);

        info!(
            directory = %normalize_endpoint(directory_endpoint),
            location = ?location,
            max_results,
            "Querying directory"
        );

        let unreachable = |source: reqwest::Error| DiscoveryError::DirectoryUnreachable {
            endpoint: normalize_endpoint(directory_endpoint).to_string(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .query(&location.query_pairs(max_results))
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::DirectoryRejected {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(unreachable)?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| DiscoveryError::invalid_response(e.to_string()))?;

        parse_directory_response(&body)
    }
}
