//! Observability sink for discovery runs
//!
//! The orchestrator reports what happens through a [`DiscoveryObserver`]
//! handed to it by the caller. [`TracingObserver`] forwards everything to
//! `tracing`; the caller owns subscriber setup.

use cloudlet_core::CandidateEndpoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::probe::ProbeFailure;

/// Phases of a discovery call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPhase {
    Directory,
    Probe,
    Select,
}

impl std::fmt::Display for DiscoveryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryPhase::Directory => write!(f, "directory"),
            DiscoveryPhase::Probe => write!(f, "probe"),
            DiscoveryPhase::Select => write!(f, "select"),
        }
    }
}

/// Receives diagnostic events from a discovery call
///
/// All methods default to no-ops so sinks only implement what they need.
pub trait DiscoveryObserver: Send + Sync {
    fn candidates_listed(&self, _run_id: Uuid, _count: usize) {}

    fn probe_succeeded(&self, _run_id: Uuid, _endpoint: &CandidateEndpoint, _elapsed: Duration) {}

    fn probe_failed(&self, _run_id: Uuid, _endpoint: &CandidateEndpoint, _failure: &ProbeFailure) {}

    fn phase_completed(&self, _run_id: Uuid, _phase: DiscoveryPhase, _elapsed: Duration) {}

    /// `selected` is `None` when every candidate was filtered out
    fn discovery_finished(&self, _run_id: Uuid, _selected: Option<&CandidateEndpoint>) {}

    fn discovery_failed(&self, _run_id: Uuid, _phase: DiscoveryPhase, _error: &crate::DiscoveryError) {}
}

/// Sink that logs through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DiscoveryObserver for TracingObserver {
    fn candidates_listed(&self, run_id: Uuid, count: usize) {
        info!(%run_id, count, "Directory returned candidates");
    }

    fn probe_succeeded(&self, run_id: Uuid, endpoint: &CandidateEndpoint, elapsed: Duration) {
        debug!(
            %run_id,
            candidate = %endpoint,
            elapsed_ms = elapsed.as_millis() as u64,
            "Probe succeeded"
        );
    }

    fn probe_failed(&self, run_id: Uuid, endpoint: &CandidateEndpoint, failure: &ProbeFailure) {
        warn!(%run_id, candidate = %endpoint, error = %failure, "Probe failed, candidate excluded");
    }

    fn phase_completed(&self, run_id: Uuid, phase: DiscoveryPhase, elapsed: Duration) {
        debug!(
            %run_id,
            %phase,
            elapsed_ms = elapsed.as_millis() as u64,
            "Phase completed"
        );
    }

    fn discovery_finished(&self, run_id: Uuid, selected: Option<&CandidateEndpoint>) {
        match selected {
            Some(endpoint) => info!(%run_id, cloudlet = %endpoint, "Selected cloudlet"),
            None => info!(%run_id, "No cloudlet satisfies the application requirements"),
        }
    }

    fn discovery_failed(&self, run_id: Uuid, phase: DiscoveryPhase, error: &crate::DiscoveryError) {
        warn!(%run_id, %phase, error = %error, "Discovery failed");
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DiscoveryObserver for NoopObserver {}
