//! Discovery orchestration
//!
//! Runs the full discovery flow for one client request:
//!
//! ```text
//! discover(directory, client, app)
//!     │
//!     ├── 1. Directory query      (fatal on failure)
//!     │
//!     ├── 2. Probe fan-out        (per-candidate failures absorbed)
//!     │
//!     └── 3. Selection            (Selected | NoneAvailable)
//! ```
//!
//! Each call is independent; nothing is shared between calls except the
//! HTTP clients' connection pools. Phase timings are diagnostic only.

use crate::config::DiscoveryConfig;
use crate::directory::DirectoryClient;
use crate::error::{DiscoveryError, Result};
use crate::observe::{DiscoveryObserver, DiscoveryPhase, TracingObserver};
use crate::probe::CloudletProbe;
use crate::prober::{ParallelProber, ProbeSummary};
use crate::select::{CacheAffinity, select};
use chrono::{DateTime, Utc};
use cloudlet_core::{AppInfo, ClientInfo, SelectionOutcome, SelectionStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Timing breakdown for discovery phases
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryPhaseTimes {
    /// Directory round trip (seconds)
    pub directory_secs: f64,

    /// Probe fan-out, join included (seconds)
    pub probe_secs: f64,

    /// Selection (seconds)
    pub select_secs: f64,
}

/// Result of a completed discovery call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// Identifier of this call, also attached to log events
    pub run_id: Uuid,

    /// When the call started
    pub started_at: DateTime<Utc>,

    /// Selected cloudlet, or none available
    pub outcome: SelectionOutcome,

    /// Candidates returned by the directory
    pub candidates_count: usize,

    /// Probe counts
    pub probes: ProbeSummary,

    /// Strategy used for selection
    pub strategy: String,

    /// Total wall-clock time (seconds)
    pub total_time_secs: f64,

    /// Time spent in each phase
    pub phase_times: DiscoveryPhaseTimes,
}

/// Two-phase cloudlet discovery
///
/// Coordinates the components for one request:
/// - DirectoryClient: coarse shortlist
/// - ParallelProber: authoritative resource state
/// - SelectionStrategy: final choice
pub struct Discovery {
    config: DiscoveryConfig,
    directory: DirectoryClient,
    prober: ParallelProber,
    observer: Arc<dyn DiscoveryObserver>,
}

impl Discovery {
    /// Create a discovery client that logs through `tracing`
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Create a discovery client reporting to `observer`
    pub fn with_observer(
        config: DiscoveryConfig,
        observer: Arc<dyn DiscoveryObserver>,
    ) -> Result<Self> {
        config.validate()?;
        let directory = DirectoryClient::new(&config)?;
        let prober = ParallelProber::new(CloudletProbe::new(&config)?, config.max_concurrent_probes);

        Ok(Self {
            config,
            directory,
            prober,
            observer,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Find the best cloudlet for `app` near `client`
    ///
    /// `Err` means discovery failed; `Ok(NoneAvailable)` means it worked
    /// and nothing was suitable.
    pub async fn discover(
        &self,
        directory_endpoint: &str,
        client: &ClientInfo,
        app: &AppInfo,
        strategy: Option<&dyn SelectionStrategy>,
    ) -> Result<SelectionOutcome> {
        self.discover_with_report(directory_endpoint, client, app, strategy)
            .await
            .map(|report| report.outcome)
    }

    /// Same as [`discover`](Self::discover), with counts and phase timings
    pub async fn discover_with_report(
        &self,
        directory_endpoint: &str,
        client: &ClientInfo,
        app: &AppInfo,
        strategy: Option<&dyn SelectionStrategy>,
    ) -> Result<DiscoveryReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let mut phase_times = DiscoveryPhaseTimes::default();
        let strategy = strategy.unwrap_or(&CacheAffinity);

        info!(
            %run_id,
            app_id = %app.app_id(),
            strategy = strategy.name(),
            "Starting cloudlet discovery"
        );

        // Phase 1: Directory
        let phase_start = Instant::now();
        let mut candidates = match self
            .directory
            .list_candidates(directory_endpoint, client, app, self.config.max_results)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                self.observer
                    .discovery_failed(run_id, DiscoveryPhase::Directory, &e);
                return Err(e);
            }
        };
        let elapsed = phase_start.elapsed();
        phase_times.directory_secs = elapsed.as_secs_f64();
        self.observer.candidates_listed(run_id, candidates.len());
        self.observer
            .phase_completed(run_id, DiscoveryPhase::Directory, elapsed);

        // Phase 2: Probe fan-out
        let phase_start = Instant::now();
        let probes = self
            .prober
            .probe_all_observed(
                &mut candidates,
                app,
                self.config.probe_timeout(),
                self.observer.as_ref(),
                run_id,
            )
            .await;
        let elapsed = phase_start.elapsed();
        phase_times.probe_secs = elapsed.as_secs_f64();
        self.observer
            .phase_completed(run_id, DiscoveryPhase::Probe, elapsed);

        // Phase 3: Selection
        let phase_start = Instant::now();
        let outcome = match select(&candidates, app, Some(strategy)) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.observer
                    .discovery_failed(run_id, DiscoveryPhase::Select, &e);
                return Err(e);
            }
        };
        let elapsed = phase_start.elapsed();
        phase_times.select_secs = elapsed.as_secs_f64();
        self.observer
            .phase_completed(run_id, DiscoveryPhase::Select, elapsed);
        self.observer
            .discovery_finished(run_id, outcome.selected().map(|c| &c.endpoint));

        let total_time = start.elapsed().as_secs_f64();

        info!(
            %run_id,
            total_time_secs = total_time,
            directory_secs = phase_times.directory_secs,
            probe_secs = phase_times.probe_secs,
            probes_succeeded = probes.succeeded,
            "Discovery completed"
        );

        Ok(DiscoveryReport {
            run_id,
            started_at,
            outcome,
            candidates_count: candidates.len(),
            probes,
            strategy: strategy.name().to_string(),
            total_time_secs: total_time,
            phase_times,
        })
    }
}

/// Reject unusable directory endpoints before any I/O
pub fn validate_directory_endpoint(endpoint: &str) -> Result<()> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(DiscoveryError::config("directory endpoint is empty"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(DiscoveryError::config(format!(
            "directory endpoint must start with http:// or https:// (got {trimmed}), \
             e.g. http://128.2.112.221:8080/"
        )));
    }
    Ok(())
}
