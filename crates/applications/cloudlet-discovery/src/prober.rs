//! Parallel prober
//!
//! Fans out one probe per candidate and waits for all of them:
//!
//! ```text
//! candidates ──┬── probe(c0) ──┐
//!              ├── probe(c1) ──┤  each bounded by the per-probe timeout,
//!              └── probe(cN) ──┘  at most `max_concurrency` in flight
//!                                 │
//!                        join barrier (every probe terminated)
//! ```
//!
//! Each probe borrows its own candidate mutably and nothing else, so no
//! locking is needed. The slice is mutated in place and keeps its order.
//! The batch never fails; a failed probe just leaves its candidate without
//! a snapshot.

use crate::observe::{DiscoveryObserver, NoopObserver};
use crate::probe::{CloudletProbe, ProbeOutcome};
use cloudlet_core::{AppInfo, CandidateCloudlet};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Counts for one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Bounded concurrent prober
#[derive(Debug, Clone)]
pub struct ParallelProber {
    probe: CloudletProbe,
    max_concurrency: usize,
}

impl ParallelProber {
    /// `max_concurrency` is clamped to at least 1
    pub fn new(probe: CloudletProbe, max_concurrency: usize) -> Self {
        Self {
            probe,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Probe every candidate; returns once all probes terminated
    pub async fn probe_all(
        &self,
        candidates: &mut [CandidateCloudlet],
        app: &AppInfo,
        per_probe_timeout: Duration,
    ) -> ProbeSummary {
        self.probe_all_observed(candidates, app, per_probe_timeout, &NoopObserver, Uuid::nil())
            .await
    }

    /// Same as [`probe_all`](Self::probe_all), reporting each probe to `observer`
    pub async fn probe_all_observed(
        &self,
        candidates: &mut [CandidateCloudlet],
        app: &AppInfo,
        per_probe_timeout: Duration,
        observer: &dyn DiscoveryObserver,
        run_id: Uuid,
    ) -> ProbeSummary {
        let outcomes: Vec<ProbeOutcome> = stream::iter(candidates.iter_mut())
            .map(|candidate| async move {
                let outcome = self.probe.probe(candidate, app, per_probe_timeout).await;
                match &outcome {
                    ProbeOutcome::Attached { elapsed } => {
                        observer.probe_succeeded(run_id, &candidate.endpoint, *elapsed)
                    }
                    ProbeOutcome::Failed(failure) => {
                        observer.probe_failed(run_id, &candidate.endpoint, failure)
                    }
                    ProbeOutcome::AlreadyProbed => {}
                }
                outcome
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut summary = ProbeSummary::default();
        for outcome in &outcomes {
            match outcome {
                ProbeOutcome::Attached { .. } => {
                    summary.attempted += 1;
                    summary.succeeded += 1;
                }
                ProbeOutcome::Failed(_) => {
                    summary.attempted += 1;
                    summary.failed += 1;
                }
                ProbeOutcome::AlreadyProbed => {}
            }
        }
        summary
    }
}
