//! Cloudlet selection
//!
//! Picks one cloudlet out of the probed candidates.
//!
//! ## Default policy: cache affinity
//!
//! 1. A single candidate is returned as-is, without filtering
//! 2. Otherwise keep candidates that have a snapshot for the application
//!    and meet its minimum CPU clock (if one is set)
//! 3. Nothing left → none available (a valid answer, not an error)
//! 4. Highest cache-affinity score wins; ties go to directory order
//! 5. No score anywhere → first eligible candidate
//!
//! ## Extension point
//!
//! The `weight-*` application keys are reserved for weighted multi-factor
//! scoring. No built-in policy reads them; plug a custom
//! [`SelectionStrategy`] into [`select`] to implement one.

use crate::error::{DiscoveryError, Result};
use cloudlet_core::{AppInfo, CandidateCloudlet, SelectionOutcome, SelectionStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Built-in selection policies
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Highest cache-affinity score among eligible cloudlets
    #[default]
    CacheAffinity,

    /// Smallest reported RTT among eligible cloudlets
    LowestRtt,
}

impl SelectionPolicy {
    pub fn strategy(&self) -> &'static dyn SelectionStrategy {
        match self {
            SelectionPolicy::CacheAffinity => &CacheAffinity,
            SelectionPolicy::LowestRtt => &LowestRtt,
        }
    }
}

/// Candidates that have a snapshot for the application and meet its CPU floor
///
/// Order is preserved.
pub fn eligible<'a>(candidates: &'a [CandidateCloudlet], app: &AppInfo) -> Vec<&'a CandidateCloudlet> {
    let app_id = app.app_id();
    let min_cpu = app.min_cpu_clock_mhz();

    candidates
        .iter()
        .filter(|c| c.has_snapshot(app_id))
        .filter(|c| match min_cpu {
            None => true,
            Some(required) => c
                .snapshot(app_id)
                .and_then(|s| s.cpu_clock_mhz())
                .is_some_and(|clock| clock >= required),
        })
        .collect()
}

/// First candidate with the best finite metric; `better(new, best)` decides
fn first_best<'a>(
    candidates: &[&'a CandidateCloudlet],
    metric: impl Fn(&CandidateCloudlet) -> Option<f64>,
    better: impl Fn(f64, f64) -> bool,
) -> Option<&'a CandidateCloudlet> {
    let mut best: Option<(&'a CandidateCloudlet, f64)> = None;
    for &candidate in candidates {
        let Some(value) = metric(candidate).filter(|v| v.is_finite()) else {
            continue;
        };
        if best.is_none_or(|(_, current)| better(value, current)) {
            best = Some((candidate, value));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Default policy: CPU floor, then highest cache-affinity score
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheAffinity;

impl SelectionStrategy for CacheAffinity {
    fn name(&self) -> &str {
        "cache-affinity"
    }

    fn select<'a>(
        &self,
        candidates: &'a [CandidateCloudlet],
        app: &AppInfo,
    ) -> Option<&'a CandidateCloudlet> {
        if let [only] = candidates {
            return Some(only);
        }

        let eligible = eligible(candidates, app);
        debug!(
            candidates = candidates.len(),
            eligible = eligible.len(),
            "Filtered candidates"
        );

        let app_id = app.app_id();
        first_best(
            &eligible,
            |c| c.snapshot(app_id).and_then(|s| s.cache_score()),
            |new, best| new > best,
        )
        .or_else(|| eligible.first().copied())
    }
}

/// Alternative policy: CPU floor, then lowest reported RTT
///
/// Does not filter on the application's RTT requirement.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestRtt;

impl SelectionStrategy for LowestRtt {
    fn name(&self) -> &str {
        "lowest-rtt"
    }

    fn select<'a>(
        &self,
        candidates: &'a [CandidateCloudlet],
        app: &AppInfo,
    ) -> Option<&'a CandidateCloudlet> {
        if let [only] = candidates {
            return Some(only);
        }

        let eligible = eligible(candidates, app);
        let app_id = app.app_id();
        first_best(
            &eligible,
            |c| c.snapshot(app_id).and_then(|s| s.rtt_ms()),
            |new, best| new < best,
        )
        .or_else(|| eligible.first().copied())
    }
}

/// Run a selection strategy (default: [`CacheAffinity`])
///
/// Fails with `NoCandidates` on an empty list. Returns
/// `NoneAvailable` when the strategy finds nothing suitable.
pub fn select(
    candidates: &[CandidateCloudlet],
    app: &AppInfo,
    strategy: Option<&dyn SelectionStrategy>,
) -> Result<SelectionOutcome> {
    if candidates.is_empty() {
        return Err(DiscoveryError::NoCandidates);
    }

    let strategy = strategy.unwrap_or(&CacheAffinity);
    let outcome = match strategy.select(candidates, app) {
        Some(chosen) => SelectionOutcome::Selected(chosen.clone()),
        None => SelectionOutcome::NoneAvailable,
    };

    debug!(
        strategy = strategy.name(),
        selected = ?outcome.selected().map(|c| c.endpoint.url()),
        "Selection complete"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudlet_core::{CandidateEndpoint, ResourceSnapshot, from_fn};
    use serde_json::json;

    const APP: &str = "moped";

    fn candidate(host: &str) -> CandidateCloudlet {
        let endpoint = CandidateEndpoint::new(host, 8022, "/api/v1/resource/").unwrap();
        CandidateCloudlet::new(endpoint, serde_json::Map::new())
    }

    fn probed(host: &str, snapshot: serde_json::Value) -> CandidateCloudlet {
        let serde_json::Value::Object(fields) = snapshot else {
            panic!("snapshot must be an object");
        };
        candidate(host).with_snapshot(APP, ResourceSnapshot::from_map(fields))
    }

    fn chosen_host(outcome: &SelectionOutcome) -> &str {
        outcome.selected().expect("expected a selection").endpoint.host()
    }

    #[test]
    fn test_empty_list_is_no_candidates() {
        let err = select(&[], &AppInfo::new(APP), None).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoCandidates));
    }

    #[test]
    fn test_singleton_bypasses_filtering() {
        let app = AppInfo::new(APP).with_min_cpu_clock_mhz(5000);

        // no snapshot at all
        let outcome = select(&[candidate("10.0.0.1")], &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.1");

        // snapshot below the CPU floor
        let slow = probed("10.0.0.2", json!({"cpu_clock_speed_mhz": 100}));
        let outcome = select(&[slow], &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");
    }

    #[test]
    fn test_candidates_without_snapshot_excluded() {
        let app = AppInfo::new(APP);
        let candidates = vec![
            candidate("10.0.0.1"),
            probed("10.0.0.2", json!({"app_cache_total_score": 0.1})),
            candidate("10.0.0.3"),
        ];

        let outcome = select(&candidates, &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");

        let nobody = vec![candidate("10.0.0.1"), candidate("10.0.0.3")];
        let outcome = select(&nobody, &app, None).unwrap();
        assert!(outcome.is_none_available());
    }

    #[test]
    fn test_snapshot_for_other_app_does_not_count() {
        let app = AppInfo::new("face");
        let candidates = vec![
            probed("10.0.0.1", json!({"app_cache_total_score": 1.0})),
            probed("10.0.0.2", json!({"app_cache_total_score": 1.0})),
        ];
        assert!(select(&candidates, &app, None).unwrap().is_none_available());
    }

    #[test]
    fn test_cpu_floor_excludes_slow_candidates() {
        let app = AppInfo::new(APP).with_min_cpu_clock_mhz(2500);
        let candidates = vec![
            probed("10.0.0.1", json!({"cpu_clock_speed_mhz": 2000, "app_cache_total_score": 0.99})),
            probed("10.0.0.2", json!({"cpu_clock_speed_mhz": 3000, "app_cache_total_score": 0.0})),
            probed("10.0.0.3", json!({"app_cache_total_score": 0.99})),
        ];

        let outcome = select(&candidates, &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");
    }

    #[test]
    fn test_none_meets_cpu_floor() {
        let app = AppInfo::new(APP).with_min_cpu_clock_mhz(4000);
        let candidates = vec![
            probed("10.0.0.1", json!({"cpu_clock_speed_mhz": 2000})),
            probed("10.0.0.2", json!({"cpu_clock_speed_mhz": 3000})),
        ];
        assert!(select(&candidates, &app, None).unwrap().is_none_available());
    }

    #[test]
    fn test_highest_cache_score_wins() {
        let app = AppInfo::new(APP).with_min_cpu_clock_mhz(1600);
        let candidates = vec![
            probed("10.0.0.1", json!({"cpu_clock_speed_mhz": 2000, "app_cache_total_score": 0.8})),
            probed("10.0.0.2", json!({"cpu_clock_speed_mhz": 2000, "app_cache_total_score": 0.95})),
        ];
        let outcome = select(&candidates, &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");
    }

    #[test]
    fn test_tie_goes_to_directory_order() {
        let app = AppInfo::new(APP);
        let candidates = vec![
            probed("10.0.0.1", json!({"app_cache_total_score": 0.3})),
            probed("10.0.0.2", json!({"app_cache_total_score": 0.7})),
            probed("10.0.0.3", json!({"app_cache_total_score": 0.7})),
        ];

        for _ in 0..10 {
            let outcome = select(&candidates, &app, None).unwrap();
            assert_eq!(chosen_host(&outcome), "10.0.0.2");
        }
    }

    #[test]
    fn test_no_scores_falls_back_to_first_eligible() {
        let app = AppInfo::new(APP).with_min_cpu_clock_mhz(1000);
        let candidates = vec![
            probed("10.0.0.1", json!({"cpu_clock_speed_mhz": 500})),
            probed("10.0.0.2", json!({"cpu_clock_speed_mhz": 1500})),
            probed("10.0.0.3", json!({"cpu_clock_speed_mhz": 2500})),
        ];
        let outcome = select(&candidates, &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");
    }

    #[test]
    fn test_scored_candidate_beats_unscored() {
        let app = AppInfo::new(APP);
        let candidates = vec![
            probed("10.0.0.1", json!({"cpu_clock_speed_mhz": 3000})),
            probed("10.0.0.2", json!({"app_cache_total_score": 0.0})),
        ];
        let outcome = select(&candidates, &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");
    }

    #[test]
    fn test_nan_score_ignored() {
        let app = AppInfo::new(APP);
        let candidates = vec![
            probed("10.0.0.1", json!({"app_cache_total_score": "NaN"})),
            probed("10.0.0.2", json!({"app_cache_total_score": 0.2})),
        ];
        let outcome = select(&candidates, &app, None).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");
    }

    #[test]
    fn test_lowest_rtt_policy() {
        let app = AppInfo::new(APP);
        let candidates = vec![
            probed("10.0.0.1", json!({"dynamic_RTT": 40, "app_cache_total_score": 0.9})),
            probed("10.0.0.2", json!({"dynamic_RTT": 12})),
            probed("10.0.0.3", json!({"dynamic_RTT": 12})),
        ];
        let outcome = select(&candidates, &app, Some(SelectionPolicy::LowestRtt.strategy())).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");
    }

    #[test]
    fn test_custom_strategy() {
        let app = AppInfo::new(APP);
        let candidates = vec![candidate("10.0.0.1"), candidate("10.0.0.2")];
        let last = from_fn("last", |candidates, _app| candidates.last());

        let outcome = select(&candidates, &app, Some(&last)).unwrap();
        assert_eq!(chosen_host(&outcome), "10.0.0.2");

        let never = from_fn("never", |_candidates, _app| None);
        let outcome = select(&candidates, &app, Some(&never)).unwrap();
        assert!(outcome.is_none_available());
    }

    #[test]
    fn test_policy_serialization() {
        let json = serde_json::to_string(&SelectionPolicy::LowestRtt).unwrap();
        assert_eq!(json, "\"lowest-rtt\"");
        assert_eq!(SelectionPolicy::default(), SelectionPolicy::CacheAffinity);
        assert_eq!(SelectionPolicy::CacheAffinity.strategy().name(), "cache-affinity");
    }
}
