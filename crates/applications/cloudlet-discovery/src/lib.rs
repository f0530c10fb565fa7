//! # Cloudlet Discovery
//!
//! Finds the best nearby cloudlet for a mobile client and an application.
//!
//! ## Architecture
//!
//! ```text
//! Mobile client                 Directory server
//! ├── ClientInfo  ──────────►   /api/v1/Cloudlet/search/   (coarse shortlist)
//! └── AppInfo                          │
//!        │                             ▼
//!        │                  candidates [c0, c1, ... cN]
//!        │                             │
//!        └──────────► probe fan-out (one bounded probe per candidate)
//!                                      │
//!                                      ▼
//!                     SelectionStrategy  ──►  Selected | NoneAvailable
//! ```
//!
//! Discovery runs in two phases:
//!
//! 1. **Directory**: ask a central server for up to `n` cloudlets near the
//!    client (GPS coordinates, then client IP, then the observed address)
//! 2. **Probe**: ask every candidate concurrently for its live resources and
//!    cache state for this application; each probe has its own timeout
//!
//! A selection strategy then picks one cloudlet. The built-in
//! [`CacheAffinity`] policy applies the CPU clock floor and prefers the
//! highest cache score; callers can inject their own with
//! [`cloudlet_core::from_fn`].
//!
//! See [`orchestrator`] for the full flow.

#![warn(clippy::all)]

pub mod config;
pub mod directory;
pub mod error;
pub mod observe;
pub mod orchestrator;
pub mod probe;
pub mod prober;
pub mod select;

// Discovery orchestration
pub use orchestrator::{Discovery, DiscoveryPhaseTimes, DiscoveryReport, validate_directory_endpoint};

// Configuration
pub use config::DiscoveryConfig;

// Error handling
pub use error::{DiscoveryError, Result};

// Phase 1: directory
pub use directory::{DirectoryClient, LocationQuery, SEARCH_PATH};

// Phase 2: probing
pub use probe::{CloudletProbe, ProbeFailure, ProbeOutcome};
pub use prober::{ParallelProber, ProbeSummary};

// Selection
pub use select::{CacheAffinity, LowestRtt, SelectionPolicy, select};

// Observability
pub use observe::{DiscoveryObserver, DiscoveryPhase, NoopObserver, TracingObserver};
