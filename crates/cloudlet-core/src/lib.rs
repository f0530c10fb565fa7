//! Cloudlet Core - Shared types and traits
//!
//! This crate defines the core abstractions used across:
//! - cloudlet-discovery (directory query, probe fan-out, selection)
//! - provisioning collaborators (VM overlay synthesis, handoff)
//!
//! Key types:
//! - ClientInfo / AppInfo descriptors (open key-value maps with typed accessors)
//! - CandidateCloudlet and its per-application ResourceSnapshot
//! - SelectionStrategy trait (pluggable selection policy)
//! - Provisioner trait (collaborator interface, not called by discovery)
//! - Error types

pub mod cloudlet;
pub mod error;
pub mod keys;
pub mod traits;
pub mod types;

pub use cloudlet::*;
pub use error::*;
pub use traits::*;
pub use types::*;
