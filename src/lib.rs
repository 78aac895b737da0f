//! varnish-agent Library
//!
//! Settings for a Varnish agent: the discovery-service address and backend
//! service tag, plus an ordered record of the VCL files it has generated.

pub mod config;
pub mod registry;
pub mod vcl;

pub use config::{ConfigManager, Settings};
pub use registry::{ArtifactRegistry, SharedArtifactRegistry};
pub use vcl::VclWriter;

/// Common error type for the agent
pub type Result<T> = anyhow::Result<T>;
