//! The world around the scoring engine: config, artifact loading, probes and sinks.
//!
//! Filesystem artifact loading and report writing, capability probes backed
//! by recorded results or pattern-based test discovery, Swagger operation
//! counting, and tool configuration.

pub mod config;
pub mod error;
pub mod loader;
pub mod mock;
pub mod pattern;
pub mod recorded;
pub mod sink;
pub mod swagger;

pub use config::{load_config_from, RubricforgeConfig};
pub use error::ProbeError;
pub use loader::{discover_batch_inputs, FsArtifactLoader};
pub use pattern::PatternTestRunner;
pub use recorded::RecordedProbes;
pub use sink::FsReportSink;
