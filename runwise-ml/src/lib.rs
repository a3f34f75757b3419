//! # runwise-ml: registries, metric snapshots and progress for training loops
//!
//! This crate holds the bookkeeping a training loop needs around its model:
//!
//! 1. **Registries**: user input given as a single item, a list, or a keyed
//!    map becomes an ordered [`Registry`] with unique, deterministic keys.
//! 2. **Metric snapshots**: captured metric values ordered lexicographically
//!    by registry position, used to decide whether an evaluation improved.
//! 3. **Loop plumbing**: metric updates from model outputs, progress and
//!    throughput, cooperative termination, status containers.

// Foundation
pub mod config;
pub mod error;
pub mod logging;

// Registries and instance resolution
pub mod instance;
pub mod registry;

// Training support
pub mod training;

// Terminal output
pub mod display;

// Re-exports
pub use config::RunwiseConfig;
pub use error::MlError;
pub use registry::{Named, Registry, RegistrySpec, normalize, to_dict};
pub use training::{Metric, MetricRegistry, MetricSnapshot, ProgressTracker, TerminateExecution};
