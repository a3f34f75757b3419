//! Training status and checkpoint metadata containers.
//!
//! These are plain serde types keyed by the same names as the metric
//! registries they describe. Writing them anywhere is up to the caller.

use crate::training::metrics::{MetricRegistry, MetricValue};
use crate::training::update::TensorData;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metric values keyed by registry name, in registry order.
pub type MetricValues = IndexMap<String, MetricValue>;

fn capture(metrics: &MetricRegistry) -> MetricValues {
    metrics
        .iter()
        .map(|(name, metric)| (name.to_string(), metric.value()))
        .collect()
}

/// Where the loop is and what its metrics read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub epoch: usize,
    pub iteration: usize,
    pub split: String,
    pub metric: MetricValues,
    pub eval_metric: MetricValues,
}

impl TrainingStatus {
    pub fn new(epoch: usize, iteration: usize, split: impl Into<String>) -> Self {
        Self {
            epoch,
            iteration,
            split: split.into(),
            metric: MetricValues::new(),
            eval_metric: MetricValues::new(),
        }
    }

    /// Record the live values of the training and evaluation metrics.
    pub fn with_metrics(mut self, train: &MetricRegistry, eval: &MetricRegistry) -> Self {
        self.metric = capture(train);
        self.eval_metric = capture(eval);
        self
    }
}

/// Metadata stored next to a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetaInfo {
    pub id: String,
    pub status: TrainingStatus,
    pub timestamp: DateTime<Utc>,
}

impl CheckpointMetaInfo {
    pub fn new(status: TrainingStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status,
            timestamp: Utc::now(),
        }
    }
}

/// Random generator state to restore alongside a checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    #[serde(default)]
    pub state: Option<serde_json::Value>,
}

/// Everything needed to resume training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedTrainingState {
    pub model: IndexMap<String, TensorData>,
    pub optimizer: IndexMap<String, TensorData>,
    #[serde(default)]
    pub scheduler: serde_json::Value,
    pub rng: RngState,
}
