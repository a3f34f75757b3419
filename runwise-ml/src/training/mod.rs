//! Training support: metrics, snapshots, progress and loop control.

pub mod average;
pub mod callbacks;
pub mod control;
pub mod metrics;
pub mod progress;
pub mod snapshot;
pub mod status;
pub mod update;

pub use average::{AverageRecorder, SingleAverageRecorder};
pub use callbacks::{BestCheckpoint, CallbackAction, EarlyStopping, TrainingCallback};
pub use control::{LoopOutcome, StepFlow, TerminateExecution, drive};
pub use metrics::{
    Accuracy, Direction, Metric, MetricNaming, MetricRegistry, MetricValue, RunningAverage,
    to_metric_dict,
};
pub use progress::ProgressTracker;
pub use snapshot::MetricSnapshot;
pub use status::{CheckpointMetaInfo, SavedTrainingState, TrainingStatus};
pub use update::{FieldValue, Record, TensorData, update_metrics};
