//! Evaluation callbacks: early stopping and best-checkpoint selection.

use crate::error::MlError;
use crate::training::control::{StepFlow, TerminateExecution};
use crate::training::snapshot::MetricSnapshot;
use std::ops::ControlFlow;

/// Action a callback can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    Stop,
    Checkpoint,
}

impl CallbackAction {
    /// Loop control for this action; `Stop` becomes a termination request.
    pub fn flow(&self) -> StepFlow {
        match self {
            Self::Stop => ControlFlow::Break(TerminateExecution::with_reason("stopped by callback")),
            Self::Continue | Self::Checkpoint => ControlFlow::Continue(()),
        }
    }
}

/// Trait for evaluation callbacks.
pub trait TrainingCallback: Send + Sync {
    /// Called after each evaluation with the freshly captured snapshot.
    fn on_evaluation(&mut self, snapshot: &MetricSnapshot) -> Result<CallbackAction, MlError>;
}

/// Stop after `patience` evaluations without a strictly better snapshot.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    pub patience: usize,
    counter: usize,
    best: Option<MetricSnapshot>,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            counter: 0,
            best: None,
        }
    }

    pub fn best(&self) -> Option<&MetricSnapshot> {
        self.best.as_ref()
    }
}

impl TrainingCallback for EarlyStopping {
    fn on_evaluation(&mut self, snapshot: &MetricSnapshot) -> Result<CallbackAction, MlError> {
        let improved = match &self.best {
            None => true,
            Some(best) => snapshot.is_better_than(best)?,
        };
        if improved {
            self.best = Some(snapshot.clone());
            self.counter = 0;
            return Ok(CallbackAction::Continue);
        }
        self.counter += 1;
        if self.counter >= self.patience {
            tracing::info!(patience = self.patience, "Early stopping: no improvement");
            Ok(CallbackAction::Stop)
        } else {
            Ok(CallbackAction::Continue)
        }
    }
}

/// Requests a checkpoint whenever the snapshot beats the best one seen so far.
#[derive(Debug, Clone, Default)]
pub struct BestCheckpoint {
    best: Option<MetricSnapshot>,
    improvements: usize,
}

impl BestCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self) -> Option<&MetricSnapshot> {
        self.best.as_ref()
    }

    /// How many times a new best was recorded.
    pub fn improvements(&self) -> usize {
        self.improvements
    }
}

impl TrainingCallback for BestCheckpoint {
    fn on_evaluation(&mut self, snapshot: &MetricSnapshot) -> Result<CallbackAction, MlError> {
        let improved = match &self.best {
            None => true,
            Some(best) => snapshot.is_better_than(best)?,
        };
        if !improved {
            return Ok(CallbackAction::Continue);
        }
        self.best = Some(snapshot.clone());
        self.improvements += 1;
        tracing::debug!(improvements = self.improvements, "New best snapshot");
        Ok(CallbackAction::Checkpoint)
    }
}
