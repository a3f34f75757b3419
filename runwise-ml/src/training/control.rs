//! Cooperative early termination of training and evaluation loops.
//!
//! Stopping early is a normal outcome, not a failure: a step returns
//! `ControlFlow::Break(TerminateExecution)` and [`drive`] hands the signal back
//! to its caller as [`LoopOutcome::Terminated`]. Errors travel separately in
//! `Result`, so `?` never swallows a stop request.

use crate::error::MlError;
use std::fmt;
use std::ops::ControlFlow;
use tokio_util::sync::CancellationToken;

/// Request to unwind out of the running loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminateExecution {
    pub reason: Option<String>,
}

impl TerminateExecution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl fmt::Display for TerminateExecution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "execution terminated: {reason}"),
            None => write!(f, "execution terminated"),
        }
    }
}

/// What a single step asks the loop to do next.
pub type StepFlow = ControlFlow<TerminateExecution>;

/// How a driven loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    Completed { steps: usize },
    Terminated { steps: usize, signal: TerminateExecution },
}

impl LoopOutcome {
    /// Steps that ran, including the one that requested termination.
    pub fn steps(&self) -> usize {
        match self {
            Self::Completed { steps } | Self::Terminated { steps, .. } => *steps,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }

    /// Re-raise a termination in an enclosing loop's step.
    pub fn flow(&self) -> StepFlow {
        match self {
            Self::Completed { .. } => ControlFlow::Continue(()),
            Self::Terminated { signal, .. } => ControlFlow::Break(signal.clone()),
        }
    }
}

/// Run `step` over `items` until they run out, a step breaks, or `token` is
/// cancelled. The token is checked before each step.
pub fn drive<I, F>(items: I, token: &CancellationToken, mut step: F) -> Result<LoopOutcome, MlError>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<StepFlow, MlError>,
{
    let mut steps = 0;
    for item in items {
        if token.is_cancelled() {
            tracing::info!(steps, "Loop cancelled");
            return Ok(LoopOutcome::Terminated {
                steps,
                signal: TerminateExecution::with_reason("cancelled"),
            });
        }
        let flow = step(item)?;
        steps += 1;
        if let ControlFlow::Break(signal) = flow {
            tracing::info!(steps, reason = ?signal.reason, "Loop terminated early");
            return Ok(LoopOutcome::Terminated { steps, signal });
        }
    }
    Ok(LoopOutcome::Completed { steps })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_to_completion() {
        let token = CancellationToken::new();
        let mut total = 0;
        let outcome = drive(1..=4, &token, |x| {
            total += x;
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(outcome, LoopOutcome::Completed { steps: 4 });
        assert_eq!(total, 10);
    }

    #[test]
    fn test_break_stops_loop() {
        let token = CancellationToken::new();
        let outcome = drive(0..100, &token, |x| {
            if x == 2 {
                Ok(ControlFlow::Break(TerminateExecution::with_reason("enough")))
            } else {
                Ok(ControlFlow::Continue(()))
            }
        })
        .unwrap();
        assert_eq!(outcome.steps(), 3);
        assert!(outcome.is_terminated());
    }

    #[test]
    fn test_cancellation_checked_between_steps() {
        let token = CancellationToken::new();
        let outcome = drive(0..10, &token, |x| {
            if x == 1 {
                token.cancel();
            }
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
        assert_eq!(outcome.steps(), 2);
        assert!(outcome.is_terminated());
    }

    #[test]
    fn test_errors_propagate() {
        let token = CancellationToken::new();
        let result = drive(0..3, &token, |_| Err(MlError::config("bad batch")));
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_termination_propagates_through_nested_loops() {
        let token = CancellationToken::new();
        let mut inner_steps = 0;
        let outcome = drive(0..5, &token, |epoch| {
            let inner = drive(0..10, &token, |batch| {
                inner_steps += 1;
                if epoch == 1 && batch == 3 {
                    Ok(ControlFlow::Break(TerminateExecution::new()))
                } else {
                    Ok(ControlFlow::Continue(()))
                }
            })?;
            Ok(inner.flow())
        })
        .unwrap();
        assert_eq!(outcome.steps(), 2);
        assert_eq!(inner_steps, 14);
        assert_eq!(
            outcome,
            LoopOutcome::Terminated {
                steps: 2,
                signal: TerminateExecution::new()
            }
        );
    }
}
