//! Where work failures go once the tick handler has caught them.

use std::cell::RefCell;

use tracing::error;

use tickwork_core::WorkExecutionError;

/// Receives every failure a task's work raises.
///
/// Reporters must not panic; whatever they do, the task keeps ticking.
pub trait FailureReporter {
    fn report(&self, failure: &WorkExecutionError);
}

/// Default reporter: logs the failure with its context chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &WorkExecutionError) {
        error!(
            task = %failure.task,
            tick = failure.tick,
            panicked = failure.is_panic(),
            "Work execution failed: {}",
            failure.kind
        );
    }
}

/// Keeps a rendered copy of every reported failure.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    failures: RefCell<Vec<ReportedFailure>>,
}

/// A failure as seen by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedFailure {
    pub task: String,
    pub tick: u64,
    pub panicked: bool,
    pub message: String,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<ReportedFailure> {
        self.failures.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.failures.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.borrow().is_empty()
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, failure: &WorkExecutionError) {
        self.failures.borrow_mut().push(ReportedFailure {
            task: failure.task.clone(),
            tick: failure.tick,
            panicked: failure.is_panic(),
            message: failure.kind.to_string(),
        });
    }
}
