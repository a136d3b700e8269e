use thiserror::Error;

#[derive(Error, Debug)]
pub enum TickerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// What went wrong inside a unit of work.
#[derive(Error, Debug)]
pub enum WorkFailure {
    #[error("work returned an error: {0:#}")]
    Failed(anyhow::Error),

    #[error("work panicked: {0}")]
    Panicked(String),
}

/// A failure raised by a task's work on a single tick.
///
/// These never leave the tick handler. They are handed to a reporter
/// and dropped, and the task keeps ticking.
#[derive(Error, Debug)]
#[error("task '{task}' failed on tick {tick}: {kind}")]
pub struct WorkExecutionError {
    /// Name of the task whose work failed.
    pub task: String,
    /// Value of the task's total tick counter when the failure happened.
    pub tick: u64,
    #[source]
    pub kind: WorkFailure,
}

impl WorkExecutionError {
    pub fn failed(task: impl Into<String>, tick: u64, err: anyhow::Error) -> Self {
        Self {
            task: task.into(),
            tick,
            kind: WorkFailure::Failed(err),
        }
    }

    /// Build from a `catch_unwind` payload, keeping the panic message when
    /// it is a string.
    pub fn panicked(task: impl Into<String>, tick: u64, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            task: task.into(),
            tick,
            kind: WorkFailure::Panicked(message),
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self.kind, WorkFailure::Panicked(_))
    }
}
