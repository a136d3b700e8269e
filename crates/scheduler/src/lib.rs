//! Pausable periodic tasks for tick-driven hosts.
//!
//! A [`PeriodicTask`] registers with a host-provided [`TickSource`] and can
//! be started, stopped, paused and resumed independently, while keeping
//! lifetime tick counters. [`ManualTickSource`] is a deterministic tick
//! source for tests and for hosts that own their loop.

pub mod manual;
pub mod report;
pub mod source;
pub mod task;
pub mod types;

pub use manual::ManualTickSource;
pub use report::{FailureReporter, RecordingReporter, ReportedFailure, TracingReporter};
pub use source::{Interval, Registration, RegistrationId, TickHandler, TickSource};
pub use task::{NoWork, Pausable, PeriodicTask, PeriodicTaskBuilder, TickWork};
pub use types::{TaskSnapshot, TaskStatus};
