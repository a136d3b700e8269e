//! Pausable periodic task driven by an external [`TickSource`].
//!
//! A [`PeriodicTask`] tracks three things independently of each other:
//! whether it holds a registration with the tick source (started), whether
//! delivered ticks should run its work (paused), and lifetime counters.
//!
//! ```text
//! Idle    --start()-->  Running
//! Running --pause()-->  Paused
//! Paused  --resume()--> Running
//! Running --stop()-->   Idle
//! Paused  --stop()-->   Idle
//! ```
//!
//! Transition methods never fail; they return `false` when they had no
//! effect. Failures raised by the work are caught at the tick handler,
//! handed to a [`FailureReporter`], and never reach the tick source.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace};

use tickwork_core::{TickerError, WorkExecutionError};

use crate::report::{FailureReporter, TracingReporter};
use crate::source::{Interval, Registration, TickHandler, TickSource};
use crate::types::{TaskSnapshot, TaskStatus};


static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// The unit of work a task runs on each active tick.
///
/// The provided `run` does nothing, so a type only needs to override it
/// to become runnable work. Closures returning `anyhow::Result<()>` are
/// `TickWork` as well.
pub trait TickWork {
    fn run(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<F> TickWork for F
where
    F: FnMut() -> anyhow::Result<()>,
{
    fn run(&mut self) -> anyhow::Result<()> {
        self()
    }
}

/// Work used when a task is built without any.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWork;

impl TickWork for NoWork {}

/// Something that can be paused and resumed.
pub trait Pausable {
    fn is_paused(&self) -> bool;

    /// Returns true if the state changed to paused.
    fn pause(&self) -> bool;

    /// Returns true if the state changed to running.
    fn resume(&self) -> bool;

    /// `pause()` when `paused` is true, `resume()` otherwise.
    fn set_paused(&self, paused: bool) -> bool {
        if paused {
            self.pause()
        } else {
            self.resume()
        }
    }
}

/// State reachable from the tick handler.
struct Shared {
    name: String,
    paused: Cell<bool>,
    /// Bumped on every start/stop so handlers from an old registration go quiet.
    generation: Cell<u64>,
    total_ticks: Cell<u64>,
    executed_ticks: Cell<u64>,
    last_execution: Cell<Option<DateTime<Utc>>>,
    /// Taken out while the work runs.
    work: RefCell<Option<Box<dyn TickWork>>>,
    reporter: Rc<dyn FailureReporter>,
}

impl Shared {
    fn on_tick(&self) {
        let tick = self.total_ticks.get() + 1;
        self.total_ticks.set(tick);
        if self.paused.get() {
            trace!(task = %self.name, tick, "Tick skipped (paused)");
            return;
        }

        let Some(mut work) = self.work.borrow_mut().take() else {
            trace!(task = %self.name, tick, "Tick skipped (work already running)");
            return;
        };
        self.executed_ticks.set(self.executed_ticks.get() + 1);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work.run()));
        *self.work.borrow_mut() = Some(work);

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(WorkExecutionError::failed(self.name.as_str(), tick, err)),
            Err(payload) => Some(WorkExecutionError::panicked(self.name.as_str(), tick, &*payload)),
        };
        if let Some(failure) = failure {
            self.reporter.report(&failure);
        }

        self.last_execution.set(Some(Utc::now()));
    }
}

/// A unit of work invoked by an external tick source after an initial
/// delay, then on a fixed interval (or once), which can be started,
/// stopped, paused and resumed at any time.
///
/// Counters are lifetime totals: stopping and restarting a task keeps
/// accumulating into them.
///
/// A task should be stopped before it is dropped; dropping a started task
/// cancels its registration.
pub struct PeriodicTask {
    source: Rc<dyn TickSource>,
    delay: u64,
    interval: Interval,
    registration: RefCell<Option<Rc<dyn Registration>>>,
    shared: Rc<Shared>,
}

impl PeriodicTask {
    /// Create a task with the default name and reporter.
    ///
    /// `interval` is normalized so that any negative value means one-shot.
    /// Without `work` the task runs [`NoWork`].
    pub fn new(
        source: Rc<dyn TickSource>,
        delay: u64,
        interval: i64,
        work: Option<Box<dyn TickWork>>,
    ) -> Self {
        Self::assemble(None, source, delay, Interval::from(interval), work, None)
    }

    /// A task that runs once after `delay` ticks.
    pub fn once(source: Rc<dyn TickSource>, delay: u64, work: impl TickWork + 'static) -> Self {
        Self::assemble(None, source, delay, Interval::Once, Some(Box::new(work)), None)
    }

    /// A task that runs after `delay` ticks, then every `interval` ticks.
    ///
    /// Snapshots report an `interval` above `i64::MAX` as `i64::MAX`;
    /// delivery still uses the full `u64`.
    pub fn repeating(
        source: Rc<dyn TickSource>,
        delay: u64,
        interval: u64,
        work: impl TickWork + 'static,
    ) -> Self {
        Self::assemble(None, source, delay, Interval::Every(interval), Some(Box::new(work)), None)
    }

    pub fn builder() -> PeriodicTaskBuilder {
        PeriodicTaskBuilder::default()
    }

    fn assemble(
        name: Option<String>,
        source: Rc<dyn TickSource>,
        delay: u64,
        interval: Interval,
        work: Option<Box<dyn TickWork>>,
        reporter: Option<Rc<dyn FailureReporter>>,
    ) -> Self {
        let name = name.unwrap_or_else(|| {
            format!("task-{}", NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
        });
        Self {
            source,
            delay,
            interval,
            registration: RefCell::new(None),
            shared: Rc::new(Shared {
                name,
                paused: Cell::new(true),
                generation: Cell::new(0),
                total_ticks: Cell::new(0),
                executed_ticks: Cell::new(0),
                last_execution: Cell::new(None),
                work: RefCell::new(Some(work.unwrap_or_else(|| Box::new(NoWork) as Box<dyn TickWork>))),
                reporter: reporter.unwrap_or_else(|| Rc::new(TracingReporter) as Rc<dyn FailureReporter>),
            }),
        }
    }

    /// Register with the tick source and start running work.
    ///
    /// Returns false if the task was already started.
    pub fn start(&self) -> bool {
        if self.is_started() {
            return false;
        }

        let generation = self.shared.generation.get() + 1;
        self.shared.generation.set(generation);

        let shared: Weak<Shared> = Rc::downgrade(&self.shared);
        let handler: TickHandler = Rc::new(move || {
            if let Some(shared) = shared.upgrade() {
                if shared.generation.get() == generation {
                    shared.on_tick();
                }
            }
        });
        let registration = self.source.register(self.delay, self.interval, handler);

        info!(
            task = %self.shared.name,
            registration = %registration.id(),
            delay = self.delay,
            interval = %self.interval,
            "Task started"
        );
        *self.registration.borrow_mut() = Some(registration);
        self.shared.paused.set(false);
        true
    }

    /// Cancel the registration. A stopped task reads as paused.
    ///
    /// Returns false if the task was not started.
    pub fn stop(&self) -> bool {
        let Some(registration) = self.registration.borrow_mut().take() else {
            return false;
        };
        registration.cancel();
        self.shared.generation.set(self.shared.generation.get() + 1);
        self.shared.paused.set(true);

        info!(
            task = %self.shared.name,
            registration = %registration.id(),
            total_ticks = self.total_ticks(),
            executed_ticks = self.executed_ticks(),
            "Task stopped"
        );
        true
    }

    /// Stop counting ticks as executions. The registration stays live.
    ///
    /// Returns false if not started or already paused.
    pub fn pause(&self) -> bool {
        if !self.is_started() || self.shared.paused.get() {
            return false;
        }
        self.shared.paused.set(true);
        debug!(task = %self.shared.name, "Task paused");
        true
    }

    /// Returns false if not started or not paused.
    pub fn resume(&self) -> bool {
        if !self.is_started() || !self.shared.paused.get() {
            return false;
        }
        self.shared.paused.set(false);
        debug!(task = %self.shared.name, "Task resumed");
        true
    }

    pub fn set_paused(&self, paused: bool) -> bool {
        Pausable::set_paused(self, paused)
    }

    pub fn is_started(&self) -> bool {
        self.registration.borrow().is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.get()
    }

    pub fn status(&self) -> TaskStatus {
        match (self.is_started(), self.is_paused()) {
            (false, _) => TaskStatus::Idle,
            (true, true) => TaskStatus::Paused,
            (true, false) => TaskStatus::Running,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn tick_source(&self) -> &Rc<dyn TickSource> {
        &self.source
    }

    /// Every tick delivered to this task, paused or not.
    pub fn total_ticks(&self) -> u64 {
        self.shared.total_ticks.get()
    }

    /// Ticks on which the work actually ran.
    pub fn executed_ticks(&self) -> u64 {
        self.shared.executed_ticks.get()
    }

    /// When the work last finished running.
    pub fn last_execution(&self) -> Option<DateTime<Utc>> {
        self.shared.last_execution.get()
    }

    /// The live registration, present exactly while started.
    pub fn registration(&self) -> Option<Rc<dyn Registration>> {
        self.registration.borrow().clone()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            name: self.shared.name.clone(),
            delay: self.delay,
            interval: self.interval.as_raw(),
            status: self.status(),
            total_ticks: self.total_ticks(),
            executed_ticks: self.executed_ticks(),
            last_execution: self.last_execution(),
            registration: self.registration.borrow().as_ref().map(|r| r.id()),
        }
    }
}

impl Pausable for PeriodicTask {
    fn is_paused(&self) -> bool {
        PeriodicTask::is_paused(self)
    }

    fn pause(&self) -> bool {
        PeriodicTask::pause(self)
    }

    fn resume(&self) -> bool {
        PeriodicTask::resume(self)
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.get_mut().take() {
            registration.cancel();
            debug!(task = %self.shared.name, "Dropped a started task, registration cancelled");
        }
    }
}

impl fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.shared.name)
            .field("delay", &self.delay)
            .field("interval", &self.interval)
            .field("status", &self.status())
            .field("total_ticks", &self.total_ticks())
            .field("executed_ticks", &self.executed_ticks())
            .finish()
    }
}

/// Builder for tasks that need a name or a custom reporter.
#[derive(Default)]
pub struct PeriodicTaskBuilder {
    name: Option<String>,
    source: Option<Rc<dyn TickSource>>,
    delay: u64,
    interval: Option<Interval>,
    work: Option<Box<dyn TickWork>>,
    reporter: Option<Rc<dyn FailureReporter>>,
}

impl PeriodicTaskBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tick_source(mut self, source: Rc<dyn TickSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }

    /// Negative values mean one-shot, which is also the default.
    pub fn interval(mut self, interval: i64) -> Self {
        self.interval = Some(Interval::from(interval));
        self
    }

    pub fn work(mut self, work: impl TickWork + 'static) -> Self {
        self.work = Some(Box::new(work));
        self
    }

    pub fn reporter(mut self, reporter: Rc<dyn FailureReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build(self) -> Result<PeriodicTask, TickerError> {
        let source = self
            .source
            .ok_or_else(|| TickerError::InvalidArgument("tick source cannot be absent".to_string()))?;
        Ok(PeriodicTask::assemble(
            self.name,
            source,
            self.delay,
            self.interval.unwrap_or(Interval::Once),
            self.work,
            self.reporter,
        ))
    }
}
