//! Fixed-cadence host loop that feeds a [`ManualTickSource`].

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use tickwork_scheduler::{ManualTickSource, PeriodicTask};

/// How a run of the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    pub ticks_delivered: u64,
    pub handler_calls: usize,
    pub interrupted: bool,
}

/// Delivers `ticks` ticks, one every `period`, pausing and resuming the
/// task at the configured ticks.
#[derive(Debug, Clone)]
pub struct TickLoop {
    period: Duration,
    ticks: u64,
    pause_at: Option<u64>,
    resume_at: Option<u64>,
}

impl TickLoop {
    pub fn new(period: Duration, ticks: u64) -> Self {
        Self {
            period,
            ticks,
            pause_at: None,
            resume_at: None,
        }
    }

    pub fn pause_at(mut self, tick: Option<u64>) -> Self {
        self.pause_at = tick;
        self
    }

    pub fn resume_at(mut self, tick: Option<u64>) -> Self {
        self.resume_at = tick;
        self
    }

    /// Run until all ticks are delivered or `shutdown` completes.
    pub async fn run<F>(&self, source: &ManualTickSource, task: &PeriodicTask, shutdown: F) -> LoopOutcome
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        // Late ticks are delivered back to back so the tick count keeps up with wall time.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        tokio::pin!(shutdown);

        let mut outcome = LoopOutcome {
            ticks_delivered: 0,
            handler_calls: 0,
            interrupted: false,
        };

        while outcome.ticks_delivered < self.ticks {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(tick = source.current_tick(), "Shutdown requested, leaving tick loop");
                    outcome.interrupted = true;
                    break;
                }
                _ = interval.tick() => {}
            }

            let next = source.current_tick() + 1;
            if self.pause_at == Some(next) && task.pause() {
                info!(tick = next, task = task.name(), "Paused task");
            }
            if self.resume_at == Some(next) && task.resume() {
                info!(tick = next, task = task.name(), "Resumed task");
            }

            outcome.handler_calls += source.advance();
            outcome.ticks_delivered += 1;
            debug!(tick = next, status = %task.status(), "Tick delivered");
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[tokio::test]
    async fn delivers_requested_ticks() {
        let source = Rc::new(ManualTickSource::new());
        let task = PeriodicTask::new(source.clone(), 0, 1, None);
        task.start();

        let outcome = TickLoop::new(Duration::from_millis(1), 5)
            .run(&source, &task, std::future::pending())
            .await;

        assert_eq!(outcome.ticks_delivered, 5);
        assert_eq!(outcome.handler_calls, 5);
        assert!(!outcome.interrupted);
        assert_eq!(task.executed_ticks(), 5);
        assert_eq!(source.current_tick(), 5);
    }

    #[tokio::test]
    async fn pauses_and_resumes_at_configured_ticks() {
        let source = Rc::new(ManualTickSource::new());
        let task = PeriodicTask::new(source.clone(), 0, 1, None);
        task.start();

        TickLoop::new(Duration::from_millis(1), 10)
            .pause_at(Some(3))
            .resume_at(Some(7))
            .run(&source, &task, std::future::pending())
            .await;

        // Ticks 3..=6 arrive while paused.
        assert_eq!(task.total_ticks(), 10);
        assert_eq!(task.executed_ticks(), 6);
        assert!(!task.is_paused());
    }

    #[tokio::test]
    async fn shutdown_interrupts_the_loop() {
        let source = Rc::new(ManualTickSource::new());
        let task = PeriodicTask::new(source.clone(), 0, 1, None);
        task.start();

        let outcome = TickLoop::new(Duration::from_millis(1), 1_000)
            .run(&source, &task, async {})
            .await;

        assert!(outcome.interrupted);
        assert_eq!(outcome.ticks_delivered, 0);
        assert_eq!(task.total_ticks(), 0);
    }
}
