//! End-to-end lifecycle tests driving several tasks through one
//! `ManualTickSource`, using only the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tickwork_scheduler::{
    ManualTickSource, PeriodicTask, RecordingReporter, TaskStatus, TickSource,
};

fn log_work(log: &Rc<RefCell<Vec<(u64, &'static str)>>>, clock: &Rc<ManualTickSource>, label: &'static str)
    -> impl FnMut() -> anyhow::Result<()> + 'static
{
    let log = Rc::clone(log);
    let clock = Rc::clone(clock);
    move || {
        log.borrow_mut().push((clock.current_tick(), label));
        Ok(())
    }
}

#[test]
fn tasks_sharing_a_source_tick_independently() {
    let src = Rc::new(ManualTickSource::new());
    let log = Rc::new(RefCell::new(Vec::new()));

    let fast = PeriodicTask::repeating(src.clone(), 1, 1, log_work(&log, &src, "fast"));
    let slow = PeriodicTask::repeating(src.clone(), 2, 3, log_work(&log, &src, "slow"));
    let once = PeriodicTask::once(src.clone(), 4, log_work(&log, &src, "once"));
    fast.start();
    slow.start();
    once.start();

    src.advance_by(3);
    fast.pause();
    src.advance_by(5);

    assert_eq!(
        *log.borrow(),
        vec![
            (1, "fast"),
            (2, "fast"),
            (2, "slow"),
            (3, "fast"),
            (4, "once"),
            (5, "slow"),
            (8, "slow"),
        ]
    );
    assert_eq!(fast.total_ticks(), 8);
    assert_eq!(fast.executed_ticks(), 3);
    assert_eq!(fast.status(), TaskStatus::Paused);
    assert_eq!(slow.executed_ticks(), 3);
    assert_eq!(once.executed_ticks(), 1);
    assert_eq!(once.status(), TaskStatus::Running);
}

#[test]
fn failure_in_one_task_does_not_affect_another() {
    let src = Rc::new(ManualTickSource::new());
    let reporter = Rc::new(RecordingReporter::new());

    let broken = PeriodicTask::builder()
        .name("broken")
        .tick_source(src.clone())
        .interval(1)
        .work(|| -> anyhow::Result<()> { anyhow::bail!("always fails") })
        .reporter(reporter.clone())
        .build()
        .unwrap();
    let healthy_runs = Rc::new(Cell::new(0u32));
    let h = Rc::clone(&healthy_runs);
    let healthy = PeriodicTask::builder()
        .name("healthy")
        .tick_source(src.clone())
        .interval(1)
        .work(move || -> anyhow::Result<()> {
            h.set(h.get() + 1);
            Ok(())
        })
        .reporter(reporter.clone())
        .build()
        .unwrap();
    broken.start();
    healthy.start();

    assert_eq!(src.advance_by(4), 8);
    assert_eq!(healthy_runs.get(), 4);
    assert_eq!(broken.executed_ticks(), 4);
    assert!(broken.is_started());

    let failures = reporter.failures();
    assert_eq!(failures.len(), 4);
    assert!(failures.iter().all(|f| f.task == "broken"));
    assert_eq!(failures.iter().map(|f| f.tick).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
}

#[test]
fn work_can_schedule_follow_up_tasks() {
    let src = Rc::new(ManualTickSource::new());
    let follow_ups: Rc<RefCell<Vec<PeriodicTask>>> = Rc::new(RefCell::new(Vec::new()));
    let fired = Rc::new(Cell::new(0u32));

    let spawner = {
        let src_dyn: Rc<dyn TickSource> = src.clone();
        let follow_ups = Rc::clone(&follow_ups);
        let fired = Rc::clone(&fired);
        PeriodicTask::once(src.clone(), 1, move || -> anyhow::Result<()> {
            let fired = Rc::clone(&fired);
            let task = PeriodicTask::once(Rc::clone(&src_dyn), 2, move || -> anyhow::Result<()> {
                fired.set(fired.get() + 1);
                Ok(())
            });
            task.start();
            follow_ups.borrow_mut().push(task);
            Ok(())
        })
    };
    spawner.start();

    src.advance();
    assert_eq!(follow_ups.borrow().len(), 1);
    assert_eq!(fired.get(), 0);
    src.advance_by(2);
    assert_eq!(fired.get(), 1);
}

#[test]
fn stop_start_cycles_keep_lifetime_totals() {
    let src = Rc::new(ManualTickSource::new());
    let task = PeriodicTask::new(src.clone(), 0, 2, None);

    for _ in 0..3 {
        assert!(task.start());
        src.advance_by(4);
        assert!(task.stop());
        src.advance_by(4);
    }

    assert_eq!(task.total_ticks(), 6);
    assert_eq!(task.executed_ticks(), 6);
    assert_eq!(src.active_registrations(), 0);
    assert_eq!(task.status(), TaskStatus::Idle);
}
