//! Deterministic, in-process tick source.
//!
//! Ticks are delivered only when the owner calls [`ManualTickSource::advance`],
//! which makes it the tick source of choice for tests and for hosts that
//! already run their own game/server loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::source::{Interval, Registration, RegistrationId, TickHandler, TickSource};

struct Entry {
    id: RegistrationId,
    interval: Interval,
    next_run: Cell<u64>,
    active: Cell<bool>,
    handler: TickHandler,
}

impl Registration for Entry {
    fn id(&self) -> RegistrationId {
        self.id
    }

    fn cancel(&self) {
        if self.active.replace(false) {
            debug!("Cancelled registration {}", self.id);
        }
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

#[derive(Default)]
struct Registry {
    current_tick: u64,
    next_id: u64,
    entries: Vec<Rc<Entry>>,
}

/// A tick source driven by explicit calls to [`advance`](Self::advance).
///
/// Scheduling rules:
/// - a registration made at tick `T` with delay `d` first fires at `T + max(d, 1)`
/// - repeating registrations then fire every `max(interval, 1)` ticks
/// - one-shot registrations fire once and go inactive
/// - due registrations fire in registration order
/// - `advance()` called from inside a handler is ignored and returns 0
#[derive(Default)]
pub struct ManualTickSource {
    registry: RefCell<Registry>,
    delivering: Cell<bool>,
}

/// Clears the delivering flag when dispatch ends, including by unwinding.
struct Delivering<'a>(&'a Cell<bool>);

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks delivered so far.
    pub fn current_tick(&self) -> u64 {
        self.registry.borrow().current_tick
    }

    /// Number of registrations that may still fire.
    pub fn active_registrations(&self) -> usize {
        self.registry
            .borrow()
            .entries
            .iter()
            .filter(|e| e.active.get())
            .count()
    }

    /// Deliver one tick. Returns how many handlers were invoked.
    pub fn advance(&self) -> usize {
        if self.delivering.replace(true) {
            warn!("Re-entrant advance() from inside a tick handler ignored");
            return 0;
        }
        let _delivering = Delivering(&self.delivering);

        let (tick, due) = {
            let mut registry = self.registry.borrow_mut();
            registry.current_tick += 1;
            let tick = registry.current_tick;
            registry.entries.retain(|e| e.active.get());
            let due: Vec<Rc<Entry>> = registry
                .entries
                .iter()
                .filter(|e| e.next_run.get() <= tick)
                .cloned()
                .collect();
            (tick, due)
        };

        let mut fired = 0;
        for entry in due {
            // An earlier handler this tick may have cancelled it.
            if !entry.active.get() {
                continue;
            }
            match entry.interval {
                Interval::Once => entry.active.set(false),
                Interval::Every(n) => entry.next_run.set(tick + n.max(1)),
            }
            (entry.handler)();
            fired += 1;
        }
        fired
    }

    /// Deliver `ticks` ticks. Returns the total number of handler invocations.
    pub fn advance_by(&self, ticks: u64) -> usize {
        (0..ticks).map(|_| self.advance()).sum()
    }
}

impl TickSource for ManualTickSource {
    fn register(&self, delay: u64, interval: Interval, handler: TickHandler) -> Rc<dyn Registration> {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let entry = Rc::new(Entry {
            id: RegistrationId(registry.next_id),
            interval,
            next_run: Cell::new(registry.current_tick + delay.max(1)),
            active: Cell::new(true),
            handler,
        });
        debug!(
            "Registered {} at tick {} (delay: {}, {})",
            entry.id, registry.current_tick, delay, interval
        );
        registry.entries.push(Rc::clone(&entry));
        entry
    }
}
