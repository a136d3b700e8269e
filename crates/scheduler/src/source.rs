//! Capability interface to the host's tick scheduler.
//!
//! A [`PeriodicTask`](crate::PeriodicTask) never talks to a concrete
//! scheduler. It registers a handler through [`TickSource`] and keeps the
//! returned [`Registration`] for as long as it is started.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Callback invoked once per delivered tick.
///
/// Shared and `Fn` so a source may deliver a tick while an earlier delivery
/// to the same handler is still on the stack.
pub type TickHandler = Rc<dyn Fn()>;

/// Spacing between deliveries of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Interval {
    /// Deliver exactly one tick after the initial delay.
    Once,
    /// Deliver a tick every `n` ticks after the initial delay.
    /// Reported as `i64::MAX` by [`as_raw`](Self::as_raw) above that value.
    Every(u64),
}

impl Interval {
    /// Raw value reserved for [`Interval::Once`].
    pub const ONE_SHOT_SENTINEL: i64 = -1;

    /// The `i64` form used by configs and snapshots. `Every(n)` with
    /// `n > i64::MAX` saturates to `i64::MAX`.
    pub fn as_raw(self) -> i64 {
        match self {
            Interval::Once => Self::ONE_SHOT_SENTINEL,
            Interval::Every(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }

    pub fn is_once(self) -> bool {
        matches!(self, Interval::Once)
    }
}

/// Normalizes like `max(raw, -1)`: every negative value becomes `Once`.
impl From<i64> for Interval {
    fn from(raw: i64) -> Self {
        if raw < 0 {
            Interval::Once
        } else {
            Interval::Every(raw as u64)
        }
    }
}

impl From<Interval> for i64 {
    fn from(interval: Interval) -> Self {
        interval.as_raw()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Once => write!(f, "once"),
            Interval::Every(n) => write!(f, "every {} ticks", n),
        }
    }
}

/// Identifier a tick source assigns to each registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(pub u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reg-{}", self.0)
    }
}

/// A live subscription to tick delivery.
pub trait Registration {
    fn id(&self) -> RegistrationId;

    /// Stop further delivery. Calling it again has no effect.
    fn cancel(&self);

    /// False once cancelled, or once a one-shot registration has fired.
    fn is_active(&self) -> bool;
}

/// The external scheduler that delivers ticks.
///
/// Implementations must deliver ticks sequentially on one thread, and must
/// tolerate `cancel` being called from inside a handler they are running.
pub trait TickSource {
    /// Schedule `handler` to run after `delay` ticks, then on every
    /// `interval` (or once, for [`Interval::Once`]).
    fn register(&self, delay: u64, interval: Interval, handler: TickHandler) -> Rc<dyn Registration>;
}
