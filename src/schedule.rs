//! Repeating timers for continuous frame stepping.

use std::collections::BTreeMap;
use std::fmt;

use crate::InstanceId;

/// Interval between repeated steps while prev/next is held.
pub const STEP_INTERVAL_MS: u32 = 100;

/// Identifier of one repeating timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Source of repeating timer callbacks.
///
/// Each firing must come back to the control layer as a
/// [`ViewerEvent::Tick`](crate::ViewerEvent::Tick) carrying the instance
/// and timer id handed out here.
pub trait Scheduler {
    /// Start a timer that fires every `period_ms` for `instance`.
    fn set_interval(&mut self, instance: InstanceId, period_ms: u32) -> TimerId;

    /// Stop a timer. Unknown or already-cleared ids are ignored.
    fn clear_interval(&mut self, timer: TimerId);
}

#[derive(Clone, Debug)]
struct Interval {
    instance: InstanceId,
    period_ms: u64,
    next_due_ms: u64,
}

/// Virtual-clock scheduler.
///
/// Nothing fires on its own; the owner advances the clock and collects due
/// ticks one at a time, in timestamp order, so a tick handler that cancels
/// or restarts timers is observed by the very next lookup.
///
/// ```rust
/// use webp_player_ui::{InstanceId, ManualScheduler, Scheduler};
///
/// let mut clock = ManualScheduler::new();
/// let timer = clock.set_interval(InstanceId::new(0), 100);
///
/// let mut fired = 0;
/// while let Some((_, id)) = clock.pop_due(350) {
///     assert_eq!(id, timer);
///     fired += 1;
/// }
/// clock.settle(350);
/// assert_eq!(fired, 3); // 100, 200, 300
/// assert_eq!(clock.now_ms(), 350);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: u64,
    timers: BTreeMap<TimerId, Interval>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of running timers.
    pub fn active(&self) -> usize {
        self.timers.len()
    }

    /// Running timers belonging to `instance`.
    pub fn active_for(&self, instance: InstanceId) -> usize {
        self.timers
            .values()
            .filter(|interval| interval.instance == instance)
            .count()
    }

    /// Take the earliest tick due at or before `until_ms`.
    ///
    /// Moves the clock to that tick's timestamp and reschedules the timer
    /// one period later. Ties fire in timer creation order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(InstanceId, TimerId)> {
        let (id, interval) = self
            .timers
            .iter_mut()
            .filter(|(_, interval)| interval.next_due_ms <= until_ms)
            .min_by_key(|(id, interval)| (interval.next_due_ms, **id))?;

        self.now_ms = self.now_ms.max(interval.next_due_ms);
        interval.next_due_ms += interval.period_ms;
        Some((interval.instance, *id))
    }

    /// Move the clock forward to `until_ms` without firing anything.
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

impl Scheduler for ManualScheduler {
    fn set_interval(&mut self, instance: InstanceId, period_ms: u32) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let period_ms = u64::from(period_ms.max(1));
        self.timers.insert(
            id,
            Interval {
                instance,
                period_ms,
                next_due_ms: self.now_ms + period_ms,
            },
        );
        id
    }

    fn clear_interval(&mut self, timer: TimerId) {
        self.timers.remove(&timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_timestamp_order() {
        let mut clock = ManualScheduler::new();
        let a = clock.set_interval(InstanceId::new(0), 100);
        let b = clock.set_interval(InstanceId::new(1), 150);

        let mut order = Vec::new();
        while let Some((_, id)) = clock.pop_due(300) {
            order.push((clock.now_ms(), id));
        }
        assert_eq!(
            order,
            vec![(100, a), (150, b), (200, a), (300, a), (300, b)]
        );
    }

    #[test]
    fn cleared_timer_stops() {
        let mut clock = ManualScheduler::new();
        let id = clock.set_interval(InstanceId::new(0), 100);
        assert!(clock.pop_due(100).is_some());
        clock.clear_interval(id);
        assert!(clock.pop_due(1_000).is_none());
        assert_eq!(clock.active(), 0);
        // clearing twice is harmless
        clock.clear_interval(id);
    }

    #[test]
    fn new_timer_starts_from_now() {
        let mut clock = ManualScheduler::new();
        clock.settle(250);
        clock.set_interval(InstanceId::new(4), 100);
        assert!(clock.pop_due(349).is_none());
        assert!(clock.pop_due(350).is_some());
        assert_eq!(clock.active_for(InstanceId::new(4)), 1);
        assert_eq!(clock.active_for(InstanceId::new(5)), 0);
    }

    #[test]
    fn settle_never_rewinds() {
        let mut clock = ManualScheduler::new();
        clock.settle(500);
        clock.settle(100);
        assert_eq!(clock.now_ms(), 500);
    }
}
