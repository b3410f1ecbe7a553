//! Timer queue - one-shot and repeating timers on simulated time
//!
//! Timers carry an arbitrary payload so each owner can tell its own timers
//! apart. Firing order is (deadline, id), which is deterministic.

use std::collections::BTreeMap;
use std::time::Duration;

use arlearn_core::{SimTime, TimerId};

/// Smallest repeat interval accepted; a zero interval would never let time advance
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug)]
struct Timer<T> {
    deadline: SimTime,
    interval: Option<Duration>,
    payload: T,
}

/// A timer that came due
#[derive(Clone, Debug, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    /// Deadline the timer fired at
    pub at: SimTime,
    pub payload: T,
}

/// Queue of pending timers
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: SimTime,
    next_id: u64,
    timers: BTreeMap<TimerId, Timer<T>>,
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        TimerQueue {
            now: SimTime::ZERO,
            next_id: 1,
            timers: BTreeMap::new(),
        }
    }

    /// Schedule a timer that fires once after `delay`
    pub fn schedule_once(&mut self, delay: Duration, payload: T) -> TimerId {
        self.insert(delay, None, payload)
    }

    /// Schedule a timer that fires every `interval` until cancelled
    pub fn schedule_repeating(&mut self, interval: Duration, payload: T) -> TimerId {
        let interval = interval.max(MIN_INTERVAL);
        self.insert(interval, Some(interval), payload)
    }

    fn insert(&mut self, delay: Duration, interval: Option<Duration>, payload: T) -> TimerId {
        let id = TimerId::new(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            id,
            Timer {
                deadline: self.now.saturating_add(delay),
                interval,
                payload,
            },
        );
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<SimTime> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Time from now until the earliest pending deadline
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline().map(|d| self.now.until(d))
    }

    /// Advance queue time by `dt`, returning every timer that came due in
    /// firing order. Repeating timers may fire several times in one call.
    pub fn advance(&mut self, dt: Duration) -> Vec<Fired<T>> {
        let target = self.now.saturating_add(dt);
        let mut fired = Vec::new();

        while let Some((id, deadline)) = self.earliest() {
            if deadline > target {
                break;
            }
            self.now = deadline;

            let reschedule = match self.timers.get_mut(&id) {
                Some(timer) => {
                    fired.push(Fired {
                        id,
                        at: deadline,
                        payload: timer.payload.clone(),
                    });
                    match timer.interval {
                        Some(interval) => {
                            // a deadline pinned at the end of time fires once
                            let next = deadline.saturating_add(interval);
                            timer.deadline = next;
                            next > deadline
                        }
                        None => false,
                    }
                }
                None => false,
            };

            if !reschedule {
                self.timers.remove(&id);
            }
        }

        self.now = target;
        fired
    }

    fn earliest(&self) -> Option<(TimerId, SimTime)> {
        self.timers
            .iter()
            .map(|(id, t)| (*id, t.deadline))
            .min_by_key(|(id, deadline)| (*deadline, *id))
    }

    /// Cancel every timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl<T: Clone> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
