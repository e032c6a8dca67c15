//! Deadline timers for Horizon Select.
//!
//! Provides cancellable one-shot timers carrying a payload. The queue never
//! reads the clock itself: callers pass `now` to [`TimerQueue::schedule`] and
//! [`TimerQueue::expire`], which keeps auto-dismiss and debounce logic
//! deterministic under test.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TimerError};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a scheduled timer.
    pub struct TimerId;
}

/// Internal timer data.
struct TimerData<T> {
    /// When this timer should fire.
    deadline: Instant,
    /// The value handed back when the timer fires.
    payload: T,
}

/// An entry in the timer queue (min-heap by deadline, then schedule order).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    deadline: Instant,
    seq: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A queue of one-shot timers, each carrying a payload of type `T`.
///
/// Cancelled timers are removed from the slot map immediately and skipped
/// lazily when they reach the front of the heap.
pub struct TimerQueue<T> {
    /// All pending timers.
    timers: SlotMap<TimerId, TimerData<T>>,
    /// Priority queue of pending deadlines.
    queue: BinaryHeap<TimerQueueEntry>,
    /// Monotonic counter so equal deadlines fire in schedule order.
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    /// Create an empty timer queue.
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `payload` to fire `delay` after `now`.
    ///
    /// Returns the timer ID that can be used to cancel the timer.
    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> TimerId {
        let deadline = now + delay;
        let id = self.timers.insert(TimerData { deadline, payload });
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(TimerQueueEntry { id, deadline, seq });
        tracing::trace!(target: targets::TIMER, ?id, ?delay, "timer scheduled");
        id
    }

    /// Cancel a pending timer, returning its payload.
    ///
    /// Fails if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> Result<T> {
        match self.timers.remove(id) {
            Some(timer) => {
                tracing::trace!(target: targets::TIMER, ?id, "timer cancelled");
                Ok(timer.payload)
            }
            None => Err(TimerError::InvalidTimerId.into()),
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Get the deadline of a pending timer.
    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.timers.get(id).map(|t| t.deadline)
    }

    /// Get the earliest pending deadline, if any.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_cancelled_front();
        self.queue.peek().map(|entry| entry.deadline)
    }

    /// Fire every timer whose deadline is at or before `now`.
    ///
    /// Fired timers are returned in deadline order and removed from the queue.
    #[tracing::instrument(skip(self), target = "horizon_select_core::timer", level = "trace")]
    pub fn expire(&mut self, now: Instant) -> Vec<(TimerId, T)> {
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek() {
            if entry.deadline > now {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            // Cancelled timers are no longer in the slot map.
            if let Some(timer) = self.timers.remove(entry.id) {
                tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
                fired.push((entry.id, timer.payload));
            }
        }

        fired
    }

    /// Cancel every pending timer.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.queue.clear();
    }

    /// Get the number of pending timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Check whether no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn discard_cancelled_front(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TimerQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.timers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    #[test]
    fn test_fires_in_deadline_order() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        let late = timers.schedule(start, Duration::from_secs(5), "late");
        let early = timers.schedule(start, Duration::from_secs(3), "early");

        let fired = timers.expire(start + Duration::from_secs(10));
        assert_eq!(fired, vec![(early, "early"), (late, "late")]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_not_due_yet() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        let id = timers.schedule(start, Duration::from_millis(500), ());

        assert!(timers.expire(start + Duration::from_millis(499)).is_empty());
        assert!(timers.is_active(id));
        assert_eq!(timers.expire(start + Duration::from_millis(500)).len(), 1);
        assert!(!timers.is_active(id));
    }

    #[test]
    fn test_equal_deadlines_fire_in_schedule_order() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        for n in 0..4 {
            timers.schedule(start, Duration::from_secs(1), n);
        }

        let payloads: Vec<_> = timers
            .expire(start + Duration::from_secs(1))
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(payloads, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        let id = timers.schedule(start, Duration::from_secs(1), 7);

        assert_eq!(timers.cancel(id), Ok(7));
        assert_eq!(
            timers.cancel(id),
            Err(CoreError::Timer(TimerError::InvalidTimerId))
        );
        assert!(timers.expire(start + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn test_next_deadline_skips_cancelled() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        let first = timers.schedule(start, Duration::from_secs(1), ());
        timers.schedule(start, Duration::from_secs(2), ());

        timers.cancel(first).unwrap();
        assert_eq!(timers.next_deadline(), Some(start + Duration::from_secs(2)));
    }

    #[test]
    fn test_clear() {
        let mut timers = TimerQueue::new();
        let start = Instant::now();
        timers.schedule(start, Duration::from_secs(1), ());
        timers.schedule(start, Duration::from_secs(2), ());

        timers.clear();
        assert_eq!(timers.len(), 0);
        assert_eq!(timers.next_deadline(), None);
    }
}
