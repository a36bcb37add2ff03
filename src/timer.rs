//! Cancellable one-shot and repeating timers over virtual stream time.
//!
//! Time is a [`Duration`] measured from the moment the stream started. The
//! queue never sleeps; callers ask for [`TimerQueue::next_deadline`] and feed
//! the current time back through [`TimerQueue::pop_due`].

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Identifies one armed timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
enum Cadence {
    Once,
    Every(Duration),
}

#[derive(Debug)]
struct Armed<E> {
    event: E,
    cadence: Cadence,
    deadline: Duration,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    pub at: Duration,
    pub event: E,
}

#[derive(Debug)]
pub struct TimerQueue<E> {
    next_handle: u64,
    armed: HashMap<TimerHandle, Armed<E>>,
    order: BTreeSet<(Duration, TimerHandle)>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            armed: HashMap::new(),
            order: BTreeSet::new(),
        }
    }
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer that fires once at `at`.
    pub fn once(&mut self, at: Duration, event: E) -> TimerHandle {
        self.arm(at, Cadence::Once, event)
    }

    /// Arm a timer that fires at `first` and then every `period`.
    ///
    /// # Panics
    /// Panics if `period` is zero.
    pub fn every(&mut self, first: Duration, period: Duration, event: E) -> TimerHandle {
        assert!(!period.is_zero(), "repeating timer period must be positive");
        self.arm(first, Cadence::Every(period), event)
    }

    /// Disarm a timer. Returns `false` if it already fired (one-shot) or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.armed.remove(&handle) {
            Some(armed) => {
                self.order.remove(&(armed.deadline, handle));
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed.contains_key(&handle)
    }

    pub fn deadline_of(&self, handle: TimerHandle) -> Option<Duration> {
        self.armed.get(&handle).map(|armed| armed.deadline)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.order.first().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Take the earliest timer whose deadline is at or before `now`.
    ///
    /// Ties fire in arming order. Repeating timers are re-armed one period
    /// after their previous deadline, so late polling never accumulates drift.
    pub fn pop_due(&mut self, now: Duration) -> Option<Fired<E>> {
        let &(deadline, handle) = self.order.first()?;
        if deadline > now {
            return None;
        }
        self.order.pop_first();
        let armed = self.armed.get_mut(&handle)?;
        let event = armed.event.clone();
        let cadence = armed.cadence;
        match cadence {
            Cadence::Once => {
                self.armed.remove(&handle);
            }
            Cadence::Every(period) => match deadline.checked_add(period) {
                Some(next) => {
                    armed.deadline = next;
                    self.order.insert((next, handle));
                }
                // Past the end of representable time; the cadence ends here.
                None => {
                    self.armed.remove(&handle);
                }
            },
        }
        Some(Fired {
            handle,
            at: deadline,
            event,
        })
    }

    fn arm(&mut self, at: Duration, cadence: Cadence, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.armed.insert(
            handle,
            Armed {
                event,
                cadence,
                deadline: at,
            },
        );
        self.order.insert((at, handle));
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn once_fires_a_single_time() {
        let mut timers = TimerQueue::new();
        let handle = timers.once(secs(5), "remove");
        assert!(timers.pop_due(secs(4)).is_none());
        let fired = timers.pop_due(secs(5)).expect("due at 5s");
        assert_eq!(fired.handle, handle);
        assert_eq!(fired.at, secs(5));
        assert!(timers.pop_due(secs(100)).is_none());
        assert!(!timers.is_armed(handle));
    }

    #[test]
    fn repeating_timer_keeps_its_cadence_when_polled_late() {
        let mut timers = TimerQueue::new();
        timers.every(secs(2), secs(2), "tick");
        let mut fired = Vec::new();
        while let Some(f) = timers.pop_due(secs(7)) {
            fired.push(f.at);
        }
        assert_eq!(fired, vec![secs(2), secs(4), secs(6)]);
        assert_eq!(timers.next_deadline(), Some(secs(8)));
    }

    #[test]
    fn cancel_disarms_and_reports_once() {
        let mut timers = TimerQueue::new();
        let handle = timers.once(secs(1), ());
        assert!(timers.cancel(handle));
        assert!(!timers.cancel(handle));
        assert!(timers.pop_due(secs(10)).is_none());
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn ties_fire_in_arming_order() {
        let mut timers = TimerQueue::new();
        timers.once(secs(3), 'b');
        timers.once(secs(1), 'a');
        timers.once(secs(3), 'c');
        let order: Vec<char> = std::iter::from_fn(|| timers.pop_due(secs(3)))
            .map(|f| f.event)
            .collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
    }

    #[test]
    fn repeating_timer_retires_at_the_end_of_time() {
        let mut timers = TimerQueue::new();
        let handle = timers.every(Duration::MAX - secs(1), secs(2), ());
        assert!(timers.pop_due(Duration::MAX).is_some());
        assert!(!timers.is_armed(handle));
        assert!(timers.is_empty());
    }
}
