use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;

use interlace_types::{TimerCallback, TimerHost, TimerId};

struct Scheduled {
    fire_at: u64,
    seq: u64,
    id: TimerId,
    cb: Option<TimerCallback>,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        (self.fire_at, self.seq) == (other.fire_at, other.seq)
    }
}
impl Eq for Scheduled {}
impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.fire_at, self.seq).cmp(&(other.fire_at, other.seq))
    }
}

#[derive(Default)]
struct State {
    now: u64,
    next_id: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Scheduled>>,
    cleared: std::collections::HashSet<TimerId>,
}

/// A [`TimerHost`] driven by an explicit virtual clock instead of wall
/// time, for deterministic tests: nothing fires until [`Self::advance`]
/// or [`Self::run_ready`] says so, and ties at the same instant resolve
/// in registration order.
#[derive(Default)]
pub struct MockTimerHost {
    state: Mutex<State>,
}

impl MockTimerHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback already due at the current virtual time.
    /// Returns the number of callbacks invoked.
    pub fn run_ready(&self) -> usize {
        let mut count = 0;
        loop {
            let due = {
                let mut st = self.state.lock().unwrap();
                let ready = matches!(st.queue.peek(), Some(Reverse(s)) if s.fire_at <= st.now);
                if !ready {
                    break;
                }
                let Reverse(mut s) = st.queue.pop().unwrap();
                if st.cleared.remove(&s.id) {
                    continue;
                }
                s.cb.take()
            };
            if let Some(cb) = due {
                // lock is released before running the callback: a callback
                // that reentrantly schedules a new timer must be able to
                // take the lock itself without deadlocking.
                cb();
                count += 1;
            }
        }
        count
    }

    /// Advance the virtual clock by `ms` and run everything now due.
    pub fn advance(&self, ms: u64) -> usize {
        {
            let mut st = self.state.lock().unwrap();
            st.now += ms;
        }
        self.run_ready()
    }

    pub fn now(&self) -> u64 {
        self.state.lock().unwrap().now
    }
}

impl TimerHost for MockTimerHost {
    fn set_timeout(&self, cb: TimerCallback, ms: u64) -> TimerId {
        let mut st = self.state.lock().unwrap();
        let id = TimerId::new(st.next_id);
        st.next_id += 1;
        let seq = st.next_seq;
        st.next_seq += 1;
        let fire_at = st.now + ms;
        st.queue.push(Reverse(Scheduled {
            fire_at,
            seq,
            id,
            cb: Some(cb),
        }));
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.state.lock().unwrap().cleared.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    #[test]
    fn fires_in_fire_time_then_registration_order() {
        let host = MockTimerHost::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        let l1 = log.clone();
        host.set_timeout(Box::new(move || l1.lock().unwrap().push("a-at-10")), 10);
        let l2 = log.clone();
        host.set_timeout(Box::new(move || l2.lock().unwrap().push("b-at-5")), 5);
        let l3 = log.clone();
        host.set_timeout(Box::new(move || l3.lock().unwrap().push("c-at-5-later")), 5);

        assert_eq!(host.advance(10), 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["b-at-5", "c-at-5-later", "a-at-10"]
        );
    }

    #[test]
    fn cleared_timer_never_fires() {
        let host = MockTimerHost::new();
        let fired = Arc::new(StdMutex::new(false));
        let f = fired.clone();
        let id = host.set_timeout(Box::new(move || *f.lock().unwrap() = true), 5);
        host.clear_timeout(id);
        host.advance(100);
        assert!(!*fired.lock().unwrap());
    }

    #[test]
    fn reentrant_schedule_from_callback_does_not_deadlock() {
        let host = Arc::new(MockTimerHost::new());
        let h = host.clone();
        let ran = Arc::new(StdMutex::new(false));
        let r = ran.clone();
        host.set_timeout(
            Box::new(move || {
                h.set_timeout(Box::new(move || *r.lock().unwrap() = true), 0);
            }),
            0,
        );
        host.advance(0);
        assert!(*ran.lock().unwrap());
    }
}
