//! Virtual-time task scheduling.
//!
//! The engine never sleeps or reads a wall clock. Hosts advance a [`Scheduler`]
//! with their own notion of "now" (elapsed time since mount for the viewer,
//! scripted steps for the simulator, arbitrary values in tests) and dispatch
//! whatever became due.

use std::time::Duration;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// A task that became due during [`Scheduler::pop_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// A recurring timer fired.
    Interval(TaskId),
    /// The next paint opportunity after a frame request.
    Frame(TaskId),
}

#[derive(Debug, Clone)]
struct Interval {
    id: TaskId,
    period: Duration,
    due: Duration,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    intervals: Vec<Interval>,
    /// Frames requested since the last advance; they fire on the next one.
    requested_frames: Vec<TaskId>,
    /// Frames released by the current advance, still to be dispatched.
    ready_frames: Vec<TaskId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    fn allocate(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }

    /// Start a recurring timer whose first tick is one `period` from now.
    pub fn start_interval(&mut self, period: Duration) -> TaskId {
        let id = self.allocate();
        let period = period.max(Duration::from_millis(1));
        self.intervals.push(Interval {
            id,
            period,
            due: self.now + period,
        });
        id
    }

    /// Request a callback at the next paint opportunity.
    pub fn request_frame(&mut self) -> TaskId {
        let id = self.allocate();
        self.requested_frames.push(id);
        id
    }

    pub fn cancel(&mut self, id: TaskId) {
        self.intervals.retain(|i| i.id != id);
        self.requested_frames.retain(|f| *f != id);
        self.ready_frames.retain(|f| *f != id);
    }

    pub fn cancel_all(&mut self) {
        self.intervals.clear();
        self.requested_frames.clear();
        self.ready_frames.clear();
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.intervals.iter().any(|i| i.id == id)
            || self.requested_frames.contains(&id)
            || self.ready_frames.contains(&id)
    }

    pub fn has_pending_frames(&self) -> bool {
        !self.requested_frames.is_empty() || !self.ready_frames.is_empty()
    }

    /// Earliest instant at which something will be due, if anything is scheduled.
    pub fn next_deadline(&self) -> Option<Duration> {
        if self.has_pending_frames() {
            return Some(self.now);
        }
        self.intervals.iter().map(|i| i.due).min()
    }

    /// Open a new paint opportunity: frames requested so far become dispatchable.
    ///
    /// Call once per advance, before draining with [`pop_due`](Self::pop_due).
    /// Frames requested while the returned batch is being dispatched wait for the
    /// next call.
    pub fn begin_frame(&mut self) {
        self.ready_frames.append(&mut self.requested_frames);
    }

    /// Pop the next task due at or before `until`, moving virtual time forward to
    /// its deadline. Returns `None` once nothing else is due, leaving `now` at
    /// `until`.
    ///
    /// Ready frames are dispatched before timers. Intervals are rescheduled one
    /// period after the deadline they fired for, so a long jump fires every
    /// missed period in order.
    pub fn pop_due(&mut self, until: Duration) -> Option<Wakeup> {
        if !self.ready_frames.is_empty() {
            return Some(Wakeup::Frame(self.ready_frames.remove(0)));
        }

        let next = self
            .intervals
            .iter_mut()
            .filter(|i| i.due <= until)
            .min_by_key(|i| i.due);

        match next {
            Some(interval) => {
                let id = interval.id;
                self.now = self.now.max(interval.due);
                interval.due += interval.period;
                Some(Wakeup::Interval(id))
            }
            None => {
                self.now = self.now.max(until);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drain(s: &mut Scheduler, until: Duration) -> Vec<Wakeup> {
        s.begin_frame();
        let mut out = Vec::new();
        while let Some(w) = s.pop_due(until) {
            out.push(w);
        }
        out
    }

    #[test]
    fn test_interval_fires_each_period() {
        let mut s = Scheduler::new();
        let id = s.start_interval(ms(100));
        assert!(drain(&mut s, ms(99)).is_empty());
        assert_eq!(drain(&mut s, ms(100)), vec![Wakeup::Interval(id)]);
        assert_eq!(
            drain(&mut s, ms(350)),
            vec![Wakeup::Interval(id), Wakeup::Interval(id)]
        );
        assert_eq!(s.now(), ms(350));
        assert_eq!(s.next_deadline(), Some(ms(400)));
    }

    #[test]
    fn test_cancelled_interval_never_fires() {
        let mut s = Scheduler::new();
        let id = s.start_interval(ms(100));
        s.cancel(id);
        assert!(drain(&mut s, ms(1000)).is_empty());
        assert!(!s.is_scheduled(id));
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_frame_waits_for_next_advance() {
        let mut s = Scheduler::new();
        s.begin_frame();
        let frame = s.request_frame();
        // Requested after begin_frame: not part of this pass.
        assert_eq!(s.pop_due(ms(0)), None);
        assert_eq!(drain(&mut s, ms(16)), vec![Wakeup::Frame(frame)]);
        assert!(!s.has_pending_frames());
    }

    #[test]
    fn test_frames_dispatch_before_timers() {
        let mut s = Scheduler::new();
        let timer = s.start_interval(ms(10));
        let frame = s.request_frame();
        assert_eq!(
            drain(&mut s, ms(10)),
            vec![Wakeup::Frame(frame), Wakeup::Interval(timer)]
        );
    }

    #[test]
    fn test_interleaved_intervals_in_due_order() {
        let mut s = Scheduler::new();
        let a = s.start_interval(ms(30));
        let b = s.start_interval(ms(50));
        assert_eq!(
            drain(&mut s, ms(100)),
            vec![
                Wakeup::Interval(a),
                Wakeup::Interval(b),
                Wakeup::Interval(a),
                Wakeup::Interval(a),
                Wakeup::Interval(b),
            ]
        );
    }

    #[test]
    fn test_cancel_all_clears_everything() {
        let mut s = Scheduler::new();
        s.start_interval(ms(10));
        s.request_frame();
        s.cancel_all();
        assert_eq!(s.next_deadline(), None);
        assert!(drain(&mut s, ms(100)).is_empty());
    }
}
