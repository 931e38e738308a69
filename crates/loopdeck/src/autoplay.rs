//! Gated periodic advance.
//!
//! The timer runs exactly while every gate condition holds. Conditions are
//! re-evaluated on every change, so a carousel that scrolls back into view or
//! whose tab is foregrounded again resumes on its own.

use std::time::Duration;

use log::debug;

use crate::schedule::{Scheduler, TaskId};

/// Conditions the timer depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayGate {
    pub interval_ms: i64,
    pub slide_count: usize,
    pub page_visible: bool,
    pub in_viewport: bool,
    /// Explicit hold from `pause_autoplay`.
    pub paused: bool,
    /// A pointer drag is in progress.
    pub dragging: bool,
}

impl AutoplayGate {
    pub fn is_open(&self) -> bool {
        self.interval_ms > 0
            && self.slide_count > 1
            && self.page_visible
            && self.in_viewport
            && !self.paused
            && !self.dragging
    }
}

#[derive(Debug)]
pub struct AutoplayScheduler {
    gate: AutoplayGate,
    timer: Option<TaskId>,
}

impl AutoplayScheduler {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            gate: AutoplayGate {
                interval_ms,
                slide_count: 0,
                page_visible: true,
                in_viewport: true,
                paused: false,
                dragging: false,
            },
            timer: None,
        }
    }

    pub fn gate(&self) -> AutoplayGate {
        self.gate
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether `id` is the live autoplay timer.
    pub fn owns(&self, id: TaskId) -> bool {
        self.timer == Some(id)
    }

    /// Apply `change` to the gate and start or stop the timer to match.
    pub fn update(&mut self, scheduler: &mut Scheduler, change: impl FnOnce(&mut AutoplayGate)) {
        change(&mut self.gate);
        self.sync(scheduler);
    }

    /// Bring the timer in line with the gate.
    pub fn sync(&mut self, scheduler: &mut Scheduler) {
        match (self.gate.is_open(), self.timer) {
            (true, None) => self.start(scheduler),
            (false, Some(_)) => self.stop(scheduler),
            _ => {}
        }
    }

    /// Start (or restart) the timer. Never stacks a second timer.
    pub fn start(&mut self, scheduler: &mut Scheduler) {
        if let Some(old) = self.timer.take() {
            scheduler.cancel(old);
        }
        if !self.gate.is_open() {
            return;
        }
        let period = Duration::from_millis(self.gate.interval_ms as u64);
        self.timer = Some(scheduler.start_interval(period));
        debug!("autoplay running every {}ms", self.gate.interval_ms);
    }

    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
            debug!("autoplay stopped");
        }
    }
}
