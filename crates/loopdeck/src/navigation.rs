//! The carousel index state machine.
//!
//! `current_index` addresses the real slides but may sit on `-1` or `N` (the
//! clone positions) while a boundary transition is in flight. Once the
//! rendering layer reports the transition finished, the index is snapped to
//! the real slide with the transition disabled for one frame, which hides the
//! teleport.

use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

impl Direction {
    fn step(self) -> i64 {
        match self {
            Direction::Next => 1,
            Direction::Prev => -1,
        }
    }
}

/// A navigation request that could not be applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Step(Direction),
    GoTo(usize),
}

/// Coarse state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A committed transition is in flight.
    Animating,
    /// The index sits on a clone position waiting for its wrap.
    OutOfBounds,
}

/// Identifies one committed transition. Completions carrying an older token
/// are stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionToken(u64);

impl TransitionToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What happens when the running transition completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settle {
    /// Wrap an out-of-range index to the opposite edge.
    Wrap,
    /// Snap to a real index reached through a clone position.
    JumpTo(usize),
}

/// Result of reporting a transition end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The token did not match the running transition.
    Stale,
    /// The transition finished in bounds.
    Settled,
    /// The index was snapped with the transition disabled; the caller must
    /// call [`NavigationState::restore_transition`] on the next frame.
    Snapped,
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    len: usize,
    loop_enabled: bool,
    current_index: i64,
    drag_offset_px: f32,
    transition_enabled: bool,
    animating: bool,
    generation: u64,
    settle: Option<Settle>,
    queued: Option<Intent>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NavigationState {
    pub fn new(loop_enabled: bool) -> Self {
        Self {
            len: 0,
            loop_enabled,
            current_index: 0,
            drag_offset_px: 0.0,
            transition_enabled: true,
            animating: false,
            generation: 0,
            settle: None,
            queued: None,
        }
    }

    /// Start over for a freshly loaded collection of `len` slides.
    ///
    /// Any in-flight transition is invalidated.
    pub fn reset(&mut self, len: usize, start: usize) {
        self.len = len;
        self.current_index = start.min(len.saturating_sub(1)) as i64;
        self.drag_offset_px = 0.0;
        self.transition_enabled = true;
        self.animating = false;
        self.generation += 1;
        self.settle = None;
        self.queued = None;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn current_index(&self) -> i64 {
        self.current_index
    }

    pub fn drag_offset_px(&self) -> f32 {
        self.drag_offset_px
    }

    pub fn transition_enabled(&self) -> bool {
        self.transition_enabled
    }

    pub fn animating(&self) -> bool {
        self.animating
    }

    pub fn queued(&self) -> Option<Intent> {
        self.queued
    }

    /// Token of the running transition, if one is in flight.
    pub fn pending_token(&self) -> Option<TransitionToken> {
        self.animating.then_some(TransitionToken(self.generation))
    }

    fn out_of_bounds(&self) -> bool {
        self.current_index < 0 || self.current_index >= self.len as i64
    }

    pub fn phase(&self) -> Phase {
        if self.len > 0 && self.out_of_bounds() {
            Phase::OutOfBounds
        } else if self.animating {
            Phase::Animating
        } else {
            Phase::Idle
        }
    }

    /// The wrapped index into the real slides.
    pub fn active_index(&self) -> usize {
        if self.len == 0 {
            return 0;
        }
        self.current_index.rem_euclid(self.len as i64) as usize
    }

    /// Whether `render_index` is the entry currently in view.
    pub fn is_render_index_active(&self, render_index: usize) -> bool {
        self.len > 0 && render_index as i64 == self.current_index + 1
    }

    /// Whether `render_index` is the current entry or one of its neighbours.
    pub fn is_render_index_near(&self, render_index: usize) -> bool {
        self.len > 0 && (render_index as i64 - (self.current_index + 1)).abs() <= 1
    }

    /// Horizontal translation of the slide strip, in percent of the viewport.
    pub fn render_offset(&self, viewport_width: f32) -> f32 {
        let base = -((self.current_index + 1) as f32) * 100.0;
        let drag = if viewport_width > 0.0 {
            self.drag_offset_px / viewport_width * 100.0
        } else {
            0.0
        };
        base + drag
    }

    pub fn set_drag_offset(&mut self, px: f32) {
        self.drag_offset_px = px;
    }

    pub fn reset_drag(&mut self) {
        self.drag_offset_px = 0.0;
    }

    /// Intents cannot apply while the index is parked on a clone position or
    /// while the transition is switched off for the invisible jump.
    fn must_queue(&self) -> bool {
        self.out_of_bounds() || !self.transition_enabled
    }

    fn begin(&mut self, settle: Settle) -> TransitionToken {
        self.generation += 1;
        self.animating = true;
        self.transition_enabled = true;
        self.settle = Some(settle);
        TransitionToken(self.generation)
    }

    /// Move one slide in `direction`.
    ///
    /// Returns the token the rendering layer must echo back through
    /// [`complete`](Self::complete), or `None` when nothing moved (no slides,
    /// edge reached without looping, or the intent was queued).
    pub fn commit(&mut self, direction: Direction) -> Option<TransitionToken> {
        if self.len == 0 {
            return None;
        }
        if self.must_queue() {
            trace!("queueing {direction:?} behind pending wrap");
            self.queued = Some(Intent::Step(direction));
            return None;
        }
        if !self.loop_enabled {
            let target = self.current_index + direction.step();
            if target < 0 || target >= self.len as i64 {
                return None;
            }
        }

        self.current_index += direction.step();
        debug!(
            "commit {direction:?}: current_index={} active={}",
            self.current_index,
            self.active_index()
        );
        Some(self.begin(Settle::Wrap))
    }

    /// Move to the real slide `target`, crossing the loop boundary through the
    /// clone position when the move goes from one edge to the other.
    pub fn go_to(&mut self, target: usize) -> Option<TransitionToken> {
        if target >= self.len || target == self.active_index() {
            return None;
        }
        if self.must_queue() {
            trace!("queueing go_to({target}) behind pending wrap");
            self.queued = Some(Intent::GoTo(target));
            return None;
        }

        let last = self.len - 1;
        let active = self.active_index();
        let settle = if self.loop_enabled && active == last && target == 0 {
            self.current_index = self.len as i64;
            Settle::JumpTo(0)
        } else if self.loop_enabled && active == 0 && target == last {
            self.current_index = -1;
            Settle::JumpTo(last)
        } else {
            self.current_index = target as i64;
            Settle::Wrap
        };
        debug!("go_to {target}: current_index={}", self.current_index);
        Some(self.begin(settle))
    }

    /// Report that the transition identified by `token` has ended.
    pub fn complete(&mut self, token: TransitionToken) -> Completion {
        if !self.animating || token.0 != self.generation {
            trace!(
                "stale completion {} (running {})",
                token.0,
                self.generation
            );
            return Completion::Stale;
        }

        self.animating = false;
        let target = match self.settle.take() {
            Some(Settle::JumpTo(target)) => Some(target as i64),
            Some(Settle::Wrap) if self.out_of_bounds() => {
                Some(self.current_index.rem_euclid(self.len as i64))
            }
            _ => None,
        };

        match target {
            Some(target) => {
                debug!("invisible jump {} -> {target}", self.current_index);
                self.transition_enabled = false;
                self.current_index = target;
                Completion::Snapped
            }
            None => Completion::Settled,
        }
    }

    /// Re-enable the transition after an invisible jump.
    pub fn restore_transition(&mut self) {
        self.transition_enabled = true;
    }

    /// Take the queued intent once it is allowed to run.
    pub fn take_queued(&mut self) -> Option<Intent> {
        if self.must_queue() {
            return None;
        }
        self.queued.take()
    }

    /// Drop any queued intent without running it.
    pub fn clear_queued(&mut self) {
        self.queued = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(len: usize) -> NavigationState {
        let mut n = NavigationState::new(true);
        n.reset(len, 0);
        n
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let mut n = nav(0);
        assert_eq!(n.commit(Direction::Next), None);
        assert_eq!(n.go_to(0), None);
        assert!(!n.animating());
        assert_eq!(n.current_index(), 0);
    }

    #[test]
    fn test_next_from_last_wraps_through_clone() {
        let mut n = nav(3);
        n.reset(3, 2);
        let token = n.commit(Direction::Next).unwrap();
        assert_eq!(n.current_index(), 3);
        assert_eq!(n.phase(), Phase::OutOfBounds);
        assert_eq!(n.active_index(), 0);
        assert!(n.animating());

        assert_eq!(n.complete(token), Completion::Snapped);
        assert_eq!(n.current_index(), 0);
        assert!(!n.transition_enabled());
        assert!(!n.animating());

        n.restore_transition();
        assert!(n.transition_enabled());
        assert_eq!(n.active_index(), 0);
        assert_eq!(n.phase(), Phase::Idle);
    }

    #[test]
    fn test_prev_from_first_wraps_through_clone() {
        let mut n = nav(4);
        let token = n.commit(Direction::Prev).unwrap();
        assert_eq!(n.current_index(), -1);
        assert_eq!(n.active_index(), 3);
        assert_eq!(n.complete(token), Completion::Snapped);
        assert_eq!(n.current_index(), 3);
        n.restore_transition();
        assert_eq!(n.active_index(), 3);
    }

    #[test]
    fn test_in_bounds_commit_settles_without_snap() {
        let mut n = nav(3);
        let token = n.commit(Direction::Next).unwrap();
        assert_eq!(n.complete(token), Completion::Settled);
        assert_eq!(n.current_index(), 1);
        assert!(n.transition_enabled());
    }

    #[test]
    fn test_superseded_completion_is_stale() {
        let mut n = nav(5);
        let first = n.commit(Direction::Next).unwrap();
        let second = n.commit(Direction::Next).unwrap();
        assert_eq!(n.complete(first), Completion::Stale);
        assert!(n.animating());
        assert_eq!(n.complete(second), Completion::Settled);
        assert_eq!(n.current_index(), 2);
        // A repeat of the same completion is stale too.
        assert_eq!(n.complete(second), Completion::Stale);
    }

    #[test]
    fn test_commit_while_out_of_bounds_is_queued() {
        let mut n = nav(3);
        n.reset(3, 2);
        let token = n.commit(Direction::Next).unwrap();
        assert_eq!(n.commit(Direction::Next), None);
        assert_eq!(n.current_index(), 3);
        assert_eq!(n.queued(), Some(Intent::Step(Direction::Next)));

        assert_eq!(n.complete(token), Completion::Snapped);
        // Still gated until the transition is back on.
        assert_eq!(n.take_queued(), None);
        n.restore_transition();
        assert_eq!(n.take_queued(), Some(Intent::Step(Direction::Next)));
        assert_eq!(n.take_queued(), None);
    }

    #[test]
    fn test_active_index_always_in_range() {
        let mut n = nav(3);
        for current in -7..10 {
            n.current_index = current;
            assert!(n.active_index() < 3);
        }
        n.current_index = -1;
        assert_eq!(n.active_index(), 2);
        n.current_index = 3;
        assert_eq!(n.active_index(), 0);
    }

    #[test]
    fn test_go_to_same_index_is_strict_noop() {
        let mut n = nav(3);
        n.reset(3, 1);
        n.set_drag_offset(12.0);
        let before = n.clone();
        assert_eq!(n.go_to(1), None);
        assert_eq!(n.current_index(), before.current_index());
        assert_eq!(n.drag_offset_px(), before.drag_offset_px());
        assert_eq!(n.transition_enabled(), before.transition_enabled());
        assert_eq!(n.animating(), before.animating());
        assert_eq!(n.pending_token(), before.pending_token());
    }

    #[test]
    fn test_go_to_direct() {
        let mut n = nav(5);
        let token = n.go_to(3).unwrap();
        assert_eq!(n.current_index(), 3);
        assert!(n.animating());
        assert_eq!(n.complete(token), Completion::Settled);
        assert!(!n.animating());
    }

    #[test]
    fn test_go_to_first_from_last_crosses_boundary() {
        let mut n = nav(4);
        n.reset(4, 3);
        let token = n.go_to(0).unwrap();
        assert_eq!(n.current_index(), 4);
        assert_eq!(n.complete(token), Completion::Snapped);
        assert_eq!(n.current_index(), 0);
        assert!(!n.transition_enabled());
    }

    #[test]
    fn test_go_to_last_from_first_crosses_boundary() {
        let mut n = nav(4);
        let token = n.go_to(3).unwrap();
        assert_eq!(n.current_index(), -1);
        assert_eq!(n.complete(token), Completion::Snapped);
        assert_eq!(n.current_index(), 3);
    }

    #[test]
    fn test_go_to_out_of_range_is_noop() {
        let mut n = nav(3);
        assert_eq!(n.go_to(3), None);
        assert!(!n.animating());
    }

    #[test]
    fn test_no_loop_stops_at_edges() {
        let mut n = NavigationState::new(false);
        n.reset(3, 0);
        assert_eq!(n.commit(Direction::Prev), None);
        n.reset(3, 2);
        assert_eq!(n.commit(Direction::Next), None);
        let token = n.go_to(0).unwrap();
        assert_eq!(n.current_index(), 0);
        assert_eq!(n.complete(token), Completion::Settled);
    }

    #[test]
    fn test_render_offset() {
        let mut n = nav(3);
        assert_eq!(n.render_offset(1000.0), -100.0);
        n.set_drag_offset(250.0);
        assert_eq!(n.render_offset(1000.0), -75.0);
        assert_eq!(n.render_offset(0.0), -100.0);
        n.reset_drag();
        n.current_index = -1;
        assert_eq!(n.render_offset(1000.0), 0.0);
    }

    #[test]
    fn test_render_index_flags() {
        let mut n = nav(3);
        n.reset(3, 1);
        assert!(n.is_render_index_active(2));
        assert!(!n.is_render_index_active(1));
        assert!(n.is_render_index_near(1));
        assert!(n.is_render_index_near(3));
        assert!(!n.is_render_index_near(4));
    }

    #[test]
    fn test_reset_invalidates_running_transition() {
        let mut n = nav(3);
        let token = n.commit(Direction::Next).unwrap();
        n.reset(2, 0);
        assert_eq!(n.complete(token), Completion::Stale);
        assert_eq!(n.current_index(), 0);
    }
}
