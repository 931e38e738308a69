//! Pointer-to-intent translation.
//!
//! A pointer sequence is captured on pointer-down and released on pointer-up or
//! cancel. While captured, moves are tracked wherever they happen, even outside
//! the carousel's bounds; hosts route every move/up of the capturing pointer
//! here regardless of position.

use crate::navigation::Direction;

pub const DEFAULT_SWITCH_THRESHOLD: f32 = 50.0;
pub const DEFAULT_CLICK_THRESHOLD: f32 = 5.0;

/// Selectors whose elements count as interactive pointer targets.
pub const INTERACTIVE_SELECTORS: &[&str] = &[
    "button",
    "a",
    "input",
    "textarea",
    "select",
    "label",
    "[role=button]",
    "[data-cta]",
    ".cta",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerTarget {
    /// Slide surface: eligible for tap-to-advance.
    #[default]
    Surface,
    /// A button, link, input or call-to-action.
    Interactive,
}

impl PointerTarget {
    /// Classify a target from its ancestor chain, innermost first. Each entry
    /// is a tag name or one of the selector forms in [`INTERACTIVE_SELECTORS`].
    pub fn classify<S: AsRef<str>>(chain: &[S]) -> Self {
        let interactive = chain.iter().any(|node| {
            let node = node.as_ref().trim();
            INTERACTIVE_SELECTORS
                .iter()
                .any(|sel| node.eq_ignore_ascii_case(sel))
        });
        if interactive {
            Self::Interactive
        } else {
            Self::Surface
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Horizontal travel beyond which a release commits a slide change.
    pub switch_threshold: f32,
    /// Horizontal travel below which a release counts as a tap.
    pub click_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            switch_threshold: DEFAULT_SWITCH_THRESHOLD,
            click_threshold: DEFAULT_CLICK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSignal {
    /// Visual drag preview, at most once per frame.
    DragMove { delta_x: f32 },
    /// The release travelled far enough to change slides.
    Commit(Direction),
    /// A tap on the slide surface of a narrow layout.
    Click,
    /// Always emitted on release so the caller can clear the drag offset.
    DragEnd { delta_x: f32, committed: bool },
}

/// A captured pointer sequence, alive from pointer-down until release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerCapture {
    pub pointer: PointerId,
    pub start_x: f32,
    pub current_x: f32,
    pub target: PointerTarget,
}

impl PointerCapture {
    pub fn delta_x(&self) -> f32 {
        self.current_x - self.start_x
    }
}

#[derive(Debug, Default)]
pub struct GestureInterpreter {
    config: GestureConfig,
    capture: Option<PointerCapture>,
    /// Latest drag delta not yet delivered this frame.
    pending_move: Option<f32>,
    wide_screen: bool,
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> GestureConfig {
        self.config
    }

    pub fn set_wide_screen(&mut self, wide: bool) {
        self.wide_screen = wide;
    }

    pub fn wide_screen(&self) -> bool {
        self.wide_screen
    }

    pub fn is_dragging(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture(&self) -> Option<&PointerCapture> {
        self.capture.as_ref()
    }

    /// Begin a captured sequence. A second pointer going down while one is
    /// already captured is ignored; returns whether this pointer was captured.
    pub fn pointer_down(&mut self, pointer: PointerId, x: f32, target: PointerTarget) -> bool {
        if self.capture.is_some() {
            return false;
        }
        self.capture = Some(PointerCapture {
            pointer,
            start_x: x,
            current_x: x,
            target,
        });
        self.pending_move = None;
        true
    }

    /// Track a move. Returns `true` when this is the first move since the last
    /// frame, i.e. the caller should request a frame to flush it.
    pub fn pointer_move(&mut self, pointer: PointerId, x: f32) -> bool {
        let Some(capture) = self.capture.as_mut().filter(|c| c.pointer == pointer) else {
            return false;
        };
        capture.current_x = x;
        let first = self.pending_move.is_none();
        self.pending_move = Some(capture.delta_x());
        first
    }

    /// Deliver the coalesced drag preview for this frame.
    pub fn frame(&mut self) -> Option<GestureSignal> {
        let delta_x = self.pending_move.take()?;
        self.capture.is_some().then_some(GestureSignal::DragMove { delta_x })
    }

    /// Finish the sequence on release.
    pub fn pointer_up(&mut self, pointer: PointerId) -> Vec<GestureSignal> {
        let Some(capture) = self.capture.filter(|c| c.pointer == pointer) else {
            return Vec::new();
        };
        self.release();

        let delta_x = capture.delta_x();
        let mut signals = Vec::with_capacity(2);
        let committed = delta_x.abs() > self.config.switch_threshold;
        if committed {
            signals.push(GestureSignal::Commit(if delta_x > 0.0 {
                Direction::Prev
            } else {
                Direction::Next
            }));
        } else if delta_x.abs() < self.config.click_threshold
            && capture.target == PointerTarget::Surface
            && !self.wide_screen
        {
            signals.push(GestureSignal::Click);
        }
        signals.push(GestureSignal::DragEnd { delta_x, committed });
        signals
    }

    /// A cancelled sequence is resolved exactly like a release.
    pub fn pointer_cancel(&mut self, pointer: PointerId) -> Vec<GestureSignal> {
        self.pointer_up(pointer)
    }

    /// Drop the capture without emitting anything.
    pub fn release(&mut self) {
        self.capture = None;
        self.pending_move = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PointerId = PointerId(1);

    fn drag(delta: f32, target: PointerTarget, wide: bool) -> Vec<GestureSignal> {
        let mut g = GestureInterpreter::new(GestureConfig::default());
        g.set_wide_screen(wide);
        assert!(g.pointer_down(P, 100.0, target));
        g.pointer_move(P, 100.0 + delta);
        g.pointer_up(P)
    }

    #[test]
    fn test_drag_right_commits_prev() {
        let signals = drag(60.0, PointerTarget::Surface, false);
        assert_eq!(
            signals,
            vec![
                GestureSignal::Commit(Direction::Prev),
                GestureSignal::DragEnd {
                    delta_x: 60.0,
                    committed: true
                },
            ]
        );
    }

    #[test]
    fn test_drag_left_commits_next() {
        let signals = drag(-60.0, PointerTarget::Surface, false);
        assert_eq!(signals[0], GestureSignal::Commit(Direction::Next));
        assert_eq!(signals.len(), 2);
    }

    #[test]
    fn test_tap_on_narrow_surface_clicks() {
        let signals = drag(3.0, PointerTarget::Surface, false);
        assert_eq!(
            signals,
            vec![
                GestureSignal::Click,
                GestureSignal::DragEnd {
                    delta_x: 3.0,
                    committed: false
                },
            ]
        );
    }

    #[test]
    fn test_tap_suppressed_on_interactive_or_wide() {
        let interactive = drag(3.0, PointerTarget::Interactive, false);
        assert_eq!(interactive.len(), 1);
        assert!(matches!(interactive[0], GestureSignal::DragEnd { .. }));

        let wide = drag(3.0, PointerTarget::Surface, true);
        assert_eq!(wide.len(), 1);
    }

    #[test]
    fn test_middle_distance_only_ends_drag() {
        let signals = drag(30.0, PointerTarget::Surface, false);
        assert_eq!(
            signals,
            vec![GestureSignal::DragEnd {
                delta_x: 30.0,
                committed: false
            }]
        );
        // Exactly at the threshold does not commit.
        let at = drag(50.0, PointerTarget::Surface, false);
        assert_eq!(at.len(), 1);
    }

    #[test]
    fn test_second_pointer_ignored() {
        let mut g = GestureInterpreter::default();
        assert!(g.pointer_down(P, 0.0, PointerTarget::Surface));
        assert!(!g.pointer_down(PointerId(2), 500.0, PointerTarget::Surface));
        assert!(!g.pointer_move(PointerId(2), 900.0));
        assert!(g.pointer_up(PointerId(2)).is_empty());
        assert!(g.is_dragging());
        g.pointer_move(P, -80.0);
        let signals = g.pointer_up(P);
        assert_eq!(signals[0], GestureSignal::Commit(Direction::Next));
        assert!(!g.is_dragging());
    }

    #[test]
    fn test_moves_coalesce_per_frame() {
        let mut g = GestureInterpreter::default();
        g.pointer_down(P, 10.0, PointerTarget::Surface);
        assert!(g.pointer_move(P, 20.0));
        assert!(!g.pointer_move(P, 30.0));
        assert!(!g.pointer_move(P, 45.0));
        assert_eq!(g.frame(), Some(GestureSignal::DragMove { delta_x: 35.0 }));
        assert_eq!(g.frame(), None);
        assert!(g.pointer_move(P, 5.0));
        assert_eq!(g.frame(), Some(GestureSignal::DragMove { delta_x: -5.0 }));
    }

    #[test]
    fn test_release_drops_pending_move() {
        let mut g = GestureInterpreter::default();
        g.pointer_down(P, 0.0, PointerTarget::Surface);
        g.pointer_move(P, 20.0);
        g.pointer_up(P);
        assert_eq!(g.frame(), None);
    }

    #[test]
    fn test_cancel_resolves_like_release() {
        let mut g = GestureInterpreter::default();
        g.pointer_down(P, 0.0, PointerTarget::Surface);
        g.pointer_move(P, 70.0);
        let signals = g.pointer_cancel(P);
        assert_eq!(signals[0], GestureSignal::Commit(Direction::Prev));
        assert!(!g.is_dragging());
    }

    #[test]
    fn test_up_without_down_is_ignored() {
        let mut g = GestureInterpreter::default();
        assert!(g.pointer_up(P).is_empty());
        assert!(!g.pointer_move(P, 3.0));
    }

    #[test]
    fn test_classify_target() {
        assert_eq!(
            PointerTarget::classify(&["img", "div", "a"]),
            PointerTarget::Interactive
        );
        assert_eq!(
            PointerTarget::classify(&[".cta"]),
            PointerTarget::Interactive
        );
        assert_eq!(
            PointerTarget::classify(&["img", "div"]),
            PointerTarget::Surface
        );
        let empty: [&str; 0] = [];
        assert_eq!(PointerTarget::classify(&empty), PointerTarget::Surface);
    }
}
