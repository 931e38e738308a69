//! Composition of the carousel engine.
//!
//! The controller is the only thing hosts talk to. It routes pointer input,
//! timer wakeups and visibility notifications into [`NavigationState`], and
//! exposes the derived values a renderer binds to. Every entry point runs to
//! completion; nothing here is re-entrant.

use std::time::Duration;

use log::{debug, error, info, trace};

use crate::autoplay::AutoplayScheduler;
use crate::cta::{self, CtaActivation, CtaRoute, Navigator};
use crate::gesture::{GestureConfig, GestureInterpreter, GestureSignal, PointerId, PointerTarget};
use crate::navigation::{Completion, Direction, Intent, NavigationState, Phase, TransitionToken};
use crate::schedule::{Scheduler, TaskId, Wakeup};
use crate::slides::{RenderSlide, Slide, SlideCollection};
use crate::source::{self, SlideSource};

pub const DEFAULT_AUTOPLAY_INTERVAL_MS: i64 = 5000;
pub const DEFAULT_WIDE_BREAKPOINT: f32 = 1024.0;

/// Which notification sets a slide's `loaded` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadedPolicy {
    /// Set when the slide's media finished decoding.
    #[default]
    MediaDecoded,
    /// Set as soon as the slide intersects the viewport.
    Intersection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarouselConfig {
    /// Autoplay period; zero or negative disables autoplay.
    pub autoplay_interval_ms: i64,
    pub loop_enabled: bool,
    pub random_start: bool,
    pub loaded_policy: LoadedPolicy,
    pub gesture: GestureConfig,
    /// Viewport width at and above which the layout counts as wide.
    pub wide_breakpoint: f32,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: DEFAULT_AUTOPLAY_INTERVAL_MS,
            loop_enabled: true,
            random_start: false,
            loaded_policy: LoadedPolicy::default(),
            gesture: GestureConfig::default(),
            wide_breakpoint: DEFAULT_WIDE_BREAKPOINT,
        }
    }
}

/// Notifications for the surrounding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum CarouselEvent {
    CtaActivated(CtaActivation),
}

#[derive(Debug)]
pub struct CarouselController {
    config: CarouselConfig,
    slides: SlideCollection,
    nav: NavigationState,
    gesture: GestureInterpreter,
    autoplay: AutoplayScheduler,
    scheduler: Scheduler,
    viewport_width: f32,
    /// Frame that re-enables the transition after an invisible jump.
    restore_frame: Option<TaskId>,
    /// Frame that flushes the coalesced drag preview.
    drag_frame: Option<TaskId>,
    events: Vec<CarouselEvent>,
    mounted: bool,
}

impl CarouselController {
    pub fn new(config: CarouselConfig) -> Self {
        Self {
            nav: NavigationState::new(config.loop_enabled),
            autoplay: AutoplayScheduler::new(config.autoplay_interval_ms),
            gesture: GestureInterpreter::new(config.gesture),
            slides: SlideCollection::new(),
            scheduler: Scheduler::new(),
            viewport_width: 0.0,
            restore_frame: None,
            drag_frame: None,
            events: Vec::new(),
            mounted: true,
            config,
        }
    }

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    // ----- data -----

    /// Replace the slide collection wholesale.
    pub fn load(&mut self, slides: Vec<Slide>) {
        if !self.mounted {
            return;
        }
        let start = self.slides.load(slides, self.config.random_start);
        self.apply_loaded(start);
    }

    /// Replace the collection and start on `start` (clamped).
    pub fn load_at(&mut self, slides: Vec<Slide>, start: usize) {
        if !self.mounted {
            return;
        }
        let start = self.slides.load_at(slides, start);
        self.apply_loaded(start);
    }

    /// Fetch from `source` and load the result. Failures are logged and leave
    /// the carousel empty; returns the number of slides loaded.
    pub fn load_from(&mut self, source: &dyn SlideSource) -> usize {
        match source::fetch_slides(source) {
            Ok(slides) => {
                info!("loaded {} slide(s) from {}", slides.len(), source.describe());
                self.load(slides);
            }
            Err(e) => {
                error!("slide loading error ({}): {e}", source.describe());
                self.load(Vec::new());
            }
        }
        self.slides.len()
    }

    fn apply_loaded(&mut self, start: usize) {
        if let Some(frame) = self.restore_frame.take() {
            self.scheduler.cancel(frame);
        }
        self.nav.reset(self.slides.len(), start);
        let count = self.slides.len();
        self.autoplay
            .update(&mut self.scheduler, |g| g.slide_count = count);
    }

    // ----- derived state -----

    pub fn slides(&self) -> &SlideCollection {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn active_index(&self) -> usize {
        self.nav.active_index()
    }

    pub fn current_index(&self) -> i64 {
        self.nav.current_index()
    }

    pub fn phase(&self) -> Phase {
        self.nav.phase()
    }

    pub fn render_sequence(&self) -> Vec<RenderSlide<'_>> {
        self.slides.render_sequence()
    }

    /// Strip translation in percent of the viewport width.
    pub fn render_offset(&self) -> f32 {
        self.nav.render_offset(self.viewport_width)
    }

    pub fn is_render_index_active(&self, render_index: usize) -> bool {
        self.nav.is_render_index_active(render_index)
    }

    pub fn is_render_index_near(&self, render_index: usize) -> bool {
        self.nav.is_render_index_near(render_index)
    }

    pub fn drag_offset_px(&self) -> f32 {
        self.nav.drag_offset_px()
    }

    pub fn transition_enabled(&self) -> bool {
        self.nav.transition_enabled()
    }

    pub fn animating(&self) -> bool {
        self.nav.animating()
    }

    /// Token the renderer must echo through [`transition_end`](Self::transition_end).
    pub fn pending_token(&self) -> Option<TransitionToken> {
        self.nav.pending_token()
    }

    pub fn queued_intent(&self) -> Option<Intent> {
        self.nav.queued()
    }

    pub fn autoplay_running(&self) -> bool {
        self.autoplay.is_running()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn is_wide_screen(&self) -> bool {
        self.gesture.wide_screen()
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// When the host should next call [`advance`](Self::advance).
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    // ----- commands -----

    pub fn next(&mut self) {
        self.run(Intent::Step(Direction::Next));
    }

    pub fn prev(&mut self) {
        self.run(Intent::Step(Direction::Prev));
    }

    pub fn go_to(&mut self, index: usize) {
        self.run(Intent::GoTo(index));
    }

    fn run(&mut self, intent: Intent) {
        if !self.mounted {
            return;
        }
        match intent {
            Intent::Step(direction) => self.nav.commit(direction),
            Intent::GoTo(index) => self.nav.go_to(index),
        };
    }

    pub fn pause_autoplay(&mut self) {
        if !self.mounted {
            return;
        }
        self.autoplay.update(&mut self.scheduler, |g| g.paused = true);
    }

    pub fn resume_autoplay(&mut self) {
        if !self.mounted {
            return;
        }
        self.autoplay
            .update(&mut self.scheduler, |g| g.paused = false);
    }

    /// Activate call-to-action `cta_index` of real slide `slide_index`.
    pub fn activate_cta(
        &mut self,
        slide_index: usize,
        cta_index: usize,
        navigator: &mut dyn Navigator,
    ) -> Option<CtaRoute> {
        if !self.mounted {
            return None;
        }
        let slide = self.slides.get(slide_index)?;
        let cta = slide.ctas.get(cta_index)?;
        let route = cta::follow(cta, navigator);
        self.events.push(CarouselEvent::CtaActivated(CtaActivation {
            slide: slide.clone(),
            slide_index,
            cta: cta.clone(),
            cta_index,
        }));
        Some(route)
    }

    /// Take the notifications produced since the last call.
    pub fn drain_events(&mut self) -> Vec<CarouselEvent> {
        std::mem::take(&mut self.events)
    }

    // ----- rendering layer -----

    /// The renderer finished the transition identified by `token`.
    pub fn transition_end(&mut self, token: TransitionToken) {
        if !self.mounted {
            return;
        }
        match self.nav.complete(token) {
            Completion::Stale => {}
            Completion::Settled => self.replay_queued(),
            Completion::Snapped => {
                self.restore_frame = Some(self.scheduler.request_frame());
            }
        }
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        if !self.mounted {
            return;
        }
        self.viewport_width = width;
        self.gesture
            .set_wide_screen(width >= self.config.wide_breakpoint);
    }

    /// Advance virtual time to `now` and dispatch everything that became due.
    pub fn advance(&mut self, now: Duration) {
        if !self.mounted {
            return;
        }
        self.scheduler.begin_frame();
        while let Some(wakeup) = self.scheduler.pop_due(now) {
            match wakeup {
                Wakeup::Frame(id) => self.on_frame(id),
                Wakeup::Interval(id) => self.on_interval(id),
            }
        }
    }

    fn on_frame(&mut self, id: TaskId) {
        if self.restore_frame == Some(id) {
            self.restore_frame = None;
            self.nav.restore_transition();
            trace!("transition re-enabled");
            self.replay_queued();
        }
        if self.drag_frame == Some(id) {
            self.drag_frame = None;
            if let Some(GestureSignal::DragMove { delta_x }) = self.gesture.frame() {
                self.on_drag_move(delta_x);
            }
        }
    }

    fn on_interval(&mut self, id: TaskId) {
        if !self.autoplay.owns(id) {
            return;
        }
        if self.nav.animating() || !self.nav.transition_enabled() {
            trace!("autoplay tick dropped mid-transition");
            return;
        }
        debug!("autoplay tick");
        self.next();
    }

    fn replay_queued(&mut self) {
        if let Some(intent) = self.nav.take_queued() {
            debug!("replaying queued {intent:?}");
            self.run(intent);
        }
    }

    // ----- visibility -----

    pub fn set_page_visible(&mut self, visible: bool) {
        if !self.mounted {
            return;
        }
        self.autoplay
            .update(&mut self.scheduler, |g| g.page_visible = visible);
    }

    pub fn set_root_in_viewport(&mut self, intersecting: bool) {
        if !self.mounted {
            return;
        }
        self.autoplay
            .update(&mut self.scheduler, |g| g.in_viewport = intersecting);
    }

    /// A rendered slide element started intersecting the viewport.
    pub fn slide_intersected(&mut self, render_index: usize) {
        if !self.mounted {
            return;
        }
        self.slides.mark_visible(render_index);
        if self.config.loaded_policy == LoadedPolicy::Intersection {
            self.slides.mark_loaded(render_index);
        }
    }

    /// A rendered slide finished loading its media.
    pub fn media_loaded(&mut self, render_index: usize) {
        if !self.mounted {
            return;
        }
        self.slides.mark_visible(render_index);
        if self.config.loaded_policy == LoadedPolicy::MediaDecoded {
            self.slides.mark_loaded(render_index);
        }
    }

    // ----- pointer input -----

    pub fn pointer_down(&mut self, pointer: PointerId, x: f32, target: PointerTarget) {
        if !self.mounted {
            return;
        }
        if self.gesture.pointer_down(pointer, x, target) {
            self.autoplay
                .update(&mut self.scheduler, |g| g.dragging = true);
        }
    }

    pub fn pointer_move(&mut self, pointer: PointerId, x: f32) {
        if !self.mounted {
            return;
        }
        if self.gesture.pointer_move(pointer, x) && self.drag_frame.is_none() {
            self.drag_frame = Some(self.scheduler.request_frame());
        }
    }

    pub fn pointer_up(&mut self, pointer: PointerId) {
        if !self.mounted {
            return;
        }
        let signals = self.gesture.pointer_up(pointer);
        self.finish_gesture(signals);
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) {
        if !self.mounted {
            return;
        }
        let signals = self.gesture.pointer_cancel(pointer);
        self.finish_gesture(signals);
    }

    fn finish_gesture(&mut self, signals: Vec<GestureSignal>) {
        if signals.is_empty() {
            return;
        }
        if let Some(frame) = self.drag_frame.take() {
            self.scheduler.cancel(frame);
        }
        for signal in signals {
            match signal {
                GestureSignal::Commit(direction) if self.slides.len() > 1 => {
                    self.run(Intent::Step(direction));
                }
                GestureSignal::Click if self.slides.len() > 1 => self.next(),
                GestureSignal::DragEnd { delta_x, committed } => {
                    trace!("drag end delta={delta_x} committed={committed}");
                    self.nav.reset_drag();
                }
                _ => {}
            }
        }
        self.autoplay
            .update(&mut self.scheduler, |g| g.dragging = false);
    }

    fn on_drag_move(&mut self, delta_x: f32) {
        if self.slides.len() <= 1 || self.nav.animating() {
            return;
        }
        self.nav.set_drag_offset(delta_x);
    }

    // ----- lifecycle -----

    /// Release every listener, timer and subscription. Afterwards the
    /// controller ignores all input.
    pub fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.gesture.release();
        self.autoplay.stop(&mut self.scheduler);
        self.scheduler.cancel_all();
        self.restore_frame = None;
        self.drag_frame = None;
        self.nav.clear_queued();
        self.mounted = false;
        debug!("carousel torn down");
    }
}
