//! Infinite-loop slide carousel engine.
//!
//! The engine is renderer-agnostic: a host feeds it pointer events, elapsed
//! time, visibility changes and transition-end notifications through
//! [`CarouselController`], and paints from the values it exposes
//! ([`CarouselController::render_sequence`], [`CarouselController::render_offset`],
//! [`CarouselController::transition_enabled`]).

pub mod autoplay;
pub mod controller;
pub mod cta;
pub mod gesture;
pub mod navigation;
pub mod schedule;
pub mod slides;
pub mod source;

pub use controller::{CarouselConfig, CarouselController, CarouselEvent, LoadedPolicy};
pub use gesture::{GestureConfig, PointerId, PointerTarget};
pub use navigation::{Direction, TransitionToken};
pub use slides::{Cta, CtaKind, Slide};
