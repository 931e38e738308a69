use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use loopdeck::cta::Navigator;
use loopdeck::{CarouselConfig, CarouselController, CarouselEvent, PointerId, source};

use crate::script::{self, Step};

const POINTER: PointerId = PointerId(1);
const DEFAULT_WIDTH: f32 = 800.0;

/// Prints navigation requests instead of performing them.
struct PrintingNavigator;

impl Navigator for PrintingNavigator {
    fn navigate_internal(&mut self, link: &str) {
        println!("    {} {link}", "navigate".magenta());
    }

    fn open_external(&mut self, url: &str) {
        println!("    {} {url}", "open".magenta());
    }
}

/// Virtual clock plus the carousel it drives.
pub struct Simulation {
    pub carousel: CarouselController,
    clock: Duration,
}

impl Simulation {
    pub fn new(config: CarouselConfig) -> Self {
        let mut carousel = CarouselController::new(config);
        carousel.set_viewport_width(DEFAULT_WIDTH);
        Self {
            carousel,
            clock: Duration::ZERO,
        }
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn apply(&mut self, step: &Step, navigator: &mut dyn Navigator) {
        let c = &mut self.carousel;
        match *step {
            Step::Down { x, target } => c.pointer_down(POINTER, x, target),
            Step::Move { x } => c.pointer_move(POINTER, x),
            Step::Up => c.pointer_up(POINTER),
            Step::Cancel => c.pointer_cancel(POINTER),
            Step::Advance { ms } => {
                self.clock += Duration::from_millis(ms);
                c.advance(self.clock);
            }
            Step::End => {
                if let Some(token) = c.pending_token() {
                    c.transition_end(token);
                }
            }
            Step::Next => c.next(),
            Step::Prev => c.prev(),
            Step::GoTo { index } => c.go_to(index),
            Step::Pause => c.pause_autoplay(),
            Step::Resume => c.resume_autoplay(),
            Step::PageVisible(visible) => c.set_page_visible(visible),
            Step::RootInViewport(inside) => c.set_root_in_viewport(inside),
            Step::Width(px) => c.set_viewport_width(px),
            Step::Seen { render_index } => c.slide_intersected(render_index),
            Step::Decoded { render_index } => c.media_loaded(render_index),
            Step::Cta { slide, cta } => {
                c.activate_cta(slide, cta, navigator);
            }
            Step::Teardown => c.teardown(),
        }
    }

    /// One-line summary of the observable state.
    pub fn status(&self) -> String {
        let c = &self.carousel;
        format!(
            "t={}ms current={} active={} offset={:.1}% drag={:.0}px transition={} animating={} autoplay={}",
            self.clock().as_millis(),
            c.current_index(),
            c.active_index(),
            c.render_offset(),
            c.drag_offset_px(),
            if c.transition_enabled() { "on" } else { "off" },
            if c.animating() { "yes" } else { "no" },
            if c.autoplay_running() {
                "running"
            } else {
                "stopped"
            },
        )
    }
}

pub fn run(location: &str, script_path: &Path, config: CarouselConfig) -> Result<()> {
    let text = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read {}", script_path.display()))?;
    let steps = script::parse(&text)
        .with_context(|| format!("Invalid script {}", script_path.display()))?;

    let mut sim = Simulation::new(config);
    let source = source::from_location(location);
    let count = sim.carousel.load_from(source.as_ref());
    println!(
        "{} {count} slide(s) from {}",
        "Loaded".green().bold(),
        source.describe()
    );
    println!("  {}", sim.status().dimmed());

    let mut navigator = PrintingNavigator;
    for (line, step) in &steps {
        sim.apply(step, &mut navigator);
        for event in sim.carousel.drain_events() {
            let CarouselEvent::CtaActivated(activation) = event;
            println!(
                "    {} slide {} cta {} ({})",
                "cta".magenta(),
                activation.slide_index,
                activation.cta_index,
                activation.cta.label
            );
        }
        println!("{:>4} {:<24} {}", line, format!("{step:?}").bold(), sim.status());
    }
    Ok(())
}
