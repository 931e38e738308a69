use anyhow::Result;
use colored::Colorize;

use loopdeck::CarouselController;
use loopdeck::cta::CtaRoute;
use loopdeck::source;

use crate::config::Config;

/// Print the clone-extended render sequence of a slide payload.
pub fn run(location: &str, width: f32) -> Result<()> {
    let source = source::from_location(location);
    let slides = source::fetch_slides(source.as_ref())?;

    let config = Config::load_or_default().carousel();
    let breakpoint = config.wide_breakpoint;
    let mut carousel = CarouselController::new(config);
    carousel.set_viewport_width(width);
    carousel.load_at(slides, 0);

    if carousel.slide_count() == 0 {
        println!("{}", "Payload is valid but contains no slides.".yellow());
        return Ok(());
    }

    println!(
        "{} slide(s), {} render entries, {} layout at {width}px",
        carousel.slide_count(),
        carousel.render_sequence().len(),
        if width >= breakpoint { "wide" } else { "narrow" }
    );
    println!();

    for (render_index, entry) in carousel.render_sequence().iter().enumerate() {
        let marker = if entry.is_clone {
            "clone".dimmed().to_string()
        } else {
            format!("#{}", entry.real_index).bold().to_string()
        };
        println!(
            "  [{render_index}] {marker:<7} id={} {} ({})",
            entry.slide.id,
            entry.slide.title.cyan(),
            entry.slide.media_for(width, breakpoint)
        );
        if entry.is_clone {
            continue;
        }
        for (i, cta) in entry.slide.ctas.iter().enumerate() {
            let route = match cta.route() {
                CtaRoute::Internal(link) => format!("internal {link}"),
                CtaRoute::External(url) => format!("external {url}"),
                CtaRoute::None => "event only".to_string(),
            };
            println!("        cta {i}: {} -> {}", cta.label, route.dimmed());
        }
    }
    Ok(())
}
