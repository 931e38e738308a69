use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            let path = config.save()?;
            println!(
                "{} {key} = {value} ({})",
                "Saved".green().bold(),
                path.display()
            );
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let config = Config::load_or_default();
    let path = Config::path()?;
    let carousel = config.carousel();

    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "(not created yet, showing defaults)".dimmed());
    }
    println!();
    println!("  defaults.theme                {}", config.theme());
    println!(
        "  defaults.autoplay_interval_ms {}",
        carousel.autoplay_interval_ms
    );
    println!("  defaults.loop                 {}", carousel.loop_enabled);
    println!("  defaults.random_start         {}", carousel.random_start);
    println!(
        "  defaults.loaded_policy        {}",
        match carousel.loaded_policy {
            loopdeck::LoadedPolicy::MediaDecoded => "decode",
            loopdeck::LoadedPolicy::Intersection => "intersection",
        }
    );
    println!(
        "  defaults.switch_threshold     {}",
        carousel.gesture.switch_threshold
    );
    println!(
        "  defaults.click_threshold      {}",
        carousel.gesture.click_threshold
    );
    println!("  defaults.wide_breakpoint      {}", carousel.wide_breakpoint);
    println!("  defaults.transition_ms        {}", config.transition_ms());
    Ok(())
}
