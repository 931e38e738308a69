mod app;
mod cli;
mod commands;
mod config;
mod script;
mod theme;

use clap::Parser;
use log::LevelFilter;

fn init_logger(verbose: u8, quiet: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level.min(LevelFilter::Warn))
        .filter_module("loopdeck", level)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_logger(cli.verbose, cli.quiet);

    cli.run()
}
