use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use loopdeck::CarouselConfig;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "loopdeck")]
#[command(author, version, about)]
#[command(long_about = "An infinite-loop slide carousel.\n\n\
    Load a JSON slide payload from a file or URL and swipe through it forever.\n\n\
    Examples:\n  \
    loopdeck slides.json                    Launch the carousel (fullscreen)\n  \
    loopdeck slides.json --windowed         Launch in a window\n  \
    loopdeck https://host/slides.json       Fetch the payload over HTTP\n  \
    loopdeck inspect slides.json            Print the render sequence\n  \
    loopdeck simulate slides.json run.txt   Replay a scripted event sequence")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Slide payload to show (path or http(s) URL)
    pub source: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Start on a specific slide (1-indexed)
    #[arg(long, global = false, conflicts_with = "random")]
    pub slide: Option<usize>,

    /// Autoplay period in milliseconds (0 disables autoplay)
    #[arg(long, global = true)]
    pub interval: Option<i64>,

    /// Start on a random slide
    #[arg(long, global = false)]
    pub random: bool,

    /// Reload the payload when the file changes
    #[arg(long, global = false)]
    pub watch: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Validate a payload and print its render sequence
    Inspect {
        /// Slide payload (path or http(s) URL)
        source: String,

        /// Viewport width used to pick desktop or mobile media
        #[arg(long, default_value = "1280")]
        width: f32,
    },

    /// Drive the carousel headlessly from an event script
    Simulate {
        /// Slide payload (path or http(s) URL)
        source: String,

        /// Script file, one step per line
        script: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.theme, defaults.autoplay_interval_ms, defaults.loop)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    /// Config file settings with command-line overrides applied.
    fn carousel_config(&self, config: &Config) -> CarouselConfig {
        let mut carousel = config.carousel();
        if let Some(interval) = self.interval {
            carousel.autoplay_interval_ms = interval;
        }
        if self.random {
            carousel.random_start = true;
        }
        carousel
    }

    pub fn run(self) -> anyhow::Result<()> {
        let config = Config::load_or_default();
        let carousel = self.carousel_config(&config);
        match self.command {
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Inspect { source, width }) => {
                crate::commands::inspect::run(&source, width)
            }
            Some(Commands::Simulate { source, script }) => {
                if !script.exists() {
                    anyhow::bail!("File not found: {}", script.display());
                }
                crate::commands::simulate::run(&source, &script, carousel)
            }
            None => {
                if let Some(source) = self.source {
                    crate::app::run(crate::app::ViewerOptions {
                        source,
                        windowed: self.windowed,
                        start_slide: self.slide,
                        watch: self.watch,
                        carousel,
                        theme: config.theme(),
                        transition_ms: config.transition_ms(),
                    })
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let cli = Cli::parse_from(["loopdeck", "slides.json", "--interval", "0", "--random"]);
        let carousel = cli.carousel_config(&Config::default());
        assert_eq!(carousel.autoplay_interval_ms, 0);
        assert!(carousel.random_start);
        assert!(carousel.loop_enabled);
    }

    #[test]
    fn test_subcommand_parsing() {
        let cli = Cli::parse_from(["loopdeck", "simulate", "s.json", "run.txt", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Some(Commands::Simulate { ref source, .. }) if source == "s.json"
        ));
    }
}
