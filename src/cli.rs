//! CLI argument parsing with clap.

use clap::Parser;

/// Generate images from text prompts with Google Imagen.
///
/// With a PROMPT, runs a single generation. Without one, reads one prompt
/// per line from stdin until EOF.
#[derive(Parser, Debug)]
#[command(name = "imagen-studio", version, about)]
pub struct Cli {
    /// Text prompt describing the desired image.
    pub prompt: Option<String>,

    /// Model name or short alias (defaults to the config file's model).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The log level implied by the flags; `RUST_LOG` still takes precedence.
    #[must_use]
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}
