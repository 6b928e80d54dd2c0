//! CLI definitions: argument parsing, subcommands, and help text.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  goaldigger render reply.txt             Render an assistant reply to HTML
  goaldigger render - --json < reply.txt  Read from stdin, print plan and charts as JSON
  goaldigger render note.txt --role user  Show how a user message is passed through
  goaldigger normalize chart.json         Normalize one chart config
  goaldigger config                       Show config path and effective settings
  goaldigger completions bash             Generate bash completions
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Render GoalDigger chat replies: annotations, charts, and markdown",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render one message through the content pipeline
    Render {
        /// Input file ('-' or omitted reads stdin)
        input: Option<PathBuf>,
        /// Sender role: assistant, user, or system
        #[arg(short, long, default_value = "assistant")]
        role: String,
        /// Print the render plan and chart specs as JSON instead of markup
        #[arg(long)]
        json: bool,
    },
    /// Normalize a single chart config to the current schema
    Normalize {
        /// Input file ('-' or omitted reads stdin)
        input: Option<PathBuf>,
    },
    /// Show config path and effective configuration
    Config,
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

impl Args {
    /// Log level based on -v/-q flags and the config `debug` switch.
    pub fn log_level(&self, debug: bool) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 || debug {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }
}
