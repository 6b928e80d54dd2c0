//! Application run modes: logger init and command dispatch.

use clap::CommandFactory;

use goaldigger::core;
use goaldigger::core::config::WidgetConfig;
use goaldigger::core::pipeline::Role;

use crate::cli::{self, Args, Commands};

/// Initialize env_logger. `RUST_LOG` wins over the flag-derived default.
pub fn init_logger(args: &Args, config: &WidgetConfig) {
    let log_level = args.log_level(config.debug);
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .try_init();
}

/// Run the selected subcommand.
pub fn dispatch(args: Args, config: &WidgetConfig) {
    match args.command {
        Commands::Render { input, role, json } => {
            core::cli::run_render(config, input.as_deref(), Role::parse(&role), json);
        }
        Commands::Normalize { input } => core::cli::run_normalize(config, input.as_deref()),
        Commands::Config => core::cli::run_config(config),
        Commands::Completions { shell } => {
            let mut cmd = Args::command();
            cli::generate(shell, &mut cmd, core::app::NAME, &mut std::io::stdout());
        }
    }
}
