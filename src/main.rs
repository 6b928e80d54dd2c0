//! # GoalDigger
//!
//! Command-line host for the GoalDigger message content pipeline: feeds raw chat replies
//! through the pipeline and prints the resulting markup, render plan, or chart specs.

mod cli;
mod run;

use clap::Parser;
use dotenv::dotenv;

fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let args = cli::Args::parse();

    // Print user-friendly message; exit uses Display not Debug
    let config = goaldigger::core::config::load().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    run::init_logger(&args, &config);
    run::dispatch(args, &config);
}
