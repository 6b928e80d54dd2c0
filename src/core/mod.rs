pub mod app;
pub mod cli;
pub mod config;
pub mod paths;
pub mod pipeline;
pub mod transcript;
pub mod vault;
