//! # GoalDigger
//!
//! Message content pipeline for the GoalDigger chat widget. An assistant reply goes in as
//! raw text; sanitized HTML plus the list of charts to realize comes out.
//!
//! - [`core::pipeline`]: segment scanner, chart normalizer, markdown renderer
//! - [`core::transcript`]: ordered messages, chart registry lifetime, context vault
//! - [`core::config`]: widget configuration

pub mod core;
