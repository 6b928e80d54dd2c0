//! CLI-only commands: render, normalize, config info.
//!
//! These stand in for the host page: raw text in, markup or JSON out on stdout.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::core::config::WidgetConfig;
use crate::core::paths;
use crate::core::pipeline::{self, ChartFailure, RenderPlan, RenderSession, Role, chart};

/// Read the input file, or stdin when `path` is absent or `-`.
fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => fs::read_to_string(p),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn read_input_or_exit(path: Option<&Path>) -> String {
    read_input(path).unwrap_or_else(|e| {
        let source = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdin".to_string());
        eprintln!("Error reading {}: {}", source, e);
        std::process::exit(1);
    })
}

#[derive(Serialize)]
struct RenderedChart<'a> {
    id: String,
    spec: &'a chart::ChartSpec,
}

#[derive(Serialize)]
struct RenderOutput<'a> {
    plan: &'a RenderPlan,
    charts: Vec<RenderedChart<'a>>,
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the `render` command: one message through the pipeline.
pub fn run_render(config: &WidgetConfig, input: Option<&Path>, role: Role, json: bool) {
    let raw = read_input_or_exit(input);
    let mut session = RenderSession::new(config.pipeline_settings());
    let plan = pipeline::render_for_role(&mut session, role, &raw);

    if !json {
        println!("{}", plan.markup);
        return;
    }
    let charts = session
        .charts_for(&plan)
        .into_iter()
        .map(|(id, spec)| RenderedChart {
            id: session.element_id(id),
            spec,
        })
        .collect();
    print_json(&RenderOutput {
        plan: &plan,
        charts,
    });
}

/// Run the `normalize` command: print the canonical spec, or the failure and exit 1.
pub fn run_normalize(config: &WidgetConfig, input: Option<&Path>) {
    let raw = read_input_or_exit(input);
    match chart::normalize_payload(&raw) {
        Ok(spec) => print_json(&spec),
        Err(err) => {
            print_json(&ChartFailure::new(&err, &raw, config.preview_len));
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

/// Run the `config` command: display the config file path and effective settings.
pub fn run_config(config: &WidgetConfig) {
    let config_file = paths::config_file()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "—".to_string());
    let mut shown = serde_json::to_value(config).unwrap_or(Value::Null);
    if let Some(key) = shown.get_mut("apiKey")
        && !key.is_null()
    {
        *key = Value::String("set ✓".to_string());
    }

    println!("Config file:  {}", config_file);
    print_json(&shown);
}
