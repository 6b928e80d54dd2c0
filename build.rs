//! Build script: validates config/defaults.json at compile time.

use std::path::PathBuf;

fn main() {
    let manifest_dir =
        std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR set by Cargo");
    let defaults_path: PathBuf = [&manifest_dir, "config", "defaults.json"].iter().collect();
    println!("cargo:rerun-if-changed={}", defaults_path.display());
    let json = std::fs::read_to_string(&defaults_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read {}: {}. defaults.json must exist and be valid.",
            defaults_path.display(),
            e
        )
    });
    #[derive(serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    #[allow(dead_code)]
    struct Defaults {
        welcome_message: String,
        preview_len: usize,
        chart_id_prefix: String,
        debug: bool,
    }
    let defaults: Defaults = serde_json::from_str(&json).unwrap_or_else(|e| {
        panic!(
            "defaults.json is invalid JSON: {}. Fix the file and rebuild.",
            e
        )
    });
    if defaults.preview_len == 0 {
        panic!("defaults.json: previewLen must be greater than zero");
    }
    if defaults.chart_id_prefix.is_empty()
        || !defaults
            .chart_id_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        panic!("defaults.json: chartIdPrefix must be non-empty and use only [A-Za-z0-9_-]");
    }
}
