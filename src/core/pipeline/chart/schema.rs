//! Chart config schema versions: detection, legacy-to-current migration, sanitization,
//! and defaults.
//!
//! Legacy (Chart.js 2.x) configs describe axes as `scales.xAxes` / `scales.yAxes` arrays and
//! put `title`, `legend` and `tooltips` at the root of `options`. The current form keys axes
//! by name (`scales.x`, `scales.y`) and nests title/legend/tooltip under `options.plugins`.

use serde_json::{Map, Value};

/// Schema generation of a chart config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    LegacyV2,
    CurrentV4,
}

/// Legacy axis list key and the axis name it maps to.
const LEGACY_AXES: [(&str, &str); 2] = [("xAxes", "x"), ("yAxes", "y")];

/// Legacy root option key and its key under `options.plugins`.
const LEGACY_PLUGINS: [(&str, &str); 3] =
    [("title", "title"), ("legend", "legend"), ("tooltips", "tooltip")];

fn options(spec: &Map<String, Value>) -> Option<&Map<String, Value>> {
    spec.get("options").and_then(Value::as_object)
}

/// Inspect the shape of a chart object and report its schema generation.
pub fn detect(spec: &Map<String, Value>) -> SchemaVersion {
    if spec.get("type").and_then(Value::as_str) == Some("horizontalBar") {
        return SchemaVersion::LegacyV2;
    }
    let Some(opts) = options(spec) else {
        return SchemaVersion::CurrentV4;
    };
    let legacy_axes = opts
        .get("scales")
        .and_then(Value::as_object)
        .is_some_and(|scales| LEGACY_AXES.iter().any(|(k, _)| scales.contains_key(*k)));
    let legacy_plugins = LEGACY_PLUGINS.iter().any(|(k, _)| opts.contains_key(*k));
    if legacy_axes || legacy_plugins {
        SchemaVersion::LegacyV2
    } else {
        SchemaVersion::CurrentV4
    }
}

/// Bring `spec` to the current schema. Running it on a current spec changes nothing.
pub fn migrate(spec: &mut Map<String, Value>) -> SchemaVersion {
    let detected = detect(spec);
    match detected {
        SchemaVersion::CurrentV4 => {}
        SchemaVersion::LegacyV2 => {
            log::debug!("Chart config uses legacy schema; migrating");
            upgrade(spec);
        }
    }
    detected
}

fn upgrade(spec: &mut Map<String, Value>) {
    if spec.get("type").and_then(Value::as_str) == Some("horizontalBar") {
        spec.insert("type".to_string(), Value::String("bar".to_string()));
        let opts = object_entry(spec, "options");
        opts.entry("indexAxis")
            .or_insert_with(|| Value::String("y".to_string()));
    }
    if let Some(opts) = spec.get_mut("options").and_then(Value::as_object_mut) {
        upgrade_scales(opts);
        relocate_plugins(opts);
    }
}

/// Get `map[key]` as an object, replacing a missing or non-object value with `{}`.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(obj) => obj,
        _ => unreachable!("slot was just made an object"),
    }
}

fn upgrade_scales(opts: &mut Map<String, Value>) {
    let Some(scales) = opts.get_mut("scales").and_then(Value::as_object_mut) else {
        return;
    };
    for (legacy_key, axis) in LEGACY_AXES {
        let Some(entries) = scales.remove(legacy_key) else {
            continue;
        };
        let entries = match entries {
            Value::Array(items) => items,
            obj @ Value::Object(_) => vec![obj],
            _ => Vec::new(),
        };
        for (i, entry) in entries.into_iter().enumerate() {
            let Value::Object(mut entry) = entry else {
                continue;
            };
            let key = match entry.remove("id") {
                Some(Value::String(id)) if !id.is_empty() => id,
                _ if i == 0 => axis.to_string(),
                _ => format!("{}{}", axis, i),
            };
            if key != axis {
                entry
                    .entry("axis")
                    .or_insert_with(|| Value::String(axis.to_string()));
            }
            upgrade_axis(&mut entry);
            if scales.contains_key(&key) {
                log::debug!("Axis '{}' already defined; dropping legacy entry", key);
            } else {
                scales.insert(key, Value::Object(entry));
            }
        }
    }
}

fn upgrade_axis(axis: &mut Map<String, Value>) {
    if let Some(label) = axis.remove("scaleLabel")
        && let Value::Object(mut label) = label
    {
        let mut title = Map::new();
        if let Some(display) = label.remove("display") {
            title.insert("display".to_string(), display);
        }
        if let Some(text) = label.remove("labelString") {
            title.insert("text".to_string(), text);
        }
        title.extend(label);
        axis.entry("title").or_insert(Value::Object(title));
    }
    if let Some(grid) = axis.remove("gridLines") {
        axis.entry("grid").or_insert(grid);
    }
    let begin_at_zero = axis
        .get_mut("ticks")
        .and_then(Value::as_object_mut)
        .and_then(|ticks| ticks.remove("beginAtZero"));
    if let Some(flag) = begin_at_zero {
        axis.entry("beginAtZero").or_insert(flag);
    }
}

fn relocate_plugins(opts: &mut Map<String, Value>) {
    for (legacy_key, plugin_key) in LEGACY_PLUGINS {
        let Some(value) = opts.remove(legacy_key) else {
            continue;
        };
        object_entry(opts, "plugins")
            .entry(plugin_key)
            .or_insert(value);
    }
}

/// Recursively drop non-object `callback` properties. Parsed JSON cannot carry functions,
/// so string values are data and are never touched.
pub fn sanitize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, v| key != "callback" || v.is_object());
            for v in map.values_mut() {
                sanitize(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                sanitize(v);
            }
        }
        _ => {}
    }
}

/// Ensure `options.scales` exists and `responsive` / `maintainAspectRatio` are true unless
/// explicitly `false`.
pub fn apply_defaults(spec: &mut Map<String, Value>) {
    let opts = object_entry(spec, "options");
    object_entry(opts, "scales");
    for flag in ["responsive", "maintainAspectRatio"] {
        if opts.get(flag) != Some(&Value::Bool(false)) {
            opts.insert(flag.to_string(), Value::Bool(true));
        }
    }
}
