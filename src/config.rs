//! Batch configuration module.
//!
//! Handles loading, validating, and merging the batch task file. A batch is
//! a named list of tasks; each task loads (or combines) its inputs, runs a
//! chain of steps over the result, and writes one or three TGA files.
//!
//! ## Config File Location
//!
//! `tgablend batch` reads `tgablend.toml` from the working directory, or the
//! file given with `--config`. Without a file the stock task list runs.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input_dir = "input"        # Where task inputs are read from
//! output_dir = "output"      # Created if missing
//!
//! [verify]
//! dir = "examples"           # Reference images for `batch --verify`
//! prefix = "EXAMPLE_"        # Reference name = prefix + output name
//!
//! [processing]
//! max_threads = 4            # Cap on worker threads (omit for auto)
//!
//! [[tasks]]
//! name = "part1"
//! source = { load = "layer1.tga" }
//! steps = [{ op = "blend", mode = "multiply", with = "pattern1.tga" }]
//! output = { file = "part1.tga" }
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables merge key by key over the stock defaults;
//! arrays replace, so a file that defines `[[tasks]]` replaces the whole
//! stock task list. Unknown keys are rejected to catch typos early.

use crate::composite::{BlendMode, ChannelAdjustment};
use crate::pixels::Channel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Batch configuration loaded from `tgablend.toml`.
///
/// All fields have defaults; the default task list is the stock ten-part
/// script. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Directory task inputs are resolved against.
    pub input_dir: String,
    /// Directory task outputs are written to. Created on demand.
    pub output_dir: String,
    /// Reference images for verification runs.
    pub verify: VerifyConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Tasks, run in order.
    pub tasks: Vec<TaskConfig>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: "input".to_string(),
            output_dir: "output".to_string(),
            verify: VerifyConfig::default(),
            processing: ProcessingConfig::default(),
            tasks: stock_tasks(),
        }
    }
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tasks.is_empty() {
            return Err(ConfigError::Validation("tasks must not be empty".into()));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if task.name.trim().is_empty() {
                return Err(ConfigError::Validation("task names must not be empty".into()));
            }
            if !seen.insert(task.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }
            if task
                .input_files()
                .iter()
                .chain(task.output_files().iter())
                .any(|f| f.trim().is_empty())
            {
                return Err(ConfigError::Validation(format!(
                    "task '{}': file names must not be empty",
                    task.name
                )));
            }
            for step in &task.steps {
                if let Some(adjustment) = step.adjustment() {
                    adjustment.validate().map_err(|e| {
                        ConfigError::Validation(format!("task '{}': {e}", task.name))
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// Where reference images live for `batch --verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    pub dir: String,
    /// Prepended to each output file name to find its reference.
    pub prefix: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            dir: "examples".to_string(),
            prefix: "EXAMPLE_".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads for per-pixel work.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// One unit of batch work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,
    pub source: Source,
    #[serde(default)]
    pub steps: Vec<Step>,
    pub output: Output,
}

impl TaskConfig {
    /// Every input file this task reads, in the order it reads them.
    pub fn input_files(&self) -> Vec<&str> {
        let mut files = match &self.source {
            Source::Load(file) => vec![file.as_str()],
            Source::Combine(files) => files.as_array().to_vec(),
        };
        files.extend(self.steps.iter().filter_map(|step| match step {
            Step::Blend { with, .. } => Some(with.as_str()),
            _ => None,
        }));
        files
    }

    /// Every file this task writes.
    pub fn output_files(&self) -> Vec<&str> {
        match &self.output {
            Output::File(file) => vec![file.as_str()],
            Output::Split(files) => files.as_array().to_vec(),
        }
    }
}

/// How a task obtains its starting image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Decode a single file.
    Load(String),
    /// Rebuild a color image from three per-channel files.
    Combine(ChannelFiles),
}

/// Where a task writes its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Output {
    /// Encode the result as one file.
    File(String),
    /// Split the result into three gray images.
    Split(ChannelFiles),
}

/// One file name per color channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelFiles {
    pub red: String,
    pub green: String,
    pub blue: String,
}

impl ChannelFiles {
    pub fn get(&self, channel: Channel) -> &str {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Red, green, blue.
    pub fn as_array(&self) -> [&str; 3] {
        [self.red.as_str(), self.green.as_str(), self.blue.as_str()]
    }
}

/// Which side of a blend the loaded `with` image takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// `with` is the overlay; the running image is the base.
    #[default]
    Top,
    /// `with` is the base; the running image is the overlay.
    Bottom,
}

/// One operation in a task's chain. Each step consumes the running image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Blend {
        mode: BlendMode,
        with: String,
        #[serde(default, skip_serializing_if = "is_top")]
        layer: Layer,
    },
    AddChannel {
        channel: Channel,
        delta: i32,
    },
    ScaleChannel {
        channel: Channel,
        factor: f32,
    },
    Rotate180,
    Grayscale,
}

fn is_top(layer: &Layer) -> bool {
    *layer == Layer::Top
}

impl Step {
    /// The in-place transform behind a channel step, if this is one.
    pub fn adjustment(&self) -> Option<ChannelAdjustment> {
        match *self {
            Step::AddChannel { channel, delta } => Some(ChannelAdjustment::Add { channel, delta }),
            Step::ScaleChannel { channel, factor } => {
                Some(ChannelAdjustment::Scale { channel, factor })
            }
            _ => None,
        }
    }

    /// Short human-readable description, used in progress output.
    pub fn describe(&self) -> String {
        match self {
            Step::Blend { mode, with, layer } => match layer {
                Layer::Top => format!("{mode} with {with}"),
                Layer::Bottom => format!("{mode} under {with}"),
            },
            Step::AddChannel { channel, delta } => format!("add {delta} to {channel}"),
            Step::ScaleChannel { channel, factor } => format!("scale {channel} by {factor}"),
            Step::Rotate180 => "rotate 180".to_string(),
            Step::Grayscale => "grayscale".to_string(),
        }
    }
}

fn load(task: &str, file: &str, steps: Vec<Step>, output: &str) -> TaskConfig {
    TaskConfig {
        name: task.to_string(),
        source: Source::Load(file.to_string()),
        steps,
        output: Output::File(output.to_string()),
    }
}

fn blend(mode: BlendMode, with: &str) -> Step {
    Step::Blend {
        mode,
        with: with.to_string(),
        layer: Layer::Top,
    }
}

fn channel_files(red: &str, green: &str, blue: &str) -> ChannelFiles {
    ChannelFiles {
        red: red.to_string(),
        green: green.to_string(),
        blue: blue.to_string(),
    }
}

/// The stock ten-part batch script.
pub fn stock_tasks() -> Vec<TaskConfig> {
    vec![
        load(
            "part1",
            "layer1.tga",
            vec![blend(BlendMode::Multiply, "pattern1.tga")],
            "part1.tga",
        ),
        load(
            "part2",
            "car.tga",
            vec![blend(BlendMode::Subtract, "layer2.tga")],
            "part2.tga",
        ),
        load(
            "part3",
            "layer1.tga",
            vec![
                blend(BlendMode::Multiply, "pattern2.tga"),
                blend(BlendMode::Screen, "text.tga"),
            ],
            "part3.tga",
        ),
        load(
            "part4",
            "layer2.tga",
            vec![
                blend(BlendMode::Multiply, "circles.tga"),
                blend(BlendMode::Subtract, "pattern2.tga"),
            ],
            "part4.tga",
        ),
        load(
            "part5",
            "pattern1.tga",
            vec![blend(BlendMode::Overlay, "layer1.tga")],
            "part5.tga",
        ),
        load(
            "part6",
            "car.tga",
            vec![Step::AddChannel {
                channel: Channel::Green,
                delta: 200,
            }],
            "part6.tga",
        ),
        load(
            "part7",
            "car.tga",
            vec![
                Step::ScaleChannel {
                    channel: Channel::Red,
                    factor: 4.0,
                },
                Step::ScaleChannel {
                    channel: Channel::Blue,
                    factor: 0.0,
                },
            ],
            "part7.tga",
        ),
        TaskConfig {
            name: "part8".to_string(),
            source: Source::Load("car.tga".to_string()),
            steps: Vec::new(),
            output: Output::Split(channel_files("part8_r.tga", "part8_g.tga", "part8_b.tga")),
        },
        TaskConfig {
            name: "part9".to_string(),
            source: Source::Combine(channel_files(
                "layer_red.tga",
                "layer_green.tga",
                "layer_blue.tga",
            )),
            steps: Vec::new(),
            output: Output::File("part9.tga".to_string()),
        },
        load("part10", "text2.tga", vec![Step::Rotate180], "part10.tga"),
    ]
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BatchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BatchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the batch config at `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock config.
pub fn load_config(path: &Path) -> Result<BatchConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tgablend Batch Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Tables merge over the defaults key by key. Arrays replace: defining any
# [[tasks]] replaces the whole stock task list.
# Unknown keys will cause an error.

# Directory task inputs are read from.
input_dir = "input"

# Directory task outputs are written to (created if missing).
output_dir = "output"

# ---------------------------------------------------------------------------
# Verification (`tgablend batch --verify`)
# ---------------------------------------------------------------------------
[verify]
# Directory holding reference images.
dir = "examples"

# Reference file name = prefix + output file name.
prefix = "EXAMPLE_"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads for per-pixel work.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4

# ---------------------------------------------------------------------------
# Tasks
# ---------------------------------------------------------------------------
# Each task has:
#   name    unique label
#   source  { load = "file.tga" }
#           or { combine = { red = "...", green = "...", blue = "..." } }
#   steps   applied in order to the running image (optional):
#           { op = "blend", mode = "add|subtract|multiply|screen|overlay",
#             with = "file.tga", layer = "top|bottom" }
#             (layer = where `with` goes; default "top")
#           { op = "add-channel", channel = "red|green|blue", delta = 200 }
#           { op = "scale-channel", channel = "red|green|blue", factor = 4.0 }
#           { op = "rotate180" }
#           { op = "grayscale" }
#   output  { file = "out.tga" }
#           or { split = { red = "...", green = "...", blue = "..." } }

[[tasks]]
name = "part1"
source = { load = "layer1.tga" }
steps = [{ op = "blend", mode = "multiply", with = "pattern1.tga" }]
output = { file = "part1.tga" }

[[tasks]]
name = "part2"
source = { load = "car.tga" }
steps = [{ op = "blend", mode = "subtract", with = "layer2.tga" }]
output = { file = "part2.tga" }

[[tasks]]
name = "part3"
source = { load = "layer1.tga" }
steps = [
    { op = "blend", mode = "multiply", with = "pattern2.tga" },
    { op = "blend", mode = "screen", with = "text.tga" },
]
output = { file = "part3.tga" }

[[tasks]]
name = "part4"
source = { load = "layer2.tga" }
steps = [
    { op = "blend", mode = "multiply", with = "circles.tga" },
    { op = "blend", mode = "subtract", with = "pattern2.tga" },
]
output = { file = "part4.tga" }

[[tasks]]
name = "part5"
source = { load = "pattern1.tga" }
steps = [{ op = "blend", mode = "overlay", with = "layer1.tga" }]
output = { file = "part5.tga" }

[[tasks]]
name = "part6"
source = { load = "car.tga" }
steps = [{ op = "add-channel", channel = "green", delta = 200 }]
output = { file = "part6.tga" }

[[tasks]]
name = "part7"
source = { load = "car.tga" }
steps = [
    { op = "scale-channel", channel = "red", factor = 4.0 },
    { op = "scale-channel", channel = "blue", factor = 0.0 },
]
output = { file = "part7.tga" }

[[tasks]]
name = "part8"
source = { load = "car.tga" }
output = { split = { red = "part8_r.tga", green = "part8_g.tga", blue = "part8_b.tga" } }

[[tasks]]
name = "part9"
source = { combine = { red = "layer_red.tga", green = "layer_green.tga", blue = "layer_blue.tga" } }
output = { file = "part9.tga" }

[[tasks]]
name = "part10"
source = { load = "text2.tga" }
steps = [{ op = "rotate180" }]
output = { file = "part10.tga" }
"##
}
