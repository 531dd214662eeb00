//! Batch task runner.
//!
//! Runs every task of a [`BatchConfig`] in order: obtain the source image,
//! thread it through the task's steps, write the result, and optionally
//! compare each written file against a reference image.
//!
//! ## Directory Layout
//!
//! All configured directories are resolved against a root (the working
//! directory for the CLI):
//!
//! ```text
//! <root>/
//! ├── input/              # config.input_dir
//! │   ├── car.tga
//! │   └── ...
//! ├── output/             # config.output_dir, created on demand
//! │   ├── part1.tga
//! │   ├── ...
//! │   └── report.json     # BatchReport
//! └── examples/           # config.verify.dir
//!     ├── EXAMPLE_part1.tga
//!     └── ...
//! ```
//!
//! ## Progress
//!
//! The runner never prints. Progress goes out as [`BatchEvent`]s on an
//! optional channel; the CLI formats them with
//! [`output::format_batch_event`](crate::output::format_batch_event).

use crate::composite::{self, CompositeError};
use crate::config::{BatchConfig, ConfigError, Layer, Output, Source, Step, TaskConfig};
use crate::pixels::{Channel, Dimensions, PixelBuffer};
use crate::tga::{self, CodecError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Name of the JSON summary written next to the outputs.
pub const REPORT_FILE: &str = "report.json";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("task '{task}': {}: {source}", .path.display())]
    Codec {
        task: String,
        path: PathBuf,
        source: CodecError,
    },
    #[error("task '{task}': {source}")]
    Composite {
        task: String,
        source: CompositeError,
    },
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    TaskStarted {
        /// 1-based position in the task list.
        index: usize,
        total: usize,
        name: String,
    },
    StepApplied {
        description: String,
    },
    OutputWritten {
        file: String,
        dimensions: Dimensions,
        verify: Option<VerifyStatus>,
    },
}

/// Outcome of comparing one output against its reference image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum VerifyStatus {
    Match,
    Differs { samples: usize },
    SizeMismatch { expected: Dimensions, actual: Dimensions },
    Missing { reference: String },
    /// The reference exists but could not be decoded.
    Unreadable { reference: String, reason: String },
}

impl VerifyStatus {
    pub fn is_match(&self) -> bool {
        matches!(self, VerifyStatus::Match)
    }
}

/// Summary of a finished batch, serialized to `report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub verified: bool,
    pub tasks: Vec<TaskReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub name: String,
    pub outputs: Vec<OutputReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    pub file: String,
    pub dimensions: Dimensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify: Option<VerifyStatus>,
}

impl BatchReport {
    /// Number of outputs written.
    pub fn output_count(&self) -> usize {
        self.tasks.iter().map(|t| t.outputs.len()).sum()
    }

    /// Outputs whose verification did not come back as an exact match.
    pub fn failures(&self) -> Vec<&OutputReport> {
        self.tasks
            .iter()
            .flat_map(|t| &t.outputs)
            .filter(|o| o.verify.as_ref().is_some_and(|v| !v.is_match()))
            .collect()
    }
}

/// Run every task in `config`, resolving its directories against `root`.
///
/// When `verify` is set, every written file is compared against
/// `<verify.dir>/<verify.prefix><file>`. Verification mismatches are
/// recorded in the report rather than returned as errors, so one bad output
/// does not hide the rest.
pub fn run(
    config: &BatchConfig,
    root: &Path,
    verify: bool,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    config.validate()?;

    let input_dir = root.join(&config.input_dir);
    let output_dir = root.join(&config.output_dir);
    let verify_dir = root.join(&config.verify.dir);
    std::fs::create_dir_all(&output_dir)?;

    let total = config.tasks.len();
    let mut tasks = Vec::with_capacity(total);

    for (i, task) in config.tasks.iter().enumerate() {
        emit(
            &events,
            BatchEvent::TaskStarted {
                index: i + 1,
                total,
                name: task.name.clone(),
            },
        );

        let runner = TaskRunner {
            task,
            input_dir: &input_dir,
            events: &events,
        };
        let mut outputs = Vec::new();
        for (file, image) in runner.run()? {
            let path = output_dir.join(&file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            tga::encode(&image, &path).map_err(|source| runner.codec_error(&path, source))?;

            let status = if verify {
                let reference = format!("{}{}", config.verify.prefix, file);
                Some(runner.verify(&image, &verify_dir.join(reference))?)
            } else {
                None
            };

            emit(
                &events,
                BatchEvent::OutputWritten {
                    file: file.clone(),
                    dimensions: image.dimensions(),
                    verify: status.clone(),
                },
            );
            outputs.push(OutputReport {
                file,
                dimensions: image.dimensions(),
                verify: status,
            });
        }
        tasks.push(TaskReport {
            name: task.name.clone(),
            outputs,
        });
    }

    let report = BatchReport {
        verified: verify,
        tasks,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(output_dir.join(REPORT_FILE), json)?;
    Ok(report)
}

fn emit(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening.
        tx.send(event).ok();
    }
}

/// Executes one task, attaching the task name to every error.
struct TaskRunner<'a> {
    task: &'a TaskConfig,
    input_dir: &'a Path,
    events: &'a Option<Sender<BatchEvent>>,
}

impl TaskRunner<'_> {
    /// Produce the `(file name, image)` pairs this task writes.
    fn run(&self) -> Result<Vec<(String, PixelBuffer)>, BatchError> {
        let mut image = self.source()?;
        for step in &self.task.steps {
            image = self.step(image, step)?;
            emit(
                self.events,
                BatchEvent::StepApplied {
                    description: step.describe(),
                },
            );
        }

        Ok(match &self.task.output {
            Output::File(file) => vec![(file.clone(), image)],
            Output::Split(files) => {
                let split = composite::split_rgb(&image);
                [Channel::Red, Channel::Green, Channel::Blue]
                    .into_iter()
                    .map(|c| (files.get(c).to_string(), split.get(c).clone()))
                    .collect()
            }
        })
    }

    fn source(&self) -> Result<PixelBuffer, BatchError> {
        match &self.task.source {
            Source::Load(file) => self.load(file),
            Source::Combine(files) => {
                let red = self.load(&files.red)?;
                let green = self.load(&files.green)?;
                let blue = self.load(&files.blue)?;
                composite::combine_rgb(&red, &green, &blue).map_err(|e| self.composite_error(e))
            }
        }
    }

    fn step(&self, image: PixelBuffer, step: &Step) -> Result<PixelBuffer, BatchError> {
        let result = match step {
            Step::Blend { mode, with, layer } => {
                let other = self.load(with)?;
                match layer {
                    Layer::Top => composite::apply(&image, &other, *mode),
                    Layer::Bottom => composite::apply(&other, &image, *mode),
                }
            }
            Step::AddChannel { .. } | Step::ScaleChannel { .. } => {
                let mut image = image;
                match step.adjustment() {
                    Some(adjustment) => adjustment.apply_in_place(&mut image).map(|()| image),
                    None => Ok(image),
                }
            }
            Step::Rotate180 => Ok(composite::rotate180(&image)),
            Step::Grayscale => Ok(composite::grayscale(&image)),
        };
        result.map_err(|e| self.composite_error(e))
    }

    fn load(&self, file: &str) -> Result<PixelBuffer, BatchError> {
        let path = self.input_dir.join(file);
        tga::decode(&path).map_err(|source| self.codec_error(&path, source))
    }

    fn verify(&self, image: &PixelBuffer, reference: &Path) -> Result<VerifyStatus, BatchError> {
        if !reference.exists() {
            return Ok(VerifyStatus::Missing {
                reference: reference.display().to_string(),
            });
        }
        let expected = match tga::decode(reference) {
            Ok(expected) => expected,
            Err(e) => {
                return Ok(VerifyStatus::Unreadable {
                    reference: reference.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };
        if expected.dimensions() != image.dimensions() {
            return Ok(VerifyStatus::SizeMismatch {
                expected: expected.dimensions(),
                actual: image.dimensions(),
            });
        }
        let samples =
            composite::count_differences(&expected, image).map_err(|e| self.composite_error(e))?;
        Ok(if samples == 0 {
            VerifyStatus::Match
        } else {
            VerifyStatus::Differs { samples }
        })
    }

    fn codec_error(&self, path: &Path, source: CodecError) -> BatchError {
        BatchError::Codec {
            task: self.task.name.clone(),
            path: path.to_path_buf(),
            source,
        }
    }

    fn composite_error(&self, source: CompositeError) -> BatchError {
        BatchError::Composite {
            task: self.task.name.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::BlendMode;
    use crate::config::ChannelFiles;
    use crate::test_helpers::*;
    use std::fs;

    fn input(tmp: &Path, name: &str) -> PixelBuffer {
        tga::decode(&tmp.join("input").join(name)).unwrap()
    }

    fn output(tmp: &Path, name: &str) -> PixelBuffer {
        tga::decode(&tmp.join("output").join(name)).unwrap()
    }

    fn single_task(task: TaskConfig) -> BatchConfig {
        BatchConfig {
            tasks: vec![task],
            ..BatchConfig::default()
        }
    }

    // =========================================================================
    // Stock batch
    // =========================================================================

    #[test]
    fn stock_batch_writes_every_output() {
        let tmp = setup_stock_inputs();
        let report = run(&BatchConfig::default(), tmp.path(), false, None).unwrap();

        assert_eq!(report.tasks.len(), 10);
        assert_eq!(report.output_count(), 12);
        assert!(!report.verified);
        for task in &report.tasks {
            for out in &task.outputs {
                assert!(tmp.path().join("output").join(&out.file).exists());
                assert_eq!(out.dimensions, Dimensions::new(STOCK_WIDTH, STOCK_HEIGHT));
                assert_eq!(out.verify, None);
            }
        }
        assert!(tmp.path().join("output").join(REPORT_FILE).exists());
    }

    #[test]
    fn stock_outputs_match_direct_composition() {
        let tmp = setup_stock_inputs();
        let p = tmp.path();
        run(&BatchConfig::default(), p, false, None).unwrap();

        let part1 = composite::apply(
            &input(p, "layer1.tga"),
            &input(p, "pattern1.tga"),
            BlendMode::Multiply,
        )
        .unwrap();
        assert_eq!(output(p, "part1.tga"), part1);

        let stage = composite::apply(
            &input(p, "layer2.tga"),
            &input(p, "circles.tga"),
            BlendMode::Multiply,
        )
        .unwrap();
        let part4 =
            composite::apply(&stage, &input(p, "pattern2.tga"), BlendMode::Subtract).unwrap();
        assert_eq!(output(p, "part4.tga"), part4);

        let mut part7 = input(p, "car.tga");
        composite::scale_channel(&mut part7, Channel::Red, 4.0).unwrap();
        composite::scale_channel(&mut part7, Channel::Blue, 0.0).unwrap();
        assert_eq!(output(p, "part7.tga"), part7);

        assert_eq!(
            output(p, "part10.tga"),
            composite::rotate180(&input(p, "text2.tga"))
        );
    }

    #[test]
    fn split_task_writes_gray_channels() {
        let tmp = setup_stock_inputs();
        let p = tmp.path();
        run(&BatchConfig::default(), p, false, None).unwrap();

        let car = input(p, "car.tga");
        let red = output(p, "part8_r.tga");
        for (src, gray) in car.pixels().zip(red.pixels()) {
            assert_eq!(gray, [src[2]; 3]);
        }
        let rebuilt = composite::combine_rgb(
            &red,
            &output(p, "part8_g.tga"),
            &output(p, "part8_b.tga"),
        )
        .unwrap();
        assert_eq!(rebuilt, car);
    }

    #[test]
    fn report_json_lists_tasks() {
        let tmp = setup_stock_inputs();
        run(&BatchConfig::default(), tmp.path(), false, None).unwrap();

        let json = fs::read_to_string(tmp.path().join("output").join(REPORT_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["verified"], false);
        assert_eq!(value["tasks"][0]["name"], "part1");
        assert_eq!(value["tasks"][0]["outputs"][0]["file"], "part1.tga");
        assert_eq!(value["tasks"][0]["outputs"][0]["dimensions"]["width"], 8);
        assert!(value["tasks"][0]["outputs"][0].get("verify").is_none());
    }

    // =========================================================================
    // Steps
    // =========================================================================

    #[test]
    fn bottom_layer_swaps_operands() {
        let tmp = setup_stock_inputs();
        let p = tmp.path();
        let config = single_task(TaskConfig {
            name: "under".into(),
            source: Source::Load("car.tga".into()),
            steps: vec![Step::Blend {
                mode: BlendMode::Subtract,
                with: "layer2.tga".into(),
                layer: Layer::Bottom,
            }],
            output: Output::File("under.tga".into()),
        });
        run(&config, p, false, None).unwrap();

        let expected = composite::apply(
            &input(p, "layer2.tga"),
            &input(p, "car.tga"),
            BlendMode::Subtract,
        )
        .unwrap();
        assert_eq!(output(p, "under.tga"), expected);
    }

    #[test]
    fn combine_source_with_grayscale_step() {
        let tmp = setup_stock_inputs();
        let p = tmp.path();
        let config = single_task(TaskConfig {
            name: "gray".into(),
            source: Source::Combine(ChannelFiles {
                red: "layer_red.tga".into(),
                green: "layer_green.tga".into(),
                blue: "layer_blue.tga".into(),
            }),
            steps: vec![Step::Grayscale],
            output: Output::File("gray.tga".into()),
        });
        run(&config, p, false, None).unwrap();

        assert!(output(p, "gray.tga").pixels().all(|[b, g, r]| b == g && g == r));
    }

    #[test]
    fn outputs_into_missing_nested_dir() {
        let tmp = setup_stock_inputs();
        let config = BatchConfig {
            output_dir: "out/nested".into(),
            ..BatchConfig::default()
        };
        run(&config, tmp.path(), false, None).unwrap();
        assert!(tmp.path().join("out/nested/part10.tga").exists());
    }

    #[test]
    fn nested_output_file_names_create_their_dirs() {
        let tmp = setup_stock_inputs();
        let p = tmp.path();
        let config = BatchConfig {
            tasks: vec![
                TaskConfig {
                    name: "nested".into(),
                    source: Source::Load("car.tga".into()),
                    steps: vec![Step::Rotate180],
                    output: Output::File("sub/part1.tga".into()),
                },
                TaskConfig {
                    name: "channels".into(),
                    source: Source::Load("car.tga".into()),
                    steps: Vec::new(),
                    output: Output::Split(ChannelFiles {
                        red: "split/r/part8_r.tga".into(),
                        green: "split/g/part8_g.tga".into(),
                        blue: "split/b/part8_b.tga".into(),
                    }),
                },
            ],
            ..BatchConfig::default()
        };

        let report = run(&config, p, false, None).unwrap();
        assert_eq!(report.output_count(), 4);
        assert_eq!(
            output(p, "sub/part1.tga"),
            composite::rotate180(&input(p, "car.tga"))
        );
        for file in ["split/r/part8_r.tga", "split/g/part8_g.tga", "split/b/part8_b.tga"] {
            assert!(p.join("output").join(file).exists(), "{file}");
        }
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn missing_input_names_task_and_file() {
        let tmp = setup_stock_inputs();
        fs::remove_file(tmp.path().join("input/pattern2.tga")).unwrap();

        let err = run(&BatchConfig::default(), tmp.path(), false, None).unwrap_err();
        match &err {
            BatchError::Codec { task, path, source } => {
                assert_eq!(task, "part3");
                assert!(path.ends_with("pattern2.tga"));
                assert!(matches!(source, CodecError::Io(_)));
            }
            other => panic!("expected codec error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("task 'part3': "));
    }

    #[test]
    fn size_mismatch_names_task() {
        let tmp = setup_stock_inputs();
        write_tga(
            &tmp.path().join("input"),
            "pattern1.tga",
            &PixelBuffer::filled(2, 2, [0; 3]),
        );

        let err = run(&BatchConfig::default(), tmp.path(), false, None).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Composite {
                ref task,
                source: CompositeError::DimensionMismatch { .. }
            } if task == "part1"
        ));
    }

    #[test]
    fn invalid_config_rejected_before_any_work() {
        let tmp = setup_stock_inputs();
        let config = BatchConfig {
            tasks: Vec::new(),
            ..BatchConfig::default()
        };
        assert!(matches!(
            run(&config, tmp.path(), false, None),
            Err(BatchError::Config(_))
        ));
        assert!(!tmp.path().join("output").exists());
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Run once, then copy every output into the reference directory.
    fn seed_references(root: &Path) {
        let config = BatchConfig::default();
        run(&config, root, false, None).unwrap();
        let refs = root.join(&config.verify.dir);
        fs::create_dir_all(&refs).unwrap();
        for task in &config.tasks {
            for file in task.output_files() {
                fs::copy(
                    root.join("output").join(file),
                    refs.join(format!("{}{}", config.verify.prefix, file)),
                )
                .unwrap();
            }
        }
    }

    #[test]
    fn verify_against_own_outputs_matches() {
        let tmp = setup_stock_inputs();
        seed_references(tmp.path());

        let report = run(&BatchConfig::default(), tmp.path(), true, None).unwrap();
        assert!(report.verified);
        assert!(report.failures().is_empty());
        assert!(
            report
                .tasks
                .iter()
                .flat_map(|t| &t.outputs)
                .all(|o| o.verify == Some(VerifyStatus::Match))
        );
    }

    #[test]
    fn verify_counts_differing_samples() {
        let tmp = setup_stock_inputs();
        seed_references(tmp.path());

        let reference = tmp.path().join("examples/EXAMPLE_part10.tga");
        let mut perturbed = tga::decode(&reference).unwrap();
        composite::add_to_channel(&mut perturbed, Channel::Green, -300);
        let expected = composite::count_differences(&tga::decode(&reference).unwrap(), &perturbed)
            .unwrap();
        tga::encode(&perturbed, &reference).unwrap();

        let report = run(&BatchConfig::default(), tmp.path(), true, None).unwrap();
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].file, "part10.tga");
        assert_eq!(
            failures[0].verify,
            Some(VerifyStatus::Differs { samples: expected })
        );
    }

    #[test]
    fn verify_reports_missing_and_resized_references() {
        let tmp = setup_stock_inputs();
        seed_references(tmp.path());
        let refs = tmp.path().join("examples");
        fs::remove_file(refs.join("EXAMPLE_part1.tga")).unwrap();
        write_tga(&refs, "EXAMPLE_part2.tga", &PixelBuffer::filled(3, 3, [0; 3]));

        let report = run(&BatchConfig::default(), tmp.path(), true, None).unwrap();
        let failures = report.failures();
        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0].verify, Some(VerifyStatus::Missing { .. })));
        assert_eq!(
            failures[1].verify,
            Some(VerifyStatus::SizeMismatch {
                expected: Dimensions::new(3, 3),
                actual: Dimensions::new(STOCK_WIDTH, STOCK_HEIGHT),
            })
        );
    }

    #[test]
    fn corrupt_reference_is_recorded_not_fatal() {
        let tmp = setup_stock_inputs();
        seed_references(tmp.path());
        fs::write(tmp.path().join("examples/EXAMPLE_part1.tga"), [0u8; 7]).unwrap();

        let report = run(&BatchConfig::default(), tmp.path(), true, None).unwrap();
        assert_eq!(report.output_count(), 12);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].file, "part1.tga");
        match &failures[0].verify {
            Some(VerifyStatus::Unreadable { reference, reason }) => {
                assert!(reference.ends_with("EXAMPLE_part1.tga"));
                assert!(reason.contains("got 7"));
            }
            other => panic!("expected unreadable reference, got {other:?}"),
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[test]
    fn events_follow_task_order() {
        let tmp = setup_stock_inputs();
        let (tx, rx) = std::sync::mpsc::channel();
        run(&BatchConfig::default(), tmp.path(), false, Some(tx)).unwrap();

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(
            events[0],
            BatchEvent::TaskStarted {
                index: 1,
                total: 10,
                name: "part1".into()
            }
        );
        assert_eq!(
            events[1],
            BatchEvent::StepApplied {
                description: "multiply with pattern1.tga".into()
            }
        );
        assert!(matches!(
            &events[2],
            BatchEvent::OutputWritten { file, verify: None, .. } if file == "part1.tga"
        ));

        let written = events
            .iter()
            .filter(|e| matches!(e, BatchEvent::OutputWritten { .. }))
            .count();
        assert_eq!(written, 12);
    }
}
