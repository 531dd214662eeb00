use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tgablend::composite::{self, BlendMode, ChannelAdjustment};
use tgablend::pixels::{Channel, PixelBuffer};
use tgablend::{batch, config, export, output, scan, tga};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "tgablend")]
#[command(about = "Blend, adjust and inspect uncompressed 24-bit TGA images")]
#[command(long_about = "\
Blend, adjust and inspect uncompressed 24-bit TGA images

Only uncompressed true-color TGA (type 2, 24 bits per pixel, no color map)
is accepted. Files are read in either row order and always written
bottom-left origin.

Blend modes (B = base, O = overlay, values 0-255):
  add        min(B + O, 255)
  subtract   max(B - O, 0)
  multiply   B * O / 255
  screen     255 - (255 - B) * (255 - O) / 255
  overlay    multiply (doubled) where B < 128, screen (doubled) otherwise

Run 'tgablend gen-config' to generate a documented batch file.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Blend OVERLAY onto BASE and write the result
    Blend {
        #[arg(value_enum)]
        mode: ModeArg,
        base: PathBuf,
        overlay: PathBuf,
        output: PathBuf,
    },
    /// Offset or scale one color channel
    Adjust {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_enum)]
        channel: ChannelArg,
        #[command(flatten)]
        amount: AdjustAmount,
    },
    /// Write one gray image per color channel
    Split {
        input: PathBuf,
        red: PathBuf,
        green: PathBuf,
        blue: PathBuf,
    },
    /// Rebuild a color image from per-channel images
    Combine {
        red: PathBuf,
        green: PathBuf,
        blue: PathBuf,
        output: PathBuf,
    },
    /// Rotate an image by 180 degrees
    Rotate { input: PathBuf, output: PathBuf },
    /// Count differing samples between two images (exit 1 if any)
    Compare { a: PathBuf, b: PathBuf },
    /// Show header details for a file or every .tga under a directory
    Inspect { path: PathBuf },
    /// Convert to PNG for viewing
    Export { input: PathBuf, output: PathBuf },
    /// Run the task list from a batch config
    Batch {
        /// Batch config file (stock task list if missing)
        #[arg(long, default_value = "tgablend.toml")]
        config: PathBuf,
        /// Compare every output against its reference image
        #[arg(long)]
        verify: bool,
    },
    /// Print a stock tgablend.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Add,
    Subtract,
    Multiply,
    Screen,
    Overlay,
}

impl From<ModeArg> for BlendMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Add => BlendMode::Add,
            ModeArg::Subtract => BlendMode::Subtract,
            ModeArg::Multiply => BlendMode::Multiply,
            ModeArg::Screen => BlendMode::Screen,
            ModeArg::Overlay => BlendMode::Overlay,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Red,
    Green,
    Blue,
}

impl From<ChannelArg> for Channel {
    fn from(channel: ChannelArg) -> Self {
        match channel {
            ChannelArg::Red => Channel::Red,
            ChannelArg::Green => Channel::Green,
            ChannelArg::Blue => Channel::Blue,
        }
    }
}

/// Exactly one of `--add` or `--scale`.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct AdjustAmount {
    /// Add to the channel, clamping to 0-255
    #[arg(long, allow_negative_numbers = true)]
    add: Option<i32>,
    /// Multiply the channel, rounding and clamping to 0-255
    #[arg(long)]
    scale: Option<f32>,
}

impl AdjustAmount {
    fn adjustment(&self, channel: Channel) -> ChannelAdjustment {
        match (self.add, self.scale) {
            (_, Some(factor)) => ChannelAdjustment::Scale { channel, factor },
            (delta, None) => ChannelAdjustment::Add {
                channel,
                delta: delta.unwrap_or(0),
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Blend {
            mode,
            base,
            overlay,
            output,
        } => {
            let base = tga::decode(&base)?;
            let overlay = tga::decode(&overlay)?;
            let result = composite::apply(&base, &overlay, mode.into())?;
            write_tga(&result, &output)?;
        }
        Command::Adjust {
            input,
            output,
            channel,
            amount,
        } => {
            let adjustment = amount.adjustment(channel.into());
            adjustment.validate()?;
            let mut image = tga::decode(&input)?;
            adjustment.apply_in_place(&mut image)?;
            write_tga(&image, &output)?;
        }
        Command::Split {
            input,
            red,
            green,
            blue,
        } => {
            let split = composite::split_rgb(&tga::decode(&input)?);
            write_tga(&split.red, &red)?;
            write_tga(&split.green, &green)?;
            write_tga(&split.blue, &blue)?;
        }
        Command::Combine {
            red,
            green,
            blue,
            output,
        } => {
            let result = composite::combine_rgb(
                &tga::decode(&red)?,
                &tga::decode(&green)?,
                &tga::decode(&blue)?,
            )?;
            write_tga(&result, &output)?;
        }
        Command::Rotate { input, output } => {
            let result = composite::rotate180(&tga::decode(&input)?);
            write_tga(&result, &output)?;
        }
        Command::Compare { a, b } => {
            let a = tga::decode(&a)?;
            let b = tga::decode(&b)?;
            let differences = composite::count_differences(&a, &b)?;
            println!("{}", output::format_compare(differences, a.dimensions()));
            if differences > 0 {
                std::process::exit(1);
            }
        }
        Command::Inspect { path } => {
            let entries = scan::scan(&path)?;
            output::print_scan_output(&entries);
        }
        Command::Export {
            input,
            output: path,
        } => {
            let image = tga::decode(&input)?;
            ensure_parent(&path)?;
            export::export_png(&image, &path)?;
            println!("{}", output::format_written(&path, image.dimensions()));
        }
        Command::Batch { config, verify } => {
            let batch_config = config::load_config(&config)?;
            init_thread_pool(&batch_config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::run(&batch_config, Path::new("."), verify, Some(tx));
            printer.join().map_err(|_| "output thread panicked")?;
            let report = result?;
            output::print_batch_summary(&report);
            if !report.failures().is_empty() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Encode to `path`, creating its directory first.
fn write_tga(image: &PixelBuffer, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    ensure_parent(path)?;
    tga::encode(image, path)?;
    println!("{}", output::format_written(path, image.dimensions()));
    Ok(())
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
