use clap::{Parser, Subcommand};
use imgfit::batch::{self, BatchSummary};
use imgfit::config::{self, ToolConfig};
use imgfit::imaging::{EncodeTarget, OperationError, RustBackend, SizeUnit};
use imgfit::output;
use imgfit::pipeline::{Edit, default_output_path, run_file};
use imgfit::source;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgfit")]
#[command(about = "Resize, rotate and crop images, and fit JPEGs to a size budget")]
#[command(long_about = "\
Resize, rotate and crop images, and fit JPEGs to a size budget

Every command reads one image (JPEG, PNG, GIF or WebP), applies one edit and
writes a JPEG. Without -o the result lands next to the input as
<name>-resized.jpg, <name>-rotated.jpg or <name>-cropped.jpg.

With --target, resize searches for the highest JPEG quality whose output
fits the budget. If even the lowest quality is too large, the smallest
result is written anyway and reported as over target.

Settings are read from --config, else ./imgfit.toml, else built-in defaults.
Run 'imgfit gen-config' to print a documented imgfit.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./imgfit.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Output flags shared by the single-file commands.
#[derive(clap::Args, Clone)]
struct OutputArgs {
    /// Output file (default: <input dir>/<name>-<edit>.jpg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
}

/// Resize dimensions and size budget, shared by `resize` and `batch`.
#[derive(clap::Args, Clone)]
struct ResizeArgs {
    /// Output width in pixels; derived from the aspect ratio when omitted
    #[arg(long)]
    width: Option<String>,

    /// Output height in pixels; derived from the aspect ratio when omitted
    #[arg(long)]
    height: Option<String>,

    /// Largest acceptable output size
    #[arg(long)]
    target: Option<f64>,

    /// Unit for --target
    #[arg(long, value_enum, default_value = "kb")]
    unit: SizeUnit,
}

impl ResizeArgs {
    fn edit(&self) -> Result<Edit, OperationError> {
        Edit::resize_from_text(
            self.width.as_deref(),
            self.height.as_deref(),
            self.target.map(|value| EncodeTarget {
                value,
                unit: self.unit,
            }),
        )
    }
}

#[derive(Subcommand)]
enum Command {
    /// Resize to exact dimensions, optionally to a target file size
    Resize {
        input: PathBuf,
        #[command(flatten)]
        resize: ResizeArgs,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Rotate clockwise by 90 degrees
    Rotate {
        input: PathBuf,
        /// Number of quarter turns
        #[arg(long, default_value_t = 1)]
        times: u32,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Crop the largest centered square
    Crop {
        input: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Show format, dimensions and file size
    Info {
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resize every image under a directory
    Batch {
        input_dir: PathBuf,
        /// Where results go; subdirectories are mirrored
        #[arg(long)]
        output_dir: PathBuf,
        #[command(flatten)]
        resize: ResizeArgs,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock imgfit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let load = || -> Result<(ToolConfig, RustBackend), Box<dyn std::error::Error>> {
        let config = config::load_config(cli.config.as_deref(), &std::env::current_dir()?)?;
        let backend = RustBackend::with_filter(config.resize.filter);
        Ok((config, backend))
    };

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Resize { input, resize, out } => {
            let (config, backend) = load()?;
            single(&backend, &input, &resize.edit()?, &out, &config, "Resized")?;
        }
        Command::Rotate { input, times, out } => {
            let (config, backend) = load()?;
            single(&backend, &input, &Edit::Rotate { times }, &out, &config, "Rotated")?;
        }
        Command::Crop { input, out } => {
            let (config, backend) = load()?;
            single(&backend, &input, &Edit::Crop, &out, &config, "Cropped")?;
        }
        Command::Info { input, json } => {
            let (config, _) = load()?;
            let info = source::inspect(&input, &config.input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_info(&input, &info);
            }
        }
        Command::Batch {
            input_dir,
            output_dir,
            resize,
            json,
        } => {
            let (config, backend) = load()?;
            let inputs = batch::collect_inputs(&input_dir, &config)?;
            let outcomes = batch::run_batch(
                &backend,
                &inputs,
                &input_dir,
                &output_dir,
                &resize.edit()?,
                &config,
            )?;
            if json {
                let entries: Vec<serde_json::Value> = outcomes
                    .iter()
                    .map(|o| match &o.result {
                        Ok(report) => serde_json::to_value(report),
                        Err(e) => Ok(serde_json::json!({
                            "input": o.input,
                            "error": e.to_string(),
                        })),
                    })
                    .collect::<Result<_, _>>()?;
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                output::print_batch(&outcomes);
            }
            let summary = BatchSummary::from_outcomes(&outcomes);
            if summary.failed > 0 {
                let message = format!("{} of {} files failed", summary.failed, outcomes.len());
                return Err(message.into());
            }
        }
    }

    Ok(())
}

/// Run one edit on one file and print its report.
fn single(
    backend: &RustBackend,
    input: &Path,
    edit: &Edit,
    out: &OutputArgs,
    config: &ToolConfig,
    action: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_path = out
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, edit.label(), None));
    let report = run_file(backend, input, &output_path, edit, config)?;
    if out.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report, action);
    }
    Ok(())
}

/// Compact stderr logging. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
