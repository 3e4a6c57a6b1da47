//! Directory mode: run one [`Edit`] over every image under a root.
//!
//! Candidates are picked by extension while walking; each one still goes
//! through full validation in [`run_file`]. Files are independent, so they are
//! processed in parallel on a local rayon pool sized by
//! [`effective_threads`]. A failing file is reported in its [`BatchOutcome`]
//! and never stops the rest. An entry the walk cannot read is logged and
//! skipped.
//!
//! Output names are planned for the whole batch before any worker starts.
//! Inputs that would share a name (`cat.png` and `cat.jpg`) get their
//! extension folded in (`cat-png-resized.jpg`, `cat-jpg-resized.jpg`).

use crate::config::{ToolConfig, effective_threads};
use crate::imaging::{Encoder, Rasterizer};
use crate::pipeline::{Edit, PipelineError, Report, default_output_path, run_file};
use crate::source::has_allowed_extension;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub result: Result<Report, PipelineError>,
}

/// Counts for the closing summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub over_target: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut acc, outcome| {
                match &outcome.result {
                    Ok(report) => {
                        acc.written += 1;
                        if report.missed_target() {
                            acc.over_target += 1;
                        }
                    }
                    Err(_) => acc.failed += 1,
                }
                acc
            })
    }
}

/// Every file under `root` whose extension matches the configured formats,
/// in sorted order.
pub fn collect_inputs(root: &Path, config: &ToolConfig) -> Result<Vec<PathBuf>, BatchError> {
    if !root.is_dir() {
        return Err(BatchError::NotADirectory(root.to_path_buf()));
    }
    let mut inputs = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file()
            && has_allowed_extension(entry.path(), &config.input.formats)
        {
            inputs.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), count = inputs.len(), "collected inputs");
    Ok(inputs)
}

/// Where a batch input lands: its subdirectory under `root` is mirrored
/// beneath `output_dir`.
pub fn batch_output_path(input: &Path, root: &Path, output_dir: &Path, label: &str) -> PathBuf {
    let relative_parent = input
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""));
    default_output_path(input, label, Some(&output_dir.join(relative_parent)))
}

/// Output path for every input, in input order.
///
/// Paths shared by several inputs are disambiguated with the lowercased
/// source extension. `Err` carries the path for an input whose name is still
/// taken after that; it is not written.
pub fn plan_outputs(
    inputs: &[PathBuf],
    root: &Path,
    output_dir: &Path,
    label: &str,
) -> Vec<Result<PathBuf, PathBuf>> {
    let plain: Vec<PathBuf> = inputs
        .iter()
        .map(|input| batch_output_path(input, root, output_dir, label))
        .collect();
    let mut claims: HashMap<&Path, usize> = HashMap::new();
    for path in &plain {
        *claims.entry(path.as_path()).or_default() += 1;
    }

    let mut taken = HashSet::new();
    inputs
        .iter()
        .zip(&plain)
        .map(|(input, path)| {
            let path = if claims[path.as_path()] > 1 {
                with_extension_tag(path, input, label)
            } else {
                path.clone()
            };
            if taken.insert(path.clone()) {
                Ok(path)
            } else {
                Err(path)
            }
        })
        .collect()
}

/// `<dir>/<stem>-<ext>-<label>.jpg`
fn with_extension_tag(path: &Path, input: &Path, label: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    path.with_file_name(format!("{}-{}-{}.jpg", stem, ext, label))
}

/// Run `edit` over `inputs` in parallel. Results keep the input order.
pub fn run_batch<B: Rasterizer + Encoder>(
    backend: &B,
    inputs: &[PathBuf],
    root: &Path,
    output_dir: &Path,
    edit: &Edit,
    config: &ToolConfig,
) -> Result<Vec<BatchOutcome>, BatchError> {
    let threads = effective_threads(&config.processing);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    debug!(threads, files = inputs.len(), "starting batch");

    let outputs = plan_outputs(inputs, root, output_dir, edit.label());
    let outcomes = pool.install(|| {
        inputs
            .par_iter()
            .zip(outputs.par_iter())
            .map(|(input, output)| {
                let result = match output {
                    Ok(path) => run_file(backend, input, path, edit, config),
                    Err(path) => Err(PipelineError::OutputTaken { path: path.clone() }),
                };
                if let Err(e) = &result {
                    warn!(input = %input.display(), error = %e, "skipping file");
                }
                BatchOutcome {
                    input: input.clone(),
                    result,
                }
            })
            .collect()
    });
    Ok(outcomes)
}
