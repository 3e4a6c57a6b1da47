//! One file, end to end: validate, decode, edit, encode, write.
//!
//! This is the glue the command-line front end and [`batch`](crate::batch)
//! share. Each call opens its own [`Session`], so nothing carries over from
//! one file to the next.

use crate::config::ToolConfig;
use crate::imaging::{
    EncodeTarget, Encoder, OperationError, Rasterizer, TransformRequest, parse_dimension,
};
use crate::session::Session;
use crate::source::{LoadError, load_source};
use crate::types::EncodeResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is already the output of another input")]
    OutputTaken { path: PathBuf },
}

/// What to do to a loaded image, as a user asks for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edit {
    /// A missing side is filled in from the aspect ratio.
    Resize {
        width: Option<u32>,
        height: Option<u32>,
        target: Option<EncodeTarget>,
    },
    /// Rotate 90° `times` times. Only the last rotation is encoded.
    Rotate { times: u32 },
    Crop,
}

impl Edit {
    /// A resize from user-entered text. Either side may be left out.
    pub fn resize_from_text(
        width: Option<&str>,
        height: Option<&str>,
        target: Option<EncodeTarget>,
    ) -> Result<Self, OperationError> {
        Ok(Self::Resize {
            width: width.map(|w| parse_dimension("width", w)).transpose()?,
            height: height.map(|h| parse_dimension("height", h)).transpose()?,
            target,
        })
    }

    /// Suffix for default output names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resized",
            Self::Rotate { .. } => "rotated",
            Self::Crop => "cropped",
        }
    }

    fn target(&self) -> Option<EncodeTarget> {
        match *self {
            Self::Resize { target, .. } => target,
            _ => None,
        }
    }
}

/// Outcome of one file, shaped for both status lines and `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub input: PathBuf,
    pub output: PathBuf,
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
    pub rotation: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_kb: Option<f64>,
    #[serde(flatten)]
    pub encoded: EncodeResult,
}

impl Report {
    /// The soft failure case: a target was set and the result is over it.
    pub fn missed_target(&self) -> bool {
        self.target_kb
            .is_some_and(|kb| kb > 0.0 && self.encoded.exceeds(kb))
    }
}

/// `<dir>/<stem>-<label>.jpg`, with `dir` defaulting to the input's directory.
pub fn default_output_path(input: &Path, label: &str, dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}-{}.jpg", stem, label))
}

/// Turn an [`Edit`] into the request sequence for `session`.
fn plan(session: &Session, edit: &Edit) -> Result<Vec<TransformRequest>, OperationError> {
    match *edit {
        Edit::Resize { width, height, .. } => {
            let (width, height) = match (width, height) {
                (Some(w), Some(h)) => (w, h),
                (Some(w), None) => (w, session.linked_height(w).unwrap_or(0)),
                (None, Some(h)) => (session.linked_width(h).unwrap_or(0), h),
                (None, None) => {
                    return Err(OperationError::InvalidInput(
                        "resize needs a width, a height, or both".into(),
                    ));
                }
            };
            Ok(vec![TransformRequest::Resize { width, height }])
        }
        Edit::Rotate { times: 0 } => Err(OperationError::InvalidInput(
            "rotate needs at least one quarter turn".into(),
        )),
        Edit::Rotate { times } => Ok(vec![TransformRequest::Rotate; times as usize]),
        Edit::Crop => Ok(vec![TransformRequest::CropSquare]),
    }
}

/// Run `edit` on `input` and write the encoded result to `output`.
pub fn run_file<B: Rasterizer + Encoder>(
    backend: &B,
    input: &Path,
    output: &Path,
    edit: &Edit,
    config: &ToolConfig,
) -> Result<Report, PipelineError> {
    let source = load_source(backend, input, &config.input)?;
    let (source_width, source_height) = source.dimensions();
    let mut session = Session::load(source);

    let requests = plan(&session, edit)?;
    let settings = config.encode_settings();
    let (last, leading) = match requests.split_last() {
        Some(split) => split,
        None => return Err(OperationError::InvalidInput("nothing to do".into()).into()),
    };
    for request in leading {
        session = session.apply(backend, *request)?.0;
    }
    let (session, out) = session.process(backend, *last, edit.target(), &settings)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| PipelineError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(output, &out.encoded.bytes).map_err(|source| PipelineError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    info!(
        input = %input.display(),
        output = %output.display(),
        size_kb = out.encoded.size_kb,
        "wrote output"
    );

    Ok(Report {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        source_width,
        source_height,
        width: out.width,
        height: out.height,
        rotation: session.cumulative_rotation(),
        target_kb: edit.target().map(EncodeTarget::to_kb),
        encoded: out.encoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{write_jpeg, write_png};
    use tempfile::TempDir;

    fn resize(width: Option<u32>, height: Option<u32>) -> Edit {
        Edit::Resize {
            width,
            height,
            target: None,
        }
    }

    #[test]
    fn resize_from_text_parses_present_sides() {
        assert_eq!(
            Edit::resize_from_text(Some("400"), None, None).unwrap(),
            resize(Some(400), None)
        );
        assert!(matches!(
            Edit::resize_from_text(Some("400"), Some("tall"), None),
            Err(OperationError::InvalidInput(_))
        ));
    }

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("/photos/cat.png"), "resized", None),
            PathBuf::from("/photos/cat-resized.jpg")
        );
        assert_eq!(
            default_output_path(Path::new("/photos/cat.png"), "cropped", Some(Path::new("/out"))),
            PathBuf::from("/out/cat-cropped.jpg")
        );
    }

    #[test]
    fn resize_fills_missing_height_from_aspect() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.png");
        let output = tmp.path().join("out.jpg");
        write_png(&input, 800, 600);

        let report = run_file(
            &RustBackend::new(),
            &input,
            &output,
            &resize(Some(400), None),
            &ToolConfig::default(),
        )
        .unwrap();
        assert_eq!((report.width, report.height), (400, 300));
        assert_eq!(report.encoded.quality, 0.9);

        let written = image::image_dimensions(&output).unwrap();
        assert_eq!(written, (400, 300));
    }

    #[test]
    fn resize_fills_missing_width_from_aspect() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.png");
        write_png(&input, 800, 600);

        let report = run_file(
            &RustBackend::new(),
            &input,
            &tmp.path().join("out.jpg"),
            &resize(None, Some(150)),
            &ToolConfig::default(),
        )
        .unwrap();
        assert_eq!((report.width, report.height), (200, 150));
    }

    #[test]
    fn resize_without_dimensions_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.png");
        let output = tmp.path().join("out.jpg");
        write_png(&input, 80, 60);

        let err = run_file(
            &RustBackend::new(),
            &input,
            &output,
            &resize(None, None),
            &ToolConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Operation(OperationError::InvalidInput(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn rotate_times_accumulates() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.jpg");
        write_jpeg(&input, 120, 80);

        let report = run_file(
            &RustBackend::new(),
            &input,
            &tmp.path().join("out.jpg"),
            &Edit::Rotate { times: 3 },
            &ToolConfig::default(),
        )
        .unwrap();
        assert_eq!(report.rotation, 270);
        assert_eq!((report.width, report.height), (80, 120));
        assert_eq!(report.encoded.attempts, 1);
    }

    #[test]
    fn rotate_zero_times_is_invalid() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.jpg");
        write_jpeg(&input, 20, 20);

        let err = run_file(
            &RustBackend::new(),
            &input,
            &tmp.path().join("out.jpg"),
            &Edit::Rotate { times: 0 },
            &ToolConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Operation(OperationError::InvalidInput(_))
        ));
    }

    #[test]
    fn crop_writes_square_into_new_directory() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.png");
        let output = tmp.path().join("nested/dir/out.jpg");
        write_png(&input, 90, 150);

        let report = run_file(
            &RustBackend::new(),
            &input,
            &output,
            &Edit::Crop,
            &ToolConfig::default(),
        )
        .unwrap();
        assert_eq!((report.width, report.height), (90, 90));
        assert_eq!(
            std::fs::metadata(&output).unwrap().len(),
            report.encoded.bytes.len() as u64
        );
    }

    #[test]
    fn missing_input_is_load_error() {
        let tmp = TempDir::new().unwrap();
        let err = run_file(
            &RustBackend::new(),
            &tmp.path().join("absent.png"),
            &tmp.path().join("out.jpg"),
            &Edit::Crop,
            &ToolConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn report_flags_missed_target() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.png");
        write_png(&input, 64, 64);

        let edit = Edit::Resize {
            width: Some(64),
            height: Some(64),
            target: Some(EncodeTarget::kb(0.001)),
        };
        let report = run_file(
            &RustBackend::new(),
            &input,
            &tmp.path().join("out.jpg"),
            &edit,
            &ToolConfig::default(),
        )
        .unwrap();
        assert!(report.missed_target());
        assert_eq!(report.encoded.quality, 0.05);
        assert_eq!(report.encoded.attempts, 11);
    }

    #[test]
    fn report_json_flattens_encode_metadata() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.png");
        write_png(&input, 32, 32);

        let report = run_file(
            &RustBackend::new(),
            &input,
            &tmp.path().join("out.jpg"),
            &Edit::Crop,
            &ToolConfig::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["width"], 32);
        assert!(json.get("size_kb").is_some());
        assert!(json.get("target_kb").is_none());
        assert!(json.get("bytes").is_none());
    }
}
