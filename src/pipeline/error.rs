//! Per-asset error taxonomy.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::image::MaskError;
use crate::image::rasterize::{OutputFormat, RasterizeError};
use crate::image::svg::{DocumentError, NormalizeError, RenderError};
use crate::image::trace::TraceError;
use crate::storage::StorageError;

/// Pipeline step an asset failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Catalog,
    Fetch,
    Parse,
    Mask,
    Trace,
    Theme,
    Normalize,
    Rasterize,
    Store,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Mask => "mask",
            Self::Trace => "trace",
            Self::Theme => "theme",
            Self::Normalize => "normalize",
            Self::Rasterize => "rasterize",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable error classification written to failure records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    DecodeError,
    UnsupportedChannelLayout,
    TraceError,
    EmptyContentError,
    UnsupportedFormatError,
    UnsupportedSizeError,
    StorageError,
    DocumentError,
    RenderError,
    EncodeError,
    UnknownCollection,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown collection `{0}`")]
    UnknownCollection(String),

    #[error("format {format} is not allowed by collection `{collection}`")]
    UnsupportedFormat {
        format: OutputFormat,
        collection: String,
    },

    #[error("size {size} is not allowed by collection `{collection}`")]
    UnsupportedSize { size: u32, collection: String },

    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Rasterize(#[from] RasterizeError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownCollection(_) => ErrorKind::UnknownCollection,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormatError,
            Self::UnsupportedSize { .. } => ErrorKind::UnsupportedSizeError,
            Self::Mask(MaskError::Decode(_)) => ErrorKind::DecodeError,
            Self::Mask(MaskError::UnsupportedChannelLayout { .. }) => {
                ErrorKind::UnsupportedChannelLayout
            }
            Self::Trace(_) => ErrorKind::TraceError,
            Self::Document(_) => ErrorKind::DocumentError,
            Self::Normalize(NormalizeError::EmptyContent) => ErrorKind::EmptyContentError,
            Self::Normalize(NormalizeError::Render(e)) => render_kind(e),
            Self::Rasterize(e) => match e {
                RasterizeError::NotRaster(_) => ErrorKind::UnsupportedFormatError,
                RasterizeError::ZeroSize | RasterizeError::TooLarge { .. } => {
                    ErrorKind::UnsupportedSizeError
                }
                RasterizeError::Render(e) => render_kind(e),
                RasterizeError::Encode(_) => ErrorKind::EncodeError,
            },
            Self::Storage(_) => ErrorKind::StorageError,
        }
    }
}

fn render_kind(error: &RenderError) -> ErrorKind {
    match error {
        RenderError::Document(_) => ErrorKind::DocumentError,
        RenderError::Load(_) | RenderError::Canvas { .. } => ErrorKind::RenderError,
    }
}

/// A [`PipelineError`] tagged with the stage it came from.
#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub error: PipelineError,
}

pub trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E: Into<PipelineError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|e| StageError {
            stage,
            error: e.into(),
        })
    }
}

/// Failure record of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFailure {
    pub asset_id: String,
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl AssetFailure {
    pub fn new(asset_id: impl Into<String>, error: StageError) -> Self {
        Self {
            asset_id: asset_id.into(),
            stage: error.stage,
            kind: error.error.kind(),
            message: error.error.to_string(),
        }
    }
}
