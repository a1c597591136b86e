use std::path::PathBuf;

use thiserror::Error;

/// Recoverable stamp renderer failures.
///
/// Precondition violations (drawing more instances than declared, more than
/// [`MAX_TEXTURES`](super::MAX_TEXTURES) textures) are programming errors and
/// panic instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StampError {
    /// A GPU object would exceed what the device can allocate.
    #[error("cannot allocate {what}: {requested} exceeds device limit {limit}")]
    ResourceExhaustion {
        what: &'static str,
        requested: u64,
        limit: u64,
    },

    /// The parallel per-instance streams disagree on length.
    #[error(
        "instance streams differ in length: transforms={transforms}, tex_rects={tex_rects}, \
         tex_units={tex_units}, tints={tints}"
    )]
    MismatchedStreams {
        transforms: usize,
        tex_rects: usize,
        tex_units: usize,
        tints: usize,
    },

    /// More instances were supplied than the batch declares room for.
    #[error("batch holds {len} instances but max_stamps is {max_stamps}")]
    BatchOverflow { len: usize, max_stamps: usize },

    /// A batch declared more texture units than one draw can bind.
    #[error("batch declares {requested} texture units, at most {max} are supported")]
    TextureUnitLimit { requested: usize, max: usize },

    /// Texture dimensions or pixel data are unusable.
    #[error("invalid texture {width}x{height}: {reason}")]
    InvalidTexture {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    /// Encoded image data could not be decoded.
    #[error("cannot decode image: {reason}")]
    Image { reason: String },

    /// A texture or atlas file could not be read.
    #[error("cannot read {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    /// An atlas description is malformed.
    #[error("atlas line {line}: {reason}")]
    Atlas { line: usize, reason: String },
}
