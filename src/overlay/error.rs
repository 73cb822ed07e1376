//! Error type shared by the overlay pipeline stages.

use std::path::PathBuf;

use thiserror::Error;

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Failures raised inside the overlay pipeline.
///
/// None of these reach callers of [`crate::overlay::overlay`]; the boundary there logs them
/// and hands back the untouched input image.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The input image has a zero width or height.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("failed to read font {}: {source}", path.display())]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font {}", path.display())]
    FontParse { path: PathBuf },

    /// A coverage mask could not be allocated for the working image.
    #[error("failed to allocate glyph mask ({width}x{height})")]
    Mask { width: u32, height: u32 },
}
