//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Each call is
//! self-contained: decode, size, resample, encode, and hand the bytes back.
//! Any failing step aborts the call; no partial output escapes.

use super::backend::{Dimensions, ImageBackend, ResizeError};
use super::calculations::compute_target_size;
use super::params::{Encoding, Quality, ResizeResult, SizingOptions};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ResizeError>;

/// Read image dimensions from the header.
pub fn image_size(backend: &impl ImageBackend, raw: &[u8]) -> Result<Dimensions> {
    backend.identify(raw)
}

/// Decode `raw`, resize it according to `options`, and encode the result.
pub fn resize(
    backend: &impl ImageBackend,
    raw: &[u8],
    options: &SizingOptions,
) -> Result<ResizeResult> {
    let source = backend.decode(raw)?;
    let quality = options.validate()?;
    let (width, height) = compute_target_size(source.width(), source.height(), options)?;
    debug!(
        source_width = source.width(),
        source_height = source.height(),
        width,
        height,
        filter = %options.filter,
        "computed target size"
    );

    let pixels = backend.resample(&source, width, height, options.filter)?;
    let bytes = backend.encode(&pixels, options.encoding, quality)?;

    Ok(ResizeResult {
        bytes,
        width,
        height,
        encoding: options.encoding,
    })
}

/// Decode `raw` and encode it again in `encoding` at its original size.
pub fn reencode(
    backend: &impl ImageBackend,
    raw: &[u8],
    encoding: Encoding,
    quality: Quality,
) -> Result<ResizeResult> {
    let source = backend.decode(raw)?;
    let bytes = backend.encode(&source, encoding, quality)?;

    Ok(ResizeResult {
        bytes,
        width: source.width(),
        height: source.height(),
        encoding,
    })
}
