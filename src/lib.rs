//! # image-resizer
//!
//! Resize images under width/height constraints, read their dimensions, and
//! store them to disk. The core is one synchronous, stateless function:
//!
//! ```text
//! resize(raw bytes, SizingOptions) → ResizeResult { bytes, width, height }
//!          decode → compute target size → resample → encode
//! ```
//!
//! ```no_run
//! use image_resizer::SizingOptions;
//!
//! let raw = std::fs::read("photo.jpg")?;
//! let options = SizingOptions::width(800).with_quality(0.8);
//! let result = image_resizer::resize(&raw, &options)?;
//! std::fs::write("photo-800.jpg", &result.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Sizing math, the [`ImageBackend`] seam, and the `image`-crate backend |
//! | [`source`] | Turning base64, data URIs, paths and `file://` URIs into bytes |
//! | [`store`] | Writing encoded images into a directory |
//! | [`bridge`] | JSON command layer (`resizeImage`, `imageSize`, `storeImage`) with worker dispatch |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fit, Don't Pad
//!
//! With both a width and a height and `preserve_aspect_ratio` set, the image
//! is scaled to fit inside the box. The binding side matches exactly; the
//! other side may come out smaller. Nothing is letterboxed.
//!
//! ## Bytes In, Bytes Out
//!
//! The core never sees a path or a URL. Reading input and persisting output
//! live at the edges ([`source`], [`store`]), so every call is independent
//! and safe to run on any thread.
//!
//! ## JPEG Has No Alpha
//!
//! Encoding a buffer with an alpha channel to JPEG drops the alpha channel.
//! PNG keeps it. The rule is the same for every input.

pub mod bridge;
pub mod config;
pub mod imaging;
pub mod output;
pub mod source;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use imaging::{
    Dimensions, Encoding, ErrorKind, Filter, ImageBackend, Quality, ResizeError, ResizeResult,
    RustBackend, SizingOptions,
};

/// Resize `raw` with the default [`RustBackend`].
pub fn resize(raw: &[u8], options: &SizingOptions) -> Result<ResizeResult, ResizeError> {
    imaging::resize(&RustBackend::default(), raw, options)
}

/// Read the dimensions of `raw` with the default [`RustBackend`].
pub fn image_size(raw: &[u8]) -> Result<Dimensions, ResizeError> {
    imaging::image_size(&RustBackend::default(), raw)
}
