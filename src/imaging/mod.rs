//! Image processing in pure Rust, built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image::ImageReader::decode` (JPEG, PNG) |
//! | **Resample** | `resize_exact` with Bilinear / Catmull-Rom / Lanczos3 |
//! | **Encode** | `JpegEncoder` (quality-tunable) / `PngEncoder` (lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing a resize
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{
    ChannelLayout, Dimensions, ErrorKind, ImageBackend, PixelBuffer, ResizeError, SourceImage,
};
pub use calculations::{
    calculate_factor_dimensions, calculate_fit_dimensions, calculate_min_fill_dimensions,
    calculate_target_dimensions, compute_target_size, scale_dimension,
};
pub use operations::{image_size, reencode, resize};
pub use params::{Encoding, Filter, Quality, ResizeResult, SizingOptions};
pub use rust_backend::{ResizeLimits, RustBackend};
