//! Shared test utilities for the image-resizer test suite.
//!
//! Builds synthetic images in memory so no test depends on fixture files.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let png = encode_test_image(&gradient_rgb(400, 300), Encoding::Png);
//! let result = resize(&RustBackend::new(), &png, &SizingOptions::width(200)).unwrap();
//! assert_eq!((result.width, result.height), (200, 150));
//! ```

use crate::imaging::Encoding;
use image::{DynamicImage, Rgb, RgbImage};
use std::io::Cursor;

/// A smooth RGB gradient; compresses predictably under JPEG.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    }))
}

/// Encode `img` straight through the `image` crate, independent of the backend under test.
pub fn encode_test_image(img: &DynamicImage, encoding: Encoding) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, encoding.image_format()).unwrap();
    buf.into_inner()
}

/// Mean absolute per-channel difference between two RGB renderings.
///
/// Panics if the images differ in size.
pub fn mean_abs_diff(a: &DynamicImage, b: &DynamicImage) -> f64 {
    let a = a.to_rgb8();
    let b = b.to_rgb8();
    assert_eq!(a.dimensions(), b.dimensions(), "images differ in size");

    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| (x as i16 - y as i16).unsigned_abs() as u64)
        .sum();
    total as f64 / a.as_raw().len() as f64
}
