//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Rounding is half-away-from-zero (`f64::round`) and no computed side is
//! ever smaller than one pixel.

use super::backend::ResizeError;
use super::params::SizingOptions;

/// Scale a single side, rounding to the nearest pixel and clamping to `[1, u32::MAX]`.
pub fn scale_dimension(length: u32, scale: f64) -> u32 {
    let scaled = (length as f64 * scale).round();
    if scaled < 1.0 {
        1
    } else if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Calculate dimensions that fit inside `bound` while keeping the source aspect ratio.
///
/// The binding side matches its bound exactly; the other side is at most its
/// bound. Nothing is padded.
///
/// # Examples
/// ```
/// # use image_resizer::imaging::calculate_fit_dimensions;
/// // 100x100 into a 50x200 box: width binds
/// assert_eq!(calculate_fit_dimensions((100, 100), (50, 200)), (50, 50));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), bound: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bound;

    let scale_w = max_w as f64 / src_w as f64;
    let scale_h = max_h as f64 / src_h as f64;

    if scale_w <= scale_h {
        // Width binds
        (max_w, scale_dimension(src_h, scale_w).min(max_h))
    } else {
        // Height binds
        (scale_dimension(src_w, scale_h).min(max_w), max_h)
    }
}

/// Calculate output dimensions from optional targets.
///
/// Returns `None` when neither target is given.
///
/// | targets | `preserve` | result |
/// |---|---|---|
/// | both | `false` | exactly the targets |
/// | both | `true` | fit inside the box |
/// | one | either | uniform scale from the given side |
pub fn calculate_target_dimensions(
    source: (u32, u32),
    target: (Option<u32>, Option<u32>),
    preserve_aspect_ratio: bool,
) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;

    match target {
        (Some(w), Some(h)) if !preserve_aspect_ratio => Some((w, h)),
        (Some(w), Some(h)) => Some(calculate_fit_dimensions(source, (w, h))),
        (Some(w), None) => {
            let scale = w as f64 / src_w as f64;
            Some((w, scale_dimension(src_h, scale)))
        }
        (None, Some(h)) => {
            let scale = h as f64 / src_h as f64;
            Some((scale_dimension(src_w, scale), h))
        }
        (None, None) => None,
    }
}

/// Validate `options` and compute the output size for a `source_width`×`source_height` image.
pub fn compute_target_size(
    source_width: u32,
    source_height: u32,
    options: &SizingOptions,
) -> Result<(u32, u32), ResizeError> {
    options.validate()?;
    if source_width == 0 || source_height == 0 {
        return Err(ResizeError::InvalidOptions(format!(
            "source dimensions must be positive, got {source_width}x{source_height}"
        )));
    }

    calculate_target_dimensions(
        (source_width, source_height),
        (options.target_width, options.target_height),
        options.preserve_aspect_ratio,
    )
    .ok_or_else(|| {
        ResizeError::InvalidOptions("at least one of targetWidth or targetHeight is required".into())
    })
}

/// Calculate dimensions from per-axis scale factors.
///
/// A zero factor on one axis takes the other axis' factor so the aspect ratio
/// is kept. Returns `None` for negative or non-finite factors, or when both
/// are zero.
pub fn calculate_factor_dimensions(source: (u32, u32), factors: (f64, f64)) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    let (fx, fy) = factors;

    if !fx.is_finite() || !fy.is_finite() || fx < 0.0 || fy < 0.0 {
        return None;
    }
    let (fx, fy) = match (fx == 0.0, fy == 0.0) {
        (true, true) => return None,
        (true, false) => (fy, fy),
        (false, true) => (fx, fx),
        (false, false) => (fx, fy),
    };

    Some((scale_dimension(src_w, fx), scale_dimension(src_h, fy)))
}

/// Calculate dimensions that cover `target` with one uniform scale, never upscaling.
///
/// The larger of the two per-axis scales wins when it is at most 1. Otherwise
/// the height scale is used if it is at most 1, and the source size is kept
/// when both would upscale.
///
/// ```
/// # use image_resizer::imaging::calculate_min_fill_dimensions;
/// // 400x300 covering 100x100: width scale 0.25, height scale 0.33 wins
/// assert_eq!(calculate_min_fill_dimensions((400, 300), (100, 100)), (133, 100));
/// ```
pub fn calculate_min_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let scale_w = target.0 as f64 / src_w as f64;
    let scale_h = target.1 as f64 / src_h as f64;

    let scale = if scale_w > scale_h && scale_w <= 1.0 {
        scale_w
    } else if scale_h <= 1.0 {
        scale_h
    } else {
        1.0
    };
    (scale_dimension(src_w, scale), scale_dimension(src_h, scale))
}
