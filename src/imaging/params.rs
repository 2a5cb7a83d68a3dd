//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which validates options and decides the output size) and the
//! [`backend`](super::backend) (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`SizingOptions`]: caller-supplied constraints for one resize call.
//! - [`Encoding`]: output container (JPEG or PNG).
//! - [`Filter`]: interpolation used when resampling.
//! - [`Quality`]: validated encoder quality in `[0, 1]`.
//! - [`ResizeResult`]: encoded bytes plus final dimensions.

use super::backend::ResizeError;
use image::ImageFormat;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "jpg", alias = "jpeg", alias = "JPG", alias = "JPEG")]
    Jpeg,
    #[serde(rename = "png", alias = "PNG")]
    Png,
}

impl Encoding {
    /// Map a file extension (without the dot) to an encoding, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Infer the encoding from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }

    /// Whether the encoder honours [`Quality`].
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim()).ok_or_else(|| format!("unsupported encoding: {s}"))
    }
}

/// Interpolation filter used by resampling. Every option is bilinear or better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Linear interpolation over a 2×2 neighbourhood (triangle kernel).
    Bilinear,
    /// Cubic Catmull-Rom spline.
    CatmullRom,
    /// Windowed sinc, radius 3. Sharpest, slowest.
    #[default]
    Lanczos3,
}

impl Filter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Bilinear => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bilinear => "bilinear",
            Self::CatmullRom => "catmull_rom",
            Self::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "bilinear" | "triangle" => Ok(Self::Bilinear),
            "catmull_rom" | "catmullrom" | "bicubic" => Ok(Self::CatmullRom),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            other => Err(format!("unknown filter: {other}")),
        }
    }
}

/// Encoder quality in `[0, 1]`.
///
/// Unlike a clamped setting, construction rejects out-of-range values so the
/// caller learns about a bad option instead of silently getting a different
/// image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// Highest fidelity.
    pub const MAX: Quality = Quality(1.0);

    /// Returns `None` for values outside `[0, 1]` (including NaN).
    pub fn new(value: f32) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    /// Build from an integer percentage; values above 100 saturate.
    pub fn from_percent(percent: u32) -> Self {
        Self(percent.min(100) as f32 / 100.0)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// JPEG encoder quality. The encoder accepts 1..=100, so 0 maps to 1.
    pub fn jpeg_value(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.75)
    }
}

/// Caller-supplied sizing constraints for a single resize call.
///
/// At least one of `target_width` / `target_height` must be set. With
/// `preserve_aspect_ratio` and both targets set the image is scaled to fit
/// inside the box; no padding is added, so one side may come out smaller
/// than requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizingOptions {
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    /// Encoder quality in `[0, 1]`; ignored for PNG.
    pub quality: f32,
    pub encoding: Encoding,
    pub preserve_aspect_ratio: bool,
    pub filter: Filter,
}

impl Default for SizingOptions {
    fn default() -> Self {
        Self {
            target_width: None,
            target_height: None,
            quality: Quality::default().value(),
            encoding: Encoding::default(),
            preserve_aspect_ratio: true,
            filter: Filter::default(),
        }
    }
}

impl SizingOptions {
    /// Scale to `width`, deriving the height.
    pub fn width(width: u32) -> Self {
        Self {
            target_width: Some(width),
            ..Self::default()
        }
    }

    /// Scale to `height`, deriving the width.
    pub fn height(height: u32) -> Self {
        Self {
            target_height: Some(height),
            ..Self::default()
        }
    }

    /// Fit inside `width`×`height`, preserving the aspect ratio.
    pub fn fit(width: u32, height: u32) -> Self {
        Self {
            target_width: Some(width),
            target_height: Some(height),
            ..Self::default()
        }
    }

    /// Stretch to exactly `width`×`height`.
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            target_width: Some(width),
            target_height: Some(height),
            preserve_aspect_ratio: false,
            ..Self::default()
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Check the options and return the validated quality.
    pub fn validate(&self) -> Result<Quality, ResizeError> {
        if self.target_width.is_none() && self.target_height.is_none() {
            return Err(ResizeError::InvalidOptions(
                "at least one of targetWidth or targetHeight is required".into(),
            ));
        }
        if self.target_width == Some(0) {
            return Err(ResizeError::InvalidOptions(
                "targetWidth must be positive".into(),
            ));
        }
        if self.target_height == Some(0) {
            return Err(ResizeError::InvalidOptions(
                "targetHeight must be positive".into(),
            ));
        }
        Quality::new(self.quality).ok_or_else(|| {
            ResizeError::InvalidOptions(format!("quality {} is outside [0, 1]", self.quality))
        })
    }
}

/// Encoded output of a resize. Ownership of `bytes` moves to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_rejects_out_of_range() {
        assert!(Quality::new(-0.01).is_none());
        assert!(Quality::new(1.5).is_none());
        assert!(Quality::new(f32::NAN).is_none());
        assert_eq!(Quality::new(0.0).unwrap().value(), 0.0);
        assert_eq!(Quality::new(1.0).unwrap().value(), 1.0);
    }

    #[test]
    fn quality_default_is_three_quarters() {
        assert_eq!(Quality::default().value(), 0.75);
    }

    #[test]
    fn jpeg_quality_mapping() {
        assert_eq!(Quality::new(0.0).unwrap().jpeg_value(), 1);
        assert_eq!(Quality::new(0.8).unwrap().jpeg_value(), 80);
        assert_eq!(Quality::MAX.jpeg_value(), 100);
    }

    #[test]
    fn quality_from_percent_saturates() {
        assert_eq!(Quality::from_percent(75).value(), 0.75);
        assert_eq!(Quality::from_percent(250).value(), 1.0);
    }

    #[test]
    fn encoding_from_extension() {
        assert_eq!(Encoding::from_extension("JPG"), Some(Encoding::Jpeg));
        assert_eq!(Encoding::from_extension("jpeg"), Some(Encoding::Jpeg));
        assert_eq!(Encoding::from_extension("png"), Some(Encoding::Png));
        assert_eq!(Encoding::from_extension("webp"), None);
        assert_eq!(
            Encoding::from_path(Path::new("/tmp/out.PNG")),
            Some(Encoding::Png)
        );
    }

    #[test]
    fn only_jpeg_is_lossy() {
        assert!(Encoding::Jpeg.is_lossy());
        assert!(!Encoding::Png.is_lossy());
        assert_eq!(Encoding::Png.image_format(), ImageFormat::Png);
    }

    #[test]
    fn encoding_serde_names() {
        assert_eq!(serde_json::to_string(&Encoding::Jpeg).unwrap(), "\"jpg\"");
        let parsed: Encoding = serde_json::from_str("\"jpeg\"").unwrap();
        assert_eq!(parsed, Encoding::Jpeg);
    }

    #[test]
    fn filter_parse_accepts_aliases() {
        assert_eq!("triangle".parse::<Filter>().unwrap(), Filter::Bilinear);
        assert_eq!("catmull-rom".parse::<Filter>().unwrap(), Filter::CatmullRom);
        assert!("nearest".parse::<Filter>().is_err());
    }

    #[test]
    fn validate_requires_a_target() {
        let err = SizingOptions::default().validate().unwrap_err();
        assert!(matches!(err, ResizeError::InvalidOptions(_)));
    }

    #[test]
    fn validate_rejects_zero_targets() {
        assert!(SizingOptions::width(0).validate().is_err());
        assert!(SizingOptions::fit(10, 0).validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_quality() {
        let err = SizingOptions::width(10)
            .with_quality(1.5)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn options_deserialize_camel_case_with_defaults() {
        let options: SizingOptions =
            serde_json::from_str(r#"{"targetWidth": 800, "encoding": "png"}"#).unwrap();
        assert_eq!(options.target_width, Some(800));
        assert_eq!(options.target_height, None);
        assert_eq!(options.encoding, Encoding::Png);
        assert!(options.preserve_aspect_ratio);
        assert_eq!(options.filter, Filter::Lanczos3);
    }
}
