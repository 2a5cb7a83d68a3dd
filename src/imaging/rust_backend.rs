//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG) | `image::ImageReader::decode` with [`image::Limits`] |
//! | Resample | `image::DynamicImage::resize_exact` with the requested [`Filter`] |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! ## Channel policy
//!
//! JPEG has no alpha channel and only 8-bit samples: alpha is dropped and
//! samples are reduced to 8 bits (RGB, or luma for grayscale sources). PNG
//! keeps the layout and bit depth; float buffers become 8-bit RGBA.
//! The same input always takes the same path.

use super::backend::{Dimensions, ImageBackend, PixelBuffer, ResizeError, SourceImage};
use super::params::{Encoding, Filter, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::error::ImageError;
use image::{ColorType, DynamicImage, ImageReader, Limits};
use std::io::Cursor;
use tracing::debug;

/// Upper bounds that turn runaway inputs into [`ResizeError::ResourceExhausted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeLimits {
    /// Largest decoded source, in pixels.
    pub max_input_pixels: u64,
    /// Largest resampled output, in pixels.
    pub max_output_pixels: u64,
    /// Largest single allocation the decoder may make, in bytes.
    pub max_alloc_bytes: u64,
}

impl Default for ResizeLimits {
    fn default() -> Self {
        Self {
            max_input_pixels: 100_000_000,
            max_output_pixels: 100_000_000,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

impl ResizeLimits {
    fn decoder_limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }

    fn check_input(&self, dims: Dimensions) -> Result<(), ResizeError> {
        if dims.pixel_count() > self.max_input_pixels {
            return Err(ResizeError::ResourceExhausted(format!(
                "source {}x{} exceeds the {} pixel input limit",
                dims.width, dims.height, self.max_input_pixels
            )));
        }
        Ok(())
    }

    fn check_output(&self, dims: Dimensions) -> Result<(), ResizeError> {
        if dims.pixel_count() > self.max_output_pixels {
            return Err(ResizeError::ResourceExhausted(format!(
                "target {}x{} exceeds the {} pixel output limit",
                dims.width, dims.height, self.max_output_pixels
            )));
        }
        Ok(())
    }
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Default)]
pub struct RustBackend {
    limits: ResizeLimits,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ResizeLimits) -> Self {
        Self { limits }
    }
}

/// Open an in-memory reader, sniffing the format from magic bytes.
fn open_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, ResizeError> {
    if bytes.is_empty() {
        return Err(ResizeError::Decode("input buffer is empty".into()));
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ResizeError::Decode(format!("failed to read input: {e}")))?;
    if reader.format().is_none() {
        return Err(ResizeError::Decode("unrecognized image format".into()));
    }
    Ok(reader)
}

fn decode_error(err: ImageError) -> ResizeError {
    match err {
        ImageError::Limits(e) => ResizeError::ResourceExhausted(format!("decoder limit hit: {e}")),
        other => ResizeError::Decode(other.to_string()),
    }
}

fn encode_error(encoding: Encoding, err: ImageError) -> ResizeError {
    match err {
        ImageError::Limits(e) => ResizeError::ResourceExhausted(format!("encoder limit hit: {e}")),
        other => ResizeError::Encode(format!("{} encode failed: {other}", encoding.extension())),
    }
}

/// Reduce a buffer to something the JPEG encoder accepts: 8-bit, no alpha.
fn jpeg_compatible(img: &DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::L8 | ColorType::Rgb8 => img.clone(),
        color if color.has_color() => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => DynamicImage::ImageLuma8(img.to_luma8()),
    }
}

/// PNG takes every integer layout; only float buffers need converting.
fn png_compatible(img: &DynamicImage) -> DynamicImage {
    match img.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img.clone(),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, ResizeError> {
        let (width, height) = open_reader(bytes)?
            .into_dimensions()
            .map_err(decode_error)?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, ResizeError> {
        let dims = self.identify(bytes)?;
        self.limits.check_input(dims)?;

        let mut reader = open_reader(bytes)?;
        reader.limits(self.limits.decoder_limits());
        let image = reader.decode().map_err(decode_error)?;
        debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "decoded source image"
        );
        Ok(PixelBuffer::new(image))
    }

    fn resample(
        &self,
        source: &SourceImage,
        width: u32,
        height: u32,
        filter: Filter,
    ) -> Result<PixelBuffer, ResizeError> {
        if width == 0 || height == 0 {
            return Err(ResizeError::InvalidOptions(format!(
                "cannot resample to {width}x{height}"
            )));
        }
        self.limits.check_output(Dimensions { width, height })?;

        let resized = source
            .as_image()
            .resize_exact(width, height, filter.filter_type());
        Ok(PixelBuffer::new(resized))
    }

    fn encode(
        &self,
        pixels: &PixelBuffer,
        encoding: Encoding,
        quality: Quality,
    ) -> Result<Vec<u8>, ResizeError> {
        let mut buf = Vec::new();
        match encoding {
            Encoding::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buf, quality.jpeg_value());
                jpeg_compatible(pixels.as_image())
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_error(encoding, e))?;
            }
            Encoding::Png => {
                let encoder = PngEncoder::new(&mut buf);
                png_compatible(pixels.as_image())
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_error(encoding, e))?;
            }
        }
        debug!(
            encoding = %encoding,
            quality = ?encoding.is_lossy().then(|| quality.jpeg_value()),
            bytes = buf.len(),
            "encoded image"
        );
        Ok(buf)
    }
}
