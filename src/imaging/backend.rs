//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four steps every backend must
//! support: identify, decode, resample, and encode. Operations in
//! [`operations`](super::operations) are written against the trait so step
//! ordering and error propagation can be tested with a mock.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` crate.

use super::params::{Encoding, Filter, Quality};
use image::DynamicImage;
use serde::Serialize;
use thiserror::Error;

/// Failure of a single resize call. Never retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// Stable machine-readable error kind, for bridge callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidOptions,
    DecodeError,
    EncodeError,
    ResourceExhausted,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidOptions => "invalid_options",
            Self::DecodeError => "decode_error",
            Self::EncodeError => "encode_error",
            Self::ResourceExhausted => "resource_exhausted",
        }
    }
}

impl ResizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOptions(_) => ErrorKind::InvalidOptions,
            Self::Decode(_) => ErrorKind::DecodeError,
            Self::Encode(_) => ErrorKind::EncodeError,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
        }
    }
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Colour-channel layout of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::LumaAlpha | Self::Rgba)
    }

    pub fn channel_count(self) -> u8 {
        match self {
            Self::Luma => 1,
            Self::LumaAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// An owned, decoded pixel buffer.
///
/// Resampling always produces a new buffer; nothing mutates a buffer once it
/// has been built.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: DynamicImage,
}

/// A buffer produced by decoding the caller's bytes.
pub type SourceImage = PixelBuffer;

impl PixelBuffer {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn layout(&self) -> ChannelLayout {
        let color = self.image.color();
        match (color.has_color(), color.has_alpha()) {
            (false, false) => ChannelLayout::Luma,
            (false, true) => ChannelLayout::LumaAlpha,
            (true, false) => ChannelLayout::Rgb,
            (true, true) => ChannelLayout::Rgba,
        }
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve concurrent calls from worker threads;
/// no method may keep per-call state.
pub trait ImageBackend: Sync {
    /// Read dimensions from the header without a full decode.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, ResizeError>;

    /// Decode bytes into a pixel buffer.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, ResizeError>;

    /// Produce a new `width`×`height` buffer from `source`.
    fn resample(
        &self,
        source: &SourceImage,
        width: u32,
        height: u32,
        filter: Filter,
    ) -> Result<PixelBuffer, ResizeError>;

    /// Serialize `pixels` into `encoding`. `quality` only affects lossy encodings.
    fn encode(
        &self,
        pixels: &PixelBuffer,
        encoding: Encoding,
        quality: Quality,
    ) -> Result<Vec<u8>, ResizeError>;
}
