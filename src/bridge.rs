//! Command layer for plugin-style hosts.
//!
//! Hosts send a JSON request naming an `action` plus its parameters and get
//! back a JSON object (or a `{kind, message}` error). Three actions exist:
//!
//! | Action | Does | Success payload |
//! |---|---|---|
//! | `resizeImage` | resize, return base64 or store to disk | `{imageData, width, height}` / `{filename, path, width, height}` |
//! | `imageSize` | read header dimensions | `{width, height}` |
//! | `storeImage` | re-encode and store to disk | `{filename, path, width, height}` |
//!
//! [`Bridge::dispatch`] runs synchronously. [`Bridge::submit`] and
//! [`Bridge::submit_with`] run the same work on a rayon worker and deliver
//! exactly one completion through a channel or callback.
//!
//! ## Resize types
//!
//! `width`/`height` of `0` mean "not given".
//!
//! - `maxPixelResize` (default): fit inside `width`×`height`, aspect kept
//! - `pixelResize`: exactly `width`×`height` (or derive the missing side)
//! - `factorResize`: `width`/`height` are scale factors on the source size
//! - `minPixelResize`: cover `width`×`height` with one scale, never upscaling

use crate::imaging::{
    Encoding, Filter, ImageBackend, Quality, ResizeError, RustBackend, SizingOptions,
    calculate_factor_dimensions, calculate_min_fill_dimensions, image_size, resize,
};
use crate::source::{ImageDataType, ImageSource, SourceError, encode_base64};
use crate::store::{StoreError, StoreOptions, resolve_filename, store_image, write_result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Worker exited without a response")]
    Disconnected,
}

impl BridgeError {
    /// Stable machine-readable kind for the host.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Source(_) => "source_error",
            Self::Resize(e) | Self::Store(StoreError::Resize(e)) => e.kind().as_str(),
            Self::Store(StoreError::InvalidFilename(_)) => "invalid_filename",
            Self::Store(StoreError::Io { .. }) => "io_error",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Error payload sent back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

impl From<&BridgeError> for ErrorResponse {
    fn from(err: &BridgeError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeType {
    FactorResize,
    PixelResize,
    MinPixelResize,
    #[default]
    MaxPixelResize,
}

fn default_resize_quality() -> u32 {
    75
}

fn default_store_quality() -> u32 {
    100
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRequest {
    pub data: String,
    #[serde(default)]
    pub image_data_type: ImageDataType,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub resize_type: ResizeType,
    #[serde(default)]
    pub format: Encoding,
    /// Percentage, 0–100.
    #[serde(default = "default_resize_quality")]
    pub quality: u32,
    #[serde(default)]
    pub store_image: bool,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRequest {
    pub data: String,
    #[serde(default)]
    pub image_data_type: ImageDataType,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    pub data: String,
    #[serde(default)]
    pub image_data_type: ImageDataType,
    #[serde(default)]
    pub format: Encoding,
    /// Percentage, 0–100.
    #[serde(default = "default_store_quality")]
    pub quality: u32,
    #[serde(default)]
    pub directory: String,
    pub filename: String,
}

/// A host command, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    ResizeImage(ResizeRequest),
    ImageSize(SizeRequest),
    StoreImage(StoreRequest),
}

impl Request {
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::ResizeImage(_) => "resizeImage",
            Self::ImageSize(_) => "imageSize",
            Self::StoreImage(_) => "storeImage",
        }
    }
}

/// Successful payload sent back to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Image {
        #[serde(rename = "imageData")]
        image_data: String,
        width: u32,
        height: u32,
    },
    Stored {
        filename: String,
        path: String,
        width: u32,
        height: u32,
    },
    Size {
        width: u32,
        height: u32,
    },
}

/// Outcome delivered to a [`Bridge::submit`] receiver or callback.
pub type Completion = Result<Response, BridgeError>;

/// Request dispatcher bound to one backend.
pub struct Bridge<B = RustBackend> {
    backend: Arc<B>,
    filter: Filter,
    default_directory: PathBuf,
}

impl Bridge<RustBackend> {
    pub fn new() -> Self {
        Self::with_backend(RustBackend::new())
    }
}

impl Default for Bridge<RustBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ImageBackend + Send + 'static> Bridge<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            filter: Filter::default(),
            default_directory: PathBuf::from("."),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Directory used when a request leaves `directory` empty.
    pub fn with_default_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.default_directory = directory.into();
        self
    }

    /// Run `request` on the calling thread.
    pub fn dispatch(&self, request: &Request) -> Completion {
        debug!(action = request.action(), "dispatching request");
        let result = match request {
            Request::ResizeImage(req) => self.resize_image(req),
            Request::ImageSize(req) => self.image_size(req),
            Request::StoreImage(req) => self.store_image(req),
        };
        if let Err(e) = &result {
            warn!(action = request.action(), kind = e.kind(), error = %e, "request failed");
        }
        result
    }

    /// Parse and run a JSON request on the calling thread.
    pub fn dispatch_json(&self, json: &str) -> Completion {
        self.dispatch(&Request::from_json(json)?)
    }

    /// Run `request` on a worker; the receiver yields exactly one completion.
    pub fn submit(&self, request: Request) -> mpsc::Receiver<Completion> {
        let (tx, rx) = mpsc::channel();
        self.submit_with(request, move |completion| {
            // The host may have stopped waiting; nothing to do then.
            let _ = tx.send(completion);
        });
        rx
    }

    /// Run `request` on a worker and hand the completion to `callback` there.
    pub fn submit_with<F>(&self, request: Request, callback: F)
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        let worker = Bridge {
            backend: Arc::clone(&self.backend),
            filter: self.filter,
            default_directory: self.default_directory.clone(),
        };
        rayon::spawn(move || callback(worker.dispatch(&request)));
    }

    fn directory_for(&self, requested: &str) -> PathBuf {
        if requested.trim().is_empty() {
            self.default_directory.clone()
        } else {
            PathBuf::from(requested)
        }
    }

    fn resize_image(&self, req: &ResizeRequest) -> Completion {
        let raw = ImageSource::new(req.data.clone(), req.image_data_type).read_bytes()?;

        // A stored file's extension decides the encoding.
        let (filename, encoding) = if req.store_image {
            let (name, encoding) = resolve_filename(&req.filename, req.format)?;
            (Some(name), encoding)
        } else {
            (None, req.format)
        };

        let mut options = self.sizing_for(req, &raw)?;
        options.encoding = encoding;
        options.quality = Quality::from_percent(req.quality).value();
        options.filter = self.filter;

        let result = resize(&*self.backend, &raw, &options)?;
        match filename {
            Some(name) => {
                let stored = write_result(&self.directory_for(&req.directory), &name, &result)?;
                Ok(stored_response(&stored.filename, &stored.path, stored.width, stored.height))
            }
            None => Ok(Response::Image {
                image_data: encode_base64(&result.bytes),
                width: result.width,
                height: result.height,
            }),
        }
    }

    fn sizing_for(&self, req: &ResizeRequest, raw: &[u8]) -> Result<SizingOptions, BridgeError> {
        let options = match req.resize_type {
            ResizeType::FactorResize => {
                let source = image_size(&*self.backend, raw)?;
                let (width, height) = calculate_factor_dimensions(
                    (source.width, source.height),
                    (req.width, req.height),
                )
                .ok_or_else(|| {
                    ResizeError::InvalidOptions(format!(
                        "invalid scale factors {}x{}",
                        req.width, req.height
                    ))
                })?;
                SizingOptions::exact(width, height)
            }
            ResizeType::MinPixelResize => {
                let target = (
                    pixel_target("width", req.width)?,
                    pixel_target("height", req.height)?,
                );
                if target == (None, None) {
                    return Err(ResizeError::InvalidOptions(
                        "minPixelResize needs a width or a height".into(),
                    )
                    .into());
                }
                let source = image_size(&*self.backend, raw)?;
                let (width, height) = calculate_min_fill_dimensions(
                    (source.width, source.height),
                    (target.0.unwrap_or(0), target.1.unwrap_or(0)),
                );
                SizingOptions::exact(width, height)
            }
            ResizeType::PixelResize | ResizeType::MaxPixelResize => SizingOptions {
                target_width: pixel_target("width", req.width)?,
                target_height: pixel_target("height", req.height)?,
                preserve_aspect_ratio: req.resize_type == ResizeType::MaxPixelResize,
                ..SizingOptions::default()
            },
        };
        Ok(options)
    }

    fn image_size(&self, req: &SizeRequest) -> Completion {
        let raw = ImageSource::new(req.data.clone(), req.image_data_type).read_bytes()?;
        let dims = image_size(&*self.backend, &raw)?;
        Ok(Response::Size {
            width: dims.width,
            height: dims.height,
        })
    }

    fn store_image(&self, req: &StoreRequest) -> Completion {
        let raw = ImageSource::new(req.data.clone(), req.image_data_type).read_bytes()?;
        let options = StoreOptions {
            directory: self.directory_for(&req.directory),
            filename: req.filename.clone(),
            encoding: req.format,
            quality: Quality::from_percent(req.quality),
        };
        let stored = store_image(&*self.backend, &raw, &options)?;
        Ok(stored_response(&stored.filename, &stored.path, stored.width, stored.height))
    }
}

fn stored_response(filename: &str, path: &Path, width: u32, height: u32) -> Response {
    Response::Stored {
        filename: filename.to_string(),
        path: path.display().to_string(),
        width,
        height,
    }
}

/// Convert a wire dimension to a pixel target; `0` means absent.
fn pixel_target(name: &str, value: f64) -> Result<Option<u32>, ResizeError> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(ResizeError::InvalidOptions(format!(
            "{name} must be a non-negative pixel count, got {value}"
        )));
    }
    let pixels = value.round() as u32;
    Ok((pixels > 0).then_some(pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{encode_test_image, gradient_rgb};
    use std::time::Duration;

    fn base64_png(width: u32, height: u32) -> String {
        encode_base64(&encode_test_image(&gradient_rgb(width, height), Encoding::Png))
    }

    #[test]
    fn parse_resize_request_defaults() {
        let request = Request::from_json(r#"{"action": "resizeImage", "data": "/tmp/a.jpg"}"#)
            .unwrap();
        let Request::ResizeImage(req) = request else {
            panic!("expected resizeImage");
        };
        assert_eq!(req.image_data_type, ImageDataType::UrlImage);
        assert_eq!(req.resize_type, ResizeType::MaxPixelResize);
        assert_eq!(req.format, Encoding::Jpeg);
        assert_eq!(req.quality, 75);
        assert!(!req.store_image);
    }

    #[test]
    fn parse_unknown_action_is_invalid_request() {
        let err = Request::from_json(r#"{"action": "rotate", "data": "x"}"#).unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
    }

    #[test]
    fn pixel_target_zero_is_absent() {
        assert_eq!(pixel_target("width", 0.0).unwrap(), None);
        assert_eq!(pixel_target("width", 12.4).unwrap(), Some(12));
        assert!(pixel_target("width", -3.0).is_err());
        assert!(pixel_target("width", f64::INFINITY).is_err());
    }

    #[test]
    fn resize_returns_base64_image() {
        let bridge = Bridge::new();
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image",
                "width": 50, "height": 200, "format": "png"}}"#,
            base64_png(100, 100)
        );

        let Response::Image {
            image_data,
            width,
            height,
        } = bridge.dispatch_json(&json).unwrap()
        else {
            panic!("expected image response");
        };
        assert_eq!((width, height), (50, 50));

        let bytes = crate::source::decode_base64(&image_data).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn resize_pixel_type_stretches() {
        let bridge = Bridge::with_backend(MockBackend::with_source(100, 100));
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image",
                "width": 50, "height": 200, "resizeType": "pixelResize"}}"#,
            encode_base64(b"raw")
        );
        let response = bridge.dispatch_json(&json).unwrap();
        assert!(matches!(response, Response::Image { width: 50, height: 200, .. }));
    }

    #[test]
    fn resize_factor_type_scales_source() {
        let backend = MockBackend::with_source(400, 300);
        let bridge = Bridge::with_backend(backend);
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image",
                "width": 0.5, "height": 0, "resizeType": "factorResize"}}"#,
            encode_base64(b"raw")
        );
        let response = bridge.dispatch_json(&json).unwrap();
        assert!(matches!(response, Response::Image { width: 200, height: 150, .. }));

        let ops = bridge.backend.get_operations();
        assert_eq!(ops[0], RecordedOp::Identify);
        assert!(ops.contains(&RecordedOp::Resample {
            width: 200,
            height: 150,
            filter: Filter::Lanczos3,
        }));
    }

    #[test]
    fn resize_min_pixel_type_covers_box_without_upscaling() {
        let bridge = Bridge::with_backend(MockBackend::with_source(400, 300));
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image",
                "width": 100, "height": 100, "resizeType": "minPixelResize"}}"#,
            encode_base64(b"raw")
        );
        let response = bridge.dispatch_json(&json).unwrap();
        assert!(matches!(response, Response::Image { width: 133, height: 100, .. }));

        let small = Bridge::with_backend(MockBackend::with_source(50, 40));
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image",
                "width": 100, "height": 100, "resizeType": "minPixelResize"}}"#,
            encode_base64(b"raw")
        );
        let response = small.dispatch_json(&json).unwrap();
        assert!(matches!(response, Response::Image { width: 50, height: 40, .. }));
    }

    #[test]
    fn resize_min_pixel_type_needs_a_side() {
        let bridge = Bridge::with_backend(MockBackend::with_source(10, 10));
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image",
                "resizeType": "minPixelResize"}}"#,
            encode_base64(b"raw")
        );
        assert_eq!(bridge.dispatch_json(&json).unwrap_err().kind(), "invalid_options");
    }

    #[test]
    fn resize_without_dimensions_is_invalid_options() {
        let bridge = Bridge::with_backend(MockBackend::with_source(10, 10));
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image"}}"#,
            encode_base64(b"raw")
        );
        let err = bridge.dispatch_json(&json).unwrap_err();
        assert_eq!(err.kind(), "invalid_options");
    }

    #[test]
    fn resize_and_store_uses_filename_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let bridge = Bridge::new().with_default_directory(tmp.path());
        let json = format!(
            r#"{{"action": "resizeImage", "data": "{}", "imageDataType": "base64Image",
                "width": 20, "storeImage": true, "filename": "small.png"}}"#,
            base64_png(40, 30)
        );

        let Response::Stored {
            filename,
            width,
            height,
            ..
        } = bridge.dispatch_json(&json).unwrap()
        else {
            panic!("expected stored response");
        };
        assert_eq!(filename, "small.png");
        assert_eq!((width, height), (20, 15));

        let bytes = std::fs::read(tmp.path().join("small.png")).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn image_size_reads_file_uri() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("in.png");
        std::fs::write(&path, encode_test_image(&gradient_rgb(64, 48), Encoding::Png)).unwrap();

        let request = Request::ImageSize(SizeRequest {
            data: format!("file://{}", path.display()),
            image_data_type: ImageDataType::UrlImage,
        });
        assert_eq!(
            Bridge::new().dispatch(&request).unwrap(),
            Response::Size {
                width: 64,
                height: 48
            }
        );
    }

    #[test]
    fn image_size_bad_base64_is_source_error() {
        let request = Request::ImageSize(SizeRequest {
            data: "@@@".into(),
            image_data_type: ImageDataType::Base64Image,
        });
        let err = Bridge::new().dispatch(&request).unwrap_err();
        assert_eq!(err.kind(), "source_error");
    }

    #[test]
    fn store_image_appends_format_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let request = Request::StoreImage(StoreRequest {
            data: base64_png(8, 8),
            image_data_type: ImageDataType::Base64Image,
            format: Encoding::Jpeg,
            quality: 90,
            directory: tmp.path().display().to_string(),
            filename: "copy".into(),
        });

        let response = Bridge::new().dispatch(&request).unwrap();
        assert!(matches!(response, Response::Stored { ref filename, .. } if filename == "copy.jpg"));
        assert!(tmp.path().join("copy.jpg").exists());
    }

    #[test]
    fn store_image_empty_filename_is_rejected() {
        let request = Request::StoreImage(StoreRequest {
            data: base64_png(8, 8),
            image_data_type: ImageDataType::Base64Image,
            format: Encoding::Jpeg,
            quality: 90,
            directory: String::new(),
            filename: String::new(),
        });
        let err = Bridge::new().dispatch(&request).unwrap_err();
        assert_eq!(err.kind(), "invalid_filename");
    }

    #[test]
    fn submit_delivers_one_completion() {
        let bridge = Bridge::with_backend(MockBackend::with_source(30, 20));
        let request = Request::ImageSize(SizeRequest {
            data: encode_base64(b"raw"),
            image_data_type: ImageDataType::Base64Image,
        });

        let rx = bridge.submit(request);
        let completion = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(
            completion.unwrap(),
            Response::Size {
                width: 30,
                height: 20
            }
        );
        // Sender dropped after the single completion.
        assert!(rx.recv_timeout(Duration::from_secs(10)).is_err());
    }

    #[test]
    fn submit_with_invokes_callback_on_error() {
        let bridge = Bridge::new();
        let request = Request::ImageSize(SizeRequest {
            data: encode_base64(b""),
            image_data_type: ImageDataType::Base64Image,
        });

        let (tx, rx) = mpsc::channel();
        bridge.submit_with(request, move |completion| {
            tx.send(completion.map_err(|e| ErrorResponse::from(&e))).unwrap();
        });
        let err = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap_err();
        assert_eq!(err.kind, "decode_error");
    }

    #[test]
    fn responses_serialize_like_the_plugin() {
        let json = serde_json::to_value(Response::Image {
            image_data: "AAAA".into(),
            width: 1,
            height: 2,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"imageData": "AAAA", "width": 1, "height": 2}));

        let err = ErrorResponse::from(&BridgeError::Resize(ResizeError::Decode("bad".into())));
        assert_eq!(
            serde_json::to_value(err).unwrap(),
            serde_json::json!({"kind": "decode_error", "message": "Decode failed: bad"})
        );
    }
}
