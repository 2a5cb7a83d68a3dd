//! Where image bytes come from.
//!
//! The resizer itself only accepts an in-memory buffer. Callers hand it
//! either inline base64 data (optionally wrapped in a `data:` URI) or a local
//! file reference (plain path or `file://` URI). Remote URLs are refused:
//! the crate never touches the network.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Unsupported URL scheme '{0}': only local files can be read")]
    UnsupportedScheme(String),
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
}

/// How the `data` field of a request should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageDataType {
    #[serde(rename = "base64Image")]
    Base64Image,
    #[default]
    #[serde(rename = "urlImage")]
    UrlImage,
}

/// A reference to image bytes that have not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Base64 payload, bare or as a `data:<mime>;base64,` URI.
    Base64(String),
    /// Local path or `file://` URI.
    Url(String),
}

impl ImageSource {
    pub fn new(data: impl Into<String>, data_type: ImageDataType) -> Self {
        match data_type {
            ImageDataType::Base64Image => Self::Base64(data.into()),
            ImageDataType::UrlImage => Self::Url(data.into()),
        }
    }

    /// Load the referenced bytes into memory.
    pub fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        match self {
            Self::Base64(data) => decode_base64(data),
            Self::Url(url) => {
                let path = resolve_path(url)?;
                std::fs::read(&path).map_err(|source| SourceError::Io { path, source })
            }
        }
    }
}

/// Decode base64 image data, accepting `data:` URIs and embedded whitespace.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, SourceError> {
    let payload = match data.trim().strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((header, body)) if header.ends_with(";base64") => body,
            _ => {
                return Err(SourceError::InvalidUri(
                    "data URI is not base64 encoded".into(),
                ));
            }
        },
        None => data,
    };
    // Line-wrapped base64 (MIME style) is common from mobile encoders.
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

/// Encode bytes as standard padded base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Turn a local file reference into a filesystem path.
///
/// - `file:///abs/path` and `file://localhost/abs/path` → `/abs/path`
/// - any other `scheme://` → [`SourceError::UnsupportedScheme`]
/// - anything else is taken as a path as-is
pub fn resolve_path(url: &str) -> Result<PathBuf, SourceError> {
    if let Some(rest) = url.strip_prefix("file://") {
        let path = rest.strip_prefix("localhost").unwrap_or(rest);
        if !path.starts_with('/') {
            return Err(SourceError::InvalidUri(format!(
                "file URI must be absolute: {url}"
            )));
        }
        return Ok(PathBuf::from(percent_decode(path)?));
    }
    if let Some((scheme, _)) = url.split_once("://") {
        return Err(SourceError::UnsupportedScheme(scheme.to_string()));
    }
    Ok(PathBuf::from(url))
}

fn percent_decode(input: &str) -> Result<String, SourceError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| SourceError::InvalidUri(format!("bad escape in {input}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out)
        .map_err(|_| SourceError::InvalidUri(format!("escape is not UTF-8 in {input}")))
}
