//! Persisting encoded images to a directory.
//!
//! Stands in for a platform photo library: the host picks a directory, the
//! resizer writes `directory/filename`. Filenames follow one rule:
//!
//! - no extension (`"avatar"`) → the encoding's extension is appended (`avatar.jpg`)
//! - a `jpg`/`jpeg`/`png` extension → kept, and it selects the encoding
//! - any other extension → kept verbatim, encoding unchanged

use crate::imaging::{Encoding, ImageBackend, Quality, ResizeError, ResizeResult, reencode};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Resize(#[from] ResizeError),
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where and how to store an image.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    pub directory: PathBuf,
    pub filename: String,
    pub encoding: Encoding,
    pub quality: Quality,
}

/// A file written by [`store_image`] or [`write_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Apply the filename rule, returning the final name and the encoding to use.
pub fn resolve_filename(filename: &str, encoding: Encoding) -> Result<(String, Encoding), StoreError> {
    let name = filename.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }

    match name.rsplit_once('.') {
        Some((_, ext)) => {
            let encoding = Encoding::from_extension(ext).unwrap_or(encoding);
            Ok((name.to_string(), encoding))
        }
        None => Ok((format!("{name}.{}", encoding.extension()), encoding)),
    }
}

/// Write an already encoded result to `directory/filename`, creating the directory.
pub fn write_result(
    directory: &Path,
    filename: &str,
    result: &ResizeResult,
) -> Result<StoredImage, StoreError> {
    fs::create_dir_all(directory).map_err(|source| StoreError::Io {
        path: directory.to_path_buf(),
        source,
    })?;
    let path = directory.join(filename);
    fs::write(&path, &result.bytes).map_err(|source| StoreError::Io {
        path: path.clone(),
        source,
    })?;
    info!(
        path = %path.display(),
        bytes = result.bytes.len(),
        width = result.width,
        height = result.height,
        "stored image"
    );

    Ok(StoredImage {
        path,
        filename: filename.to_string(),
        width: result.width,
        height: result.height,
    })
}

/// Re-encode `raw` per `options` and write it to disk.
///
/// The filename is checked before any decoding so a bad name costs nothing.
pub fn store_image(
    backend: &impl ImageBackend,
    raw: &[u8],
    options: &StoreOptions,
) -> Result<StoredImage, StoreError> {
    let (filename, encoding) = resolve_filename(&options.filename, options.encoding)?;
    let encoded = reencode(backend, raw, encoding, options.quality)?;
    write_result(&options.directory, &filename, &encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{encode_test_image, gradient_rgb};
    use tempfile::TempDir;

    #[test]
    fn filename_without_extension_gets_one() {
        assert_eq!(
            resolve_filename("avatar", Encoding::Png).unwrap(),
            ("avatar.png".to_string(), Encoding::Png)
        );
    }

    #[test]
    fn filename_extension_selects_encoding() {
        assert_eq!(
            resolve_filename("shot.JPEG", Encoding::Png).unwrap(),
            ("shot.JPEG".to_string(), Encoding::Jpeg)
        );
    }

    #[test]
    fn filename_unknown_extension_keeps_encoding() {
        assert_eq!(
            resolve_filename("shot.v2", Encoding::Png).unwrap(),
            ("shot.v2".to_string(), Encoding::Png)
        );
    }

    #[test]
    fn filename_rejects_paths_and_empty() {
        for bad in ["", "  ", "..", "a/b.jpg", "a\\b.jpg"] {
            assert!(
                matches!(resolve_filename(bad, Encoding::Jpeg), Err(StoreError::InvalidFilename(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn store_creates_directory_and_writes_png() {
        let tmp = TempDir::new().unwrap();
        let raw = encode_test_image(&gradient_rgb(40, 20), Encoding::Jpeg);
        let options = StoreOptions {
            directory: tmp.path().join("nested/album"),
            filename: "copy".into(),
            encoding: Encoding::Png,
            quality: Quality::MAX,
        };

        let stored = store_image(&RustBackend::new(), &raw, &options).unwrap();
        assert_eq!(stored.filename, "copy.png");
        assert_eq!((stored.width, stored.height), (40, 20));

        let written = fs::read(&stored.path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn store_invalid_bytes_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let options = StoreOptions {
            directory: tmp.path().to_path_buf(),
            filename: "broken".into(),
            encoding: Encoding::Jpeg,
            quality: Quality::MAX,
        };

        let err = store_image(&RustBackend::new(), b"nope", &options).unwrap_err();
        assert!(matches!(err, StoreError::Resize(ResizeError::Decode(_))));
        assert!(!tmp.path().join("broken.jpg").exists());
    }
}
