//! Image file acceptance.
//!
//! A file becomes an [`ImageUpload`] only if it can be read, fits under the
//! upload limit and has an `image/*` MIME type.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest file the analysis backend accepts (16 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Reasons a file is refused before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please select an image file")]
    NotAnImage { path: PathBuf },
    #[error("{} is too large ({size} bytes, limit {limit})", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("Cannot read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}

/// An accepted image, ready to be posted as multipart form data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read and validate the file at `path` with the default size limit.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        Self::from_path_with_limit(path, MAX_UPLOAD_BYTES)
    }

    /// Read and validate the file at `path`, refusing anything over `limit` bytes.
    pub fn from_path_with_limit(path: &Path, limit: u64) -> Result<Self, UploadError> {
        let unreadable = |err: std::io::Error| UploadError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        };

        let metadata = fs::metadata(path).map_err(unreadable)?;
        if !metadata.is_file() {
            return Err(UploadError::Unreadable {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }
        if metadata.len() > limit {
            return Err(UploadError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit,
            });
        }

        let mut bytes = Vec::new();
        // Bound the read in case the file grew after the metadata check.
        fs::File::open(path)
            .and_then(|file| file.take(limit + 1).read_to_end(&mut bytes))
            .map_err(unreadable)?;
        if bytes.len() as u64 > limit {
            return Err(UploadError::TooLarge {
                path: path.to_path_buf(),
                size: bytes.len() as u64,
                limit,
            });
        }

        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());
        Self::from_bytes(file_name, bytes).map_err(|_| UploadError::NotAnImage {
            path: path.to_path_buf(),
        })
    }

    /// Build an upload from in-memory bytes, detecting the MIME type from the
    /// file name first and the content second.
    pub fn from_bytes(file_name: String, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let mime = detect_mime(&file_name, &bytes).ok_or_else(|| UploadError::NotAnImage {
            path: PathBuf::from(&file_name),
        })?;
        Ok(Self {
            file_name,
            mime: mime.to_string(),
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encode as `data:<mime>;base64,<payload>`.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// MIME type for an image file, or `None` if the file is not an image.
pub fn detect_mime(file_name: &str, bytes: &[u8]) -> Option<&'static str> {
    let from_extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension);
    from_extension.or_else(|| {
        image::guess_format(bytes)
            .ok()
            .map(|format| format.to_mime_type())
            .filter(|mime| mime.starts_with("image/"))
    })
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime)
}

/// Turn a pasted string into a path, as terminals deliver dropped files.
///
/// Handles surrounding quotes, `file://` URLs and backslash-escaped spaces.
/// Returns `None` for pastes spanning several lines or empty input.
pub fn path_from_drop(text: &str) -> Option<PathBuf> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.contains('\n') {
        return None;
    }
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    if unquoted.starts_with("file://") {
        return Some(file_uri_path(unquoted));
    }
    Some(PathBuf::from(unquoted.replace("\\ ", " ")))
}

/// `file://` URIs arrive percent-encoded from terminals that drop URIs.
fn file_uri_path(uri: &str) -> PathBuf {
    reqwest::Url::parse(uri)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(uri.trim_start_matches("file://")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(detect_mime("scan.PNG", b""), Some("image/png"));
        assert_eq!(detect_mime("scan.jpeg", b""), Some("image/jpeg"));
        assert_eq!(detect_mime("icon.svg", b""), Some("image/svg+xml"));
    }

    #[test]
    fn test_mime_sniffed_from_content() {
        assert_eq!(detect_mime("scan.bin", PNG_MAGIC), Some("image/png"));
    }

    #[test]
    fn test_non_image_rejected() {
        let err = ImageUpload::from_bytes("notes.txt".to_string(), b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage { .. }));
        assert_eq!(err.to_string(), "Please select an image file");
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("xray.png");
        fs::write(&path, PNG_MAGIC).unwrap();

        let upload = ImageUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name(), "xray.png");
        assert_eq!(upload.mime(), "image/png");
        assert_eq!(upload.bytes(), PNG_MAGIC);
    }

    #[test]
    fn test_from_path_rejects_oversized_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        fs::write(&path, vec![0u8; 64]).unwrap();

        let err = ImageUpload::from_path_with_limit(&path, 32).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { size: 64, limit: 32, .. }));
    }

    #[test]
    fn test_from_path_missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let err = ImageUpload::from_path(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, UploadError::Unreadable { .. }));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = tempdir().unwrap();
        let err = ImageUpload::from_path(dir.path()).unwrap_err();
        assert!(matches!(err, UploadError::Unreadable { .. }));
    }

    #[test]
    fn test_data_url() {
        let upload = ImageUpload::from_bytes("a.gif".to_string(), b"GIF".to_vec()).unwrap();
        assert_eq!(upload.data_url(), "data:image/gif;base64,R0lG");
    }

    #[test]
    fn test_path_from_drop_variants() {
        assert_eq!(path_from_drop("  /tmp/a.png \n"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(path_from_drop("'/tmp/my scan.png'"), Some(PathBuf::from("/tmp/my scan.png")));
        assert_eq!(path_from_drop("/tmp/my\\ scan.png"), Some(PathBuf::from("/tmp/my scan.png")));
        assert_eq!(path_from_drop("file:///tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(path_from_drop("a\nb"), None);
        assert_eq!(path_from_drop("   "), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_path_from_dropped_uri_is_percent_decoded() {
        assert_eq!(
            path_from_drop("file:///tmp/my%20scan.png"),
            Some(PathBuf::from("/tmp/my scan.png"))
        );
        assert_eq!(
            path_from_drop("'file:///home/u/r%C3%B6ntgen.jpg'"),
            Some(PathBuf::from("/home/u/röntgen.jpg"))
        );
    }

    proptest! {
        #[test]
        fn prop_text_files_are_never_images(body in "[a-zA-Z0-9 ,.]{0,200}", stem in "[a-z]{1,8}") {
            let name = format!("{stem}.txt");
            let result = ImageUpload::from_bytes(name, format!("note: {body}").into_bytes());
            let is_not_image = matches!(result, Err(UploadError::NotAnImage { .. }));
            prop_assert!(is_not_image);
        }
    }
}
