//! File selection for upload controls.
//!
//! [`FileInput`] is what a user picks in the file dialog; [`FileChooser`]
//! applies the control's `multiple` and `accept` attributes to a selection;
//! [`UploadedFile`] is what the store records.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dom::Element;
use crate::result::HealResult;

/// A file offered to an upload control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInput {
    /// File name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Original path, when picked from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl FileInput {
    /// Create a file input
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            path: None,
        }
    }

    /// Create a file input, guessing the MIME type from the name
    #[must_use]
    pub fn sized(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let mime_type = guess_mime_type(&name);
        Self::new(name, mime_type, size)
    }

    /// Create from a file on disk, reading its size
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file metadata cannot be read
    pub fn from_path(path: impl AsRef<Path>) -> HealResult<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Self {
            path: Some(path.to_path_buf()),
            ..Self::sized(name, size)
        })
    }

    /// Lower-case extension with a leading dot
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        Some(format!(".{}", ext.to_lowercase()))
    }
}

/// Selection rules of one file control
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChooser {
    /// Whether more than one file may be selected
    pub multiple: bool,
    /// Accepted MIME types, `type/*` patterns, or `.ext` extensions
    pub accept: Vec<String>,
}

impl FileChooser {
    /// Single-file chooser accepting anything
    #[must_use]
    pub fn single() -> Self {
        Self::default()
    }

    /// Multi-file chooser accepting anything
    #[must_use]
    pub fn multiple() -> Self {
        Self {
            multiple: true,
            accept: Vec::new(),
        }
    }

    /// Read `multiple` and `accept` from a control
    #[must_use]
    pub fn for_element(element: &Element) -> Self {
        let accept = element
            .attribute("accept")
            .map(|a| {
                a.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            multiple: element.attribute("multiple").is_some(),
            accept,
        }
    }

    /// Set accepted types
    #[must_use]
    pub fn accept(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.accept = types.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a file passes the `accept` filter
    #[must_use]
    pub fn is_accepted(&self, file: &FileInput) -> bool {
        if self.accept.is_empty() {
            return true;
        }
        let ext = file.extension();
        self.accept.iter().any(|accept| {
            accept == "*/*"
                || accept.eq_ignore_ascii_case(&file.mime_type)
                || ext.as_deref() == Some(accept.as_str())
                || accept
                    .strip_suffix('*')
                    .is_some_and(|prefix| prefix.ends_with('/') && file.mime_type.starts_with(prefix))
        })
    }

    /// Apply the control's rules to a selection: unaccepted files are
    /// dropped, and a single-file control keeps only the first
    #[must_use]
    pub fn select(&self, files: impl IntoIterator<Item = FileInput>) -> Vec<FileInput> {
        let accepted = files.into_iter().filter(|f| self.is_accepted(f));
        if self.multiple {
            accepted.collect()
        } else {
            accepted.take(1).collect()
        }
    }
}

/// One file as recorded by the upload store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type
    pub mime_type: String,
    /// Rendered positioned locator of the control, for scenarios that build one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

impl UploadedFile {
    /// Create an uploaded file without a locator
    #[must_use]
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            mime_type: guess_mime_type(&name),
            name,
            size,
            locator: None,
        }
    }

    /// Record a selected file
    #[must_use]
    pub fn from_input(input: &FileInput) -> Self {
        Self {
            name: input.name.clone(),
            size: input.size,
            mime_type: input.mime_type.clone(),
            locator: None,
        }
    }

    /// Attach a locator rendering; an empty rendering attaches nothing
    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        let locator = locator.into();
        self.locator = (!locator.is_empty()).then_some(locator);
        self
    }
}

/// Guess a MIME type from a file name
#[must_use]
pub fn guess_mime_type(filename: &str) -> String {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    // =========================================================================
    // FileInput
    // =========================================================================

    #[test]
    fn h0_file_01_sized_guesses_mime() {
        let file = FileInput::sized("a.PNG", 1024);
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size, 1024);
        assert_eq!(file.extension().as_deref(), Some(".png"));
    }

    #[test]
    fn h0_file_02_from_path_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, vec![0_u8; 300]).unwrap();

        let file = FileInput::from_path(&path).unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size, 300);
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn h0_file_03_from_missing_path_is_io_error() {
        let err = FileInput::from_path("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, crate::result::HealError::Io(_)));
    }

    #[test]
    fn h0_file_04_unknown_extension() {
        assert_eq!(guess_mime_type("README"), "application/octet-stream");
        assert_eq!(guess_mime_type("data.bin"), "application/octet-stream");
    }

    // =========================================================================
    // FileChooser
    // =========================================================================

    #[test]
    fn h0_file_05_single_keeps_first() {
        let picked = FileChooser::single().select([FileInput::sized("a.txt", 1), FileInput::sized("b.txt", 2)]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "a.txt");
    }

    #[test]
    fn h0_file_06_accept_patterns() {
        let chooser = FileChooser::multiple().accept(["image/*", ".pdf"]);
        assert!(chooser.is_accepted(&FileInput::sized("x.png", 1)));
        assert!(chooser.is_accepted(&FileInput::sized("x.PDF", 1)));
        assert!(!chooser.is_accepted(&FileInput::sized("x.csv", 1)));
    }

    #[test]
    fn h0_file_07_for_element_reads_attributes() {
        let mut dom = Dom::new();
        let input = dom.create_element("input");
        dom.set_attribute(input, "type", "file").unwrap();
        dom.set_attribute(input, "multiple", "").unwrap();
        dom.set_attribute(input, "accept", "image/png, .TXT").unwrap();

        let chooser = FileChooser::for_element(dom.element(input).unwrap());
        assert!(chooser.multiple);
        assert_eq!(chooser.accept, vec!["image/png".to_string(), ".txt".to_string()]);
        let picked = chooser.select([
            FileInput::sized("a.png", 1),
            FileInput::sized("b.csv", 1),
            FileInput::sized("c.txt", 1),
        ]);
        assert_eq!(picked.len(), 2);
    }

    // =========================================================================
    // UploadedFile
    // =========================================================================

    #[test]
    fn h0_file_08_uploaded_from_input() {
        let recorded = UploadedFile::from_input(&FileInput::sized("a.png", 1024)).with_locator("XPath: //x");
        assert_eq!(recorded.name, "a.png");
        assert_eq!(recorded.size, 1024);
        assert_eq!(recorded.locator.as_deref(), Some("XPath: //x"));
    }

    #[test]
    fn h0_file_09_empty_locator_is_not_attached() {
        let recorded = UploadedFile::new("a.png", 1).with_locator("");
        assert_eq!(recorded.locator, None);
    }
}
