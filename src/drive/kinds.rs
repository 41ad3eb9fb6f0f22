//! Logical file kinds and the two classification paths
//!
//! The drive reports a content type for every item, but it frequently fails
//! to tag non-native file types with the expected value, so a second
//! classification path derives a kind from the filename suffix. The two
//! paths are mutually exclusive: a query either filters by content type on
//! the server (`MatchMode::Mime`, every returned item trusted) or filters
//! client-side by suffix (`MatchMode::Extension`). Folders are the one
//! exception: they have no suffix and are always matched by exact content
//! type.

use std::fmt;
use std::str::FromStr;

use super::types::{DriveError, DriveItem};

/// Content type the service assigns to folder entries.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Closed vocabulary of file classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Csv,
    Pdf,
    Jpeg,
    Png,
    Mp3,
    /// Native Google document.
    Document,
    /// Native Google spreadsheet.
    Spreadsheet,
    Folder,
}

/// Which classification path a lookup or bulk run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Server-side content-type filter; returned items are trusted as-is.
    Mime,
    /// Client-side re-derivation from the filename suffix.
    Extension,
}

impl FileKind {
    /// The service content-type string for this kind.
    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::PlainText => "text/plain",
            FileKind::Csv => "text/csv",
            FileKind::Pdf => "application/pdf",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Png => "image/png",
            FileKind::Mp3 => "audio/mpeg",
            FileKind::Document => "application/vnd.google-apps.document",
            FileKind::Spreadsheet => "application/vnd.google-apps.spreadsheet",
            FileKind::Folder => FOLDER_MIME,
        }
    }

    /// Short label, matching the suffix convention used on the drive.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::PlainText => "txt",
            FileKind::Csv => "csv",
            FileKind::Pdf => "pdf",
            FileKind::Jpeg => "jpg",
            FileKind::Png => "png",
            FileKind::Mp3 => "mp3",
            FileKind::Document => "gdoc",
            FileKind::Spreadsheet => "gsht",
            FileKind::Folder => "folder",
        }
    }

    /// Map a filename suffix to a kind. Never yields `Folder`: folder
    /// entries carry no suffix and are classified by content type only.
    pub fn from_extension(ext: &str) -> Option<FileKind> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(FileKind::PlainText),
            "csv" => Some(FileKind::Csv),
            "pdf" => Some(FileKind::Pdf),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "png" => Some(FileKind::Png),
            "mp3" => Some(FileKind::Mp3),
            "gdoc" => Some(FileKind::Document),
            "gsht" => Some(FileKind::Spreadsheet),
            _ => None,
        }
    }

    /// Derive a kind from a filename: the suffix after the last `.`,
    /// defaulting to plain text when there is no suffix or it is
    /// unrecognized. Pure function of the name.
    pub fn from_name(name: &str) -> FileKind {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                Self::from_extension(ext).unwrap_or(FileKind::PlainText)
            }
            _ => FileKind::PlainText,
        }
    }

    /// Whether an item counts as this kind under the given mode.
    ///
    /// Folder entries are decided by exact content type in both modes and
    /// never fall through to the suffix heuristic.
    pub fn matches(&self, item: &DriveItem, mode: MatchMode) -> bool {
        if item.is_folder() {
            return *self == FileKind::Folder;
        }
        if *self == FileKind::Folder {
            return false;
        }
        match mode {
            MatchMode::Mime => true,
            MatchMode::Extension => FileKind::from_name(&item.name) == *self,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FileKind {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(FileKind::PlainText),
            "csv" => Ok(FileKind::Csv),
            "pdf" => Ok(FileKind::Pdf),
            "jpg" | "jpeg" => Ok(FileKind::Jpeg),
            "png" => Ok(FileKind::Png),
            "mp3" => Ok(FileKind::Mp3),
            "gdoc" => Ok(FileKind::Document),
            "gsht" => Ok(FileKind::Spreadsheet),
            "folder" | "gfldr" => Ok(FileKind::Folder),
            other => Err(DriveError::InvalidInput(format!(
                "unknown file kind '{other}'"
            ))),
        }
    }
}
