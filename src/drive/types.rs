//! Shared types for the drive engine
//!
//! Contains the item snapshot returned by the Drive API, the page wrapper
//! used by the pagination engine, the per-action outcome record, and the
//! crate-wide error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::kinds::FOLDER_MIME;

/// One file or folder entry on the drive.
///
/// Items are immutable snapshots: the engine never mutates them, it only
/// requests remote state transitions and receives fresh copies. `size` is
/// absent for folders and some native document types, and `parents` is empty
/// for entries shared into the drive from another account. Both are normal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Last modification time (ISO 8601, second precision, service timezone).
    pub modified_time: Option<String>,
    /// Byte size; the API serializes int64 as a decimal string.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

impl DriveItem {
    /// Folder entries are identified by exact content type, never by name.
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }

    /// Parent ids for display, with the original tool's marker for
    /// parentless "shared with me" entries.
    pub fn parents_label(&self) -> String {
        if self.parents.is_empty() {
            "[*** NONE ***]".to_string()
        } else {
            format!("[{}]", self.parents.join(", "))
        }
    }
}

/// One page of a listing, with the continuation cursor for the next call.
///
/// A `None` cursor means "start from the beginning" on the first request and
/// "no more pages" on any response; the pagination engine distinguishes the
/// two purely by call order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPage {
    #[serde(default, rename = "files")]
    pub items: Vec<DriveItem>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// Record of one bulk-executor action (or of the fact that none applied).
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub file_id: String,
    pub name: String,
    pub modified: String,
    /// Dry-run description or the raw service response.
    pub detail: String,
}

impl ActionOutcome {
    /// Sentinel returned when a run completed but matched no items, so
    /// callers can tell "ran but found nothing" from "did not run".
    pub fn nothing_found() -> Self {
        Self {
            file_id: String::new(),
            name: String::new(),
            modified: String::new(),
            detail: "nothing found".to_string(),
        }
    }

    pub fn is_nothing_found(&self) -> bool {
        self.file_id.is_empty() && self.detail == "nothing found"
    }
}

/// Drive engine error type.
///
/// `NoSession` and `EmptyQuery` are caller-sequencing signals rather than
/// remote faults: both are recoverable by fixing the call, and callers may
/// downgrade them to warnings. Everything else is propagated unchanged:
/// partial knowledge of remote state is unsafe to paper over, especially
/// ahead of a delete.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("no active drive session")]
    NoSession,

    #[error("no query predicates supplied")]
    EmptyQuery,

    #[error("invalid argument: {0}")]
    InvalidInput(String),

    #[error("invalid local path: {0}")]
    InvalidPath(String),

    #[error("credential error: {0}")]
    Credentials(String),

    #[error("drive api returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    /// True for errors caused by how the caller invoked the engine, as
    /// opposed to faults from the remote service or the local machine.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            DriveError::NoSession
                | DriveError::EmptyQuery
                | DriveError::InvalidInput(_)
                | DriveError::InvalidPath(_)
        )
    }
}
