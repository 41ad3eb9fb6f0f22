//! Conjunctive query composition
//!
//! Builds the single filter expression handed to the listing endpoint from
//! up to three predicates: content-type equality, a modified-before bound,
//! and parent containment. An empty filter is rejected rather than resolved
//! to "match everything". That guard is what stands between a mistyped
//! flag and a full-drive enumeration or deletion.

use chrono::NaiveDate;
use tracing::warn;

use super::kinds::FileKind;
use super::types::DriveError;

/// Time-of-day suffix the original tool appends to date-only bounds.
const QUERY_TIME_SUFFIX: &str = "T01:02:03";

/// Composable item filter. All predicates are optional, but at least one
/// must be present by composition time.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    mime_type: Option<String>,
    modified_before: Option<String>,
    parent: Option<String>,
}

impl ItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the service content type of a logical kind.
    pub fn with_kind(mut self, kind: FileKind) -> Self {
        self.mime_type = Some(kind.mime().to_string());
        self
    }

    /// Filter on a raw content-type string.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Keep only items last modified strictly before the given date.
    pub fn modified_before(self, date: NaiveDate) -> Self {
        self.modified_before_timestamp(format!("{date}{QUERY_TIME_SUFFIX}"))
    }

    /// Same as [`modified_before`](Self::modified_before) with a preformatted
    /// service timestamp.
    pub fn modified_before_timestamp(mut self, ts: impl Into<String>) -> Self {
        self.modified_before = Some(ts.into());
        self
    }

    /// Keep only items whose parent set contains the given folder id.
    pub fn in_parent(mut self, folder_id: impl Into<String>) -> Self {
        self.parent = Some(folder_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mime_type.is_none() && self.modified_before.is_none() && self.parent.is_none()
    }

    /// Join the present predicates with `and`, in the fixed order
    /// content-type, age bound, containment. Clause order does not change
    /// the result set, only the literal expression; fixing it keeps the
    /// composer deterministic and testable.
    pub fn compose(&self) -> Result<String, DriveError> {
        let mut clauses = Vec::with_capacity(3);
        if let Some(mime) = &self.mime_type {
            clauses.push(format!("mimeType='{}'", escape(mime)));
        }
        if let Some(ts) = &self.modified_before {
            clauses.push(format!("modifiedTime < '{}'", escape(ts)));
        }
        if let Some(parent) = &self.parent {
            clauses.push(format!("'{}' in parents", escape(parent)));
        }
        if clauses.is_empty() {
            warn!("no query predicates supplied");
            return Err(DriveError::EmptyQuery);
        }
        Ok(clauses.join(" and "))
    }
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}
