//! Transfer unit
//!
//! Uploads one local file, or one local folder's immediate regular files
//! into a freshly created remote folder. Subdirectories are not descended
//! into, and the first failed upload aborts the remainder of a folder run;
//! callers wanting resilience retry the whole operation.

use std::borrow::Cow;
use std::path::Path;

use chrono::Utc;
use tracing::info;
use walkdir::WalkDir;

use super::kinds::FileKind;
use super::session::DriveSession;
use super::types::{ActionOutcome, DriveError};

const OUTCOME_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Content type for an upload: the closed vocabulary first, then a guess
/// from the path for suffixes outside it, then plain text. Only the upload
/// is refined this way; classification proper stays a pure function of the
/// suffix.
fn upload_mime(path: &Path) -> Cow<'static, str> {
    let ext = path.extension().and_then(|e| e.to_str());
    match ext.and_then(FileKind::from_extension) {
        Some(kind) => Cow::Borrowed(kind.mime()),
        None => mime_guess::from_path(path)
            .first_raw()
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Borrowed(FileKind::PlainText.mime())),
    }
}

fn base_name(path: &Path) -> Result<&str, DriveError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DriveError::InvalidPath(path.display().to_string()))
}

impl DriveSession {
    /// Upload one local file under `parent_id`; returns the new item's id.
    pub async fn send_file(&self, path: &Path, parent_id: &str) -> Result<String, DriveError> {
        let api = self.api()?;
        let name = base_name(path)?;
        let mime = upload_mime(path);
        let content = tokio::fs::read(path).await?;

        info!("sending file '{}' to drive folder '{parent_id}'", path.display());
        let id = api.create_file(name, parent_id, &mime, content).await?;
        info!("success: drive id = {id}");
        Ok(id)
    }

    /// Create a remote folder named after `path`'s base name under
    /// `parent_id`, then upload every regular file that is a direct child of
    /// `path` into it. Returns one outcome per uploaded file.
    pub async fn send_folder(
        &self,
        path: &Path,
        parent_id: &str,
    ) -> Result<Vec<ActionOutcome>, DriveError> {
        let api = self.api()?;
        if !path.is_dir() {
            return Err(DriveError::InvalidPath(format!(
                "{} is not a folder",
                path.display()
            )));
        }
        let folder_name = base_name(path)?;
        let folder_id = api.create_folder(folder_name, parent_id).await?;
        info!("created drive folder '{folder_name}' ({folder_id})");

        let mut outcomes = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_id = self.send_file(entry.path(), &folder_id).await?;
            outcomes.push(ActionOutcome {
                file_id,
                name: entry.file_name().to_string_lossy().into_owned(),
                modified: Utc::now().format(OUTCOME_TIME_FORMAT).to_string(),
                detail: format!("uploaded to '{folder_name}'"),
            });
        }

        info!("sent {} files to folder '{folder_name}'", outcomes.len());
        Ok(outcomes)
    }
}
