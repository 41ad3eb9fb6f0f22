//! Result sink
//!
//! Optional JSON persistence for listing and cleanup results. The engines'
//! contract ends at returning their sequences; callers that set a save flag
//! hand them here.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::drive::DriveError;

const FILE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Write `payload` as pretty-printed JSON to `<label>_<timestamp>.json`
/// inside `dir`, returning the path written.
pub fn save_json_in<T: Serialize>(
    dir: &Path,
    label: &str,
    payload: &T,
) -> Result<PathBuf, DriveError> {
    let stamp = Utc::now().format(FILE_TIME_FORMAT);
    let path = dir.join(format!("{label}_{stamp}.json"));
    let body = serde_json::to_string_pretty(payload).map_err(|e| DriveError::Parse(e.to_string()))?;
    std::fs::write(&path, body)?;
    info!("saved results to '{}'", path.display());
    Ok(path)
}

/// [`save_json_in`] targeting the current directory.
pub fn save_json<T: Serialize>(label: &str, payload: &T) -> Result<PathBuf, DriveError> {
    save_json_in(Path::new("."), label, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::ActionOutcome;

    #[test]
    fn test_saves_timestamped_json() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![ActionOutcome::nothing_found()];

        let path = save_json_in(dir.path(), "drivesweep", &outcomes).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("drivesweep_"));
        assert!(name.ends_with(".json"));

        let body = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed[0]["detail"], "nothing found");
    }
}
