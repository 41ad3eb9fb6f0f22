//! Bulk operation executor
//!
//! Walks a fetched item set in order, classifies each item against a target
//! kind, and either simulates (dry run) or performs the deletion, one
//! outcome record per action. A hard action cap bounds the blast radius of
//! a mis-scoped filter; a run that matches nothing returns a single
//! sentinel record instead of an empty sequence.

use chrono::NaiveDate;
use tracing::{info, warn};

use super::kinds::{FileKind, MatchMode};
use super::session::DriveSession;
use super::types::{ActionOutcome, DriveError, DriveItem};

/// Upper bound on actions per run, matching or not how many items remain.
pub const MAX_DELETE_ACTIONS: usize = 500;

impl DriveSession {
    /// Delete (or pretend to delete) every item in `items` whose
    /// classification matches `kind` under `mode`.
    ///
    /// Dry-run outcomes describe the deletion that would have happened and
    /// never touch the service; live outcomes record the raw delete
    /// response. Items are processed in the order received until the set is
    /// exhausted or [`MAX_DELETE_ACTIONS`] is reached.
    pub async fn purge_items(
        &self,
        items: &[DriveItem],
        kind: FileKind,
        mode: MatchMode,
        dry_run: bool,
    ) -> Result<Vec<ActionOutcome>, DriveError> {
        let api = self.api()?;
        let mut outcomes: Vec<ActionOutcome> = Vec::new();

        for (index, item) in items.iter().enumerate() {
            if outcomes.len() >= MAX_DELETE_ACTIONS {
                warn!(
                    "action cap of {MAX_DELETE_ACTIONS} reached; {} items left unexamined",
                    items.len() - index
                );
                break;
            }
            if !kind.matches(item, mode) {
                continue;
            }

            let modified = item.modified_time.clone().unwrap_or_default();
            let detail = if dry_run {
                format!("would have deleted '{}' from {}", item.name, modified)
            } else {
                let response = api.delete_item(&item.id).await?;
                format!("delete response[{} @ {}] = '{}'", item.name, modified, response)
            };
            info!("{detail}");

            outcomes.push(ActionOutcome {
                file_id: item.id.clone(),
                name: item.name.clone(),
                modified,
                detail,
            });
        }

        if outcomes.is_empty() {
            warn!("no files matched '{}'", kind.label());
            return Ok(vec![ActionOutcome::nothing_found()]);
        }
        info!("{} '{}' files processed", outcomes.len(), kind.label());
        Ok(outcomes)
    }

    /// The cleanup composition: fetch everything in `parent_id` older than
    /// `before`, then purge the entries whose filename suffix matches
    /// `kind`. Suffix classification is deliberate here: old junk is
    /// exactly the data the service tends to mis-tag.
    pub async fn sweep(
        &self,
        before: NaiveDate,
        parent_id: &str,
        kind: FileKind,
        dry_run: bool,
    ) -> Result<Vec<ActionOutcome>, DriveError> {
        let items = self.find_old_files(before, parent_id).await?;
        self.purge_items(&items, kind, MatchMode::Extension, dry_run).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::testutil::{item, live_session, page, FakeDrive};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn txt_items(count: usize) -> Vec<DriveItem> {
        (0..count)
            .map(|i| item(&format!("id-{i}"), &format!("file-{i}.txt"), "text/plain"))
            .collect()
    }

    #[tokio::test]
    async fn test_dry_run_never_calls_delete() {
        let api = Arc::new(FakeDrive::default());
        let session = live_session(api.clone()).await;
        let items = vec![
            item("1", "a.txt", "text/plain"),
            item("2", "b.txt", "application/octet-stream"),
            item("3", "c.pdf", "application/pdf"),
        ];

        let outcomes = session
            .purge_items(&items, FileKind::PlainText, MatchMode::Extension, true)
            .await
            .unwrap();

        // two txt-suffixed items match, and each outcome is a "would have" line
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.detail.starts_with("would have")));
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_run_records_service_response() {
        let api = Arc::new(FakeDrive::default());
        let session = live_session(api.clone()).await;
        let items = txt_items(3);

        let outcomes = session
            .purge_items(&items, FileKind::PlainText, MatchMode::Extension, false)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 3);
        assert!(outcomes[0].detail.starts_with("delete response["));
        assert_eq!(outcomes[0].file_id, "id-0");
    }

    #[tokio::test]
    async fn test_zero_matches_yields_single_sentinel() {
        let api = Arc::new(FakeDrive::default());
        let session = live_session(api.clone()).await;
        let items = vec![item("1", "keep.pdf", "application/pdf")];

        let outcomes = session
            .purge_items(&items, FileKind::PlainText, MatchMode::Extension, false)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_nothing_found());
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_action_cap_bounds_the_run() {
        let api = Arc::new(FakeDrive::default());
        let session = live_session(api).await;
        let items = txt_items(MAX_DELETE_ACTIONS + 25);

        let outcomes = session
            .purge_items(&items, FileKind::PlainText, MatchMode::Extension, true)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), MAX_DELETE_ACTIONS);
    }

    #[tokio::test]
    async fn test_folders_are_never_deleted_as_files() {
        let api = Arc::new(FakeDrive::default());
        let session = live_session(api.clone()).await;
        let items = vec![item(
            "1",
            "backups.txt",
            crate::drive::FOLDER_MIME,
        )];

        let outcomes = session
            .purge_items(&items, FileKind::PlainText, MatchMode::Extension, false)
            .await
            .unwrap();
        assert!(outcomes[0].is_nothing_found());
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sweep_fetches_then_purges_by_suffix() {
        let api = Arc::new(FakeDrive::with_pages(vec![Ok(page(
            vec![
                item("1", "old.txt", "text/plain"),
                item("2", "old.pdf", "application/pdf"),
            ],
            None,
        ))]));
        let session = live_session(api.clone()).await;

        let before = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let outcomes = session
            .sweep(before, "parent-1", FileKind::PlainText, false)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].name, "old.txt");
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 1);

        let queries = api.queries.lock().unwrap();
        assert_eq!(
            queries[0],
            "modifiedTime < '2024-06-01T01:02:03' and 'parent-1' in parents"
        );
    }
}
