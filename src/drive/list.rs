//! Pagination engine and listing operations
//!
//! `find_items` drives the listing endpoint to completion: start from an
//! absent cursor, append each page in service order, stop when the cursor
//! runs out or the accumulator reaches the caller's cap. A failed page
//! aborts the whole retrieval, since a half-complete item set is unsafe to hand
//! to a subsequent delete.

use chrono::NaiveDate;
use tracing::info;

use super::kinds::{FileKind, MatchMode};
use super::query::ItemFilter;
use super::session::DriveSession;
use super::types::{DriveError, DriveItem};

/// Limit applied when a caller asks for more than the ceiling allows.
pub const DEFAULT_NUM_FILES: usize = 100;
/// Safety ceiling on any single retrieval, bounding memory and request
/// volume no matter what the caller requests.
pub const MAX_NUM_ITEMS: usize = 5000;

const PAGE_SIZE: u32 = 100;

/// Far-future age bound used when a lookup needs a server-side predicate but
/// the real filtering happens client-side on the filename suffix.
const EXTENSION_SWEEP_HORIZON: &str = "2027-11-13T01:02:03";

/// Clamp a requested item count to the engine's bounds: absent or zero means
/// the ceiling, anything above the ceiling is silently reduced to the
/// default rather than rejected.
pub(crate) fn clamp_limit(requested: Option<usize>) -> usize {
    match requested {
        None | Some(0) => MAX_NUM_ITEMS,
        Some(n) if n > MAX_NUM_ITEMS => DEFAULT_NUM_FILES,
        Some(n) => n,
    }
}

impl DriveSession {
    /// Retrieve every item matching `filter`, up to `limit` (clamped).
    ///
    /// Accumulation order is the order the service returns pages and items
    /// within a page; no client-side re-sorting.
    pub async fn find_items(
        &self,
        filter: &ItemFilter,
        limit: Option<usize>,
    ) -> Result<Vec<DriveItem>, DriveError> {
        let api = self.api()?;
        let query = filter.compose()?;
        let limit = clamp_limit(limit);
        info!("query = '{query}'; limit = {limit}");

        let mut found: Vec<DriveItem> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = api.list_page(&query, PAGE_SIZE, page_token.as_deref()).await?;
            found.extend(page.items);
            page_token = page.next_page_token;
            if page_token.is_none() || found.len() >= limit {
                break;
            }
        }

        info!("found {} items", found.len());
        Ok(found)
    }

    /// All folders on the drive, up to `limit`.
    pub async fn find_all_folders(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<DriveItem>, DriveError> {
        let folders = self
            .find_items(&ItemFilter::new().with_kind(FileKind::Folder), limit)
            .await?;
        info!("found {} folders", folders.len());
        Ok(folders)
    }

    /// Files of one logical kind, classified per `mode`.
    ///
    /// Mime mode asks the server to filter by content type and trusts every
    /// returned item. Extension mode cannot, because the server often mis-tags
    /// non-native types, so it queries a far-future age bound instead and
    /// re-derives each item's kind from its name, keeping matches until the
    /// clamped limit is reached.
    pub async fn find_files_of_kind(
        &self,
        kind: FileKind,
        limit: Option<usize>,
        mode: MatchMode,
    ) -> Result<Vec<DriveItem>, DriveError> {
        match mode {
            MatchMode::Mime => {
                self.find_items(&ItemFilter::new().with_kind(kind), limit).await
            }
            MatchMode::Extension => {
                let cap = clamp_limit(limit);
                let fetched = self
                    .find_items(
                        &ItemFilter::new().modified_before_timestamp(EXTENSION_SWEEP_HORIZON),
                        None,
                    )
                    .await?;
                let mut found = Vec::new();
                for item in fetched {
                    if kind.matches(&item, MatchMode::Extension) {
                        found.push(item);
                        if found.len() >= cap {
                            break;
                        }
                    }
                }
                info!("{} '{}' files matched by extension", found.len(), kind.label());
                Ok(found)
            }
        }
    }

    /// Items in `parent_id` last modified before `before`.
    pub async fn find_old_files(
        &self,
        before: NaiveDate,
        parent_id: &str,
    ) -> Result<Vec<DriveItem>, DriveError> {
        let filter = ItemFilter::new().modified_before(before).in_parent(parent_id);
        let items = self.find_items(&filter, None).await?;
        info!("found {} files older than {before} in folder '{parent_id}'", items.len());
        Ok(items)
    }

    /// Full metadata object for one item.
    pub async fn get_metadata(&self, file_id: &str) -> Result<serde_json::Value, DriveError> {
        let api = self.api()?;
        api.get_metadata(file_id).await
    }
}
