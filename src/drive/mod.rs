//! Drive Session & Query Engine
//!
//! Everything that touches the remote drive goes through one exclusive
//! session:
//!
//! ```text
//! SessionLock ──▶ DriveSession ──▶ DriveApi (Drive API v3)
//!                    │
//!      ┌─────────────┼──────────────┬─────────────┐
//!      ▼             ▼              ▼             ▼
//!  ItemFilter    pagination     bulk purge    transfers
//!  (query.rs)    (list.rs)     (cleanup.rs)  (transfer.rs)
//! ```
//!
//! A caller begins a session, composes a filter, resolves it to a concrete
//! item set, acts on that set (or on local files), and ends the session.

pub mod api;
pub mod cleanup;
pub mod kinds;
pub mod list;
pub mod query;
pub mod retry;
pub mod session;
pub mod transfer;
pub mod types;

pub use api::{DriveApi, DriveHub, DRIVE_API_BASE, UPLOAD_API_BASE};
pub use cleanup::MAX_DELETE_ACTIONS;
pub use kinds::{FileKind, MatchMode, FOLDER_MIME};
pub use list::{DEFAULT_NUM_FILES, MAX_NUM_ITEMS};
pub use query::ItemFilter;
pub use retry::RetryPolicy;
pub use session::{Connect, DriveSession, HttpConnect, SessionLock};
pub use types::{ActionOutcome, DriveError, DriveItem, ItemPage};

#[cfg(test)]
pub(crate) mod testutil {
    //! Scripted in-memory drive backing the engine tests.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::api::DriveApi;
    use super::session::{Connect, DriveSession};
    use super::types::{DriveError, DriveItem, ItemPage};

    #[derive(Debug)]
    pub(crate) struct CreatedEntry {
        pub name: String,
        pub parent: String,
        pub mime: String,
        pub folder: bool,
    }

    /// Fake `DriveApi`: serves scripted pages in order (an `Err` script
    /// entry fails that call with a 500) and records every mutation.
    #[derive(Default)]
    pub(crate) struct FakeDrive {
        pages: Mutex<VecDeque<Result<ItemPage, String>>>,
        pub list_calls: AtomicUsize,
        pub delete_calls: AtomicUsize,
        pub queries: Mutex<Vec<String>>,
        pub created: Mutex<Vec<CreatedEntry>>,
        next_id: AtomicUsize,
    }

    impl FakeDrive {
        pub fn with_pages(pages: Vec<Result<ItemPage, String>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                ..Self::default()
            }
        }

        /// Queue another scripted page after construction.
        pub fn push_page(&self, page: Result<ItemPage, String>) {
            self.pages.lock().unwrap().push_back(page);
        }

        fn next_id(&self, prefix: &str) -> String {
            format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    #[async_trait]
    impl DriveApi for FakeDrive {
        async fn list_page(
            &self,
            query: &str,
            _page_size: u32,
            _page_token: Option<&str>,
        ) -> Result<ItemPage, DriveError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            match self.pages.lock().unwrap().pop_front() {
                Some(Ok(page)) => Ok(page),
                Some(Err(message)) => Err(DriveError::Api { status: 500, message }),
                None => Ok(ItemPage::default()),
            }
        }

        async fn create_file(
            &self,
            name: &str,
            parent_id: &str,
            mime_type: &str,
            _content: Vec<u8>,
        ) -> Result<String, DriveError> {
            self.created.lock().unwrap().push(CreatedEntry {
                name: name.to_string(),
                parent: parent_id.to_string(),
                mime: mime_type.to_string(),
                folder: false,
            });
            Ok(self.next_id("file"))
        }

        async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, DriveError> {
            self.created.lock().unwrap().push(CreatedEntry {
                name: name.to_string(),
                parent: parent_id.to_string(),
                mime: super::kinds::FOLDER_MIME.to_string(),
                folder: true,
            });
            Ok(self.next_id("folder"))
        }

        async fn delete_item(&self, _file_id: &str) -> Result<String, DriveError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }

        async fn get_metadata(&self, file_id: &str) -> Result<serde_json::Value, DriveError> {
            Ok(serde_json::json!({ "id": file_id, "name": "fake" }))
        }
    }

    pub(crate) struct FakeConnect {
        api: Arc<FakeDrive>,
    }

    impl FakeConnect {
        pub fn new(api: Arc<FakeDrive>) -> Self {
            Self { api }
        }
    }

    #[async_trait]
    impl Connect for FakeConnect {
        async fn connect(&self) -> Result<Arc<dyn DriveApi>, DriveError> {
            Ok(self.api.clone() as Arc<dyn DriveApi>)
        }
    }

    /// Connector whose credential acquisition always fails.
    pub(crate) struct FailConnect;

    #[async_trait]
    impl Connect for FailConnect {
        async fn connect(&self) -> Result<Arc<dyn DriveApi>, DriveError> {
            Err(DriveError::Credentials("no stored token".to_string()))
        }
    }

    pub(crate) fn item(id: &str, name: &str, mime: &str) -> DriveItem {
        DriveItem {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime.to_string(),
            modified_time: Some("2024-01-01T00:00:00".to_string()),
            size: Some("10".to_string()),
            parents: vec!["root".to_string()],
        }
    }

    pub(crate) fn page(items: Vec<DriveItem>, next: Option<&str>) -> ItemPage {
        ItemPage {
            items,
            next_page_token: next.map(str::to_string),
        }
    }

    /// A session already begun against the given fake drive.
    pub(crate) async fn live_session(api: Arc<FakeDrive>) -> DriveSession {
        let mut session = DriveSession::new(Arc::new(FakeConnect::new(api)));
        session.begin().await.expect("begin against fake drive");
        session
    }

    /// A session that was never begun.
    pub(crate) fn dead_session() -> DriveSession {
        DriveSession::new(Arc::new(FakeConnect::new(Arc::new(FakeDrive::default()))))
    }
}
