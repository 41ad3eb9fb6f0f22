//! DriveSweep — enumerate, upload and clean up files on Google Drive.
//!
//! The crate is built around one exclusive [`drive::DriveSession`]: begin a
//! session, compose an [`drive::ItemFilter`], resolve it to items through
//! the pagination engine, then act (bulk delete with a dry-run/live
//! duality, or upload a file or folder) and end the session. Credentials
//! come in through the [`auth::CredentialSource`] seam; results can be
//! persisted through [`report`].

pub mod auth;
pub mod drive;
pub mod report;

pub use auth::{AccessToken, CredentialSource, StaticToken, TokenFile};
pub use drive::{
    ActionOutcome, DriveApi, DriveError, DriveItem, DriveSession, FileKind, HttpConnect,
    ItemFilter, ItemPage, MatchMode, RetryPolicy, SessionLock,
};
