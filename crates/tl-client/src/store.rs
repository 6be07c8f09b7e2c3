//! The seam between views and wherever entries are persisted.

use std::future::Future;

use chrono::{DateTime, Utc};
use tl_core::{EntryDraft, EntryId, LogEntry};

use crate::client::ClientError;

/// Persistent collection of log entries, owned by the remote store.
///
/// Entries are never edited in place locally: callers mutate through the
/// store and fetch again.
pub trait EntryStore {
    /// Entries with `start <= timestamp <= end`, in no particular order.
    fn list_entries(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<LogEntry>, ClientError>>;

    /// Stores a new entry and returns its identifier.
    fn create_entry(
        &self,
        draft: &EntryDraft,
    ) -> impl Future<Output = Result<EntryId, ClientError>>;

    /// Replaces timestamp, activity and tag of an existing entry.
    fn update_entry(
        &self,
        id: &EntryId,
        draft: &EntryDraft,
    ) -> impl Future<Output = Result<(), ClientError>>;

    fn delete_entry(&self, id: &EntryId) -> impl Future<Output = Result<(), ClientError>>;
}
