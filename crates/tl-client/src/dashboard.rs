//! View state for the two dashboard views.
//!
//! The range view (table plus per-tag totals) and the day timeline each load
//! independently. A view can be asked to reload while an earlier request is
//! still in flight, and responses may arrive in any order. Each view
//! therefore keeps a generation counter: starting a fetch takes a ticket,
//! and a completed fetch is only committed if no newer fetch was started
//! since. Superseded results, including failures, are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tl_core::{
    DayTimeline, EntryDraft, EntryId, LogEntry, TagTotals, aggregate_by_tag, build_day_segments,
    window_bounds,
};

use crate::client::ClientError;
use crate::store::EntryStore;

/// What a view currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState<T> {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The fetch succeeded but there is nothing to show.
    Empty,
    Ready(T),
    /// The fetch failed; the message is shown in place of the view.
    Failed(String),
}

impl<T> ViewState<T> {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Proof that a fetch was started; see [`FetchSlot::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Latest-wins holder for one view's state.
#[derive(Debug)]
pub struct FetchSlot<T> {
    latest: AtomicU64,
    state: Mutex<ViewState<T>>,
}

impl<T> Default for FetchSlot<T> {
    fn default() -> Self {
        Self {
            latest: AtomicU64::new(0),
            state: Mutex::new(ViewState::Idle),
        }
    }
}

impl<T> FetchSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fetch. Any fetch started earlier becomes stale.
    pub fn begin(&self) -> FetchTicket {
        // Held across the bump so no commit lands between it and `Loading`.
        let mut state = self.lock();
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        *state = ViewState::Loading;
        FetchTicket(generation)
    }

    /// Whether `ticket` belongs to the most recently started fetch.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Stores the outcome of the fetch identified by `ticket`.
    ///
    /// Returns `false`, leaving the state untouched, when a newer fetch was
    /// started after this one.
    pub fn commit(&self, ticket: FetchTicket, state: ViewState<T>) -> bool {
        let mut current = self.lock();
        if !self.is_current(ticket) {
            tracing::debug!(
                generation = ticket.0,
                latest = self.latest.load(Ordering::SeqCst),
                "discarding superseded fetch result"
            );
            return false;
        }
        *current = state;
        true
    }

    fn lock(&self) -> MutexGuard<'_, ViewState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> FetchSlot<T> {
    /// A copy of the current state.
    pub fn snapshot(&self) -> ViewState<T> {
        self.lock().clone()
    }
}

/// Entries of a date range with their per-tag totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeView {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub entries: Vec<LogEntry>,
    pub totals: TagTotals,
}

/// Coordinates fetching for the range view and the day timeline.
///
/// Mutations go through the store and are followed by a refetch of every
/// view that has been loaded before.
#[derive(Debug)]
pub struct Dashboard<S, Tz: TimeZone> {
    store: S,
    tz: Tz,
    range: FetchSlot<RangeView>,
    timeline: FetchSlot<DayTimeline>,
    last_range: Mutex<Option<(DateTime<Utc>, DateTime<Utc>)>>,
    last_day: Mutex<Option<NaiveDate>>,
}

impl<S: EntryStore, Tz: TimeZone> Dashboard<S, Tz> {
    /// Creates a dashboard whose days are local to `tz`.
    pub fn new(store: S, tz: Tz) -> Self {
        Self {
            store,
            tz,
            range: FetchSlot::new(),
            timeline: FetchSlot::new(),
            last_range: Mutex::new(None),
            last_day: Mutex::new(None),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn range(&self) -> ViewState<RangeView> {
        self.range.snapshot()
    }

    pub fn timeline(&self) -> ViewState<DayTimeline> {
        self.timeline.snapshot()
    }

    /// Loads entries in `[start, end]` and aggregates them by tag.
    ///
    /// Returns whether the result was committed.
    pub async fn load_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        *lock(&self.last_range) = Some((start, end));
        let ticket = self.range.begin();

        let state = match self.store.list_entries(start, end).await {
            Ok(entries) if entries.is_empty() => ViewState::Empty,
            Ok(entries) => match aggregate_by_tag(&entries) {
                Ok(totals) => ViewState::Ready(RangeView {
                    start,
                    end,
                    entries,
                    totals,
                }),
                Err(err) => ViewState::Failed(err.to_string()),
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to load range");
                ViewState::Failed(err.to_string())
            }
        };
        self.range.commit(ticket, state)
    }

    /// Loads the window around `day` and segments the day.
    ///
    /// A day that yields nothing beyond its start marker is committed as
    /// [`ViewState::Empty`]. Returns whether the result was committed.
    pub async fn load_timeline(&self, day: NaiveDate) -> bool {
        *lock(&self.last_day) = Some(day);
        let ticket = self.timeline.begin();
        let (start, end) = window_bounds(day, &self.tz);

        let state = match self.store.list_entries(start, end).await {
            Ok(entries) => {
                let timeline = build_day_segments(&entries, day, &self.tz);
                if timeline.has_enough_data() {
                    ViewState::Ready(timeline)
                } else {
                    ViewState::Empty
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, %day, "failed to load timeline");
                ViewState::Failed(err.to_string())
            }
        };
        self.timeline.commit(ticket, state)
    }

    /// Reloads every view that was loaded before, concurrently.
    pub async fn refresh(&self) {
        let range = *lock(&self.last_range);
        let day = *lock(&self.last_day);

        let reload_range = async {
            if let Some((start, end)) = range {
                self.load_range(start, end).await;
            }
        };
        let reload_timeline = async {
            if let Some(day) = day {
                self.load_timeline(day).await;
            }
        };
        tokio::join!(reload_range, reload_timeline);
    }

    pub async fn create(&self, draft: &EntryDraft) -> Result<EntryId, ClientError> {
        let id = self.store.create_entry(draft).await?;
        tracing::info!(%id, "created entry");
        self.refresh().await;
        Ok(id)
    }

    pub async fn update(&self, id: &EntryId, draft: &EntryDraft) -> Result<(), ClientError> {
        self.store.update_entry(id, draft).await?;
        tracing::info!(%id, "updated entry");
        self.refresh().await;
        Ok(())
    }

    pub async fn delete(&self, id: &EntryId) -> Result<(), ClientError> {
        self.store.delete_entry(id).await?;
        tracing::info!(%id, "deleted entry");
        self.refresh().await;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use chrono::FixedOffset;
    use tokio::sync::oneshot;

    type Reply = Result<Vec<LogEntry>, ClientError>;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    fn entry(timestamp: DateTime<Utc>, activity: &str, tag: &str) -> LogEntry {
        LogEntry::new(timestamp, activity, tag)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    /// Answers each listing with whatever is sent on the matching channel,
    /// so tests decide the order in which fetches complete.
    struct ScriptedStore {
        replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    }

    impl ScriptedStore {
        fn new(replies: Vec<oneshot::Receiver<Reply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    impl EntryStore for ScriptedStore {
        async fn list_entries(&self, _start: DateTime<Utc>, _end: DateTime<Utc>) -> Reply {
            let reply = self.replies.lock().unwrap().pop_front().expect("unexpected fetch");
            reply.await.expect("reply sender dropped")
        }

        async fn create_entry(&self, _draft: &EntryDraft) -> Result<EntryId, ClientError> {
            unreachable!("read-only store")
        }

        async fn update_entry(&self, _id: &EntryId, _draft: &EntryDraft) -> Result<(), ClientError> {
            unreachable!("read-only store")
        }

        async fn delete_entry(&self, _id: &EntryId) -> Result<(), ClientError> {
            unreachable!("read-only store")
        }
    }

    /// In-memory store recording every listing it serves.
    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<Vec<LogEntry>>,
        listings: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
        next_id: Mutex<u32>,
    }

    impl MemoryStore {
        fn with(entries: Vec<LogEntry>) -> Self {
            Self {
                entries: Mutex::new(entries),
                ..Self::default()
            }
        }
    }

    impl EntryStore for MemoryStore {
        async fn list_entries(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Reply {
            self.listings.lock().unwrap().push((start, end));
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.timestamp >= start && e.timestamp <= end)
                .cloned()
                .collect())
        }

        async fn create_entry(&self, draft: &EntryDraft) -> Result<EntryId, ClientError> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = EntryId::new(format!("id-{next}")).unwrap();
            self.entries.lock().unwrap().push(
                LogEntry::new(draft.timestamp(), draft.activity(), draft.tag()).with_id(id.clone()),
            );
            Ok(id)
        }

        async fn update_entry(&self, id: &EntryId, draft: &EntryDraft) -> Result<(), ClientError> {
            let mut entries = self.entries.lock().unwrap();
            let entry = entries
                .iter_mut()
                .find(|e| e.id.as_ref() == Some(id))
                .ok_or_else(|| ClientError::Api {
                    status: 404,
                    message: "Time log not found".to_string(),
                })?;
            *entry = LogEntry::new(draft.timestamp(), draft.activity(), draft.tag())
                .with_id(id.clone());
            Ok(())
        }

        async fn delete_entry(&self, id: &EntryId) -> Result<(), ClientError> {
            self.entries
                .lock()
                .unwrap()
                .retain(|e| e.id.as_ref() != Some(id));
            Ok(())
        }
    }

    #[test]
    fn slot_starts_idle_and_loads() {
        let slot: FetchSlot<u32> = FetchSlot::new();
        assert_eq!(slot.snapshot(), ViewState::Idle);

        let ticket = slot.begin();
        assert!(slot.snapshot().is_loading());
        assert!(slot.commit(ticket, ViewState::Ready(7)));
        assert_eq!(slot.snapshot().ready(), Some(&7));
    }

    #[test]
    fn slot_rejects_stale_ticket() {
        let slot: FetchSlot<&str> = FetchSlot::new();
        let first = slot.begin();
        let second = slot.begin();

        assert!(!slot.is_current(first));
        assert!(slot.commit(second, ViewState::Ready("new")));
        assert!(!slot.commit(first, ViewState::Ready("old")));
        assert_eq!(slot.snapshot(), ViewState::Ready("new"));
    }

    #[test]
    fn slot_stale_ticket_does_not_end_loading() {
        let slot: FetchSlot<&str> = FetchSlot::new();
        let first = slot.begin();
        let _second = slot.begin();

        assert!(!slot.commit(first, ViewState::Failed("boom".to_string())));
        assert!(slot.snapshot().is_loading());
    }

    #[test]
    fn slot_never_stays_loading_after_concurrent_fetches() {
        let slot: FetchSlot<usize> = FetchSlot::new();
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let slot = &slot;
                scope.spawn(move || {
                    for round in 0..500 {
                        let ticket = slot.begin();
                        slot.commit(ticket, ViewState::Ready(worker * 1000 + round));
                    }
                });
            }
        });
        assert!(slot.snapshot().ready().is_some());
    }

    #[tokio::test]
    async fn older_range_response_arriving_last_is_discarded() {
        let (older_tx, older_rx) = oneshot::channel();
        let (newer_tx, newer_rx) = oneshot::channel();
        let dashboard = Dashboard::new(ScriptedStore::new(vec![older_rx, newer_rx]), Utc);

        let older = vec![entry(at(1, 9, 0), "old", "a"), entry(at(1, 10, 0), "old", "a")];
        let newer = vec![entry(at(2, 9, 0), "new", "b"), entry(at(2, 9, 30), "new", "b")];

        let respond = async {
            tokio::task::yield_now().await;
            newer_tx.send(Ok(newer)).unwrap();
            tokio::task::yield_now().await;
            older_tx.send(Ok(older)).unwrap();
        };

        let (first, second, ()) = tokio::join!(
            dashboard.load_range(at(1, 0, 0), at(2, 0, 0)),
            dashboard.load_range(at(2, 0, 0), at(3, 0, 0)),
            respond,
        );

        assert!(!first);
        assert!(second);
        let view = dashboard.range();
        let view = view.ready().expect("range loaded");
        assert_eq!(view.totals.get("b"), Some(1800));
        assert_eq!(view.totals.get("a"), None);
        assert_eq!(view.start, at(2, 0, 0));
    }

    #[tokio::test]
    async fn superseded_failure_is_discarded() {
        let (older_tx, older_rx) = oneshot::channel();
        let (newer_tx, newer_rx) = oneshot::channel();
        let dashboard = Dashboard::new(ScriptedStore::new(vec![older_rx, newer_rx]), Utc);

        let respond = async {
            tokio::task::yield_now().await;
            newer_tx
                .send(Ok(vec![entry(at(2, 9, 0), "x", "b"), entry(at(2, 10, 0), "y", "b")]))
                .unwrap();
            tokio::task::yield_now().await;
            older_tx
                .send(Err(ClientError::Api {
                    status: 500,
                    message: "down".to_string(),
                }))
                .unwrap();
        };

        tokio::join!(
            dashboard.load_range(at(1, 0, 0), at(2, 0, 0)),
            dashboard.load_range(at(2, 0, 0), at(3, 0, 0)),
            respond,
        );

        assert_eq!(
            dashboard.range().ready().and_then(|v| v.totals.get("b")),
            Some(3600)
        );
    }

    #[tokio::test]
    async fn range_and_timeline_load_independently() {
        let (range_tx, range_rx) = oneshot::channel();
        let (timeline_tx, timeline_rx) = oneshot::channel();
        let dashboard = Dashboard::new(ScriptedStore::new(vec![range_rx, timeline_rx]), Utc);

        let entries = vec![entry(at(5, 8, 0), "email", "work"), entry(at(5, 12, 0), "lunch", "food")];
        let timeline_entries = entries.clone();

        let respond = async {
            tokio::task::yield_now().await;
            timeline_tx.send(Ok(timeline_entries)).unwrap();
            tokio::task::yield_now().await;
            range_tx.send(Ok(entries)).unwrap();
        };

        let (range_committed, timeline_committed, ()) = tokio::join!(
            dashboard.load_range(at(1, 0, 0), at(8, 0, 0)),
            dashboard.load_timeline(day(5)),
            respond,
        );

        assert!(range_committed);
        assert!(timeline_committed);
        assert!(dashboard.range().ready().is_some());
        let timeline = dashboard.timeline();
        let timeline = timeline.ready().expect("timeline loaded");
        assert_eq!(timeline.day, day(5));
    }

    #[tokio::test]
    async fn empty_listing_is_empty_state() {
        let dashboard = Dashboard::new(MemoryStore::default(), Utc);
        assert!(dashboard.load_range(at(1, 0, 0), at(8, 0, 0)).await);
        assert_eq!(dashboard.range(), ViewState::Empty);
    }

    #[tokio::test]
    async fn store_error_is_failed_state() {
        let (tx, rx) = oneshot::channel();
        let dashboard = Dashboard::new(ScriptedStore::new(vec![rx]), Utc);
        tx.send(Err(ClientError::Api {
            status: 401,
            message: "Invalid token".to_string(),
        }))
        .unwrap();

        assert!(dashboard.load_timeline(day(5)).await);
        assert_eq!(
            dashboard.timeline(),
            ViewState::Failed("store error (401): Invalid token".to_string())
        );
    }

    #[tokio::test]
    async fn day_without_activity_is_empty_timeline() {
        let store = MemoryStore::with(vec![entry(at(9, 9, 0), "elsewhere", "work")]);
        let dashboard = Dashboard::new(store, Utc);
        dashboard.load_timeline(day(5)).await;
        assert_eq!(dashboard.timeline(), ViewState::Empty);
    }

    #[tokio::test]
    async fn timeline_fetches_three_day_window_in_local_time() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let dashboard = Dashboard::new(MemoryStore::default(), tz);
        dashboard.load_timeline(day(5)).await;

        let listings = dashboard.store().listings.lock().unwrap().clone();
        assert_eq!(listings, vec![(at(3, 22, 0), at(6, 22, 0))]);
    }

    #[tokio::test]
    async fn mutations_refetch_loaded_views() {
        let store = MemoryStore::with(vec![entry(at(5, 8, 0), "email", "work")]);
        let dashboard = Dashboard::new(store, Utc);
        let segment_count = |d: &Dashboard<MemoryStore, Utc>| {
            d.timeline().ready().map_or(0, |timeline| timeline.segments.len())
        };

        dashboard.load_range(at(1, 0, 0), at(8, 0, 0)).await;
        dashboard.load_timeline(day(5)).await;
        assert!(dashboard.range().ready().unwrap().totals.is_empty());
        assert_eq!(segment_count(&dashboard), 2);

        let draft = EntryDraft::new(at(5, 9, 30), "review", "work").unwrap();
        let id = dashboard.create(&draft).await.unwrap();

        assert_eq!(dashboard.store().listings.lock().unwrap().len(), 4);
        assert_eq!(
            dashboard.range().ready().unwrap().totals.get("work"),
            Some(5400)
        );
        assert_eq!(segment_count(&dashboard), 3);

        dashboard.delete(&id).await.unwrap();
        assert!(dashboard.range().ready().unwrap().totals.is_empty());
        assert_eq!(segment_count(&dashboard), 2);
    }

    #[tokio::test]
    async fn failed_update_skips_refetch() {
        let dashboard = Dashboard::new(MemoryStore::default(), Utc);
        dashboard.load_range(at(1, 0, 0), at(8, 0, 0)).await;

        let id = EntryId::new("missing").unwrap();
        let draft = EntryDraft::new(at(5, 9, 0), "x", "").unwrap();
        let err = dashboard.update(&id, &draft).await.unwrap_err();

        assert!(matches!(err, ClientError::Api { status: 404, .. }));
        assert_eq!(dashboard.store().listings.lock().unwrap().len(), 1);
    }
}
