//! Upload status store.
//!
//! One record per scenario, replaced wholesale on every update, plus a
//! pointer to the scenario that most recently transitioned into the
//! uploaded state. Subscribers are notified synchronously, in subscription
//! order, with an immutable snapshot.
//!
//! Listeners only ever see `&StatusMap` while the store itself is mutably
//! borrowed, so a listener cannot call back into [`UploadStore::update_status`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::clock::Clock;
use crate::files::UploadedFile;

/// Scenario identifier, a small positive integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub u32);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ScenarioId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Record state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    /// No files, no timestamp
    NotUploaded,
    /// Files recorded at a timestamp
    Uploaded,
}

/// Upload state of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Whether files are recorded
    pub uploaded: bool,
    /// Files in selection order
    pub files: Vec<UploadedFile>,
    /// Milliseconds since the Unix epoch of the last non-empty update
    pub timestamp: Option<u64>,
}

impl UploadRecord {
    /// The not-uploaded record
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> RecordState {
        if self.uploaded {
            RecordState::Uploaded
        } else {
            RecordState::NotUploaded
        }
    }
}

/// Scenario id to record
pub type StatusMap = BTreeMap<ScenarioId, Arc<UploadRecord>>;

/// Immutable view of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    records: Arc<StatusMap>,
    most_recent: Option<ScenarioId>,
}

impl StoreSnapshot {
    /// All records
    #[must_use]
    pub fn records(&self) -> &StatusMap {
        &self.records
    }

    /// Record of one scenario
    #[must_use]
    pub fn get(&self, key: ScenarioId) -> Option<&UploadRecord> {
        self.records.get(&key).map(AsRef::as_ref)
    }

    /// Scenario that most recently transitioned into the uploaded state
    #[must_use]
    pub const fn most_recent(&self) -> Option<ScenarioId> {
        self.most_recent
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Handle returned by [`UploadStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&StatusMap, Option<ScenarioId>) + Send>;

/// In-memory keyed upload store
pub struct UploadStore {
    records: Arc<StatusMap>,
    most_recent: Option<(ScenarioId, u64)>,
    listeners: Vec<(Subscription, Listener)>,
    next_subscription: u64,
    clock: Clock,
}

impl fmt::Debug for UploadStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadStore")
            .field("records", &self.records.len())
            .field("most_recent", &self.most_recent)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl UploadStore {
    /// Create a store with an empty record for every id
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = u32>, clock: Clock) -> Self {
        let records = ids
            .into_iter()
            .map(|id| (ScenarioId(id), Arc::new(UploadRecord::empty())))
            .collect();
        Self {
            records: Arc::new(records),
            most_recent: None,
            listeners: Vec::new(),
            next_subscription: 0,
            clock,
        }
    }

    /// Replace the record for `key`. Non-empty `files` mark it uploaded at
    /// the current time; empty `files` reset it. Every call notifies all
    /// subscribers.
    pub fn update_status(&mut self, key: ScenarioId, files: Vec<UploadedFile>) {
        let record = if files.is_empty() {
            UploadRecord::empty()
        } else {
            let now = self.clock.now_ms();
            if self.most_recent.map_or(true, |(_, at)| now > at) {
                self.most_recent = Some((key, now));
            }
            UploadRecord {
                uploaded: true,
                files,
                timestamp: Some(now),
            }
        };

        info!(
            scenario = %key,
            state = ?record.state(),
            files = record.files.len(),
            most_recent = ?self.most_recent(),
            "upload status updated"
        );
        Arc::make_mut(&mut self.records).insert(key, Arc::new(record));
        self.notify();
    }

    /// Reset one scenario to not-uploaded
    pub fn reset(&mut self, key: ScenarioId) {
        self.update_status(key, Vec::new());
    }

    /// Record of one scenario
    #[must_use]
    pub fn status(&self, key: ScenarioId) -> Option<&UploadRecord> {
        self.records.get(&key).map(AsRef::as_ref)
    }

    /// Snapshot of every record and the most-recent pointer
    #[must_use]
    pub fn all(&self) -> StoreSnapshot {
        StoreSnapshot {
            records: Arc::clone(&self.records),
            most_recent: self.most_recent(),
        }
    }

    /// Scenario that most recently transitioned into the uploaded state
    #[must_use]
    pub fn most_recent(&self) -> Option<ScenarioId> {
        self.most_recent.map(|(key, _)| key)
    }

    /// Register a listener, called after every update
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&StatusMap, Option<ScenarioId>) + Send + 'static,
    {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((subscription, Box::new(listener)));
        subscription
    }

    /// Remove a listener; `false` if it was not registered
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != subscription);
        self.listeners.len() != before
    }

    /// Number of registered listeners
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self) {
        let most_recent = self.most_recent();
        for (_, listener) in &mut self.listeners {
            listener(&self.records, most_recent);
        }
    }
}
