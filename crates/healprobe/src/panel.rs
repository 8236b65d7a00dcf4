//! Status panel: the single consumer of the upload store.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use crate::scenario::ScenarioRegistry;
use crate::size::format_size;
use crate::store::{ScenarioId, StatusMap, Subscription, UploadStore};

/// Text shown before anything is uploaded
pub const EMPTY_PANEL: &str = "No uploads yet";

/// Render the most recent upload
#[must_use]
pub fn render(records: &StatusMap, most_recent: Option<ScenarioId>, registry: &ScenarioRegistry) -> String {
    let Some((id, record)) = most_recent.and_then(|id| records.get(&id).map(|r| (id, r))) else {
        return EMPTY_PANEL.to_string();
    };
    if !record.uploaded {
        return EMPTY_PANEL.to_string();
    }

    let mut out = format!("Last upload: {} (scenario {id})\n", registry.title(id));
    if let Some(at) = record.timestamp.and_then(format_timestamp) {
        let _ = writeln!(out, "Uploaded at: {at}");
    }
    for file in &record.files {
        let _ = writeln!(out, "  {} ({})", file.name, format_size(file.size));
        if let Some(locator) = &file.locator {
            let _ = writeln!(out, "    {locator}");
        }
    }
    out.trim_end().to_string()
}

fn format_timestamp(ms: u64) -> Option<String> {
    let ms = i64::try_from(ms).ok()?;
    DateTime::<Utc>::from_timestamp_millis(ms).map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Subscribed panel that keeps its latest rendering
#[derive(Debug, Clone)]
pub struct StatusPanel {
    text: Arc<Mutex<String>>,
    subscription: Subscription,
}

impl StatusPanel {
    /// Subscribe to `store`, rendering titles from `registry`
    #[must_use]
    pub fn attach(store: &mut UploadStore, registry: ScenarioRegistry) -> Self {
        let snapshot = store.all();
        let text = Arc::new(Mutex::new(render(snapshot.records(), snapshot.most_recent(), &registry)));
        let sink = Arc::clone(&text);
        let subscription = store.subscribe(move |records, most_recent| {
            if let Ok(mut slot) = sink.lock() {
                *slot = render(records, most_recent, &registry);
            }
        });
        Self { text, subscription }
    }

    /// Latest rendering
    #[must_use]
    pub fn text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }

    /// Stop following the store
    pub fn detach(self, store: &mut UploadStore) -> bool {
        store.unsubscribe(self.subscription)
    }
}
