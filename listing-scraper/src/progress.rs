use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Completion state of one crawl, as seen by whoever polls for it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    /// zero based index of the last completed page
    pub current: u32,
    /// requested page count, zero or negative for backwards ranges
    pub total: i64,
    #[serde(rename = "end")]
    pub done: bool,
}

/// Receives progress updates keyed by crawl id.
pub trait ProgressSink: Send + Sync {
    fn update(&self, crawl_id: &str, state: ProgressState);
}

/// Tracks the progress of a single crawl and publishes every change as a whole.
pub struct ProgressReporter {
    crawl_id: String,
    sink: Arc<dyn ProgressSink>,
    state: ProgressState,
}

impl ProgressReporter {
    pub fn new(crawl_id: impl Into<String>, total: i64, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            crawl_id: crawl_id.into(),
            sink,
            state: ProgressState {
                current: 0,
                total,
                done: false,
            },
        }
    }

    pub fn page_completed(&mut self, index: u32) {
        self.publish(ProgressState {
            current: index,
            done: false,
            ..self.state
        });
    }

    /// Mark the crawl done, keeping the index of the last completed page.
    pub fn finish(&mut self) -> ProgressState {
        self.publish(ProgressState {
            done: true,
            ..self.state
        });
        self.state
    }

    fn publish(&mut self, state: ProgressState) {
        self.state = state;
        log::debug!("crawl {} progress: {:?}", self.crawl_id, state);
        self.sink.update(&self.crawl_id, state);
    }
}

/// In-memory progress slots, one per crawl id.
#[derive(Default)]
pub struct ProgressStore {
    states: RwLock<HashMap<String, ProgressState>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the latest state published for `crawl_id`.
    pub fn snapshot(&self, crawl_id: &str) -> Option<ProgressState> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(crawl_id)
            .copied()
    }

    pub fn remove(&self, crawl_id: &str) -> Option<ProgressState> {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(crawl_id)
    }
}

impl ProgressSink for ProgressStore {
    fn update(&self, crawl_id: &str, state: ProgressState) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(crawl_id.to_owned(), state);
    }
}
