//! In-process row store.
//!
//! Holds the most recently imported batch of rows and an optional selection.
//! One instance is constructed at server start and handed to the handlers
//! through the shared application state; nothing is persisted, a restart
//! clears everything.
//!
//! Handlers run on a multithreaded runtime, so every operation takes the
//! internal mutex for its full read-modify-write sequence. Import and select
//! would otherwise race on the "selection references an existing row"
//! invariant.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::types::{Row, StoreInfo};

struct StoreState {
    rows: Vec<Row>,
    /// Selected row, referenced by id rather than owned
    selected: Option<String>,
    filename: Option<String>,
    last_updated: DateTime<Utc>,
}

pub struct RowStore {
    state: Mutex<StoreState>,
}

impl Default for RowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RowStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                rows: Vec::new(),
                selected: None,
                filename: None,
                last_updated: Utc::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("row store mutex poisoned")
    }

    /// Replace all rows wholesale and stamp the update time.
    ///
    /// Always clears the selection, even when the new batch happens to reuse
    /// the previously selected id.
    pub fn import(&self, rows: Vec<Row>, filename: &str) {
        let mut state = self.lock();
        info!(rows = rows.len(), filename, "importing batch");
        state.rows = rows;
        state.selected = None;
        state.filename = Some(filename.to_string());
        state.last_updated = Utc::now();
    }

    /// All rows of the current batch, insertion order preserved.
    pub fn list(&self) -> Vec<Row> {
        self.lock().rows.clone()
    }

    /// Mark the row with the given id as selected and return it.
    ///
    /// An unknown id returns `None` and leaves any existing selection intact.
    pub fn select(&self, id: &str) -> Option<Row> {
        let mut state = self.lock();
        let found = state.rows.iter().find(|row| row.id() == id).cloned();
        if let Some(row) = &found {
            state.selected = Some(row.id().to_string());
            debug!(id, "element selected");
        }
        found
    }

    /// The currently selected row, if any.
    pub fn selected(&self) -> Option<Row> {
        let state = self.lock();
        let id = state.selected.as_deref()?;
        state.rows.iter().find(|row| row.id() == id).cloned()
    }

    pub fn info(&self) -> StoreInfo {
        let state = self.lock();
        StoreInfo {
            count: state.rows.len(),
            has_selection: state.selected.is_some(),
            last_updated: state.last_updated,
            filename: state.filename.clone(),
            columns: state
                .rows
                .first()
                .map(|row| row.columns().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    /// Clear rows, selection and filename; stamp the update time.
    pub fn reset(&self) {
        let mut state = self.lock();
        info!("resetting row store");
        state.rows.clear();
        state.selected = None;
        state.filename = None;
        state.last_updated = Utc::now();
    }
}
