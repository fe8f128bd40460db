//! Dataset loading with an in-flight flag and last-request-wins
//!
//! The loader holds the dataset currently on screen. Starting a fetch hands
//! out a [`RequestTicket`] stamped with a generation; only the newest ticket
//! may replace the dataset. Older responses are dropped, and a failed fetch
//! keeps whatever was loaded before.
//!
//! Meant for interactive embedders that keep one screen's dataset across
//! refetches. The CLI and server fetch once per request and do not use it.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::ProcessedMarginDataset;
use crate::source::{DatasetQuery, DatasetSource};

/// Handle for one outstanding fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    query: DatasetQuery,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &DatasetQuery {
        &self.query
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the current dataset
    Applied,
    /// A newer request was started; the response was dropped
    Stale,
    /// The fetch failed; the previous dataset stays in place
    Failed(String),
}

/// Snapshot of loader state for status displays
#[derive(Debug, Clone, Serialize)]
pub struct LoadState {
    pub in_flight: bool,
    pub loaded: Option<DatasetQuery>,
    pub pending: Option<DatasetQuery>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct DatasetLoader {
    generation: u64,
    in_flight: bool,
    pending: Option<DatasetQuery>,
    current: Option<Arc<ProcessedMarginDataset>>,
    current_query: Option<DatasetQuery>,
    last_error: Option<String>,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch; supersedes any outstanding ticket
    pub fn begin(&mut self, query: DatasetQuery) -> RequestTicket {
        self.generation += 1;
        self.in_flight = true;
        self.pending = Some(query.clone());
        debug!(generation = self.generation, period = %query.period, "Dataset fetch started");
        RequestTicket {
            generation: self.generation,
            query,
        }
    }

    /// Finish a fetch started with [`DatasetLoader::begin`]
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<ProcessedMarginDataset>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            warn!(
                generation = ticket.generation,
                latest = self.generation,
                period = %ticket.query.period,
                "Discarding stale dataset response"
            );
            return LoadOutcome::Stale;
        }

        self.in_flight = false;
        self.pending = None;

        match result {
            Ok(dataset) => {
                debug!(period = %ticket.query.period, "Dataset applied");
                self.current = Some(Arc::new(dataset));
                self.current_query = Some(ticket.query);
                self.last_error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!(period = %ticket.query.period, error = %e, "Dataset fetch failed");
                let message = e.to_string();
                self.last_error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Dataset on screen, if any
    pub fn current(&self) -> Option<Arc<ProcessedMarginDataset>> {
        self.current.clone()
    }

    pub fn current_query(&self) -> Option<&DatasetQuery> {
        self.current_query.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn state(&self) -> LoadState {
        LoadState {
            in_flight: self.in_flight,
            loaded: self.current_query.clone(),
            pending: self.pending.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Begin, fetch and complete without holding the lock across the await
pub async fn fetch_into(
    loader: &Mutex<DatasetLoader>,
    source: &dyn DatasetSource,
    query: DatasetQuery,
) -> Result<LoadOutcome> {
    let ticket = lock(loader)?.begin(query);
    let result = source.fetch(ticket.query()).await;
    let outcome = lock(loader)?.complete(ticket, result);
    Ok(outcome)
}

fn lock(loader: &Mutex<DatasetLoader>) -> Result<std::sync::MutexGuard<'_, DatasetLoader>> {
    loader
        .lock()
        .map_err(|_| Error::Service("dataset loader lock poisoned".to_string()))
}
