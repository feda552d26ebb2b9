//! Search session state and the controller that keeps it in sync with the catalog.
//!
//! Fetches run as tokio tasks and report back over an unbounded channel. The UI
//! loop drains that channel with [`SearchController::check_pending`] and every
//! outcome is applied in arrival order, so whichever response lands last owns
//! `results`. With `discard_stale` enabled, outcomes older than the most
//! recently issued request are dropped instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CatalogService, Track};

/// View state shared by the search screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSession {
  pub query: String,
  pub results: Vec<Track>,
  pub is_loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
  Popular,
  Search,
}

/// A completed fetch, tagged with the sequence number it was issued under.
#[derive(Debug)]
pub struct FetchOutcome {
  pub kind: FetchKind,
  pub seq: u64,
  pub result: Result<Vec<Track>, CatalogError>,
}

/// Cancels the popular-tracks timer. Stopping is idempotent and dropping the handle stops it too.
#[derive(Debug)]
pub struct PollHandle {
  task: Option<JoinHandle<()>>,
}

impl PollHandle {
  pub fn stop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
      info!("poll: stopped");
    }
  }

  pub fn is_active(&self) -> bool {
    self.task.as_ref().is_some_and(|t| !t.is_finished())
  }
}

impl Drop for PollHandle {
  fn drop(&mut self) {
    self.stop();
  }
}

/// Issues sequence numbers and forwards outcomes. Cloned into every fetch task.
struct Dispatcher<C> {
  catalog: Arc<C>,
  seq: Arc<AtomicU64>,
  tx: mpsc::UnboundedSender<FetchOutcome>,
}

impl<C> Clone for Dispatcher<C> {
  fn clone(&self) -> Self {
    Self { catalog: Arc::clone(&self.catalog), seq: Arc::clone(&self.seq), tx: self.tx.clone() }
  }
}

impl<C: CatalogService> Dispatcher<C> {
  fn next_seq(&self) -> u64 {
    self.seq.fetch_add(1, Ordering::SeqCst) + 1
  }

  async fn popular(&self, seq: u64) {
    let result = self.catalog.chart().await;
    // Receiver gone means the controller was dropped; nothing left to update.
    let _ = self.tx.send(FetchOutcome { kind: FetchKind::Popular, seq, result });
  }

  async fn search(&self, seq: u64, query: &str) {
    let result = self.catalog.search(query).await;
    let _ = self.tx.send(FetchOutcome { kind: FetchKind::Search, seq, result });
  }
}

pub struct SearchController<C> {
  session: SearchSession,
  dispatcher: Dispatcher<C>,
  outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
  popular_limit: usize,
  discard_stale: bool,
  /// Sequence of the most recent manual search.
  latest_search: Option<u64>,
}

impl<C: CatalogService> SearchController<C> {
  pub fn new(catalog: Arc<C>, popular_limit: usize) -> Self {
    let (tx, outcome_rx) = mpsc::unbounded_channel();
    Self {
      session: SearchSession::default(),
      dispatcher: Dispatcher { catalog, seq: Arc::new(AtomicU64::new(0)), tx },
      outcome_rx,
      popular_limit,
      discard_stale: false,
      latest_search: None,
    }
  }

  /// Only apply outcomes whose sequence number is the latest issued.
  pub fn with_discard_stale(mut self, discard: bool) -> Self {
    self.discard_stale = discard;
    self
  }

  pub fn session(&self) -> &SearchSession {
    &self.session
  }

  pub fn set_query(&mut self, query: impl Into<String>) {
    self.session.query = query.into();
  }

  pub fn query_mut(&mut self) -> &mut String {
    &mut self.session.query
  }

  /// Empty the query box. Results are left as they are.
  pub fn clear_query(&mut self) {
    self.session.query.clear();
  }

  /// Start a chart fetch in the background. The outcome is applied by `check_pending`.
  pub fn fetch_popular(&self) {
    let dispatcher = self.dispatcher.clone();
    let seq = dispatcher.next_seq();
    debug!(seq, "catalog: popular fetch issued");
    tokio::spawn(async move { dispatcher.popular(seq).await });
  }

  /// Start a search for `query`. Blank queries do nothing and return `false`.
  pub fn fetch_by_search(&mut self, query: &str) -> bool {
    if query.trim().is_empty() {
      return false;
    }
    let dispatcher = self.dispatcher.clone();
    let seq = dispatcher.next_seq();
    self.latest_search = Some(seq);
    self.session.is_loading = true;
    info!(query = %query, seq, "search triggered");

    let query = query.to_string();
    tokio::spawn(async move { dispatcher.search(seq, &query).await });
    true
  }

  /// Search for whatever is currently in the query box.
  pub fn submit_query(&mut self) -> bool {
    let query = self.session.query.clone();
    self.fetch_by_search(&query)
  }

  /// Refresh popular tracks now and then every `interval` until the handle is stopped.
  pub fn start_polling(&self, interval: Duration) -> PollHandle {
    let dispatcher = self.dispatcher.clone();
    info!(interval_secs = interval.as_secs(), "poll: started");
    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        // The first tick completes immediately.
        ticker.tick().await;
        let seq = dispatcher.next_seq();
        debug!(seq, "poll: tick");
        dispatcher.popular(seq).await;
      }
    });
    PollHandle { task: Some(task) }
  }

  pub fn stop_polling(&self, handle: &mut PollHandle) {
    handle.stop();
  }

  /// Apply every outcome that has arrived so far. Returns whether anything was applied.
  pub fn check_pending(&mut self) -> bool {
    let mut applied = false;
    while let Ok(outcome) = self.outcome_rx.try_recv() {
      self.apply(outcome);
      applied = true;
    }
    applied
  }

  /// Wait for the next outcome and apply it. Used by one-shot commands that have no UI loop.
  pub async fn settle_next(&mut self) -> Option<FetchKind> {
    let outcome = self.outcome_rx.recv().await?;
    let kind = outcome.kind;
    self.apply(outcome);
    Some(kind)
  }

  fn is_stale(&self, seq: u64) -> bool {
    self.discard_stale && seq < self.dispatcher.seq.load(Ordering::SeqCst)
  }

  pub fn apply(&mut self, outcome: FetchOutcome) {
    let FetchOutcome { kind, seq, result } = outcome;

    if kind == FetchKind::Search && (!self.discard_stale || self.latest_search == Some(seq)) {
      self.session.is_loading = false;
    }

    if self.is_stale(seq) {
      debug!(?kind, seq, "catalog: discarding stale outcome");
      return;
    }

    match (kind, result) {
      (FetchKind::Popular, Ok(tracks)) => {
        debug!(received = tracks.len(), "catalog: popular tracks applied");
        self.session.results = tracks.into_iter().take(self.popular_limit).collect();
      }
      (FetchKind::Search, Ok(tracks)) => {
        info!(results = tracks.len(), "catalog: search results applied");
        self.session.results = tracks;
      }
      (FetchKind::Popular, Err(e)) => {
        warn!(err = %e, "catalog: popular fetch failed");
        self.session.results.clear();
      }
      (FetchKind::Search, Err(e)) => {
        warn!(err = %e, "catalog: search failed");
        self.session.results.clear();
      }
    }
  }
}
