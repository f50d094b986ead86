//! Hierarchy traversal: walks the classification tree from a root identifier,
//! saving every node once and resuming from whatever is already on disk.
//!
//! # Algorithm
//! - A FIFO queue of pending identifiers is seeded with the root. Identifiers
//!   enter a visited-set when they are enqueued, so each one is queued at most
//!   once even when several parents reference it.
//! - A node already present in the [`NodeStore`] is not fetched. Its stored
//!   payload is read back to discover the children, so a resumed run can walk
//!   the whole tree without touching the network for finished nodes.
//! - Otherwise the node is fetched, its children are queued and the payload is
//!   saved. Consecutive fetches are separated by the configured delay; skipped
//!   nodes cost no delay.
//! - A failure belongs to its node only. It is logged, reported in the
//!   [`Visit`], and the walk continues with the next pending identifier.
//!
//! Visits are produced lazily: call [`Traversal::next_visit`] in a loop, turn
//! the traversal into a [`Stream`] with [`Traversal::into_stream`], or drain it
//! with [`Traversal::run`].

use futures::stream::{self, Stream};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::EffectiveConfig;
use crate::contract::{HierarchyNode, NodeFetcher, NodeStore};
use crate::error::{ApiError, StoreError};

/// What happened to one node.
#[derive(Debug)]
pub enum VisitOutcome {
    /// Fetched and written to `path`; `children` new identifiers were queued.
    Saved { path: PathBuf, children: usize },
    /// Already on disk; not fetched.
    Skipped { children: usize },
    FetchFailed(ApiError),
    /// Fetched but could not be written. Its children were still queued.
    SaveFailed { error: StoreError, children: usize },
}

/// One traversal step: the node identifier, the payload if one was obtained, and the outcome.
#[derive(Debug)]
pub struct Visit {
    pub node_id: String,
    pub payload: Option<Value>,
    pub outcome: VisitOutcome,
}

impl Visit {
    pub fn is_failure(&self) -> bool {
        matches!(
            self.outcome,
            VisitOutcome::FetchFailed(_) | VisitOutcome::SaveFailed { .. }
        )
    }
}

/// Totals for a finished (or interrupted) traversal.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalReport {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_ids: Vec<String>,
}

impl TraversalReport {
    pub fn record(&mut self, visit: &Visit) {
        match visit.outcome {
            VisitOutcome::Saved { .. } => self.saved += 1,
            VisitOutcome::Skipped { .. } => self.skipped += 1,
            VisitOutcome::FetchFailed(_) | VisitOutcome::SaveFailed { .. } => {
                self.failed += 1;
                self.failed_ids.push(visit.node_id.clone());
            }
        }
    }

    pub fn visited(&self) -> usize {
        self.saved + self.skipped + self.failed
    }
}

pub struct Traversal<F, S> {
    fetcher: F,
    store: S,
    delay: Duration,
    seed: String,
    seed_fallback: Vec<String>,
    pending: VecDeque<String>,
    visited: HashSet<String>,
    fetched_before: bool,
}

impl<F, S> Traversal<F, S>
where
    F: NodeFetcher,
    S: NodeStore,
{
    pub fn new(fetcher: F, store: S, root: impl Into<String>, delay: Duration) -> Self {
        let seed = root.into();
        let mut traversal = Self {
            fetcher,
            store,
            delay,
            seed: seed.clone(),
            seed_fallback: Vec::new(),
            pending: VecDeque::new(),
            visited: HashSet::new(),
            fetched_before: false,
        };
        traversal.enqueue(std::iter::once(seed));
        traversal
    }

    /// Builds a traversal from the run configuration, including the chapter
    /// fallback for the release root.
    pub fn from_config(fetcher: F, store: S, config: &EffectiveConfig) -> Self {
        Self::new(fetcher, store, config.root.clone(), config.delay)
            .with_seed_fallback(config.seed_fallback())
    }

    /// Children to queue if the seed node itself cannot be fetched.
    pub fn with_seed_fallback(mut self, children: Vec<String>) -> Self {
        self.seed_fallback = children;
        self
    }

    /// Number of identifiers still waiting to be visited.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn enqueue(&mut self, ids: impl IntoIterator<Item = String>) -> usize {
        let mut added = 0;
        for id in ids {
            if self.visited.insert(id.clone()) {
                self.pending.push_back(id);
                added += 1;
            }
        }
        added
    }

    /// Visits the next pending node, or returns `None` once the queue is empty.
    pub async fn next_visit(&mut self) -> Option<Visit> {
        let node_id = self.pending.pop_front()?;

        if self.store.exists(&node_id) {
            match self.store.load(&node_id) {
                Ok(payload) => {
                    let node = HierarchyNode::new(node_id, payload);
                    let children = self.enqueue(node.children);
                    info!(node_id = %node.id, children, "Already saved, skipping fetch");
                    return Some(Visit {
                        node_id: node.id,
                        payload: Some(node.payload),
                        outcome: VisitOutcome::Skipped { children },
                    });
                }
                Err(e) => {
                    warn!(node_id = %node_id, error = %e, "Stored payload unreadable, fetching again");
                }
            }
        }

        if self.fetched_before && !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "Waiting before next request");
            tokio::time::sleep(self.delay).await;
        }
        self.fetched_before = true;

        info!(node_id = %node_id, "Fetching data for code");
        let payload = match self.fetcher.fetch(&node_id).await {
            Ok(payload) => payload,
            Err(e) => {
                error!(node_id = %node_id, status = ?e.status(), error = %e, "Error fetching data for code");
                if node_id == self.seed && !self.seed_fallback.is_empty() {
                    let fallback = std::mem::take(&mut self.seed_fallback);
                    let queued = self.enqueue(fallback);
                    warn!(node_id = %node_id, queued, "Root unavailable, using default child list");
                }
                return Some(Visit {
                    node_id,
                    payload: None,
                    outcome: VisitOutcome::FetchFailed(e),
                });
            }
        };

        let node = HierarchyNode::new(node_id, payload);
        let children = self.enqueue(node.children);
        let outcome = match self.store.save(&node.id, &node.payload) {
            Ok(path) => {
                info!(node_id = %node.id, path = %path.display(), children, "Data saved");
                VisitOutcome::Saved { path, children }
            }
            Err(e) => {
                error!(node_id = %node.id, error = %e, "Error saving data for code");
                VisitOutcome::SaveFailed { error: e, children }
            }
        };

        Some(Visit {
            node_id: node.id,
            payload: Some(node.payload),
            outcome,
        })
    }

    /// Lazily yields every visit as a stream.
    pub fn into_stream(self) -> impl Stream<Item = Visit> {
        stream::unfold(self, |mut traversal| async move {
            traversal
                .next_visit()
                .await
                .map(|visit| (visit, traversal))
        })
    }

    /// Visits every reachable node and returns the totals.
    pub async fn run(mut self) -> TraversalReport {
        let mut report = TraversalReport::default();
        while let Some(visit) = self.next_visit().await {
            report.record(&visit);
        }
        info!(
            saved = report.saved,
            skipped = report.skipped,
            failed = report.failed,
            "Traversal complete"
        );
        report
    }
}
