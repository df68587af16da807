//! Remote runtime integration.
//!
//! Bridges the game's controlling loop with the async remote calls. Work is
//! spawned on the current tokio runtime; results come back as
//! [`RemoteEvent`]s that the loop drains with [`RemoteBridge::try_recv`] or
//! awaits with [`RemoteBridge::recv`], and leaderboard results are settled
//! on the loop itself.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{LeaderboardError, StoreError, TransportError};
use crate::leaderboard::{FetchOutcome, Reconciliation};
use crate::services::RemoteServices;
use crate::submit::SubmitOutcome;
use memory_match_types::PendingRun;

/// Completion of background work, delivered to the controlling loop
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    Submitted {
        generation: u64,
        outcome: SubmitOutcome,
    },
    LeaderboardFetched {
        request_id: u64,
        pending: Option<PendingRun>,
        outcome: FetchOutcome,
    },
}

pub struct RemoteBridge {
    services: RemoteServices,
    event_tx: mpsc::UnboundedSender<RemoteEvent>,
    event_rx: mpsc::UnboundedReceiver<RemoteEvent>,
    shutdown: CancellationToken,
    round_cancel: CancellationToken,
    generation: u64,
    next_request: u64,
}

impl RemoteBridge {
    pub fn new(services: RemoteServices) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let round_cancel = shutdown.child_token();
        Self {
            services,
            event_tx,
            event_rx,
            shutdown,
            round_cancel,
            generation: 0,
            next_request: 0,
        }
    }

    pub fn services(&self) -> &RemoteServices {
        &self.services
    }

    /// A new round supersedes the previous one: its leaderboard fetches are
    /// abandoned. Score submissions only stop at [`RemoteBridge::shutdown`].
    pub fn begin_round(&mut self, generation: u64) {
        self.round_cancel.cancel();
        self.round_cancel = self.shutdown.child_token();
        self.generation = generation;
        debug!(generation, "remote work scoped to new round");
    }

    /// Record the finished run locally and start submitting it.
    ///
    /// The returned run is already durable; the submission result arrives
    /// later as [`RemoteEvent::Submitted`].
    pub fn round_complete(&self, seconds: u32) -> Result<PendingRun, StoreError> {
        let username = self.services.session.display_name();
        let completion = self.services.coordinator.on_round_complete(
            &username,
            seconds,
            self.shutdown.child_token(),
        )?;

        let tx = self.event_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let outcome = match completion.submission.await {
                Ok(outcome) => outcome,
                Err(err) => SubmitOutcome::Failed(TransportError::Network(err.to_string())),
            };
            let _ = tx.send(RemoteEvent::Submitted {
                generation,
                outcome,
            });
        });

        Ok(completion.pending)
    }

    /// Start fetching the leaderboard for the currently stored run.
    ///
    /// Returns the request id carried by the matching
    /// [`RemoteEvent::LeaderboardFetched`].
    pub fn request_leaderboard(&mut self) -> u64 {
        self.next_request += 1;
        let request_id = self.next_request;
        let pending = self.services.records.pending();
        let reconciler = Arc::clone(&self.services.reconciler);
        let cancel = self.round_cancel.clone();
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    FetchOutcome::Failed(LeaderboardError::Transport(TransportError::Cancelled))
                }
                outcome = reconciler.fetch() => outcome,
            };
            let _ = tx.send(RemoteEvent::LeaderboardFetched {
                request_id,
                pending,
                outcome,
            });
        });
        request_id
    }

    /// Build the view for a fetched leaderboard. Runs on the calling loop.
    pub fn settle(&self, pending: Option<PendingRun>, outcome: FetchOutcome) -> Reconciliation {
        let reconciler = &self.services.reconciler;
        reconciler.settle(pending, reconciler.top_n(), outcome)
    }

    pub fn try_recv(&mut self) -> Option<RemoteEvent> {
        self.event_rx.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<RemoteEvent> {
        self.event_rx.recv().await
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for RemoteBridge {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
