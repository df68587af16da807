//! Score submission.
//!
//! Completing a round records the run locally before anything touches the
//! network; the submission then runs on its own task and never blocks play.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::{StoreError, TransportError};
use crate::protocol::{envelope_code, submission_accepted, ApiResponse, AuthHeader, ScoreSubmission};
use crate::records::ScoreRecords;
use crate::session::Session;
use crate::transport::Transport;
use memory_match_types::PendingRun;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored by the service; `retried_raw` when the bare-token retry was needed
    Accepted { retried_raw: bool },
    /// Nothing sent; the run stays local
    Skipped(SkipReason),
    /// HTTP status other than 200/201, or an envelope code other than 200/201
    Rejected { code: i64 },
    Failed(TransportError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    SignedOut,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted { .. })
    }
}

/// A completed round: the record already on disk plus the in-flight submission
#[derive(Debug)]
pub struct RoundCompletion {
    pub pending: PendingRun,
    pub best_seconds: Option<u32>,
    pub submission: JoinHandle<SubmitOutcome>,
}

pub struct ScoreCoordinator {
    session: Arc<Session>,
    records: Arc<ScoreRecords>,
    transport: Arc<dyn Transport>,
    endpoint: String,
    offline: bool,
}

impl std::fmt::Debug for ScoreCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreCoordinator")
            .field("endpoint", &self.endpoint)
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}

impl ScoreCoordinator {
    pub fn new(
        session: Arc<Session>,
        records: Arc<ScoreRecords>,
        transport: Arc<dyn Transport>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            session,
            records,
            transport,
            endpoint: config.score_endpoint.clone(),
            offline: config.offline,
        }
    }

    pub fn records(&self) -> &Arc<ScoreRecords> {
        &self.records
    }

    /// Record the run for `username`, then submit it in the background.
    ///
    /// Must be called from within a tokio runtime. The local write happens
    /// before this returns; only the network call is deferred. Cancelling
    /// `cancel` abandons the submission.
    pub fn on_round_complete(
        self: &Arc<Self>,
        username: &str,
        seconds: u32,
        cancel: CancellationToken,
    ) -> Result<RoundCompletion, StoreError> {
        let pending = self.records.record_completion(username, seconds)?;
        let best_seconds = self.records.best(username);

        let coordinator = Arc::clone(self);
        let submission = tokio::spawn(async move {
            coordinator.submit_cancellable(seconds, cancel).await
        });

        Ok(RoundCompletion {
            pending,
            best_seconds,
            submission,
        })
    }

    pub async fn submit_cancellable(
        &self,
        seconds: u32,
        cancel: CancellationToken,
    ) -> SubmitOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(seconds, "score submission cancelled");
                SubmitOutcome::Failed(TransportError::Cancelled)
            }
            outcome = self.submit(seconds) => outcome,
        }
    }

    /// POST the score once; on 401 retry exactly once with the bare token.
    pub async fn submit(&self, seconds: u32) -> SubmitOutcome {
        if self.offline {
            info!(seconds, "offline, score kept locally");
            return SubmitOutcome::Skipped(SkipReason::Offline);
        }
        let Some(token) = self.session.token() else {
            info!(seconds, "not signed in, score kept locally");
            return SubmitOutcome::Skipped(SkipReason::SignedOut);
        };
        let Some(header) = AuthHeader::from_token(&token) else {
            return SubmitOutcome::Skipped(SkipReason::SignedOut);
        };

        let body = match serde_json::to_value(ScoreSubmission {
            completion_time_seconds: seconds,
        }) {
            Ok(body) => body,
            Err(err) => return SubmitOutcome::Failed(TransportError::Body(err.to_string())),
        };

        let mut retried_raw = false;
        let mut response = self
            .transport
            .post(&self.endpoint, &body, Some(&header))
            .await;

        if matches!(response, ApiResponse::Error { code: 401, .. }) {
            if let Some(raw) = AuthHeader::raw_fallback(&token) {
                warn!("score submit unauthorized, retrying with raw token");
                retried_raw = true;
                response = self.transport.post(&self.endpoint, &body, Some(&raw)).await;
            }
        }

        let outcome = match response {
            ApiResponse::Success(body) if submission_accepted(&body) => {
                SubmitOutcome::Accepted { retried_raw }
            }
            ApiResponse::Success(body) => SubmitOutcome::Rejected {
                code: envelope_code(&body).unwrap_or(0),
            },
            ApiResponse::Error { code, message } => {
                warn!(code, %message, "score submit rejected");
                SubmitOutcome::Rejected {
                    code: i64::from(code),
                }
            }
            ApiResponse::Exception(err) => {
                warn!(error = %err, "score submit failed");
                SubmitOutcome::Failed(err)
            }
        };
        info!(seconds, ?outcome, "score submission finished");
        outcome
    }
}
