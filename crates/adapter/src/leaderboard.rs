//! Leaderboard fetch and "this run" reconciliation.
//!
//! A view is built in two steps. [`LeaderboardReconciler::fetch`] talks to
//! the service and touches no local state, so it is safe to run on any task.
//! [`LeaderboardReconciler::settle`] is synchronous: it ranks the pending run
//! against the fetched rows, decides whether the run has now been shown, and
//! consumes it. Call it from the loop that owns the display.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::LeaderboardError;
use crate::protocol::{parse_leaderboard, ApiResponse};
use crate::records::ScoreRecords;
use crate::session::Session;
use crate::transport::Transport;
use memory_match_types::{format_hms, DisplayRank, LeaderboardEntry, PendingRun};

/// `recorded_at` marker on the locally inserted row
pub const THIS_RUN_MARKER: &str = "(this run)";

/// Result of the network half of a view
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Rows as received; unparseable bodies arrive here as an empty list
    Entries(Vec<LeaderboardEntry>),
    NotSignedIn,
    Offline,
    Failed(LeaderboardError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardStatus {
    Loaded,
    Empty,
    NotSignedIn,
    Offline,
    LoadFailed(LeaderboardError),
}

impl BoardStatus {
    /// Line shown in place of (or above) the rows, if any
    pub fn message(&self) -> Option<String> {
        match self {
            BoardStatus::Loaded => None,
            BoardStatus::Empty => Some("No scores yet.".to_string()),
            BoardStatus::NotSignedIn => {
                Some("Please login first to view leaderboard.".to_string())
            }
            BoardStatus::Offline => Some("Leaderboard unavailable offline.".to_string()),
            BoardStatus::LoadFailed(LeaderboardError::EndpointNotFound) => {
                Some("Load failed (HTTP 404): leaderboard endpoint not found.".to_string())
            }
            BoardStatus::LoadFailed(LeaderboardError::Http { code, message }) => {
                Some(format!("Load failed (HTTP {code}): {message}"))
            }
            BoardStatus::LoadFailed(LeaderboardError::Transport(err)) => {
                Some(format!("Network error: {err}"))
            }
            BoardStatus::LoadFailed(LeaderboardError::Parse(detail)) => {
                Some(format!("Load failed: {detail}"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub position: usize,
    pub username: String,
    pub seconds: u32,
    pub recorded_at: String,
    pub this_run: bool,
}

impl fmt::Display for LeaderboardRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3}. {:<20} {}",
            self.position,
            self.username,
            format_hms(self.seconds)
        )?;
        if self.this_run {
            write!(f, "  {THIS_RUN_MARKER}")
        } else if !self.recorded_at.is_empty() {
            write!(f, "  {}", self.recorded_at)
        } else {
            Ok(())
        }
    }
}

/// One-time disclosure of the run that just finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunBanner {
    pub username: String,
    pub seconds: u32,
    pub rank: Option<DisplayRank>,
    pub best_seconds: Option<u32>,
}

impl fmt::Display for RunBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "This run: {}  {}", self.username, format_hms(self.seconds))?;
        match self.rank {
            Some(DisplayRank::Confirmed(n)) => write!(f, "   (Rank #{n})")?,
            Some(DisplayRank::Estimated(n)) => write!(f, "   (Estimated rank #{n})")?,
            None => {}
        }
        if let Some(best) = self.best_seconds {
            write!(f, "   Best: {}", format_hms(best))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardView {
    pub rows: Vec<LeaderboardRow>,
    pub banner: Option<RunBanner>,
    pub status: BoardStatus,
    /// Local best of the current player, shown even once the banner is gone
    pub best_seconds: Option<u32>,
}

impl fmt::Display for LeaderboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.banner, self.best_seconds) {
            (Some(banner), _) => writeln!(f, "{banner}")?,
            (None, Some(best)) => writeln!(f, "Best: {}", format_hms(best))?,
            (None, None) => {}
        }
        if let Some(message) = self.status.message() {
            writeln!(f, "{message}")?;
        }
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Remote top-N, ascending by time
    pub entries: Vec<LeaderboardEntry>,
    pub rank: Option<DisplayRank>,
    pub view: LeaderboardView,
    /// This pass flipped the pending run to consumed
    pub consumed: bool,
}

/// Rank of `run` within `entries` (ascending by time).
///
/// An exact `(username, seconds)` row confirms the run's position; otherwise
/// the run is placed after every strictly faster row.
pub fn rank_for(run: &PendingRun, entries: &[LeaderboardEntry]) -> DisplayRank {
    match entries
        .iter()
        .position(|e| e.username == run.username && e.seconds == run.seconds)
    {
        Some(index) => DisplayRank::Confirmed(index + 1),
        None => DisplayRank::Estimated(
            entries.iter().filter(|e| e.seconds < run.seconds).count() + 1,
        ),
    }
}

/// Merge, dedupe by `(username, seconds, recorded_at)`, and sort ascending.
pub fn display_rows(entries: &[LeaderboardEntry], local: Option<&LeaderboardEntry>) -> Vec<LeaderboardRow> {
    let mut seen = HashSet::new();
    let mut merged: Vec<&LeaderboardEntry> = entries
        .iter()
        .chain(local)
        .filter(|e| seen.insert(e.dedup_key()))
        .collect();
    merged.sort_by_key(|e| e.seconds);

    merged
        .into_iter()
        .enumerate()
        .map(|(index, e)| LeaderboardRow {
            position: index + 1,
            username: e.username.clone(),
            seconds: e.seconds,
            recorded_at: e.recorded_at.clone(),
            this_run: e.recorded_at == THIS_RUN_MARKER,
        })
        .collect()
}

pub struct LeaderboardReconciler {
    session: Arc<Session>,
    records: Arc<ScoreRecords>,
    transport: Arc<dyn Transport>,
    endpoints: Vec<String>,
    top_n: usize,
    offline: bool,
}

impl fmt::Debug for LeaderboardReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaderboardReconciler")
            .field("endpoints", &self.endpoints.len())
            .field("top_n", &self.top_n)
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}

impl LeaderboardReconciler {
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
            endpoints: config.leaderboard_endpoints.clone(),
            top_n: config.leaderboard_size.max(1),
            offline: config.offline,
        }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Fetch the remote list, trying each candidate endpoint until one
    /// answers with anything but 404.
    pub async fn fetch(&self) -> FetchOutcome {
        if self.offline {
            return FetchOutcome::Offline;
        }
        let Some(header) = self.session.auth_header() else {
            return FetchOutcome::NotSignedIn;
        };

        for endpoint in &self.endpoints {
            match self.transport.get(endpoint, Some(&header)).await {
                ApiResponse::Success(body) => {
                    return match parse_leaderboard(&body) {
                        Ok(entries) => {
                            debug!(endpoint = %endpoint, rows = entries.len(), "leaderboard fetched");
                            FetchOutcome::Entries(entries)
                        }
                        Err(err) => {
                            warn!(endpoint = %endpoint, error = %err, "leaderboard body unusable, showing empty list");
                            FetchOutcome::Entries(Vec::new())
                        }
                    };
                }
                ApiResponse::Error { code: 404, .. } => {
                    debug!(endpoint = %endpoint, "leaderboard endpoint missing, trying next");
                }
                ApiResponse::Error { code, message } => {
                    warn!(endpoint = %endpoint, code, "leaderboard request rejected");
                    return FetchOutcome::Failed(LeaderboardError::Http { code, message });
                }
                ApiResponse::Exception(err) => {
                    warn!(endpoint = %endpoint, error = %err, "leaderboard request failed");
                    return FetchOutcome::Failed(err.into());
                }
            }
        }
        FetchOutcome::Failed(LeaderboardError::EndpointNotFound)
    }

    /// Build the view for the best `top_n` fetched rows and consume `pending`
    /// if this view discloses it.
    ///
    /// The run is consumed after a successful fetch or a final failure, and
    /// left pending after a transient one (timeouts, 408, 429, 5xx) so a
    /// later view can still show its rank.
    pub fn settle(
        &self,
        pending: Option<PendingRun>,
        top_n: usize,
        fetched: FetchOutcome,
    ) -> Reconciliation {
        let pending = pending.filter(PendingRun::is_pending);

        let (mut entries, fetched_ok, failure) = match fetched {
            FetchOutcome::Entries(entries) => (entries, true, None),
            FetchOutcome::NotSignedIn => (Vec::new(), false, Some(BoardStatus::NotSignedIn)),
            FetchOutcome::Offline => (Vec::new(), false, Some(BoardStatus::Offline)),
            FetchOutcome::Failed(err) => (Vec::new(), false, Some(BoardStatus::LoadFailed(err))),
        };
        entries.sort_by_key(|e| e.seconds);
        entries.truncate(top_n);

        let transient = matches!(&failure, Some(BoardStatus::LoadFailed(err)) if err.is_transient());

        let mut consumed = false;
        let disclosed = match pending {
            Some(run) if transient => Some(run),
            Some(run) => match self.records.consume_pending(&run) {
                Ok(Some(_)) => {
                    consumed = true;
                    Some(run)
                }
                Ok(None) => None,
                Err(err) => {
                    warn!(error = %err, "could not mark pending run consumed");
                    Some(run)
                }
            },
            None => None,
        };

        let rank = disclosed
            .as_ref()
            .filter(|_| fetched_ok)
            .map(|run| rank_for(run, &entries));

        let local_row = disclosed
            .as_ref()
            .filter(|_| !matches!(rank, Some(DisplayRank::Confirmed(_))))
            .map(|run| LeaderboardEntry::new(run.username.clone(), run.seconds, THIS_RUN_MARKER));

        let rows = display_rows(&entries, local_row.as_ref());
        let status = match failure {
            Some(status) => status,
            None if rows.is_empty() => BoardStatus::Empty,
            None => BoardStatus::Loaded,
        };

        let best_seconds = self.records.best(&self.session.display_name());
        let banner = disclosed.map(|run| RunBanner {
            best_seconds: self.records.best(&run.username),
            username: run.username,
            seconds: run.seconds,
            rank,
        });

        info!(
            rows = rows.len(),
            rank = ?rank,
            consumed,
            "leaderboard settled"
        );

        Reconciliation {
            entries,
            rank,
            view: LeaderboardView {
                rows,
                banner,
                status,
                best_seconds,
            },
            consumed,
        }
    }

    /// Fetch and settle in one step; for callers that already own the display.
    pub async fn reconcile(&self, pending: Option<PendingRun>, top_n: usize) -> Reconciliation {
        let fetched = self.fetch().await;
        self.settle(pending, top_n, fetched)
    }

    /// Reconcile the currently stored run against the configured top N.
    pub async fn reconcile_stored(&self) -> Reconciliation {
        let pending = self.records.pending();
        self.reconcile(pending, self.top_n).await
    }
}
