//! Pending run and personal-best records.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::LocalStore;
use memory_match_types::PendingRun;

pub const PENDING_RUN_KEY: &str = "last_run_pending";
pub const BEST_SECONDS_PREFIX: &str = "best_seconds_";

/// Local score records.
///
/// Read-modify-write sequences are serialized by an internal lock, so the
/// pending run flips from unconsumed to consumed at most once even when two
/// views race.
pub struct ScoreRecords {
    store: Arc<dyn LocalStore>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for ScoreRecords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreRecords")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl ScoreRecords {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Record a finished run as pending and lower the player's best if beaten.
    pub fn record_completion(
        &self,
        username: &str,
        seconds: u32,
    ) -> Result<PendingRun, StoreError> {
        let _guard = self.write_lock.lock();

        let run = PendingRun::new(username, seconds);
        self.store
            .set(PENDING_RUN_KEY, &serde_json::to_string(&run)?)?;

        let best_key = best_key(username);
        let improved = match self.read_best(&best_key) {
            Some(best) => seconds < best,
            None => true,
        };
        if improved {
            self.store.set(&best_key, &seconds.to_string())?;
        }
        debug!(username, seconds, improved, "run recorded");
        Ok(run)
    }

    /// The stored pending run, consumed or not
    pub fn pending(&self) -> Option<PendingRun> {
        let raw = self.store.get(PENDING_RUN_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(run) => Some(run),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable pending run");
                None
            }
        }
    }

    pub fn best(&self, username: &str) -> Option<u32> {
        self.read_best(&best_key(username))
    }

    /// Mark `expected` consumed.
    ///
    /// Returns the consumed run only for the caller that performed the
    /// unconsumed-to-consumed transition; every later call, or a call for a run
    /// that has since been replaced, returns `None`.
    pub fn consume_pending(
        &self,
        expected: &PendingRun,
    ) -> Result<Option<PendingRun>, StoreError> {
        let _guard = self.write_lock.lock();

        let Some(mut current) = self.pending() else {
            return Ok(None);
        };
        if current.consumed
            || current.username != expected.username
            || current.seconds != expected.seconds
        {
            return Ok(None);
        }

        current.consumed = true;
        self.store
            .set(PENDING_RUN_KEY, &serde_json::to_string(&current)?)?;
        debug!(username = %current.username, seconds = current.seconds, "pending run consumed");
        Ok(Some(current))
    }

    fn read_best(&self, key: &str) -> Option<u32> {
        self.store
            .get(key)
            .and_then(|v| v.trim().parse().ok())
    }
}

fn best_key(username: &str) -> String {
    format!("{BEST_SECONDS_PREFIX}{username}")
}
