//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! Everything here is plain data: the round engine, the driver, and the
//! remote scoring adapter all speak in these types.
//!
//! # Deck Dimensions
//!
//! - **Pairs per round**: 6 by default (12 tiles)
//! - **Tiles per pair**: always 2
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 1000 | Elapsed-time counter period (one tick per second) |
//! | `MISMATCH_REVEAL_MS` | 1000 | How long a mismatched pair stays face up |
//!
//! # Examples
//!
//! ```
//! use memory_match_types::{format_hms, DisplayRank, RoundState};
//!
//! assert_eq!(format_hms(47), "00:00:47");
//! assert_eq!(format_hms(3725), "01:02:05");
//!
//! assert_eq!(DisplayRank::Estimated(3).to_string(), "estimated:#3");
//! assert!(RoundState::Resolving.is_running());
//! assert!(!RoundState::Complete.is_running());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pairs dealt per round when the caller does not choose (6 pairs, 12 tiles)
pub const DEFAULT_PAIR_COUNT: usize = 6;

/// Elapsed-time counter period (1000ms = one tick per second)
pub const TICK_MS: u64 = 1000;

/// Visual delay before a mismatched pair flips back face down
pub const MISMATCH_REVEAL_MS: u64 = 1000;

/// Default number of leaderboard rows requested from the remote service
pub const DEFAULT_LEADERBOARD_SIZE: usize = 50;

/// One face of the game board.
///
/// Exactly two tiles in a deck share a `content_ref`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: u32,
    pub content_ref: String,
    pub face_up: bool,
    pub matched: bool,
}

impl Tile {
    /// A fresh face-down, unmatched tile
    pub fn new(id: u32, content_ref: impl Into<String>) -> Self {
        Self {
            id,
            content_ref: content_ref.into(),
            face_up: false,
            matched: false,
        }
    }

    /// Whether a selection on this tile would be accepted
    pub fn is_selectable(&self) -> bool {
        !self.face_up && !self.matched
    }
}

/// Round lifecycle
///
/// `Idle -> AwaitingFirstPick -> AwaitingSecondPick -> Resolving -> (AwaitingFirstPick | Complete)`
///
/// `Complete` is terminal until an explicit restart re-enters `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoundState {
    #[default]
    Idle,
    AwaitingFirstPick,
    AwaitingSecondPick,
    Resolving,
    Complete,
}

impl RoundState {
    /// The elapsed-time counter only advances while this is true
    pub fn is_running(&self) -> bool {
        !matches!(self, RoundState::Idle | RoundState::Complete)
    }

    /// Whether the board currently accepts a tile selection
    pub fn accepts_selection(&self) -> bool {
        matches!(
            self,
            RoundState::AwaitingFirstPick | RoundState::AwaitingSecondPick
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundState::Idle => "idle",
            RoundState::AwaitingFirstPick => "awaitingFirstPick",
            RoundState::AwaitingSecondPick => "awaitingSecondPick",
            RoundState::Resolving => "resolving",
            RoundState::Complete => "complete",
        }
    }
}

/// Terminal output of a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundResult {
    pub elapsed_seconds: u32,
}

/// A completed round's result awaiting one-time display.
///
/// At most one exists per device. `consumed` moves from `false` to `true`
/// exactly once, after which the run is ignored until a new round completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingRun {
    pub username: String,
    pub seconds: u32,
    pub consumed: bool,
}

impl PendingRun {
    pub fn new(username: impl Into<String>, seconds: u32) -> Self {
        Self {
            username: username.into(),
            seconds,
            consumed: false,
        }
    }

    /// Still eligible for the one-time "this run" disclosure
    pub fn is_pending(&self) -> bool {
        !self.consumed
    }
}

/// Immutable row of the remote ranked list (lower `seconds` is better).
///
/// `recorded_at` is the server's completion timestamp, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub seconds: u32,
    pub recorded_at: String,
}

impl LeaderboardEntry {
    pub fn new(username: impl Into<String>, seconds: u32, recorded_at: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            seconds,
            recorded_at: recorded_at.into(),
        }
    }

    /// Key used to deduplicate merged local/remote rows
    pub fn dedup_key(&self) -> (&str, u32, &str) {
        (&self.username, self.seconds, &self.recorded_at)
    }
}

/// Where a pending run sits on the leaderboard
///
/// - **Confirmed**: the run was found on the remote board at this 1-based position
/// - **Estimated**: not found; position computed from faster remote entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayRank {
    Confirmed(usize),
    Estimated(usize),
}

impl DisplayRank {
    pub fn position(&self) -> usize {
        match self {
            DisplayRank::Confirmed(n) | DisplayRank::Estimated(n) => *n,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, DisplayRank::Confirmed(_))
    }
}

impl fmt::Display for DisplayRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayRank::Confirmed(n) => write!(f, "#{n}"),
            DisplayRank::Estimated(n) => write!(f, "estimated:#{n}"),
        }
    }
}

/// Format whole seconds as `HH:MM:SS`
pub fn format_hms(total_seconds: u32) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}
