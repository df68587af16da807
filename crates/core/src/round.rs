//! Round state module - one playthrough from deal to all-pairs-matched
//!
//! The round owns its tiles, the pair counters, and the elapsed-time counter.
//! It never schedules anything itself: the owner calls [`Round::tick`] once per
//! second and [`Round::resolve_mismatch`] after the reveal delay, passing the
//! generation that was current when the timer was armed.

use thiserror::Error;

use crate::snapshot::{RoundSnapshot, TileView};
use crate::types::{RoundResult, RoundState, Tile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("tile position {position} is out of range for a board of {len} tiles")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Outcome of a single tile selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing changed (tile already face up or matched, or board not accepting picks)
    Ignored,
    /// First tile of a pair attempt flipped face up
    FirstPick { position: usize },
    /// Second tile matched the first. `completed` is set on the final pair only.
    Matched {
        first: usize,
        second: usize,
        completed: Option<RoundResult>,
    },
    /// Second tile differs; the pair stays face up until `resolve_mismatch`
    Mismatched { first: usize, second: usize },
}

/// Complete round state
#[derive(Debug, Clone, Default)]
pub struct Round {
    tiles: Vec<Tile>,
    matched_pairs: usize,
    total_pairs: usize,
    elapsed_seconds: u32,
    state: RoundState,
    first_pick: Option<usize>,
    pending_mismatch: Option<(usize, usize)>,
    /// Bumped on every start/reset; timers armed under an older value are stale.
    generation: u64,
    result: Option<RoundResult>,
}

impl Round {
    /// Create an idle round with no tiles
    pub fn new() -> Self {
        Self::default()
    }

    /// Deal `tiles` and begin play.
    ///
    /// `tiles` is expected to come from [`build_deck`](crate::deck::build_deck);
    /// `total_pairs` is half the tile count. An empty board is complete at once.
    pub fn start(&mut self, tiles: Vec<Tile>) {
        debug_assert!(tiles.len() % 2 == 0, "odd tile count: {}", tiles.len());
        self.generation = self.generation.wrapping_add(1);
        self.total_pairs = tiles.len() / 2;
        self.tiles = tiles;
        self.matched_pairs = 0;
        self.elapsed_seconds = 0;
        self.first_pick = None;
        self.pending_mismatch = None;
        self.result = None;
        self.state = RoundState::AwaitingFirstPick;
        if self.total_pairs == 0 {
            self.result = Some(RoundResult { elapsed_seconds: 0 });
            self.state = RoundState::Complete;
        }
    }

    /// Tear down to `Idle`, dropping any pending mismatch reset
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.tiles.clear();
        self.matched_pairs = 0;
        self.total_pairs = 0;
        self.elapsed_seconds = 0;
        self.first_pick = None;
        self.pending_mismatch = None;
        self.result = None;
        self.state = RoundState::Idle;
    }

    /// Abandon the current round (whatever its state) and deal a new one
    pub fn restart(&mut self, tiles: Vec<Tile>) {
        self.reset();
        self.start(tiles);
    }

    /// Select the tile at `position`.
    ///
    /// Selections on a face-up or matched tile, or while a mismatch is being
    /// shown, or after completion, are ignored without any state change.
    pub fn select_tile(&mut self, position: usize) -> Result<Selection, RoundError> {
        if position >= self.tiles.len() {
            return Err(RoundError::PositionOutOfRange {
                position,
                len: self.tiles.len(),
            });
        }

        if !self.state.accepts_selection() || !self.tiles[position].is_selectable() {
            return Ok(Selection::Ignored);
        }

        self.tiles[position].face_up = true;

        let first = match self.first_pick.take() {
            None => {
                self.first_pick = Some(position);
                self.state = RoundState::AwaitingSecondPick;
                return Ok(Selection::FirstPick { position });
            }
            Some(first) => first,
        };

        self.state = RoundState::Resolving;

        if self.tiles[first].content_ref != self.tiles[position].content_ref {
            self.pending_mismatch = Some((first, position));
            return Ok(Selection::Mismatched {
                first,
                second: position,
            });
        }

        self.tiles[first].matched = true;
        self.tiles[position].matched = true;
        self.matched_pairs += 1;

        let completed = if self.matched_pairs == self.total_pairs {
            let result = RoundResult {
                elapsed_seconds: self.elapsed_seconds,
            };
            self.state = RoundState::Complete;
            self.result = Some(result);
            Some(result)
        } else {
            self.state = RoundState::AwaitingFirstPick;
            None
        };

        Ok(Selection::Matched {
            first,
            second: position,
            completed,
        })
    }

    /// Flip a shown mismatch back face down.
    ///
    /// Returns the hidden pair, or `None` if the firing is stale (older
    /// generation) or there is nothing to resolve.
    pub fn resolve_mismatch(&mut self, generation: u64) -> Option<(usize, usize)> {
        if generation != self.generation || self.state != RoundState::Resolving {
            return None;
        }
        let (first, second) = self.pending_mismatch.take()?;
        self.tiles[first].face_up = false;
        self.tiles[second].face_up = false;
        self.state = RoundState::AwaitingFirstPick;
        Some((first, second))
    }

    /// Advance the elapsed counter by one second.
    ///
    /// Returns the new value, or `None` when the counter is stopped or the
    /// tick belongs to an older generation.
    pub fn tick(&mut self, generation: u64) -> Option<u32> {
        if generation != self.generation || !self.state.is_running() {
            return None;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        Some(self.elapsed_seconds)
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn first_pick(&self) -> Option<usize> {
        self.first_pick
    }

    pub fn pending_mismatch(&self) -> Option<(usize, usize)> {
        self.pending_mismatch
    }

    /// Set once, on the transition to `Complete`
    pub fn result(&self) -> Option<RoundResult> {
        self.result
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            generation: self.generation,
            state: self.state,
            elapsed_seconds: self.elapsed_seconds,
            matched_pairs: self.matched_pairs,
            total_pairs: self.total_pairs,
            tiles: self.tiles.iter().map(TileView::from).collect(),
        }
    }
}
