//! Core game logic module - pure, deterministic, and testable
//!
//! This module contains the round rules and deck construction. It has **zero
//! dependencies** on timers, networking, or I/O:
//!
//! - **Deterministic**: Same seed produces the same deck
//! - **Testable**: Time is injected through explicit `tick` calls
//! - **Portable**: The async driver, a test, or a bench can all own a [`Round`]
//!
//! # Module Structure
//!
//! - [`deck`]: builds a shuffled deck of paired tiles
//! - [`round`]: the round state machine (selection, match/mismatch, completion)
//! - [`snapshot`]: read-only views handed to renderers
//!
//! # Round Rules
//!
//! - Two picks form a pair attempt; a third pick is refused while a mismatch is shown
//! - A matched pair stays face up for the rest of the round
//! - A mismatched pair flips back after [`MISMATCH_REVEAL_MS`](crate::types::MISMATCH_REVEAL_MS)
//! - The elapsed counter stops the instant the last pair is matched
//!
//! # Example
//!
//! ```
//! use memory_match_core::{build_deck, Round, Selection};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let refs = vec!["cat".to_string(), "dog".to_string()];
//! let mut rng = StdRng::seed_from_u64(7);
//! let tiles = build_deck(&refs, &mut rng).unwrap();
//!
//! let mut round = Round::new();
//! round.start(tiles);
//!
//! let first = round.select_tile(0).unwrap();
//! assert!(matches!(first, Selection::FirstPick { position: 0 }));
//! ```
//!
//! # Timing
//!
//! Every timer firing carries the round generation it was scheduled for.
//! [`Round::tick`] and [`Round::resolve_mismatch`] ignore firings from an
//! older generation, so a restarted round is never touched by a stale timer.

pub mod deck;
pub mod round;
pub mod snapshot;

pub use memory_match_types as types;

// Re-export commonly used types for convenience
pub use deck::{build_deck, DeckError};
pub use round::{Round, RoundError, Selection};
pub use snapshot::{RoundSnapshot, TileView};
