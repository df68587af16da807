//! Deck module - paired tile generation
//!
//! Each content ref yields two face-down tiles. Ids are assigned before the
//! shuffle, so `id / 2` identifies the pair a tile was dealt from.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::types::Tile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    #[error("deck needs at least one content ref")]
    Empty,
    #[error("content ref {0:?} appears more than once")]
    DuplicateRef(String),
}

/// Build a shuffled deck of `2 * content_refs.len()` tiles.
///
/// The permutation comes from `rng`; pass a seeded `StdRng` for
/// reproducible boards.
pub fn build_deck<R>(content_refs: &[String], rng: &mut R) -> Result<Vec<Tile>, DeckError>
where
    R: Rng + ?Sized,
{
    if content_refs.is_empty() {
        return Err(DeckError::Empty);
    }

    let mut seen = HashSet::with_capacity(content_refs.len());
    for content_ref in content_refs {
        if !seen.insert(content_ref.as_str()) {
            return Err(DeckError::DuplicateRef(content_ref.clone()));
        }
    }

    let mut tiles = Vec::with_capacity(content_refs.len() * 2);
    let mut next_id = 0u32;
    for content_ref in content_refs {
        for _ in 0..2 {
            tiles.push(Tile::new(next_id, content_ref.clone()));
            next_id += 1;
        }
    }

    tiles.shuffle(rng);
    Ok(tiles)
}
