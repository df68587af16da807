use crate::types::{RoundState, Tile};

/// What a renderer may know about one tile.
///
/// `content_ref` is only present while the tile is face up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileView {
    pub id: u32,
    pub face_up: bool,
    pub matched: bool,
    pub content_ref: Option<String>,
}

impl From<&Tile> for TileView {
    fn from(value: &Tile) -> Self {
        Self {
            id: value.id,
            face_up: value.face_up,
            matched: value.matched,
            content_ref: if value.face_up {
                Some(value.content_ref.clone())
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RoundSnapshot {
    pub generation: u64,
    pub state: RoundState,
    pub elapsed_seconds: u32,
    pub matched_pairs: usize,
    pub total_pairs: usize,
    pub tiles: Vec<TileView>,
}

impl RoundSnapshot {
    pub fn playable(&self) -> bool {
        self.state.accepts_selection()
    }

    pub fn is_complete(&self) -> bool {
        self.state == RoundState::Complete
    }

    pub fn face_up_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.face_up).count()
    }
}
