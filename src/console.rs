//! Line-oriented console front end.

use std::fmt::Write as _;

use crate::core::RoundSnapshot;
use crate::types::format_hms;

pub const BOARD_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Select(usize),
    Restart,
    Leaderboard,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(match line {
        "r" | "restart" => ConsoleInput::Restart,
        "b" | "board" | "leaderboard" => ConsoleInput::Leaderboard,
        "h" | "help" | "?" => ConsoleInput::Help,
        "q" | "quit" | "exit" => ConsoleInput::Quit,
        other => match other.parse::<usize>() {
            Ok(position) => ConsoleInput::Select(position),
            Err(_) => ConsoleInput::Unknown(other.to_string()),
        },
    })
}

pub const HELP: &str = "Commands: <position> select a tile, r restart, b leaderboard, q quit";

/// Content refs for a deck of `pairs` pairs.
pub fn content_refs(pairs: usize) -> Vec<String> {
    (1..=pairs).map(|i| format!("card-{i:02}")).collect()
}

/// Hidden tiles show their position, face-up tiles their content, matched
/// tiles a marker.
pub fn render_board(snapshot: &RoundSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Time {}   Pairs {}/{}   [{}]",
        format_hms(snapshot.elapsed_seconds),
        snapshot.matched_pairs,
        snapshot.total_pairs,
        snapshot.state.as_str()
    );

    for (row_index, row) in snapshot.tiles.chunks(BOARD_COLUMNS).enumerate() {
        for (col, tile) in row.iter().enumerate() {
            let position = row_index * BOARD_COLUMNS + col;
            let cell = match (&tile.content_ref, tile.matched) {
                (Some(content), true) => format!("*{content}*"),
                (Some(content), false) => content.clone(),
                (None, _) => format!("{position:>2}"),
            };
            let _ = write!(out, "[{cell:^9}]");
        }
        out.push('\n');
    }
    out
}
