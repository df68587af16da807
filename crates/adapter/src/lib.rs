//! Remote side of the game - score submission, leaderboard, and session
//!
//! Nothing here runs on the board's timing path. A finished round is written
//! to the local store first and submitted in the background; the leaderboard
//! is fetched in the background and settled on the caller's loop.
//!
//! # Service contract
//!
//! All endpoints are relative to `MEMORY_MATCH_API_URL` and answer with an
//! envelope `{ "code", "message", "data" }`.
//!
//! - **POST `Scores/submit`**: body `{"completionTimeSeconds": n}`, header
//!   `Authorization: Bearer <token>`. Success needs HTTP 200/201 and an
//!   envelope code of 200/201 (or none). On 401 the request is retried once
//!   with the bare token as the header value.
//! - **GET leaderboard**: several historical paths are tried in order
//!   (see [`config::default_leaderboard_endpoints`]); only a 404 moves on.
//!   Rows live under `data.items`, `data.leaderboard`, `data.data`, or `data`.
//! - **POST `Auth/login`**: body `{"username", "password"}`, token in
//!   `data.token`.
//!
//! # Local records
//!
//! | key                      | value                               |
//! |--------------------------|-------------------------------------|
//! | `last_run_pending`       | [`PendingRun`] as JSON              |
//! | `best_seconds_<user>`    | personal best in seconds            |
//! | `auth_token`             | token as returned by login          |
//! | `username`               | signed-in user                      |
//! | `is_paid_user`           | `IsPaid` claim of the token         |
//!
//! # Environment Variables
//!
//! - `MEMORY_MATCH_API_URL`: service base URL (default `http://127.0.0.1:5011/api/`)
//! - `MEMORY_MATCH_HTTP_TIMEOUT_MS`: per-request timeout (default 10000)
//! - `MEMORY_MATCH_LEADERBOARD_SIZE`: rows requested and displayed (default 50)
//! - `MEMORY_MATCH_DATA_DIR`: local store directory
//! - `MEMORY_MATCH_OFFLINE`: set to "1" or "true" to keep everything local

pub mod config;
pub mod error;
pub mod leaderboard;
pub mod login;
pub mod protocol;
pub mod records;
pub mod runtime;
pub mod services;
pub mod session;
pub mod store;
pub mod submit;
pub mod transport;

pub use memory_match_types as types;
pub use memory_match_types::PendingRun;

pub use config::ServiceConfig;
pub use error::{LeaderboardError, LoginError, ServiceError, StoreError, TransportError};
pub use leaderboard::{
    rank_for, BoardStatus, FetchOutcome, LeaderboardReconciler, LeaderboardRow, LeaderboardView,
    Reconciliation, RunBanner,
};
pub use login::{AuthClient, LoginOutcome};
pub use protocol::{ApiResponse, AuthHeader};
pub use records::ScoreRecords;
pub use runtime::{RemoteBridge, RemoteEvent};
pub use services::RemoteServices;
pub use session::Session;
pub use store::{JsonFileStore, LocalStore, MemoryStore};
pub use submit::{RoundCompletion, ScoreCoordinator, SkipReason, SubmitOutcome};
pub use transport::{HttpTransport, Transport};
