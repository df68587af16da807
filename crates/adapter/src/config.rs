//! Remote service configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use memory_match_types::DEFAULT_LEADERBOARD_SIZE;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5011/api/";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const SCORE_SUBMIT_ENDPOINT: &str = "Scores/submit";
pub const LOGIN_ENDPOINT: &str = "Auth/login";
pub const STORE_FILE_NAME: &str = "store.json";

/// Leaderboard paths tried in order; only a 404 moves on to the next one.
pub fn default_leaderboard_endpoints(size: usize) -> Vec<String> {
    vec![
        format!("Score/leaderboard?page=1&size={size}"),
        format!("score/leaderboard?page=1&size={size}"),
        format!("Score/leaderboard?pageNumber=1&pageSize={size}"),
        format!("score/leaderboard?pageNumber=1&pageSize={size}"),
        "Score/leaderboard".to_string(),
        "score/leaderboard".to_string(),
        format!("scores/leaderboard?page=1&size={size}"),
        "scores/leaderboard".to_string(),
        "Scores/leaderboard".to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub leaderboard_size: usize,
    pub data_dir: PathBuf,
    pub offline: bool,
    pub score_endpoint: String,
    pub login_endpoint: String,
    pub leaderboard_endpoints: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            data_dir: default_data_dir(),
            offline: false,
            score_endpoint: SCORE_SUBMIT_ENDPOINT.to_string(),
            login_endpoint: LOGIN_ENDPOINT.to_string(),
            leaderboard_endpoints: default_leaderboard_endpoints(DEFAULT_LEADERBOARD_SIZE),
        }
    }
}

impl ServiceConfig {
    /// Create from environment variables
    ///
    /// - `MEMORY_MATCH_API_URL`: base URL (default `http://127.0.0.1:5011/api/`)
    /// - `MEMORY_MATCH_HTTP_TIMEOUT_MS`: per-request timeout (default 10000)
    /// - `MEMORY_MATCH_LEADERBOARD_SIZE`: rows requested and shown (default 50)
    /// - `MEMORY_MATCH_DATA_DIR`: local store directory
    /// - `MEMORY_MATCH_OFFLINE`: "1" or "true" disables all remote calls
    pub fn from_env() -> Self {
        let base_url = env::var("MEMORY_MATCH_API_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_ms = env::var("MEMORY_MATCH_HTTP_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let leaderboard_size = env::var("MEMORY_MATCH_LEADERBOARD_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_LEADERBOARD_SIZE);

        let data_dir = env::var("MEMORY_MATCH_DATA_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let offline = env::var("MEMORY_MATCH_OFFLINE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
            leaderboard_size,
            data_dir,
            offline,
            score_endpoint: SCORE_SUBMIT_ENDPOINT.to_string(),
            login_endpoint: LOGIN_ENDPOINT.to_string(),
            leaderboard_endpoints: default_leaderboard_endpoints(leaderboard_size),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }

    /// Join `endpoint` onto the base URL, tolerating a leading `/` on either side.
    pub fn url_for(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ep = endpoint.trim().trim_start_matches('/');
        format!("{base}/{ep}")
    }
}

fn default_data_dir() -> PathBuf {
    match env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home).join(".config/memory-match"),
        _ => PathBuf::from(".memory-match"),
    }
}
