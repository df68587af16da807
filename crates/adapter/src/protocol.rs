//! Wire format of the score service.
//!
//! Every response is wrapped in an envelope `{ "code", "message", "data" }`.
//! The server has shipped several field spellings for leaderboard items over
//! time, so item parsing accepts all of them and drops rows it cannot use.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LeaderboardError, TransportError};
use memory_match_types::LeaderboardEntry;

const BEARER_PREFIX: &str = "Bearer";
const RAW_PREFIX: &str = "RAW ";
const UNKNOWN_USER: &str = "unknown";

/// Outcome of one HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Accepted status; carries the decoded body (`Null` when empty)
    Success(Value),
    /// Any other status
    Error { code: u16, message: String },
    /// No usable response
    Exception(TransportError),
}

/// How the stored token is placed in the `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub enum AuthHeader {
    Bearer(String),
    Raw(String),
}

impl AuthHeader {
    /// `RAW x` sends `x` verbatim, `Bearer x` is kept as is, anything else
    /// gets the `Bearer ` scheme. Blank tokens yield `None`.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if let Some(rest) = strip_prefix_ignore_case(token, RAW_PREFIX) {
            let rest = rest.trim();
            return (!rest.is_empty()).then(|| AuthHeader::Raw(rest.to_string()));
        }
        if let Some(rest) = strip_prefix_ignore_case(token, "Bearer ") {
            let rest = rest.trim();
            return (!rest.is_empty()).then(|| AuthHeader::Bearer(rest.to_string()));
        }
        Some(AuthHeader::Bearer(token.to_string()))
    }

    /// Bare token for the one-shot retry after a 401
    pub fn raw_fallback(token: &str) -> Option<Self> {
        let token = token.trim();
        let bare = strip_prefix_ignore_case(token, RAW_PREFIX)
            .or_else(|| strip_prefix_ignore_case(token, BEARER_PREFIX))
            .unwrap_or(token)
            .trim();
        (!bare.is_empty()).then(|| AuthHeader::Raw(bare.to_string()))
    }

    pub fn header_value(&self) -> String {
        match self {
            AuthHeader::Bearer(token) => format!("Bearer {token}"),
            AuthHeader::Raw(token) => token.clone(),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            AuthHeader::Bearer(_) => "bearer",
            AuthHeader::Raw(_) => "raw",
        }
    }
}

// Tokens never reach logs.
impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = match self {
            AuthHeader::Bearer(t) | AuthHeader::Raw(t) => t.len(),
        };
        write!(f, "AuthHeader({}, {len} chars)", self.mode())
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub completion_time_seconds: u32,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn from_value(body: &Value) -> Result<Self, serde_json::Error> {
        Envelope::deserialize(body)
    }

    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
    }
}

/// The envelope `code` of a body, when it has one
pub fn envelope_code(body: &Value) -> Option<i64> {
    body.get("code").map(|code| code.as_i64().unwrap_or(0))
}

/// A submission body is accepted when its `code` is 200 or 201, or absent.
pub fn submission_accepted(body: &Value) -> bool {
    match envelope_code(body) {
        Some(code) => code == 200 || code == 201,
        None => true,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLeaderboardItem {
    #[serde(default, alias = "userName")]
    username: Option<String>,
    #[serde(default)]
    complete_time_seconds: Option<i64>,
    #[serde(default)]
    completion_time_seconds: Option<i64>,
    #[serde(default)]
    time_seconds: Option<i64>,
    #[serde(default)]
    complete_at: Option<String>,
}

impl WireLeaderboardItem {
    fn into_entry(self) -> Option<LeaderboardEntry> {
        let seconds = self
            .complete_time_seconds
            .or(self.completion_time_seconds)
            .or(self.time_seconds)
            .unwrap_or(0);
        if seconds <= 0 {
            return None;
        }
        let seconds = u32::try_from(seconds).ok()?;
        let username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        Some(LeaderboardEntry::new(
            username,
            seconds,
            self.complete_at.unwrap_or_default(),
        ))
    }
}

/// Extract leaderboard entries from a response body.
///
/// The envelope `code` must be 200. Items are read from `data.items`,
/// `data.leaderboard`, `data.data`, or `data` itself when it is an array.
/// Items without a positive time are skipped; a malformed item is skipped
/// rather than failing the whole list. Order is preserved as received.
pub fn parse_leaderboard(body: &Value) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
    let envelope =
        Envelope::from_value(body).map_err(|err| LeaderboardError::Parse(err.to_string()))?;

    match envelope.code {
        Some(200) => {}
        Some(code) => {
            return Err(LeaderboardError::Parse(format!(
                "envelope code {code}: {}",
                envelope.message_or("no message")
            )))
        }
        None => return Err(LeaderboardError::Parse("missing envelope code".to_string())),
    }

    let items = match &envelope.data {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Object(data)) => ["items", "leaderboard", "data"]
            .iter()
            .find_map(|key| data.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };

    Ok(items
        .iter()
        .filter_map(|item| WireLeaderboardItem::deserialize(item).ok())
        .filter_map(WireLeaderboardItem::into_entry)
        .collect())
}

/// Token carried by a successful login body, trimmed
pub fn login_token(body: &Value) -> Option<String> {
    body.get("data")
        .and_then(|data| data.get("token"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
