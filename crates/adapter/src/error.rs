use thiserror::Error;

/// Failure below the HTTP status line: the request never produced a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response body: {0}")]
    Body(String),
    #[error("http client setup failed: {0}")]
    Client(String),
    #[error("request cancelled")]
    Cancelled,
}

impl TransportError {
    /// A momentary failure worth retrying on a later view
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout
                | TransportError::Connect(_)
                | TransportError::Network(_)
                | TransportError::Cancelled
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::Body(err.to_string())
        } else if err.is_builder() {
            TransportError::Client(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("local store encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    #[error("leaderboard endpoint not found")]
    EndpointNotFound,
    #[error("HTTP {code}: {message}")]
    Http { code: u16, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected leaderboard response: {0}")]
    Parse(String),
}

impl LeaderboardError {
    /// Timeouts, throttling, and server-side failures may clear up on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            LeaderboardError::Http { code, .. } => matches!(code, 408 | 429 | 500..=599),
            LeaderboardError::Transport(err) => err.is_transient(),
            LeaderboardError::EndpointNotFound | LeaderboardError::Parse(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Username and password cannot be empty")]
    EmptyCredentials,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Server error, please try again later")]
    Server,
    #[error("Login failed: {0}")]
    Rejected(String),
    #[error("Invalid server response format")]
    MalformedResponse,
    #[error("Server returned empty token")]
    EmptyToken,
    #[error("Network connection failed, please check your network")]
    Network(#[source] TransportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
