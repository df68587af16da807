//! Username/password login.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::{LoginError, TransportError};
use crate::protocol::{login_token, ApiResponse, Envelope, LoginRequest};
use crate::session::Session;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub username: String,
    pub is_paid: bool,
}

pub struct AuthClient {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    endpoint: String,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    pub fn new(
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            session,
            transport,
            endpoint: config.login_endpoint.clone(),
        }
    }

    /// Exchange credentials for a token and store it in the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, LoginError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(LoginError::EmptyCredentials);
        }

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let body = serde_json::to_value(&request)
            .map_err(|err| LoginError::Network(TransportError::Body(err.to_string())))?;

        let response = match self.transport.post(&self.endpoint, &body, None).await {
            ApiResponse::Success(body) => body,
            ApiResponse::Error { code, message } => {
                warn!(code, "login rejected");
                return Err(match code {
                    401 => LoginError::InvalidCredentials,
                    404 => LoginError::UserNotFound,
                    500 => LoginError::Server,
                    _ => LoginError::Rejected(message),
                });
            }
            ApiResponse::Exception(err) => {
                warn!(error = %err, "login request failed");
                return Err(LoginError::Network(err));
            }
        };

        let envelope = Envelope::from_value(&response).map_err(|_| LoginError::MalformedResponse)?;
        if envelope.code != Some(200) {
            return Err(LoginError::Rejected(
                envelope.message_or("Unknown error").to_string(),
            ));
        }
        let token = login_token(&response).ok_or(LoginError::EmptyToken)?;

        let is_paid = self.session.sign_in(username, &token)?;
        info!(username, "login succeeded");
        Ok(LoginOutcome {
            username: username.to_string(),
            is_paid,
        })
    }

    pub fn logout(&self) -> Result<(), LoginError> {
        Ok(self.session.sign_out()?)
    }
}
