//! Signed-in user and auth token.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::protocol::AuthHeader;
use crate::store::LocalStore;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USERNAME_KEY: &str = "username";
pub const IS_PAID_KEY: &str = "is_paid_user";

/// Name shown for runs recorded while signed out
pub const ANONYMOUS_NAME: &str = "You";

/// Session state read through an injected store
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn LocalStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username())
            .field("signed_in", &self.is_signed_in())
            .finish()
    }
}

impl Session {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    pub fn token(&self) -> Option<String> {
        non_blank(self.store.get(AUTH_TOKEN_KEY))
    }

    pub fn username(&self) -> Option<String> {
        non_blank(self.store.get(USERNAME_KEY))
    }

    pub fn display_name(&self) -> String {
        self.username()
            .unwrap_or_else(|| ANONYMOUS_NAME.to_string())
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_paid_user(&self) -> bool {
        self.store
            .get(IS_PAID_KEY)
            .is_some_and(|v| v == "true")
    }

    pub fn auth_header(&self) -> Option<AuthHeader> {
        self.token()
            .and_then(|token| AuthHeader::from_token(&token))
    }

    /// Persist a successful login. Returns the paid flag decoded from the token.
    pub fn sign_in(&self, username: &str, token: &str) -> Result<bool, StoreError> {
        let is_paid = is_paid_claim(token);
        self.store.set(AUTH_TOKEN_KEY, token.trim())?;
        self.store.set(USERNAME_KEY, username.trim())?;
        self.store
            .set(IS_PAID_KEY, if is_paid { "true" } else { "false" })?;
        info!(username = username.trim(), is_paid, "signed in");
        Ok(is_paid)
    }

    pub fn sign_out(&self) -> Result<(), StoreError> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(USERNAME_KEY)?;
        self.store.remove(IS_PAID_KEY)?;
        info!("signed out");
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the `IsPaid` claim from a JWT payload without verifying it.
///
/// Accepts `"true"` in any case or a JSON `true`; anything unreadable is unpaid.
pub fn is_paid_claim(token: &str) -> bool {
    let token = token.trim();
    let token = token
        .strip_prefix("Bearer ")
        .or_else(|| token.strip_prefix("bearer "))
        .unwrap_or(token)
        .trim();

    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let decoded = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(error = %err, "token payload is not base64url");
            return false;
        }
    };
    let claims: Value = match serde_json::from_slice(&decoded) {
        Ok(claims) => claims,
        Err(_) => return false,
    };

    match claims.get("IsPaid") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn jwt(claims: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2ln",
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_paid_claim() {
        assert!(is_paid_claim(&jwt(r#"{"IsPaid":"True"}"#)));
        assert!(is_paid_claim(&format!("Bearer {}", jwt(r#"{"IsPaid":true}"#))));
        assert!(!is_paid_claim(&jwt(r#"{"IsPaid":"false"}"#)));
        assert!(!is_paid_claim(&jwt(r#"{"sub":"x"}"#)));
        assert!(!is_paid_claim("not-a-jwt"));
        assert!(!is_paid_claim("a.%%%.c"));
    }

    #[test]
    fn test_sign_in_and_out() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        assert!(!session.is_signed_in());
        assert_eq!(session.display_name(), "You");
        assert!(session.auth_header().is_none());

        let paid = session
            .sign_in("alice", &jwt(r#"{"IsPaid":"true"}"#))
            .unwrap();
        assert!(paid);
        assert!(session.is_signed_in());
        assert!(session.is_paid_user());
        assert_eq!(session.username().as_deref(), Some("alice"));
        assert!(matches!(session.auth_header(), Some(AuthHeader::Bearer(_))));

        session.sign_out().unwrap();
        assert!(!session.is_signed_in());
        assert!(!session.is_paid_user());
    }

    #[test]
    fn test_blank_token_is_signed_out() {
        let store = Arc::new(MemoryStore::new());
        store.set(AUTH_TOKEN_KEY, "   ").unwrap();
        let session = Session::new(store);
        assert!(session.token().is_none());
    }
}
