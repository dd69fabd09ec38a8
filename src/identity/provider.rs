use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur during identity operations.
/// Variants carry enough info to tell "nobody is signed in" apart from
/// "the service could not be reached".
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityError {
    /// No cached credentials, or the cached ones were rejected for good.
    NoSession,
    /// Provider misconfigured (missing pool id, bad endpoint). Not retryable.
    Config(String),
    /// Network-level failure (timeout, DNS, connection refused). Retryable.
    Network(String),
    /// The service rejected the credentials or token.
    NotAuthorized(String),
    /// Service returned an error response. Retryable if status >= 500 or 429.
    Api {
        status: u16,
        code: String,
        message: String,
    },
    /// Failed to parse the service's response. Not retryable.
    Parse(String),
    /// Reading or writing the local token cache failed.
    Storage(String),
}

impl IdentityError {
    pub fn is_no_session(&self) -> bool {
        matches!(self, IdentityError::NoSession)
    }

    /// True for failures that say nothing about whether a session exists.
    pub fn is_transient(&self) -> bool {
        match self {
            IdentityError::Network(_) => true,
            IdentityError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::NoSession => write!(f, "no active session"),
            IdentityError::Config(msg) => write!(f, "config error: {msg}"),
            IdentityError::Network(msg) => write!(f, "network error: {msg}"),
            IdentityError::NotAuthorized(msg) => write!(f, "not authorized: {msg}"),
            IdentityError::Api {
                status,
                code,
                message,
            } => write!(f, "identity service error (HTTP {status}, {code}): {message}"),
            IdentityError::Parse(msg) => write!(f, "parse error: {msg}"),
            IdentityError::Storage(msg) => write!(f, "token storage error: {msg}"),
        }
    }
}

impl std::error::Error for IdentityError {}

/// An authenticated session as reported by the identity service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// Tokens stay out of log files.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Everything the service needs to register a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub username: String,
    /// False when a confirmation code was sent and `confirm_sign_up` is still needed.
    pub confirmed: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Looks up the currently authenticated session, refreshing it if needed.
    async fn current_session(&self) -> Result<Session, IdentityError>;

    /// Ends the current session both remotely and locally.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, IdentityError>;

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, IdentityError>;

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            username: "ada".to_string(),
            email: None,
            access_token: "secret-access".to_string(),
            id_token: None,
            refresh_token: Some("secret-refresh".to_string()),
            expires_at,
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(IdentityError::Network("timeout".into()).is_transient());
        assert!(
            IdentityError::Api {
                status: 503,
                code: "ServiceUnavailable".into(),
                message: "down".into()
            }
            .is_transient()
        );
        assert!(
            !IdentityError::Api {
                status: 400,
                code: "InvalidParameterException".into(),
                message: "bad".into()
            }
            .is_transient()
        );
        assert!(!IdentityError::NoSession.is_transient());
        assert!(IdentityError::NoSession.is_no_session());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        assert!(session(now - Duration::seconds(1)).is_expired(now));
        assert!(!session(now + Duration::minutes(5)).is_expired(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", session(Utc::now()));
        assert!(rendered.contains("ada"));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
