//! # Session Bootstrapper
//!
//! Decides, once per process, whether the user already has a session, and
//! owns the three-valued status that picks the visible navigator.
//!
//! ```text
//!                 initialize()
//!  Initializing ───────────────▶ query ──ok──▶ LoggedIn
//!                                  │
//!                                  └──err──▶ LoggedOut
//!
//!  LoggedIn ◀──── update_status(..) ────▶ LoggedOut
//! ```
//!
//! ## Startup race
//!
//! The startup query runs in the background while screens are already live.
//! Each query carries a [`QueryTicket`] stamped with the generation at issue
//! time. Every `update_status` bumps the generation, so a query result that
//! lands after an explicit update is stale and gets dropped: the last
//! explicit write wins.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::identity::{IdentityError, IdentityProvider, Session};

/// Which navigator the app is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Initializing,
    LoggedIn,
    LoggedOut,
}

impl SessionStatus {
    pub fn is_settled(self) -> bool {
        !matches!(self, SessionStatus::Initializing)
    }
}

/// The statuses a screen may force. `Initializing` is only ever the start state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedIn,
    LoggedOut,
}

impl From<AuthStatus> for SessionStatus {
    fn from(status: AuthStatus) -> Self {
        match status {
            AuthStatus::LoggedIn => SessionStatus::LoggedIn,
            AuthStatus::LoggedOut => SessionStatus::LoggedOut,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Initializing => write!(f, "initializing"),
            SessionStatus::LoggedIn => write!(f, "loggedIn"),
            SessionStatus::LoggedOut => write!(f, "loggedOut"),
        }
    }
}

/// Proof that a startup query was issued at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    generation: u64,
}

/// Outcome of a sign-out attempt, handed back to the screen that asked.
#[derive(Debug, Clone, PartialEq)]
pub enum SignOutOutcome {
    SignedOut,
    Failed(IdentityError),
}

impl SignOutOutcome {
    pub fn is_signed_out(&self) -> bool {
        matches!(self, SignOutOutcome::SignedOut)
    }
}

#[derive(Debug, Default)]
pub struct Bootstrapper {
    status: SessionStatus,
    generation: u64,
    query_issued: bool,
}

impl Bootstrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }


    /// Issues the ticket for the startup query. Only the first call gets one.
    pub fn initialize(&mut self) -> Option<QueryTicket> {
        if self.query_issued {
            debug!("Startup session query already issued, ignoring initialize()");
            return None;
        }
        self.query_issued = true;
        Some(QueryTicket {
            generation: self.generation,
        })
    }

    /// Applies the startup query result. Returns false if an explicit
    /// `update_status` already superseded this ticket.
    pub fn resolve_startup(
        &mut self,
        ticket: QueryTicket,
        outcome: &Result<Session, IdentityError>,
    ) -> bool {
        if ticket.generation != self.generation {
            info!(
                "Dropping stale startup session result (ticket gen {}, current gen {})",
                ticket.generation, self.generation
            );
            return false;
        }
        self.status = match outcome {
            Ok(_) => SessionStatus::LoggedIn,
            Err(_) => SessionStatus::LoggedOut,
        };
        true
    }

    /// Unconditionally overwrites the status.
    pub fn update_status(&mut self, status: AuthStatus) {
        self.generation += 1;
        let next = SessionStatus::from(status);
        if self.status != next {
            info!("Session status {} -> {}", self.status, next);
        }
        self.status = next;
    }
}

/// Runs the startup "who is signed in" query and hands the ticket back with the result.
pub async fn query_session(
    provider: Arc<dyn IdentityProvider>,
    ticket: QueryTicket,
) -> (QueryTicket, Result<Session, IdentityError>) {
    let result = provider.current_session().await;
    match &result {
        Ok(session) => info!("User is signed in as {}", session.username),
        Err(e) if e.is_no_session() => info!("User is not signed in"),
        Err(e) if e.is_transient() => {
            warn!("User is not signed in (session check failed: {})", e)
        }
        Err(e) => info!("User is not signed in ({})", e),
    }
    (ticket, result)
}

/// Asks the identity service to end the session. Never fails outward:
/// errors are logged and returned as `SignOutOutcome::Failed`.
pub async fn sign_out(provider: Arc<dyn IdentityProvider>) -> SignOutOutcome {
    match provider.sign_out().await {
        Ok(()) => SignOutOutcome::SignedOut,
        Err(e) => {
            warn!("Error signing out: {}", e);
            SignOutOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, sample_session};

    #[test]
    fn test_starts_initializing() {
        let boot = Bootstrapper::new();
        assert_eq!(boot.status(), SessionStatus::Initializing);
        assert!(!boot.status().is_settled());
    }

    #[test]
    fn test_initialize_issues_one_ticket() {
        let mut boot = Bootstrapper::new();
        assert!(boot.initialize().is_some());
        assert!(boot.initialize().is_none());
        assert!(boot.initialize().is_none());
    }

    #[test]
    fn test_successful_query_logs_in() {
        let mut boot = Bootstrapper::new();
        let ticket = boot.initialize().unwrap();
        assert!(boot.resolve_startup(ticket, &Ok(sample_session("ada"))));
        assert_eq!(boot.status(), SessionStatus::LoggedIn);
    }

    #[test]
    fn test_every_failure_logs_out() {
        let failures = [
            IdentityError::NoSession,
            IdentityError::Network("connection refused".into()),
            IdentityError::Parse("garbage".into()),
            IdentityError::Storage("permission denied".into()),
        ];
        for failure in failures {
            let mut boot = Bootstrapper::new();
            let ticket = boot.initialize().unwrap();
            assert!(boot.resolve_startup(ticket, &Err(failure)));
            assert_eq!(boot.status(), SessionStatus::LoggedOut);
        }
    }

    #[test]
    fn test_update_status_overwrites_any_state() {
        let mut boot = Bootstrapper::new();
        boot.update_status(AuthStatus::LoggedIn);
        assert_eq!(boot.status(), SessionStatus::LoggedIn);
        boot.update_status(AuthStatus::LoggedOut);
        assert_eq!(boot.status(), SessionStatus::LoggedOut);
        boot.update_status(AuthStatus::LoggedOut);
        assert_eq!(boot.status(), SessionStatus::LoggedOut);
    }

    #[test]
    fn test_explicit_update_beats_late_startup_result() {
        let mut boot = Bootstrapper::new();
        let ticket = boot.initialize().unwrap();

        // Screen signs in before the startup query settles.
        boot.update_status(AuthStatus::LoggedIn);
        assert!(!boot.resolve_startup(ticket, &Err(IdentityError::NoSession)));
        assert_eq!(boot.status(), SessionStatus::LoggedIn);
    }

    #[tokio::test]
    async fn test_query_session_returns_ticket_and_result() {
        let provider = Arc::new(ScriptedProvider::signed_in("ada"));
        let mut boot = Bootstrapper::new();
        let ticket = boot.initialize().unwrap();

        let (returned, result) = query_session(provider.clone(), ticket).await;
        assert_eq!(returned, ticket);
        assert_eq!(result.unwrap().username, "ada");
        assert_eq!(provider.session_queries(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_service_resolves_logged_out() {
        let provider = Arc::new(ScriptedProvider::failing(IdentityError::Network(
            "connection refused".into(),
        )));
        let mut boot = Bootstrapper::new();
        let ticket = boot.initialize().unwrap();

        let (returned, result) = query_session(provider, ticket).await;
        assert!(result.as_ref().is_err_and(IdentityError::is_transient));
        assert!(boot.resolve_startup(returned, &result));
        assert_eq!(boot.status(), SessionStatus::LoggedOut);
    }

    #[tokio::test]
    async fn test_sign_out_failure_is_returned_not_raised() {
        let provider = Arc::new(ScriptedProvider::signed_in("ada"));
        provider.fail_sign_out(IdentityError::Network("offline".into()));

        let outcome = sign_out(provider.clone()).await;
        assert_eq!(
            outcome,
            SignOutOutcome::Failed(IdentityError::Network("offline".into()))
        );
        assert!(!outcome.is_signed_out());
    }

    #[tokio::test]
    async fn test_sign_out_success() {
        let provider = Arc::new(ScriptedProvider::signed_in("ada"));
        assert!(sign_out(provider.clone()).await.is_signed_out());
        assert_eq!(provider.sign_outs(), 1);
    }
}
