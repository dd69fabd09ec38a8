//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::core::i18n::Localizer;
use crate::core::state::App;
use crate::identity::{IdentityError, IdentityProvider, Session, SignUpOutcome, SignUpRequest};

pub fn sample_session(username: &str) -> Session {
    Session {
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        access_token: "access-token".to_string(),
        id_token: None,
        refresh_token: Some("refresh-token".to_string()),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// An in-memory provider whose answers are set up by the test.
pub struct ScriptedProvider {
    current: Mutex<Result<Session, IdentityError>>,
    sign_out_error: Mutex<Option<IdentityError>>,
    session_queries: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl ScriptedProvider {
    fn with_current(current: Result<Session, IdentityError>) -> Self {
        Self {
            current: Mutex::new(current),
            sign_out_error: Mutex::new(None),
            session_queries: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn signed_in(username: &str) -> Self {
        Self::with_current(Ok(sample_session(username)))
    }

    pub fn signed_out() -> Self {
        Self::with_current(Err(IdentityError::NoSession))
    }

    pub fn failing(error: IdentityError) -> Self {
        Self::with_current(Err(error))
    }

    pub fn fail_sign_out(&self, error: IdentityError) {
        *self.sign_out_error.lock().unwrap() = Some(error);
    }

    pub fn session_queries(&self) -> usize {
        self.session_queries.load(Ordering::SeqCst)
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn current_session(&self) -> Result<Session, IdentityError> {
        self.session_queries.fetch_add(1, Ordering::SeqCst);
        self.current.lock().unwrap().clone()
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        match self.sign_out_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => {
                *self.current.lock().unwrap() = Err(IdentityError::NoSession);
                Ok(())
            }
        }
    }

    async fn sign_in(&self, username: &str, _password: &str) -> Result<Session, IdentityError> {
        let session = sample_session(username);
        *self.current.lock().unwrap() = Ok(session.clone());
        Ok(session)
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, IdentityError> {
        Ok(SignUpOutcome {
            username: request.username,
            confirmed: false,
        })
    }

    async fn confirm_sign_up(&self, _username: &str, code: &str) -> Result<(), IdentityError> {
        if code == "000000" {
            return Err(IdentityError::NotAuthorized("Invalid verification code".into()));
        }
        Ok(())
    }
}

/// Creates a test App backed by a signed-out ScriptedProvider and the built-in dictionary.
pub fn test_app() -> App {
    App::new(
        std::sync::Arc::new(ScriptedProvider::signed_out()),
        Localizer::builtin(),
        "default".to_string(),
    )
}

/// Flattens a test terminal's buffer into one string for `contains` checks.
pub fn buffer_text(terminal: &ratatui::Terminal<ratatui::backend::TestBackend>) -> String {
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect()
}
