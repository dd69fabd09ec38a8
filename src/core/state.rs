//! # Application State
//!
//! Core business state for Keystone. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── provider: Arc<dyn IdentityProvider>  // identity service
//! ├── bootstrapper: Bootstrapper           // session status + startup ticket
//! ├── store: StoreState                    // persisted preferences
//! ├── store_restored: bool                 // restored gate
//! ├── localizer: Localizer                 // active language + dictionary
//! ├── profile_name: String                 // selected identity profile
//! ├── user: Option<Session>                // who is signed in
//! ├── status_message: String               // status bar text
//! ├── error: Option<String>                // last flow error
//! └── busy: bool                           // identity call in flight
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use std::sync::Arc;

use crate::core::bootstrap::{Bootstrapper, SessionStatus};
use crate::core::i18n::Localizer;
use crate::core::store::StoreState;
use crate::identity::{IdentityProvider, Session};

/// Which top-level subtree to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Rendering policy: nothing but the loading view until both the store is
/// restored and the session status has settled.
pub fn select_view(status: SessionStatus, store_restored: bool) -> View {
    if !store_restored {
        return View::Loading;
    }
    match status {
        SessionStatus::Initializing => View::Loading,
        SessionStatus::LoggedIn => View::Authenticated,
        SessionStatus::LoggedOut => View::Unauthenticated,
    }
}

pub struct App {
    pub provider: Arc<dyn IdentityProvider>,
    pub bootstrapper: Bootstrapper,
    pub store: StoreState,
    pub store_restored: bool,
    pub localizer: Localizer,
    pub profile_name: String,
    pub user: Option<Session>,
    pub status_message: String,
    pub error: Option<String>,
    /// True while a sign-in/up/out call is in flight.
    pub busy: bool,
    /// Language requested by config/CLI; wins over the stored preference.
    pub language_override: Option<String>,
}

impl App {
    pub fn new(provider: Arc<dyn IdentityProvider>, localizer: Localizer, profile_name: String) -> Self {
        Self {
            provider,
            bootstrapper: Bootstrapper::new(),
            store: StoreState::default(),
            store_restored: false,
            localizer,
            profile_name,
            user: None,
            status_message: String::new(),
            error: None,
            busy: false,
            language_override: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.bootstrapper.status()
    }

    pub fn view(&self) -> View {
        select_view(self.status(), self.store_restored)
    }

    /// Shorthand for the active-language text of `key`.
    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.localizer.t(key)
    }
}
