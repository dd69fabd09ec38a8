//! # Actions
//!
//! Everything that can happen in Keystone becomes an `Action`.
//! Startup session check settles? That's `Action::SessionResolved`.
//! A screen finishes signing in? That's `Action::SignInFinished(..)`.
//!
//! The `update()` function takes the current state and an action,
//! mutates it, and returns an `Effect` describing any I/O the adapter must
//! perform. No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! Screens never touch `SessionStatus` directly: the only way to move
//! between navigators is `Action::UpdateStatus`.

use log::{debug, info};

use crate::core::bootstrap::{AuthStatus, QueryTicket, SignOutOutcome};
use crate::core::state::App;
use crate::core::store::StoreState;
use crate::identity::{IdentityError, Session, SignUpOutcome, SignUpRequest};

#[derive(Debug)]
pub enum Action {
    /// Startup "current session" query settled.
    SessionResolved {
        ticket: QueryTicket,
        result: Result<Session, IdentityError>,
    },
    /// Persisted store finished loading; opens the restored gate.
    StoreRestored(StoreState),
    /// A screen reports the outcome of its own flow.
    UpdateStatus(AuthStatus),
    SignInRequested { username: String, password: String },
    SignInFinished(Result<Session, IdentityError>),
    SignUpRequested(SignUpRequest),
    SignUpFinished {
        email: String,
        result: Result<SignUpOutcome, IdentityError>,
    },
    ConfirmRequested { username: String, code: String },
    ConfirmFinished {
        username: String,
        result: Result<(), IdentityError>,
    },
    SignOutRequested,
    SignOutFinished(SignOutOutcome),
    CycleLanguage,
    Quit,
}

impl Action {
    /// Short label for logs. Credentials never reach the log file.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SessionResolved { .. } => "SessionResolved",
            Action::StoreRestored(_) => "StoreRestored",
            Action::UpdateStatus(AuthStatus::LoggedIn) => "UpdateStatus(LoggedIn)",
            Action::UpdateStatus(AuthStatus::LoggedOut) => "UpdateStatus(LoggedOut)",
            Action::SignInRequested { .. } => "SignInRequested",
            Action::SignInFinished(_) => "SignInFinished",
            Action::SignUpRequested(_) => "SignUpRequested",
            Action::SignUpFinished { .. } => "SignUpFinished",
            Action::ConfirmRequested { .. } => "ConfirmRequested",
            Action::ConfirmFinished { .. } => "ConfirmFinished",
            Action::SignOutRequested => "SignOutRequested",
            Action::SignOutFinished(_) => "SignOutFinished",
            Action::CycleLanguage => "CycleLanguage",
            Action::Quit => "Quit",
        }
    }
}

/// I/O the adapter performs after `update()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    PersistStore,
    SignIn { username: String, password: String },
    SignUp(SignUpRequest),
    ConfirmSignUp { username: String, code: String },
    SignOut,
}

fn all_filled(fields: &[&str]) -> bool {
    fields.iter().all(|field| !field.trim().is_empty())
}

pub fn update(app: &mut App, action: Action) -> Effect {
    debug!("update: {}", action.name());
    match action {
        Action::SessionResolved { ticket, result } => {
            if app.bootstrapper.resolve_startup(ticket, &result) {
                app.user = result.ok();
            }
            Effect::None
        }
        Action::StoreRestored(state) => {
            app.store_restored = true;
            let language = app
                .language_override
                .clone()
                .or_else(|| state.preferences.language.clone());
            if let Some(code) = language {
                app.localizer.set_active(&code);
            }
            app.store = state;
            Effect::None
        }
        Action::UpdateStatus(status) => {
            app.bootstrapper.update_status(status);
            if status == AuthStatus::LoggedOut {
                app.user = None;
            }
            app.error = None;
            app.busy = false;
            Effect::None
        }
        Action::SignInRequested { username, password } => {
            if app.busy {
                return Effect::None;
            }
            if !all_filled(&[username.as_str(), password.as_str()]) {
                app.error = Some(app.t("form.incomplete").to_string());
                return Effect::None;
            }
            app.busy = true;
            app.error = None;
            app.status_message = app.t("signin.pending").to_string();
            Effect::SignIn { username, password }
        }
        Action::SignInFinished(result) => {
            app.busy = false;
            app.status_message.clear();
            match result {
                Ok(session) => {
                    info!("Sign-in completed for {}", session.username);
                    app.store.preferences.last_username = Some(session.username.clone());
                    app.user = Some(session);
                    update(app, Action::UpdateStatus(AuthStatus::LoggedIn));
                    Effect::PersistStore
                }
                Err(e) => {
                    let reason = e.to_string();
                    app.error = Some(
                        app.localizer
                            .t_with("signin.failed", &[("error", reason.as_str())]),
                    );
                    Effect::None
                }
            }
        }
        Action::SignUpRequested(request) => {
            if app.busy {
                return Effect::None;
            }
            if !all_filled(&[
                request.username.as_str(),
                request.password.as_str(),
                request.email.as_str(),
            ]) {
                app.error = Some(app.t("form.incomplete").to_string());
                return Effect::None;
            }
            app.busy = true;
            app.error = None;
            app.status_message = app.t("signup.pending").to_string();
            Effect::SignUp(request)
        }
        Action::SignUpFinished { email, result } => {
            app.busy = false;
            match result {
                Ok(outcome) if outcome.confirmed => {
                    app.status_message = app.t("confirm.done").to_string();
                    app.store.preferences.last_username = Some(outcome.username);
                    Effect::PersistStore
                }
                Ok(_) => {
                    app.status_message = app
                        .localizer
                        .t_with("signup.code_sent", &[("email", email.as_str())]);
                    Effect::None
                }
                Err(e) => {
                    app.status_message.clear();
                    let reason = e.to_string();
                    app.error = Some(
                        app.localizer
                            .t_with("signup.failed", &[("error", reason.as_str())]),
                    );
                    Effect::None
                }
            }
        }
        Action::ConfirmRequested { username, code } => {
            if app.busy {
                return Effect::None;
            }
            if !all_filled(&[username.as_str(), code.as_str()]) {
                app.error = Some(app.t("form.incomplete").to_string());
                return Effect::None;
            }
            app.busy = true;
            app.error = None;
            app.status_message = app.t("confirm.pending").to_string();
            Effect::ConfirmSignUp {
                username: username.trim().to_string(),
                code: code.trim().to_string(),
            }
        }
        Action::ConfirmFinished { username, result } => {
            app.busy = false;
            match result {
                Ok(()) => {
                    app.status_message = app.t("confirm.done").to_string();
                    app.store.preferences.last_username = Some(username);
                    Effect::PersistStore
                }
                Err(e) => {
                    app.status_message.clear();
                    let reason = e.to_string();
                    app.error = Some(
                        app.localizer
                            .t_with("confirm.failed", &[("error", reason.as_str())]),
                    );
                    Effect::None
                }
            }
        }
        Action::SignOutRequested => {
            if app.busy {
                return Effect::None;
            }
            app.busy = true;
            app.error = None;
            app.status_message = app.t("signout.pending").to_string();
            Effect::SignOut
        }
        Action::SignOutFinished(outcome) => {
            app.busy = false;
            app.status_message.clear();
            match outcome {
                SignOutOutcome::SignedOut => {
                    update(app, Action::UpdateStatus(AuthStatus::LoggedOut));
                }
                SignOutOutcome::Failed(e) => {
                    // Status stays put; the user is still signed in locally.
                    let reason = e.to_string();
                    app.error = Some(
                        app.localizer
                            .t_with("signout.failed", &[("error", reason.as_str())]),
                    );
                }
            }
            Effect::None
        }
        Action::CycleLanguage => {
            let code = app.localizer.cycle().code.clone();
            app.status_message = format!("{}: {}", app.t("language"), app.localizer.active().name);
            app.store.preferences.language = Some(code);
            Effect::PersistStore
        }
        Action::Quit => Effect::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bootstrap::SessionStatus;
    use crate::core::state::View;
    use crate::test_support::{sample_session, test_app};

    fn restored(app: &mut App) {
        update(app, Action::StoreRestored(StoreState::default()));
    }

    #[test]
    fn test_loading_until_query_settles() {
        let mut app = test_app();
        let ticket = app.bootstrapper.initialize().unwrap();
        restored(&mut app);
        assert_eq!(app.view(), View::Loading);

        update(
            &mut app,
            Action::SessionResolved {
                ticket,
                result: Err(IdentityError::NoSession),
            },
        );
        assert_eq!(app.view(), View::Unauthenticated);
    }

    #[test]
    fn test_loading_until_store_restored() {
        let mut app = test_app();
        let ticket = app.bootstrapper.initialize().unwrap();
        update(
            &mut app,
            Action::SessionResolved {
                ticket,
                result: Ok(sample_session("ada")),
            },
        );
        assert_eq!(app.status(), SessionStatus::LoggedIn);
        assert_eq!(app.view(), View::Loading);

        restored(&mut app);
        assert_eq!(app.view(), View::Authenticated);
        assert_eq!(app.user.as_ref().unwrap().username, "ada");
    }

    #[test]
    fn test_stale_startup_result_keeps_user() {
        let mut app = test_app();
        restored(&mut app);
        let ticket = app.bootstrapper.initialize().unwrap();

        update(&mut app, Action::SignInFinished(Ok(sample_session("bo"))));
        update(
            &mut app,
            Action::SessionResolved {
                ticket,
                result: Err(IdentityError::NoSession),
            },
        );
        assert_eq!(app.view(), View::Authenticated);
        assert_eq!(app.user.as_ref().unwrap().username, "bo");
    }

    #[test]
    fn test_update_status_switches_navigator() {
        let mut app = test_app();
        restored(&mut app);
        update(&mut app, Action::UpdateStatus(AuthStatus::LoggedIn));
        assert_eq!(app.view(), View::Authenticated);
        update(&mut app, Action::UpdateStatus(AuthStatus::LoggedOut));
        assert_eq!(app.view(), View::Unauthenticated);
    }

    #[test]
    fn test_sign_in_request_requires_fields() {
        let mut app = test_app();
        let effect = update(
            &mut app,
            Action::SignInRequested {
                username: "ada".to_string(),
                password: "  ".to_string(),
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(app.error.is_some());
        assert!(!app.busy);
    }

    #[test]
    fn test_sign_in_round_trip() {
        let mut app = test_app();
        restored(&mut app);
        let effect = update(
            &mut app,
            Action::SignInRequested {
                username: "ada".to_string(),
                password: "hunter22".to_string(),
            },
        );
        assert_eq!(
            effect,
            Effect::SignIn {
                username: "ada".to_string(),
                password: "hunter22".to_string()
            }
        );
        assert!(app.busy);

        // A second submit while in flight is ignored.
        let again = update(
            &mut app,
            Action::SignInRequested {
                username: "ada".to_string(),
                password: "hunter22".to_string(),
            },
        );
        assert_eq!(again, Effect::None);

        let effect = update(&mut app, Action::SignInFinished(Ok(sample_session("ada"))));
        assert_eq!(effect, Effect::PersistStore);
        assert_eq!(app.view(), View::Authenticated);
        assert_eq!(app.store.preferences.last_username.as_deref(), Some("ada"));
        assert!(!app.busy);
    }

    #[test]
    fn test_sign_in_failure_stays_logged_out() {
        let mut app = test_app();
        restored(&mut app);
        update(&mut app, Action::UpdateStatus(AuthStatus::LoggedOut));
        update(
            &mut app,
            Action::SignInFinished(Err(IdentityError::NotAuthorized(
                "Incorrect username or password.".into(),
            ))),
        );
        assert_eq!(app.view(), View::Unauthenticated);
        assert!(app.error.as_deref().unwrap().contains("Incorrect username"));
    }

    #[test]
    fn test_sign_out_failure_keeps_status() {
        let mut app = test_app();
        restored(&mut app);
        update(&mut app, Action::SignInFinished(Ok(sample_session("ada"))));

        assert_eq!(update(&mut app, Action::SignOutRequested), Effect::SignOut);
        update(
            &mut app,
            Action::SignOutFinished(SignOutOutcome::Failed(IdentityError::Network(
                "offline".into(),
            ))),
        );
        assert_eq!(app.status(), SessionStatus::LoggedIn);
        assert!(app.user.is_some());
        assert!(app.error.as_deref().unwrap().contains("offline"));
        assert!(!app.busy);
    }

    #[test]
    fn test_sign_out_success_logs_out() {
        let mut app = test_app();
        restored(&mut app);
        update(&mut app, Action::SignInFinished(Ok(sample_session("ada"))));
        update(&mut app, Action::SignOutRequested);
        update(&mut app, Action::SignOutFinished(SignOutOutcome::SignedOut));
        assert_eq!(app.view(), View::Unauthenticated);
        assert!(app.user.is_none());
    }

    #[test]
    fn test_sign_up_unconfirmed_reports_code_sent() {
        let mut app = test_app();
        let effect = update(
            &mut app,
            Action::SignUpFinished {
                email: "ada@example.com".to_string(),
                result: Ok(SignUpOutcome {
                    username: "ada".to_string(),
                    confirmed: false,
                }),
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(app.status_message.contains("ada@example.com"));
    }

    #[test]
    fn test_confirm_trims_code() {
        let mut app = test_app();
        let effect = update(
            &mut app,
            Action::ConfirmRequested {
                username: "ada ".to_string(),
                code: " 123456 ".to_string(),
            },
        );
        assert_eq!(
            effect,
            Effect::ConfirmSignUp {
                username: "ada".to_string(),
                code: "123456".to_string()
            }
        );
    }

    #[test]
    fn test_store_language_applies_unless_overridden() {
        let mut app = test_app();
        let mut state = StoreState::default();
        state.preferences.language = Some("fr".to_string());
        update(&mut app, Action::StoreRestored(state.clone()));
        assert_eq!(app.localizer.active().code, "fr");

        let mut app = test_app();
        app.language_override = Some("es".to_string());
        update(&mut app, Action::StoreRestored(state));
        assert_eq!(app.localizer.active().code, "es");
    }

    #[test]
    fn test_cycle_language_persists_choice() {
        let mut app = test_app();
        let effect = update(&mut app, Action::CycleLanguage);
        assert_eq!(effect, Effect::PersistStore);
        assert_eq!(
            app.store.preferences.language.as_deref(),
            Some(app.localizer.active().code.as_str())
        );
        assert_ne!(app.localizer.active().code, "en");
    }

    #[tokio::test]
    async fn test_returning_user_signs_out_without_requery() {
        use crate::core::bootstrap;
        use crate::test_support::ScriptedProvider;
        use std::sync::Arc;

        let provider = Arc::new(ScriptedProvider::signed_in("ada"));
        let mut app = App::new(
            provider.clone(),
            crate::core::i18n::Localizer::builtin(),
            "default".to_string(),
        );
        restored(&mut app);

        let ticket = app.bootstrapper.initialize().unwrap();
        let (ticket, result) = bootstrap::query_session(app.provider.clone(), ticket).await;
        update(&mut app, Action::SessionResolved { ticket, result });
        assert_eq!(app.view(), View::Authenticated);

        assert_eq!(update(&mut app, Action::SignOutRequested), Effect::SignOut);
        let outcome = bootstrap::sign_out(app.provider.clone()).await;
        update(&mut app, Action::SignOutFinished(outcome));

        assert_eq!(app.view(), View::Unauthenticated);
        assert!(app.user.is_none());
        assert_eq!(provider.session_queries(), 1);
        assert_eq!(provider.sign_outs(), 1);
    }

    #[test]
    fn test_quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
