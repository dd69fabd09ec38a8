//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Startup
//!
//! Two background jobs start before the first frame:
//!
//! - the persisted store is restored on a blocking thread (`StoreRestored`)
//! - the startup session query runs once (`SessionResolved`)
//!
//! Until both land, the loading view is the only thing drawn.
//!
//! ## Redraw Strategy
//!
//! - **Animating** (loading view or identity call in flight): draws every
//!   ~80ms for the spinner.
//! - **Idle**: sleeps up to 500ms and only redraws on events, resize, or
//!   background actions.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::bootstrap;
use crate::core::state::{App, View};
use crate::core::store;
use crate::tui::component::EventHandler;
use crate::tui::components::{AuthEvent, AuthNavigatorState, HomeEvent, HomeNavigatorState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub auth: AuthNavigatorState,
    pub home: HomeNavigatorState,
}

impl TuiState {
    pub fn new(last_username: Option<&str>) -> Self {
        let mut auth = AuthNavigatorState::new();
        if last_username.is_some() {
            auth.show_sign_in(last_username);
        }
        Self {
            auth,
            home: HomeNavigatorState::new(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,                        // Show cursor for form editing
            SetCursorStyle::SteadyBlock, // Non-blinking: avoids blink timer reset from continuous redraws
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(mut app: App, store_path: PathBuf) -> std::io::Result<()> {
    let mut tui = TuiState::new(None);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    spawn_store_restore(store_path.clone(), tx.clone());
    if let Some(ticket) = app.bootstrapper.initialize() {
        let provider = app.provider.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let (ticket, result) = bootstrap::query_session(provider, ticket).await;
            send(&tx, Action::SessionResolved { ticket, result });
        });
    }

    // Animation timer
    let start_time = std::time::Instant::now();
    let mut needs_redraw = true; // Force first frame

    'main: loop {
        let animating = app.view() == View::Loading || app.busy;
        if animating {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        // Dynamic poll timeout: short when animating (~12fps), long when idle
        let timeout = if animating {
            std::time::Duration::from_millis(80)
        } else {
            std::time::Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if let Some(action) = route_event(&app, &mut tui, event) {
                let effect = update(&mut app, action);
                if !execute_effect(&app, effect, &store_path, &tx) {
                    break 'main;
                }
            }
        }

        // Handle background task actions
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {}", action.name());
            let previous = app.view();
            let navigation = navigation_for(&action);
            let effect = update(&mut app, action);
            apply_navigation(&app, &mut tui, navigation, previous);
            if !execute_effect(&app, effect, &store_path, &tx) {
                break 'main;
            }
        }
    }

    if app.store_restored
        && let Err(e) = store::persist(&store_path, &app.store)
    {
        warn!("Failed to persist store on exit: {}", e);
    }

    ratatui::restore();
    Ok(())
}

/// Maps a terminal event to a core action, letting the active navigator
/// consume it first.
fn route_event(app: &App, tui: &mut TuiState, event: TuiEvent) -> Option<Action> {
    match event {
        // Resize just needs a redraw (already flagged)
        TuiEvent::Resize => None,
        TuiEvent::ForceQuit => Some(Action::Quit),
        TuiEvent::CycleLanguage => Some(Action::CycleLanguage),
        _ => match app.view() {
            View::Loading => None,
            View::Unauthenticated => {
                tui.auth.handle_event(&event).map(|auth_event| match auth_event {
                    AuthEvent::SignIn { username, password } => {
                        Action::SignInRequested { username, password }
                    }
                    AuthEvent::SignUp(request) => Action::SignUpRequested(request),
                    AuthEvent::Confirm { username, code } => {
                        Action::ConfirmRequested { username, code }
                    }
                })
            }
            View::Authenticated => tui.home.handle_event(&event).map(|home_event| match home_event {
                HomeEvent::SignOut => Action::SignOutRequested,
            }),
        },
    }
}

/// Screen changes a background action implies once `update()` has run.
enum Navigation {
    None,
    Confirm(String),
    SignIn(String),
}

fn navigation_for(action: &Action) -> Navigation {
    match action {
        Action::SignUpFinished {
            result: Ok(outcome),
            ..
        } if outcome.confirmed => Navigation::SignIn(outcome.username.clone()),
        Action::SignUpFinished {
            result: Ok(outcome),
            ..
        } => Navigation::Confirm(outcome.username.clone()),
        Action::ConfirmFinished {
            username,
            result: Ok(()),
        } => Navigation::SignIn(username.clone()),
        _ => Navigation::None,
    }
}

/// `previous` is the view before `update()` ran; navigator resets only
/// happen when the view actually changes.
fn apply_navigation(app: &App, tui: &mut TuiState, navigation: Navigation, previous: View) {
    match navigation {
        Navigation::Confirm(username) => tui.auth.show_confirm(&username),
        Navigation::SignIn(username) => tui.auth.show_sign_in(Some(&username)),
        Navigation::None => {}
    }

    match (previous, app.view()) {
        // Signed out: next visit starts from a clean sign-in screen.
        (View::Authenticated, View::Unauthenticated) => {
            *tui = TuiState::new(app.store.preferences.last_username.as_deref());
        }
        // Startup settled logged out: pre-fill the remembered username.
        (View::Loading, View::Unauthenticated)
            if tui.auth.sign_in.value(0).is_empty() && app.store.preferences.last_username.is_some() =>
        {
            tui.auth.show_sign_in(app.store.preferences.last_username.as_deref());
        }
        (View::Loading | View::Unauthenticated, View::Authenticated) => {
            tui.home = HomeNavigatorState::new()
        }
        _ => {}
    }
}

/// Performs the I/O an `Effect` asks for. Returns `false` when the app should quit.
fn execute_effect(app: &App, effect: Effect, store_path: &Path, tx: &mpsc::Sender<Action>) -> bool {
    match effect {
        Effect::None => {}
        Effect::Quit => return false,
        // Writing before the restore lands would clobber the file with defaults.
        Effect::PersistStore if !app.store_restored => {
            debug!("Store not restored yet; skipping persist");
        }
        Effect::PersistStore => {
            if let Err(e) = store::persist(store_path, &app.store) {
                warn!("Failed to persist store: {}", e);
            }
        }
        Effect::SignIn { username, password } => {
            info!("Spawning sign-in for {}", username);
            let provider = app.provider.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = provider.sign_in(&username, &password).await;
                if let Err(e) = &result {
                    warn!("Sign-in failed for {}: {}", username, e);
                }
                send(&tx, Action::SignInFinished(result));
            });
        }
        Effect::SignUp(request) => {
            info!("Spawning sign-up for {}", request.username);
            let provider = app.provider.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let email = request.email.clone();
                let result = provider.sign_up(request).await;
                if let Err(e) = &result {
                    warn!("Sign-up failed: {}", e);
                }
                send(&tx, Action::SignUpFinished { email, result });
            });
        }
        Effect::ConfirmSignUp { username, code } => {
            info!("Spawning sign-up confirmation for {}", username);
            let provider = app.provider.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = provider.confirm_sign_up(&username, &code).await;
                if let Err(e) = &result {
                    warn!("Confirmation failed for {}: {}", username, e);
                }
                send(&tx, Action::ConfirmFinished { username, result });
            });
        }
        Effect::SignOut => {
            info!("Spawning sign-out");
            let provider = app.provider.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = bootstrap::sign_out(provider).await;
                send(&tx, Action::SignOutFinished(outcome));
            });
        }
    }
    true
}

fn spawn_store_restore(path: PathBuf, tx: mpsc::Sender<Action>) {
    tokio::task::spawn_blocking(move || {
        let state = store::restore(&path);
        send(&tx, Action::StoreRestored(state));
    });
}

fn send(tx: &mpsc::Sender<Action>, action: Action) {
    let name = action.name();
    if tx.send(action).is_err() {
        warn!("Failed to send {}: receiver dropped", name);
    }
}
