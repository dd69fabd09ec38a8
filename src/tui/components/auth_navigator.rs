//! # Unauthenticated Navigator
//!
//! Stack of the three screens reachable without a session:
//!
//! ```text
//! SignIn ──Ctrl+N──▶ SignUp ──code sent──▶ ConfirmSignUp
//!   ▲                  │                        │
//!   └───────Esc────────┴──────confirmed─────────┘
//! ```
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `AuthNavigatorState` lives in `TuiState`
//! - `AuthNavigator` is created each frame with borrowed state
//!
//! Screens emit `AuthEvent`s; the event loop turns them into core actions.
//! A successful sign-in ends with `Action::UpdateStatus(LoggedIn)`.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Padding, Paragraph, Wrap};

use crate::core::i18n::Localizer;
use crate::identity::SignUpRequest;
use crate::tui::component::EventHandler;
use crate::tui::components::text_field::{Form, TextField};
use crate::tui::event::TuiEvent;

const FORM_WIDTH: u16 = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScreen {
    SignIn,
    SignUp,
    ConfirmSignUp,
}

/// Events emitted by the unauthenticated navigator.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignIn { username: String, password: String },
    SignUp(SignUpRequest),
    Confirm { username: String, code: String },
}

// Field indices
const USERNAME: usize = 0;
const PASSWORD: usize = 1;
const EMAIL: usize = 2;
const CODE: usize = 1;

pub struct AuthNavigatorState {
    pub screen: AuthScreen,
    pub sign_in: Form,
    pub sign_up: Form,
    pub confirm: Form,
}

impl Default for AuthNavigatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthNavigatorState {
    pub fn new() -> Self {
        Self {
            screen: AuthScreen::SignIn,
            sign_in: Form::new(vec![
                TextField::new("signin.username"),
                TextField::masked("signin.password"),
            ]),
            sign_up: Form::new(vec![
                TextField::new("signin.username"),
                TextField::masked("signin.password"),
                TextField::new("signup.email"),
            ]),
            confirm: Form::new(vec![
                TextField::new("signin.username"),
                TextField::new("confirm.code"),
            ]),
        }
    }

    /// Back to the sign-in screen, optionally pre-filling the username.
    pub fn show_sign_in(&mut self, username: Option<&str>) {
        self.screen = AuthScreen::SignIn;
        self.sign_in.clear();
        if let Some(name) = username {
            self.sign_in.set(USERNAME, name);
            self.sign_in.focus(PASSWORD);
        }
    }

    pub fn show_confirm(&mut self, username: &str) {
        self.screen = AuthScreen::ConfirmSignUp;
        self.confirm.clear();
        self.confirm.set(USERNAME, username);
        self.confirm.focus(CODE);
    }

    fn active_form(&mut self) -> &mut Form {
        match self.screen {
            AuthScreen::SignIn => &mut self.sign_in,
            AuthScreen::SignUp => &mut self.sign_up,
            AuthScreen::ConfirmSignUp => &mut self.confirm,
        }
    }

    fn submit(&mut self) -> AuthEvent {
        match self.screen {
            AuthScreen::SignIn => AuthEvent::SignIn {
                username: self.sign_in.value(USERNAME).trim().to_string(),
                password: self.sign_in.value(PASSWORD).to_string(),
            },
            AuthScreen::SignUp => AuthEvent::SignUp(SignUpRequest {
                username: self.sign_up.value(USERNAME).trim().to_string(),
                password: self.sign_up.value(PASSWORD).to_string(),
                email: self.sign_up.value(EMAIL).trim().to_string(),
            }),
            AuthScreen::ConfirmSignUp => AuthEvent::Confirm {
                username: self.confirm.value(USERNAME).to_string(),
                code: self.confirm.value(CODE).to_string(),
            },
        }
    }
}

impl EventHandler for AuthNavigatorState {
    type Event = AuthEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<AuthEvent> {
        match event {
            TuiEvent::Submit => Some(self.submit()),
            TuiEvent::NewAccount => {
                let username = self.sign_in.value(USERNAME).to_string();
                self.screen = AuthScreen::SignUp;
                self.sign_up.clear();
                self.sign_up.set(USERNAME, &username);
                None
            }
            TuiEvent::Escape => {
                if self.screen != AuthScreen::SignIn {
                    self.show_sign_in(None);
                }
                None
            }
            other => {
                self.active_form().handle(other);
                None
            }
        }
    }
}

/// Transient render wrapper for the unauthenticated navigator.
pub struct AuthNavigator<'a> {
    state: &'a AuthNavigatorState,
    localizer: &'a Localizer,
}

impl<'a> AuthNavigator<'a> {
    pub fn new(state: &'a AuthNavigatorState, localizer: &'a Localizer) -> Self {
        Self { state, localizer }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (title_key, hint_key, form) = match self.state.screen {
            AuthScreen::SignIn => ("signin.title", "signin.hint", &self.state.sign_in),
            AuthScreen::SignUp => ("signup.title", "signup.hint", &self.state.sign_up),
            AuthScreen::ConfirmSignUp => ("confirm.title", "confirm.hint", &self.state.confirm),
        };

        // Borders (2) + padding (2) + form + spacer + two hint lines
        let panel_height = form.height() + 7;
        let [column] = Layout::horizontal([Constraint::Length(FORM_WIDTH)])
            .flex(Flex::Center)
            .areas(area);
        let [panel] = Layout::vertical([Constraint::Length(panel_height)])
            .flex(Flex::Center)
            .areas(column);

        let block = Block::bordered()
            .title(Line::from(self.localizer.t(title_key)).alignment(Alignment::Center))
            .title_style(Style::default().add_modifier(Modifier::BOLD))
            .padding(Padding::uniform(1));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let [form_area, _, hint_area] = Layout::vertical([
            Constraint::Length(form.height()),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);

        form.render(frame, form_area, |key| self.localizer.t(key));
        frame.render_widget(
            Paragraph::new(self.localizer.t(hint_key))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            hint_area,
        );
    }
}
