//! # Authenticated Navigator
//!
//! A drawer on the left (Home, Settings) and the selected screen on the
//! right. Ctrl+L asks to sign out; once the identity service confirms, the
//! event loop reports `Action::UpdateStatus(LoggedOut)` and the
//! unauthenticated navigator takes over.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Padding, Paragraph, Wrap};

use crate::core::i18n::Localizer;
use crate::identity::Session;
use crate::tui::component::EventHandler;
use crate::tui::event::TuiEvent;

const DRAWER_WIDTH: u16 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeScreen {
    Home,
    Settings,
}

impl HomeScreen {
    const ALL: [HomeScreen; 2] = [HomeScreen::Home, HomeScreen::Settings];

    fn title_key(self) -> &'static str {
        match self {
            HomeScreen::Home => "home.title",
            HomeScreen::Settings => "settings.title",
        }
    }

    fn index(self) -> usize {
        match self {
            HomeScreen::Home => 0,
            HomeScreen::Settings => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeEvent {
    SignOut,
}

pub struct HomeNavigatorState {
    pub screen: HomeScreen,
}

impl Default for HomeNavigatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl HomeNavigatorState {
    pub fn new() -> Self {
        Self {
            screen: HomeScreen::Home,
        }
    }

    fn step(&mut self, forward: bool) {
        let len = HomeScreen::ALL.len();
        let index = self.screen.index();
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        self.screen = HomeScreen::ALL[next];
    }
}

impl EventHandler for HomeNavigatorState {
    type Event = HomeEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<HomeEvent> {
        match event {
            TuiEvent::SignOut => Some(HomeEvent::SignOut),
            TuiEvent::NextField => {
                self.step(true);
                None
            }
            TuiEvent::PrevField => {
                self.step(false);
                None
            }
            _ => None,
        }
    }
}

/// Props for the screens on the right-hand side.
pub struct HomeProps<'a> {
    pub user: Option<&'a Session>,
    pub profile: &'a str,
    pub localizer: &'a Localizer,
}

/// Transient render wrapper for the authenticated navigator.
pub struct HomeNavigator<'a> {
    state: &'a HomeNavigatorState,
    props: HomeProps<'a>,
}

impl<'a> HomeNavigator<'a> {
    pub fn new(state: &'a HomeNavigatorState, props: HomeProps<'a>) -> Self {
        Self { state, props }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let t = |key: &'static str| self.props.localizer.t(key);
        let [drawer_area, content_area] =
            Layout::horizontal([Constraint::Length(DRAWER_WIDTH), Constraint::Min(0)]).areas(area);
        let [content_area, hint_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(content_area);

        let items: Vec<ListItem> = HomeScreen::ALL
            .iter()
            .map(|screen| ListItem::new(t(screen.title_key())))
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(self.state.screen.index()));
        let drawer = List::new(items)
            .block(Block::bordered().title(t("app.title")))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(drawer, drawer_area, &mut list_state);

        let username = self.props.user.map_or("", |u| u.username.as_str());
        let lines: Vec<Line> = match self.state.screen {
            HomeScreen::Home => {
                let mut lines = vec![Line::from(Span::styled(
                    self.props
                        .localizer
                        .t_with("home.welcome", &[("name", username)]),
                    Style::default().add_modifier(Modifier::BOLD),
                ))];
                if let Some(email) = self.props.user.and_then(|u| u.email.as_deref()) {
                    lines.push(Line::from(Span::styled(
                        email.to_string(),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines
            }
            HomeScreen::Settings => vec![
                Line::from(format!("{}: {}", t("settings.account"), username)),
                Line::from(format!("{}: {}", t("settings.profile"), self.props.profile)),
                Line::from(format!(
                    "{}: {}",
                    t("language"),
                    self.props.localizer.active().name
                )),
            ],
        };

        let content = Paragraph::new(lines)
            .block(
                Block::bordered()
                    .title(t(self.state.screen.title_key()))
                    .padding(Padding::uniform(1)),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(content, content_area);

        frame.render_widget(
            Paragraph::new(t("home.hint")).style(Style::default().fg(Color::DarkGray)),
            hint_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{buffer_text, sample_session};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_sign_out_shortcut() {
        let mut nav = HomeNavigatorState::new();
        assert_eq!(nav.handle_event(&TuiEvent::SignOut), Some(HomeEvent::SignOut));
        assert_eq!(nav.handle_event(&TuiEvent::InputChar('q')), None);
    }

    #[test]
    fn test_tab_cycles_screens() {
        let mut nav = HomeNavigatorState::new();
        nav.handle_event(&TuiEvent::NextField);
        assert_eq!(nav.screen, HomeScreen::Settings);
        nav.handle_event(&TuiEvent::NextField);
        assert_eq!(nav.screen, HomeScreen::Home);
        nav.handle_event(&TuiEvent::PrevField);
        assert_eq!(nav.screen, HomeScreen::Settings);
    }

    #[test]
    fn test_render_home_and_settings() {
        let localizer = Localizer::builtin();
        let session = sample_session("ada");
        let mut nav = HomeNavigatorState::new();
        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();

        terminal
            .draw(|f| {
                let props = HomeProps {
                    user: Some(&session),
                    profile: "prod",
                    localizer: &localizer,
                };
                HomeNavigator::new(&nav, props).render(f, f.area());
            })
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Welcome, ada!"));
        assert!(text.contains("ada@example.com"));

        nav.screen = HomeScreen::Settings;
        terminal
            .draw(|f| {
                let props = HomeProps {
                    user: Some(&session),
                    profile: "prod",
                    localizer: &localizer,
                };
                HomeNavigator::new(&nav, props).render(f, f.area());
            })
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Identity profile: prod"));
        assert!(text.contains("Language: English"));
    }
}
