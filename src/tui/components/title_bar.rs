//! # TitleBar Component
//!
//! Top status bar: app name, identity profile, active language, and either
//! the last error or the current status message.
//!
//! ## Stateless Component
//!
//! TitleBar is purely presentational. It receives all data as props and has
//! no internal state:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar {
//!     title: "Keystone".to_string(),
//!     profile: "prod".to_string(),
//!     language: "English".to_string(),
//!     status_message: "Signing in...".to_string(),
//!     error: None,
//! };
//! title_bar.render(frame, area);
//! ```
//!
//! ## Conditional Formatting
//!
//! 1. **Error**: `"Keystone [prod] English | ✗ Sign-in failed: ..."` (red)
//! 2. **Status message**: `"Keystone [prod] English | Signing in..."`
//! 3. **Default**: `"Keystone [prod] English"`
//!
//! Errors win over status messages so a failed flow is never hidden.

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

pub struct TitleBar {
    pub title: String,
    pub profile: String,
    pub language: String,
    pub status_message: String,
    pub error: Option<String>,
}

impl TitleBar {
    pub fn new(title: String, profile: String, language: String) -> Self {
        Self {
            title,
            profile,
            language,
            status_message: String::new(),
            error: None,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let head = format!("{} [{}] {}", self.title, self.profile, self.language);
        let line = match (&self.error, self.status_message.is_empty()) {
            (Some(error), _) => Line::from(vec![
                Span::raw(head),
                Span::raw(" | "),
                Span::styled(format!("✗ {error}"), Style::default().fg(Color::Red)),
            ]),
            (None, false) => Line::from(vec![
                Span::raw(head),
                Span::raw(" | "),
                Span::raw(self.status_message.clone()),
            ]),
            (None, true) => Line::from(head),
        };
        frame.render_widget(line, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::buffer_text;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn rendered(title_bar: &mut TitleBar) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();
        buffer_text(&terminal)
    }

    #[test]
    fn test_title_bar_default_no_status() {
        let mut title_bar =
            TitleBar::new("Keystone".to_string(), "default".to_string(), "English".to_string());
        let text = rendered(&mut title_bar);
        assert!(text.contains("Keystone [default] English"));
        assert!(!text.contains('|'));
    }

    #[test]
    fn test_title_bar_with_status_message() {
        let mut title_bar =
            TitleBar::new("Keystone".to_string(), "prod".to_string(), "Français".to_string());
        title_bar.status_message = "Connexion en cours...".to_string();
        let text = rendered(&mut title_bar);
        assert!(text.contains("[prod]"));
        assert!(text.contains("| Connexion en cours..."));
    }

    #[test]
    fn test_error_wins_over_status() {
        let mut title_bar =
            TitleBar::new("Keystone".to_string(), "default".to_string(), "English".to_string());
        title_bar.status_message = "Signing out...".to_string();
        title_bar.error = Some("Sign-out failed: network error: offline".to_string());
        let text = rendered(&mut title_bar);
        assert!(text.contains("Sign-out failed"));
        assert!(!text.contains("Signing out..."));
    }
}
