//! # Loading View
//!
//! Shown while the persisted store restores and the startup session check
//! runs. Nothing else is drawn until both settle.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct LoadingView {
    frame_index: usize,
    text: String,
}

impl LoadingView {
    pub fn new(frame_index: usize, text: String) -> Self {
        Self { frame_index, text }
    }
}

impl Component for LoadingView {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let spinner = SPINNER[self.frame_index % SPINNER.len()];
        let lines = vec![
            Line::from(Span::styled(
                spinner,
                Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                self.text.clone(),
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let [center] = Layout::vertical([Constraint::Length(lines.len() as u16)])
            .flex(Flex::Center)
            .areas(area);

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::buffer_text;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_renders_spinner_and_text() {
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal
            .draw(|f| LoadingView::new(11, "Loading...".to_string()).render(f, f.area()))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Loading..."));
        assert!(text.contains(SPINNER[1]));
    }
}
