//! # Text Fields and Forms
//!
//! Single-line input used by the sign-in, sign-up and confirmation screens.
//! `TextField` owns its buffer and cursor; `Form` owns a column of fields and
//! which one has focus.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::event::TuiEvent;

/// Height of one bordered field.
pub const FIELD_HEIGHT: u16 = 3;

pub struct TextField {
    /// Translation key for the field label.
    pub label_key: &'static str,
    pub value: String,
    /// Render bullets instead of the text (passwords).
    pub masked: bool,
    /// Cursor position as byte offset in value (0..=value.len())
    cursor: usize,
}

impl TextField {
    pub fn new(label_key: &'static str) -> Self {
        Self {
            label_key,
            value: String::new(),
            masked: false,
            cursor: 0,
        }
    }

    pub fn masked(label_key: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(label_key)
        }
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn prev_boundary(&self) -> usize {
        self.value[..self.cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.value[self.cursor..]
            .chars()
            .next()
            .map_or(self.cursor, |c| self.cursor + c.len_utf8())
    }

    /// Applies an editing event. Returns true if the event was consumed.
    pub fn edit(&mut self, event: &TuiEvent) -> bool {
        match event {
            TuiEvent::InputChar(c) => {
                self.value.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
            }
            TuiEvent::Paste(text) => {
                // Single-line field: drop newlines from pasted text
                let clean: String = text.chars().filter(|c| !c.is_control()).collect();
                self.value.insert_str(self.cursor, &clean);
                self.cursor += clean.len();
            }
            TuiEvent::Backspace => {
                if self.cursor > 0 {
                    let start = self.prev_boundary();
                    self.value.drain(start..self.cursor);
                    self.cursor = start;
                }
            }
            TuiEvent::Delete => {
                if self.cursor < self.value.len() {
                    let end = self.next_boundary();
                    self.value.drain(self.cursor..end);
                }
            }
            TuiEvent::CursorLeft => self.cursor = self.prev_boundary(),
            TuiEvent::CursorRight => self.cursor = self.next_boundary(),
            TuiEvent::Home => self.cursor = 0,
            TuiEvent::End => self.cursor = self.value.len(),
            _ => return false,
        }
        true
    }

    /// Text as drawn on screen.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    /// Display column of the cursor, relative to the field's inner area.
    pub fn cursor_column(&self) -> u16 {
        let before = &self.value[..self.cursor];
        let width = if self.masked {
            before.chars().count()
        } else {
            before.width()
        };
        width as u16
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, label: &str, focused: bool) {
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title_style = if focused {
            border_style.add_modifier(Modifier::BOLD)
        } else {
            border_style
        };
        let paragraph = Paragraph::new(self.display()).block(
            Block::bordered()
                .title(label.to_string())
                .border_style(border_style)
                .title_style(title_style),
        );
        frame.render_widget(paragraph, area);

        if focused {
            let x = (area.x + 1 + self.cursor_column()).min(area.right().saturating_sub(2));
            frame.set_cursor_position(Position::new(x, area.y + 1));
        }
    }
}

/// A vertical stack of fields with one focused.
pub struct Form {
    pub fields: Vec<TextField>,
    pub focused: usize,
}

impl Form {
    pub fn new(fields: Vec<TextField>) -> Self {
        Self { fields, focused: 0 }
    }

    pub fn next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn focus(&mut self, index: usize) {
        self.focused = index.min(self.fields.len().saturating_sub(1));
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map_or("", |f| f.value.as_str())
    }

    pub fn set(&mut self, index: usize, value: &str) {
        if let Some(field) = self.fields.get_mut(index) {
            field.set(value);
        }
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.focused = 0;
    }

    /// Routes focus movement and editing. Returns true if the event was consumed.
    pub fn handle(&mut self, event: &TuiEvent) -> bool {
        match event {
            TuiEvent::NextField => {
                self.next();
                true
            }
            TuiEvent::PrevField => {
                self.prev();
                true
            }
            other => self
                .fields
                .get_mut(self.focused)
                .is_some_and(|field| field.edit(other)),
        }
    }

    pub fn height(&self) -> u16 {
        FIELD_HEIGHT * self.fields.len() as u16
    }

    /// Renders each field with the label produced by `label_for`.
    pub fn render<'a, F>(&self, frame: &mut Frame, area: Rect, label_for: F)
    where
        F: Fn(&'static str) -> &'a str,
    {
        let rows = Layout::vertical(
            self.fields
                .iter()
                .map(|_| Constraint::Length(FIELD_HEIGHT)),
        )
        .split(area);
        for (index, (field, row)) in self.fields.iter().zip(rows.iter()).enumerate() {
            field.render(frame, *row, label_for(field.label_key), index == self.focused);
        }
    }
}
