use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::renderfns::centered_rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Field values in declaration order
  Submitted(Vec<String>),
  Cancelled,
}

/// Small labelled form shown over the current view (address, OTP).
#[derive(Debug, Clone, Default)]
pub struct FormDialog {
  title: String,
  labels: Vec<&'static str>,
  fields: Vec<TextInput>,
  focused: usize,
  active: bool,
}

impl FormDialog {
  pub fn new(title: &str, labels: &[&'static str]) -> Self {
    Self {
      title: title.to_string(),
      labels: labels.to_vec(),
      fields: labels.iter().map(|_| TextInput::new()).collect(),
      focused: 0,
      active: false,
    }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open with initial values; missing values start blank.
  pub fn show(&mut self, values: &[String]) {
    for (i, field) in self.fields.iter_mut().enumerate() {
      *field = TextInput::with_value(values.get(i).map(String::as_str).unwrap_or_default());
    }
    self.focused = 0;
    self.active = true;
  }

  pub fn hide(&mut self) {
    self.active = false;
  }

  fn values(&self) -> Vec<String> {
    self.fields.iter().map(|f| f.value().trim().to_string()).collect()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active || self.fields.is_empty() {
      return KeyResult::NotHandled;
    }
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.focused = (self.focused + 1) % self.fields.len();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        return KeyResult::Handled;
      }
      _ => {}
    }
    match self.fields[self.focused].handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(FormEvent::Submitted(self.values()))
      }
      InputResult::Cancelled => {
        self.active = false;
        KeyResult::Event(FormEvent::Cancelled)
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }
    let height = self.fields.len() as u16 + 4;
    let popup = centered_rect(area, (area.width * 60 / 100).max(44), height);
    frame.render_widget(Clear, popup);

    let label_width = self.labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let mut lines: Vec<Line> = self
      .labels
      .iter()
      .zip(&self.fields)
      .enumerate()
      .map(|(i, (label, field))| {
        let focused = i == self.focused;
        let (before, after) = field.split_at_cursor();
        let mut spans = vec![Span::styled(
          format!("{label:>label_width$}: "),
          Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }),
        )];
        spans.push(Span::raw(before));
        if focused {
          spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        }
        spans.push(Span::raw(after));
        Line::from(spans)
      })
      .collect();
    lines.push(Line::from(""));
    lines.push(Line::styled(
      "Tab next field   Enter submit   Esc cancel",
      Style::default().fg(Color::DarkGray),
    ));

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_fill_and_submit() {
    let mut form = FormDialog::new("Address", &["Address id", "Note"]);
    form.show(&["addr-1".to_string()]);
    form.handle_key(key(KeyCode::Tab));
    for c in "ring twice".chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted(vec!["addr-1".into(), "ring twice".into()]))
    );
    assert!(!form.is_active());
  }

  #[test]
  fn test_inactive_passes_keys() {
    let mut form = FormDialog::new("OTP", &["Email", "Code"]);
    assert_eq!(form.handle_key(key(KeyCode::Char('a'))), KeyResult::NotHandled);
  }
}
