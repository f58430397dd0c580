//! Stateless dialogs drawn from the modal stores.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::KeyResult;
use crate::modal::InfoMessage;
use crate::ui::renderfns::centered_rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
  Accepted,
  Declined,
}

/// y/Enter accepts, n/Esc/q declines; other keys are swallowed.
pub fn confirm_key(key: KeyEvent) -> KeyResult<ConfirmEvent> {
  match key.code {
    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => KeyResult::Event(ConfirmEvent::Accepted),
    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
      KeyResult::Event(ConfirmEvent::Declined)
    }
    _ => KeyResult::Handled,
  }
}

pub fn render_confirm(frame: &mut Frame, area: Rect, title: &str, message: &str) {
  let body = vec![
    Line::from(message.to_string()),
    Line::from(""),
    Line::from(vec![
      Span::styled("<y>", Style::default().fg(Color::Cyan)),
      Span::styled(" confirm   ", Style::default().fg(Color::DarkGray)),
      Span::styled("<n>", Style::default().fg(Color::Cyan)),
      Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
    ]),
  ];
  render_box(frame, area, title, Color::Red, body);
}

pub fn render_info(frame: &mut Frame, area: Rect, info: &InfoMessage) {
  let color = if info.is_error { Color::Red } else { Color::Green };
  let body = vec![
    Line::from(info.message.clone()),
    Line::from(""),
    Line::styled("press any key", Style::default().fg(Color::DarkGray)),
  ];
  render_box(frame, area, &info.title, color, body);
}

fn render_box(frame: &mut Frame, area: Rect, title: &str, color: Color, body: Vec<Line>) {
  let width = (area.width * 50 / 100).max(40);
  let popup = centered_rect(area, width, 7);
  frame.render_widget(Clear, popup);
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(color))
    .title(format!(" {title} "));
  let paragraph = Paragraph::new(body).block(block).wrap(Wrap { trim: true });
  frame.render_widget(paragraph, popup);
}
