use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::utils::spinner_frame;
use crate::ui::view::ShortcutInfo;

/// Header state shared by every view.
pub struct HeaderInfo<'a> {
  pub title: &'a str,
  pub api_url: &'a str,
  pub signed_in: bool,
  /// Spinner tick while requests are in flight
  pub busy: Option<usize>,
}

/// Draw the header bar with title, API host, session and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, info: &HeaderInfo, shortcuts: &[ShortcutInfo]) {
  let sep = || Span::styled("│", Style::default().fg(Color::DarkGray));
  let mut spans = vec![
    Span::styled(" decorhub ", Style::default().fg(Color::Cyan).bold()),
    sep(),
    Span::styled(format!(" {} ", info.title), Style::default().fg(Color::White)),
    sep(),
    Span::styled(format!(" {} ", extract_host(info.api_url)), Style::default().fg(Color::DarkGray)),
    sep(),
  ];
  spans.push(if info.signed_in {
    Span::styled(" signed in ", Style::default().fg(Color::Green))
  } else {
    Span::styled(" guest ", Style::default().fg(Color::Yellow))
  });
  spans.push(Span::raw(" "));

  let mut shortcuts = shortcuts.to_vec();
  shortcuts.sort_by_key(|s| s.priority);
  for shortcut in &shortcuts {
    spans.push(Span::styled(format!("<{}>", shortcut.key), Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(format!(" {}   ", shortcut.label), Style::default().fg(Color::DarkGray)));
  }

  if let Some(tick) = info.busy {
    spans.push(Span::styled(format!("{} ", spinner_frame(tick)), Style::default().fg(Color::Yellow)));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host (and port) of the API base URL
fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_host() {
    assert_eq!(extract_host("https://api.decorhub.vn/"), "api.decorhub.vn");
    assert_eq!(extract_host("http://localhost:5297/api"), "localhost:5297");
    assert_eq!(extract_host("api.test"), "api.test");
  }
}
