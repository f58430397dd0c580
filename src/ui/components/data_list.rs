use ratatui::prelude::*;
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};

use crate::data_mapper::Rendered;

/// Draw a mapped list whose props are the row lines.
///
/// Skeleton rows are placeholders; the "Show More" row follows the items
/// when the mapper offers it.
pub fn render_mapped<T>(
  frame: &mut Frame,
  area: Rect,
  block: Block,
  rendered: &Rendered<'_, T, Line<'static>>,
  empty_message: &str,
  state: &mut ListState,
) {
  match rendered {
    Rendered::Skeleton(rows) => {
      let width = area.width.saturating_sub(6) as usize;
      let items: Vec<ListItem> = (0..*rows)
        .map(|i| {
          let len = width * (10 - (i % 3)) / 10;
          ListItem::new(Line::styled("░".repeat(len), Style::default().fg(Color::DarkGray)))
        })
        .collect();
      frame.render_widget(List::new(items).block(block), area);
    }
    Rendered::Empty => {
      let paragraph = Paragraph::new(empty_message.to_string())
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
    }
    Rendered::Items { items, show_more } => {
      let mut rows: Vec<ListItem> = items.iter().map(|m| ListItem::new(m.props.clone())).collect();
      if let Some(show_more) = show_more {
        let style = if show_more.enabled {
          Style::default().fg(Color::Cyan)
        } else {
          Style::default().fg(Color::DarkGray)
        };
        let label = if show_more.enabled { "  Show more <m>" } else { "  Loading more..." };
        rows.push(ListItem::new(Line::styled(label, style)));
      }
      let list = List::new(rows)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
      frame.render_stateful_widget(list, area, state);
    }
  }
}
