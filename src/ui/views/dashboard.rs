use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};

use crate::modal::ModalStores;
use crate::query::{Query, QueryState};
use crate::resources::dashboard::{self, MonthlyRevenue, Summary};
use crate::ui::renderfns::{format_price, truncate};
use crate::ui::view::{Services, ShortcutInfo, View, ViewAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
  Seller,
  Admin,
}

pub struct DashboardView {
  audience: Audience,
  summary: Query<Summary>,
  /// Seller only
  revenue: Option<Query<Vec<MonthlyRevenue>>>,
}

impl DashboardView {
  pub fn new(services: Services, audience: Audience) -> Self {
    let client = &services.client;
    let (mut summary, mut revenue) = match audience {
      Audience::Seller => (
        dashboard::seller_dashboard_query(client),
        Some(dashboard::monthly_revenue_query(client)),
      ),
      Audience::Admin => (dashboard::admin_dashboard_query(client), None),
    };
    summary.fetch();
    if let Some(revenue) = &mut revenue {
      revenue.fetch();
    }
    Self {
      audience,
      summary,
      revenue,
    }
  }

  fn render_summary(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.breadcrumb_label()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let summary = match self.summary.state() {
      QueryState::Success(summary) => summary,
      QueryState::Error(e) => {
        let paragraph = Paragraph::new(format!("Failed to load dashboard: {e}"))
          .block(block)
          .fg(Color::Red);
        frame.render_widget(paragraph, area);
        return;
      }
      _ => {
        let paragraph = Paragraph::new("Loading dashboard...").block(block).fg(Color::DarkGray);
        frame.render_widget(paragraph, area);
        return;
      }
    };

    let stat = |label: &str, value: String| {
      Line::from(vec![
        Span::styled(format!("{label:<18}"), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
      ])
    };
    let mut lines = vec![
      stat("Revenue", format_price(summary.total_revenue)),
      stat("Orders", summary.total_orders.to_string()),
      stat("Bookings", summary.total_bookings.to_string()),
      stat("Pending bookings", summary.pending_bookings.to_string()),
      stat("Customers", summary.total_customers.to_string()),
    ];
    if !summary.top_products.is_empty() {
      lines.push(Line::from(""));
      lines.push(Line::styled("Top products", Style::default().fg(Color::Cyan)));
      for top in &summary.top_products {
        lines.push(Line::from(vec![
          Span::raw(format!("  {:<30}", truncate(&top.product_name, 30))),
          Span::raw(format!("{:>6} sold  ", top.total_sold)),
          Span::styled(format_price(top.revenue), Style::default().fg(Color::Yellow)),
        ]));
      }
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_revenue(&self, frame: &mut Frame, area: Rect, months: &[MonthlyRevenue]) {
    let bars: Vec<Bar> = months
      .iter()
      .map(|m| {
        Bar::default()
          .label(Line::from(format!("{:02}", m.month)))
          .value(m.revenue.max(0.0) as u64)
          .text_value(short_amount(m.revenue))
      })
      .collect();
    let chart = BarChart::default()
      .block(
        Block::default()
          .title(" Monthly revenue ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::DarkGray)),
      )
      .data(BarGroup::default().bars(&bars))
      .bar_width(5)
      .bar_gap(1)
      .bar_style(Style::default().fg(Color::Yellow));
    frame.render_widget(chart, area);
  }
}

/// Compact amount for bar labels: 1.2M, 350K.
fn short_amount(amount: f64) -> String {
  match amount {
    a if a >= 1_000_000.0 => format!("{:.1}M", a / 1_000_000.0),
    a if a >= 1_000.0 => format!("{:.0}K", a / 1_000.0),
    a => format!("{a:.0}"),
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent, _modals: &mut ModalStores) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.summary.refetch();
        if let Some(revenue) = &mut self.revenue {
          revenue.refetch();
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match self.revenue.as_ref().and_then(|q| q.data()) {
      Some(months) if !months.is_empty() => {
        let chunks = Layout::default()
          .direction(Direction::Vertical)
          .constraints([Constraint::Min(10), Constraint::Length(12)])
          .split(area);
        self.render_summary(frame, chunks[0]);
        self.render_revenue(frame, chunks[1], months);
      }
      _ => self.render_summary(frame, area),
    }
  }

  fn breadcrumb_label(&self) -> String {
    match self.audience {
      Audience::Seller => "Seller dashboard".to_string(),
      Audience::Admin => "Admin dashboard".to_string(),
    }
  }

  fn tick(&mut self, _modals: &mut ModalStores) {
    self.summary.poll();
    if let Some(revenue) = &mut self.revenue {
      revenue.poll();
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_short_amount() {
    assert_eq!(short_amount(1_250_000.0), "1.2M");
    assert_eq!(short_amount(350_000.0), "350K");
    assert_eq!(short_amount(900.0), "900");
  }
}
