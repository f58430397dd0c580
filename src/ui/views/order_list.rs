use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, ListState, Paragraph};
use serde_json::Value;

use crate::data_mapper::{DataMapper, Rendered};
use crate::modal::{DeleteConfirm, DeleteTarget, InfoMessage, ModalStores};
use crate::query::{Mutation, MutationState, Query};
use crate::resources::order::{self, CancelOrder, Order};
use crate::resources::{Page, PageParams};
use crate::ui::components::render_mapped;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_price, status_color, truncate};
use crate::ui::view::{Confirmation, Services, ShortcutInfo, View, ViewAction};

/// Order history with "Show More": pages accumulate as they arrive.
pub struct OrderListView {
  services: Services,
  params: PageParams,
  query: Query<Page<Order>>,
  loaded: Vec<Order>,
  cancel: Mutation<CancelOrder, Value>,
  mapper: DataMapper,
  list_state: ListState,
}

impl OrderListView {
  pub fn new(services: Services) -> Self {
    let ui = &services.config.ui;
    let params = order::default_params().page_size(ui.page_size);
    let mapper = DataMapper {
      page_size: ui.page_size as usize,
      skeleton_rows: ui.skeleton_rows,
      enforce_pagination: true,
      accumulative: true,
      is_loading: true,
      ..DataMapper::default()
    };
    let mut query = order::order_list_query(&services.client, params.clone());
    query.fetch();
    let cancel = services
      .client
      .mutation(|c, input: CancelOrder| async move { c.cancel_order(&input).await });

    Self {
      services,
      params,
      query,
      loaded: Vec::new(),
      cancel,
      mapper,
      list_state: ListState::default(),
    }
  }

  fn load_page(&mut self, params: PageParams) {
    self.query = order::order_list_query(&self.services.client, params.clone());
    self.query.fetch();
    self.params = params;
    self.mapper.current_page = self.params.page_index as usize;
    self.mapper.is_loading = true;
  }

  fn show_more(&mut self) {
    if self.mapper.has_more && !self.query.is_loading() {
      self.load_page(self.params.next_page());
    }
  }

  /// Fold the current page into the accumulated list.
  fn merge_page(&mut self) {
    let Some(page) = self.query.data() else {
      return;
    };
    if self.params.page_index <= 1 {
      self.loaded = page.items.clone();
    } else {
      self.loaded.extend(page.items.iter().cloned());
    }
    self.mapper.has_more = page.has_more(&self.params);
  }

  fn data(&self) -> Option<&[Order]> {
    if self.loaded.is_empty() && self.query.data().is_none() {
      None
    } else {
      Some(self.loaded.as_slice())
    }
  }

  fn selected(&self) -> Option<&Order> {
    let index = self.list_state.selected()?;
    match self.mapper.map(self.data(), |o| o.id.clone(), |_| ()) {
      Rendered::Items { items, .. } => items.get(index).map(|m| m.item),
      _ => None,
    }
  }

  fn render_details(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Details ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    let Some(order) = self.selected() else {
      frame.render_widget(Paragraph::new("").block(block), area);
      return;
    };
    let mut lines = vec![
      Line::from(vec![
        Span::styled(order.code.clone(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(order.status.clone(), Style::default().fg(status_color(&order.status))),
      ]),
      Line::styled(order.created_at.clone(), Style::default().fg(Color::DarkGray)),
      Line::raw(truncate(&order.address, 60)),
      Line::from(""),
    ];
    for line in &order.details {
      lines.push(Line::from(vec![
        Span::raw(format!("{:>3} x ", line.quantity)),
        Span::raw(truncate(&line.product_name, 28)),
        Span::styled(
          format!("  {}", format_price(line.unit_price * f64::from(line.quantity))),
          Style::default().fg(Color::Yellow),
        ),
      ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
      Span::styled("Total ", Style::default().fg(Color::DarkGray)),
      Span::styled(format_price(order.total_price), Style::default().fg(Color::Yellow)),
    ]));
    frame.render_widget(Paragraph::new(lines).block(block), area);
  }
}

fn order_row(order: &Order) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{:<14}", truncate(&order.code, 14)), Style::default().fg(Color::Cyan)),
    Span::raw(" "),
    Span::styled(
      format!("{:<12}", truncate(&order.status, 12)),
      Style::default().fg(status_color(&order.status)),
    ),
    Span::raw(" "),
    Span::styled(format!("{:>16}", format_price(order.total_price)), Style::default().fg(Color::Yellow)),
    Span::raw("  "),
    Span::styled(truncate(&order.created_at, 19), Style::default().fg(Color::DarkGray)),
  ])
}

impl View for OrderListView {
  fn handle_key(&mut self, key: KeyEvent, modals: &mut ModalStores) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('m') => self.show_more(),
      KeyCode::Char('r') => self.load_page(self.params.clone().page(1)),
      KeyCode::Char('x') => {
        if let Some(order) = self.selected() {
          modals.delete.open(Some(DeleteConfirm {
            title: "Cancel order".to_string(),
            message: format!("Cancel order {}?", order.code),
            target: DeleteTarget::Order { id: order.id.clone() },
          }));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
      .split(area);

    let title = match self.query.error() {
      Some(e) => format!(" Orders (error: {}) ", truncate(e, 40)),
      None => format!(" Orders ({}) ", self.loaded.len()),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let data = if self.loaded.is_empty() && self.query.data().is_none() {
      None
    } else {
      Some(self.loaded.as_slice())
    };
    let rendered = self.mapper.map(data, |o| o.id.clone(), order_row);
    ensure_valid_selection(&mut self.list_state, rendered.len());
    render_mapped(frame, chunks[0], block, &rendered, "No orders yet.", &mut self.list_state);

    self.render_details(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Orders".to_string()
  }

  fn tick(&mut self, modals: &mut ModalStores) {
    if self.query.poll() && self.query.is_success() {
      self.merge_page();
    }
    self.mapper.is_loading = self.query.is_loading();

    match self.cancel.poll().cloned() {
      Some(MutationState::Success(_)) => {
        modals.info.open(Some(InfoMessage::success("Order cancelled", "The order was cancelled")));
        self.load_page(self.params.clone().page(1));
      }
      Some(MutationState::Error(e)) => {
        modals.info.open(Some(InfoMessage::error("Cancel failed", e)));
      }
      _ => {}
    }
  }

  fn on_confirm(&mut self, confirmation: Confirmation, _modals: &mut ModalStores) {
    if let Confirmation::Delete(DeleteTarget::Order { id }) = confirmation {
      self.cancel.mutate(CancelOrder {
        order_id: id,
        reason: "Cancelled by customer".to_string(),
      });
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("m", "show more").with_priority(20),
      ShortcutInfo::new("x", "cancel order").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::testing::{services, services_with};
  use httpmock::prelude::*;
  use serde_json::json;
  use std::time::Duration;

  async fn settle(view: &mut OrderListView, modals: &mut ModalStores) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.tick(modals);
  }

  #[tokio::test]
  async fn test_show_more_accumulates_pages() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/Order/list")
          .query_param("pageIndex", "1")
          .query_param("pageSize", "2");
        then.status(200).json_body(json!({
          "data": [{"id": 1, "code": "OD1"}, {"id": 2, "code": "OD2"}],
          "totalCount": 3
        }));
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Order/list").query_param("pageIndex", "2");
        then.status(200).json_body(json!({"data": [{"id": 3, "code": "OD3"}], "totalCount": 3}));
      })
      .await;

    let mut modals = ModalStores::default();
    let mut view = OrderListView::new(services_with(&server, "ui:\n  page_size: 2\n"));
    settle(&mut view, &mut modals).await;
    assert_eq!(view.loaded.len(), 2);
    assert!(view.mapper.has_more);

    view.show_more();
    assert!(view.mapper.is_loading);
    // Earlier pages stay visible while the next one loads
    assert_eq!(view.mapper.map(view.data(), |o| o.id.clone(), |_| ()).len(), 2);

    settle(&mut view, &mut modals).await;
    assert_eq!(view.loaded.len(), 3);
    assert!(!view.mapper.has_more);
  }

  #[tokio::test]
  async fn test_cancel_goes_through_confirm_and_resets() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Order/list");
        then.status(200).json_body(json!({"data": [{"id": 7, "code": "OD7"}], "totalCount": 1}));
      })
      .await;
    let cancel = server
      .mock_async(|when, then| {
        when.method(PUT).path("/api/Order/cancel/7");
        then.status(200).json_body(json!({"success": true}));
      })
      .await;

    let mut modals = ModalStores::default();
    let mut view = OrderListView::new(services(&server));
    settle(&mut view, &mut modals).await;
    view.list_state.select(Some(0));

    view.handle_key(KeyEvent::from(KeyCode::Char('x')), &mut modals);
    assert!(modals.delete.is_open());
    cancel.assert_calls_async(0).await;

    view.on_confirm(Confirmation::Delete(DeleteTarget::Order { id: "7".into() }), &mut modals);
    settle(&mut view, &mut modals).await;
    cancel.assert_calls_async(1).await;
    assert!(modals.info.is_open());
    assert_eq!(view.params.page_index, 1);
  }
}
