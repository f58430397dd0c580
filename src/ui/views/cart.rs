use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use serde_json::Value;

use crate::modal::{AddressForm, InfoMessage, ModalStores, ProductRemoval};
use crate::query::{Mutation, MutationState, Query, QueryState};
use crate::resources::cart::{self, Cart, CartItem, CartLine};
use crate::resources::order::CreateOrder;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_price, truncate};
use crate::ui::view::{Confirmation, Services, ShortcutInfo, View, ViewAction};

const PAYMENT_METHOD: &str = "Wallet";

pub struct CartView {
  query: Query<Cart>,
  update: Mutation<CartLine, Value>,
  remove: Mutation<String, Value>,
  checkout: Mutation<CreateOrder, Value>,
  list_state: ListState,
}

impl CartView {
  pub fn new(services: Services) -> Self {
    let client = &services.client;
    let mut query = cart::cart_query(client);
    query.fetch();
    Self {
      query,
      update: client.mutation(|c, line: CartLine| async move { c.update_cart_quantity(&line).await }),
      remove: client.mutation(|c, product_id: String| async move { c.remove_from_cart(&product_id).await }),
      checkout: client.mutation(|c, input: CreateOrder| async move { c.create_order(&input).await }),
      list_state: ListState::default(),
    }
  }

  fn items(&self) -> &[CartItem] {
    self.query.data().map(|c| c.cart_items.as_slice()).unwrap_or(&[])
  }

  fn selected(&self) -> Option<&CartItem> {
    self.list_state.selected().and_then(|i| self.items().get(i))
  }

  fn change_quantity(&mut self, delta: i64, modals: &mut ModalStores) {
    if self.update.is_pending() {
      return;
    }
    let Some(item) = self.selected() else {
      return;
    };
    let quantity = i64::from(item.quantity) + delta;
    if quantity < 1 {
      let removal = removal_for(item);
      modals.product_remove.open(Some(removal));
      return;
    }
    let line = CartLine {
      product_id: item.product_id.clone(),
      quantity: quantity as u32,
    };
    self.update.mutate(line);
  }

  fn busy(&self) -> bool {
    self.update.is_pending() || self.remove.is_pending() || self.checkout.is_pending()
  }
}

fn removal_for(item: &CartItem) -> ProductRemoval {
  ProductRemoval {
    product_id: item.product_id.clone(),
    product_name: item.product_name.clone(),
  }
}

fn item_row(item: &CartItem) -> ListItem<'static> {
  ListItem::new(Line::from(vec![
    Span::styled(format!("{:<36}", truncate(&item.product_name, 36)), Style::default().fg(Color::White)),
    Span::styled(format!("{:>4} x ", item.quantity), Style::default().fg(Color::Cyan)),
    Span::raw(format!("{:>14}", format_price(item.unit_price))),
    Span::styled(format!("  {:>16}", format_price(item.line_total())), Style::default().fg(Color::Yellow)),
  ]))
}

impl View for CartView {
  fn handle_key(&mut self, key: KeyEvent, modals: &mut ModalStores) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('+') | KeyCode::Char('=') => self.change_quantity(1, modals),
      KeyCode::Char('-') => self.change_quantity(-1, modals),
      KeyCode::Char('d') => {
        if let Some(item) = self.selected() {
          let removal = removal_for(item);
          modals.product_remove.open(Some(removal));
        }
      }
      KeyCode::Char('c') => {
        if self.items().is_empty() {
          modals.info.open(Some(InfoMessage::error("Checkout", "Your cart is empty")));
        } else if !self.checkout.is_pending() {
          modals.address.open(Some(AddressForm::default()));
        }
      }
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(3)])
      .split(area);

    let title = if self.busy() { " Cart (updating...) " } else { " Cart " };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    match self.query.state() {
      QueryState::Idle | QueryState::Loading => {
        let paragraph = Paragraph::new("Loading cart...").block(block).fg(Color::DarkGray);
        frame.render_widget(paragraph, chunks[0]);
      }
      QueryState::Error(e) => {
        let paragraph = Paragraph::new(format!("Failed to load cart: {e}"))
          .block(block)
          .fg(Color::Red);
        frame.render_widget(paragraph, chunks[0]);
      }
      QueryState::Success(cart) if cart.cart_items.is_empty() => {
        let paragraph = Paragraph::new("Your cart is empty.").block(block).fg(Color::DarkGray);
        frame.render_widget(paragraph, chunks[0]);
      }
      QueryState::Success(cart) => {
        let rows: Vec<ListItem> = cart.cart_items.iter().map(item_row).collect();
        ensure_valid_selection(&mut self.list_state, rows.len());
        let list = List::new(rows)
          .block(block)
          .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
          .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[0], &mut self.list_state);
      }
    }

    let total = self.query.data().map(|c| c.total_price).unwrap_or(0.0);
    let summary = Paragraph::new(Line::from(vec![
      Span::styled("Total ", Style::default().fg(Color::DarkGray)),
      Span::styled(format_price(total), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
      Span::styled(format!("   paid with {PAYMENT_METHOD}"), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(summary, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Cart".to_string()
  }

  fn tick(&mut self, modals: &mut ModalStores) {
    self.query.poll();
    if let Some(MutationState::Error(e)) = self.update.poll() {
      modals.info.open(Some(InfoMessage::error("Quantity not changed", e.clone())));
    }
    match self.remove.poll() {
      Some(MutationState::Success(_)) => {
        modals.info.open(Some(InfoMessage::success("Cart", "Product removed from cart")));
      }
      Some(MutationState::Error(e)) => {
        modals.info.open(Some(InfoMessage::error("Remove failed", e.clone())));
      }
      _ => {}
    }
    match self.checkout.poll() {
      Some(MutationState::Success(_)) => {
        modals.info.open(Some(InfoMessage::success("Order placed", "Track it under :orders")));
      }
      Some(MutationState::Error(e)) => {
        modals.info.open(Some(InfoMessage::error("Checkout failed", e.clone())));
      }
      _ => {}
    }
  }

  fn on_confirm(&mut self, confirmation: Confirmation, _modals: &mut ModalStores) {
    match confirmation {
      Confirmation::RemoveProduct(removal) => self.remove.mutate(removal.product_id),
      Confirmation::Address(form) => {
        let note = form.note.trim().to_string();
        self.checkout.mutate(CreateOrder {
          address_id: form.address_id,
          payment_method: PAYMENT_METHOD.to_string(),
          note: (!note.is_empty()).then_some(note),
        });
      }
      _ => {}
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("+/-", "quantity").with_priority(20),
      ShortcutInfo::new("d", "remove").with_priority(30),
      ShortcutInfo::new("c", "checkout").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::views::testing::services;
  use httpmock::prelude::*;
  use serde_json::json;
  use std::time::Duration;

  #[tokio::test]
  async fn test_checkout_requires_address() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Cart");
        then.status(200).json_body(json!({"data": {
          "id": 1, "totalPrice": 200000,
          "cartItems": [{"productId": 9, "productName": "Lantern", "quantity": 2, "unitPrice": 100000}]
        }}));
      })
      .await;
    let create = server
      .mock_async(|when, then| {
        when.method(POST).path("/api/Order/create");
        then.status(200).json_body(json!({"success": true}));
      })
      .await;

    let mut modals = ModalStores::default();
    let mut view = CartView::new(services(&server));
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.tick(&mut modals);

    view.handle_key(KeyEvent::from(KeyCode::Char('c')), &mut modals);
    assert!(modals.address.is_open());

    view.on_confirm(Confirmation::Address(AddressForm::default()), &mut modals);
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.tick(&mut modals);
    create.assert_calls_async(0).await;
    assert!(modals.info.payload().is_some_and(|i| i.is_error));
  }

  #[tokio::test]
  async fn test_decrement_at_one_asks_to_remove() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Cart");
        then.status(200).json_body(json!({"data": {
          "cartItems": [{"productId": 9, "productName": "Lantern", "quantity": 1, "unitPrice": 100000}]
        }}));
      })
      .await;

    let mut modals = ModalStores::default();
    let mut view = CartView::new(services(&server));
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.tick(&mut modals);
    view.list_state.select(Some(0));

    view.handle_key(KeyEvent::from(KeyCode::Char('-')), &mut modals);
    assert_eq!(
      modals.product_remove.payload().map(|p| p.product_id.as_str()),
      Some("9")
    );
    assert!(!view.update.is_pending());
  }
}
