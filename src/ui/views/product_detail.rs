use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use serde_json::Value;

use crate::modal::{ChatBox, InfoMessage, ModalStores};
use crate::query::{Mutation, MutationState, Query, QueryState};
use crate::resources::cart::CartLine;
use crate::resources::follow::FollowRequest;
use crate::resources::product::{self, Product};
use crate::ui::renderfns::format_price;
use crate::ui::view::{Services, ShortcutInfo, View, ViewAction};

pub struct ProductDetailView {
  services: Services,
  product_id: String,
  query: Query<Product>,
  add_to_cart: Mutation<CartLine, Value>,
  follow: Mutation<FollowRequest, Value>,
  scroll: u16,
}

impl ProductDetailView {
  pub fn new(services: Services, product_id: String) -> Self {
    let mut query = product::product_detail_query(&services.client, Some(product_id.clone()));
    query.fetch();
    let add_to_cart = services
      .client
      .mutation(|c, line: CartLine| async move { c.add_to_cart(&line).await });
    let follow = services
      .client
      .mutation(|c, request: FollowRequest| async move { c.follow(&request).await });
    Self {
      services,
      product_id,
      query,
      add_to_cart,
      follow,
      scroll: 0,
    }
  }

  fn render_product(&self, product: &Product) -> Vec<Line<'static>> {
    let label = |text: &str| Span::styled(format!("{text:<12}"), Style::default().fg(Color::DarkGray));
    let mut lines = vec![
      Line::styled(
        product.product_name.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
      ),
      Line::from(""),
      Line::from(vec![
        label("Price"),
        Span::styled(format_price(product.product_price), Style::default().fg(Color::Yellow)),
      ]),
      Line::from(vec![
        label("Stock"),
        if product.in_stock() {
          Span::styled(product.quantity.to_string(), Style::default().fg(Color::Green))
        } else {
          Span::styled("sold out", Style::default().fg(Color::Red))
        },
      ]),
      Line::from(vec![label("Sold"), Span::raw(product.total_sold.to_string())]),
      Line::from(vec![label("Rating"), Span::raw(format!("{:.1}", product.rate))]),
      Line::from(vec![
        label("Category"),
        Span::raw(product.category_name.clone().unwrap_or_else(|| "-".into())),
      ]),
      Line::from(vec![
        label("Provider"),
        Span::styled(
          product.provider.clone().unwrap_or_else(|| "-".into()),
          Style::default().fg(Color::Cyan),
        ),
      ]),
    ];

    if !product.image_urls.is_empty() {
      lines.push(Line::from(""));
      lines.push(Line::styled("Images", Style::default().fg(Color::DarkGray)));
      for url in &product.image_urls {
        let line = if self.services.config.is_image_host_allowed(url) {
          Line::raw(format!("  {url}"))
        } else {
          Line::styled("  [image from unlisted host hidden]", Style::default().fg(Color::DarkGray))
        };
        lines.push(line);
      }
    }

    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
      lines.push(Line::from(""));
      lines.extend(description.lines().map(|l| Line::raw(l.to_string())));
    }
    lines
  }
}

fn report<O>(outcome: Option<&MutationState<O>>, modals: &mut ModalStores, success: &str) {
  match outcome {
    Some(MutationState::Success(_)) => modals.info.open(Some(InfoMessage::success("Done", success))),
    Some(MutationState::Error(e)) => modals.info.open(Some(InfoMessage::error("Failed", e.clone()))),
    _ => {}
  }
}

impl View for ProductDetailView {
  fn handle_key(&mut self, key: KeyEvent, modals: &mut ModalStores) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('a') if !self.add_to_cart.is_pending() => {
        self.add_to_cart.mutate(CartLine {
          product_id: self.product_id.clone(),
          quantity: 1,
        });
      }
      KeyCode::Char('F') if !self.follow.is_pending() => {
        let provider_id = self.query.data().and_then(|p| p.provider_id.clone());
        self.follow.mutate(FollowRequest {
          following_id: provider_id.unwrap_or_default(),
        });
      }
      KeyCode::Char('c') => {
        if let Some(product) = self.query.data() {
          match &product.provider_id {
            Some(provider_id) => modals.chat.open(Some(ChatBox {
              conversation: None,
              receiver_id: provider_id.clone(),
              receiver_name: product.provider.clone().unwrap_or_default(),
              draft: String::new(),
            })),
            None => modals
              .info
              .open(Some(InfoMessage::error("Chat", "This product has no provider to chat with"))),
          }
        }
      }
      KeyCode::Char('p') => {
        if let Some(slug) = self.query.data().and_then(|p| p.slug.clone()) {
          return ViewAction::Navigate(format!("/provider/{slug}"));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.breadcrumb_label()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines = match self.query.state() {
      QueryState::Idle | QueryState::Loading => {
        vec![Line::styled("Loading product...", Style::default().fg(Color::DarkGray))]
      }
      QueryState::Error(e) => vec![
        Line::styled(format!("Failed to load product: {e}"), Style::default().fg(Color::Red)),
        Line::styled("Press 'r' to retry.", Style::default().fg(Color::DarkGray)),
      ],
      QueryState::Success(product) => self.render_product(product),
    };

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.query.data() {
      Some(product) => product.product_name.clone(),
      None => format!("Product {}", self.product_id),
    }
  }

  fn tick(&mut self, modals: &mut ModalStores) {
    self.query.poll();
    report(self.add_to_cart.poll(), modals, "Added to cart");
    report(self.follow.poll(), modals, "You now follow this provider");
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "add to cart").with_priority(20),
      ShortcutInfo::new("F", "follow").with_priority(30),
      ShortcutInfo::new("c", "chat").with_priority(40),
      ShortcutInfo::new("p", "provider").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
