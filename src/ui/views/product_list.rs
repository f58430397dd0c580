use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, ListState};

use crate::data_mapper::{DataMapper, Rendered};
use crate::modal::ModalStores;
use crate::query::Query;
use crate::resources::product::{self, Product};
use crate::resources::{Page, PageParams};
use crate::ui::components::render_mapped;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_price, truncate};
use crate::ui::view::{Services, ShortcutInfo, View, ViewAction};
use crate::ui::views::ProductDetailView;

/// Which products the list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Catalog {
  /// Whole catalog, paged by the server
  All,
  /// One provider's products, fetched at once and paged locally
  Provider(String),
}

enum Source {
  Paged(Query<Page<Product>>),
  Provider(Query<Vec<Product>>),
}

impl Source {
  fn products(&self) -> Option<&[Product]> {
    match self {
      Source::Paged(q) => q.data().map(|p| p.items.as_slice()),
      Source::Provider(q) => q.data().map(Vec::as_slice),
    }
  }

  fn is_loading(&self) -> bool {
    match self {
      Source::Paged(q) => q.is_loading(),
      Source::Provider(q) => q.is_loading(),
    }
  }

  fn error(&self) -> Option<&str> {
    match self {
      Source::Paged(q) => q.error(),
      Source::Provider(q) => q.error(),
    }
  }

  fn poll(&mut self) {
    match self {
      Source::Paged(q) => q.poll(),
      Source::Provider(q) => q.poll(),
    };
  }

  fn refetch(&mut self) {
    match self {
      Source::Paged(q) => q.refetch(),
      Source::Provider(q) => q.refetch(),
    }
  }
}

pub struct ProductListView {
  services: Services,
  catalog: Catalog,
  params: PageParams,
  source: Source,
  mapper: DataMapper,
  list_state: ListState,
}

impl ProductListView {
  pub fn new(services: Services, catalog: Catalog) -> Self {
    let ui = &services.config.ui;
    let params = product::default_params().page_size(ui.page_size);
    let mut mapper = DataMapper {
      page_size: ui.page_size as usize,
      skeleton_rows: ui.skeleton_rows,
      ..DataMapper::default()
    };

    let source = match &catalog {
      Catalog::All => {
        let mut query = product::product_list_query(&services.client, params.clone());
        query.fetch();
        Source::Paged(query)
      }
      Catalog::Provider(slug) => {
        mapper.enforce_pagination = true;
        let mut query = product::provider_products_query(&services.client, Some(slug.clone()));
        query.fetch();
        Source::Provider(query)
      }
    };
    mapper.is_loading = source.is_loading();

    Self {
      services,
      catalog,
      params,
      source,
      mapper,
      list_state: ListState::default(),
    }
  }

  fn current_page(&self) -> u32 {
    match self.catalog {
      Catalog::All => self.params.page_index,
      Catalog::Provider(_) => self.mapper.current_page as u32,
    }
  }

  fn total_pages(&self) -> u32 {
    let size = u64::from(self.params.page_size.max(1));
    let total = match &self.source {
      Source::Paged(q) => q.data().map(|p| p.total_count).unwrap_or(0),
      Source::Provider(q) => q.data().map(|v| v.len() as u64).unwrap_or(0),
    };
    total.div_ceil(size).max(1) as u32
  }

  fn go_to_page(&mut self, page: u32) {
    if page < 1 || page > self.total_pages() || page == self.current_page() {
      return;
    }
    match &mut self.source {
      Source::Paged(query) => {
        self.params = self.params.clone().page(page);
        *query = product::product_list_query(&self.services.client, self.params.clone());
        query.fetch();
      }
      Source::Provider(_) => self.mapper.current_page = page as usize,
    }
    self.mapper.is_loading = self.source.is_loading();
    self.list_state.select(Some(0));
  }

  fn selected(&self) -> Option<&Product> {
    let rendered = self.mapper.map(self.source.products(), |p| p.id.clone(), |_| ());
    let index = self.list_state.selected()?;
    match rendered {
      Rendered::Items { items, .. } => items.get(index).map(|m| m.item),
      _ => None,
    }
  }
}

fn product_row(product: &Product) -> Line<'static> {
  let stock = if product.in_stock() {
    Span::styled(format!("{:>4} left", product.quantity), Style::default().fg(Color::Green))
  } else {
    Span::styled("sold out".to_string(), Style::default().fg(Color::Red))
  };
  Line::from(vec![
    Span::styled(
      format!("{:<36}", truncate(&product.product_name, 36)),
      Style::default().fg(Color::White),
    ),
    Span::raw(" "),
    Span::styled(format!("{:>16}", format_price(product.product_price)), Style::default().fg(Color::Yellow)),
    Span::raw("  "),
    stock,
    Span::raw("  "),
    Span::styled(
      truncate(product.provider.as_deref().unwrap_or_default(), 20),
      Style::default().fg(Color::DarkGray),
    ),
  ])
}

impl View for ProductListView {
  fn handle_key(&mut self, key: KeyEvent, _modals: &mut ModalStores) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('l') | KeyCode::Right => self.go_to_page(self.current_page() + 1),
      KeyCode::Char('h') | KeyCode::Left => self.go_to_page(self.current_page().saturating_sub(1)),
      KeyCode::Char('r') => {
        self.source.refetch();
        self.mapper.is_loading = true;
      }
      KeyCode::Enter => {
        if let Some(product) = self.selected() {
          let id = product.id.clone();
          return ViewAction::Push(Box::new(ProductDetailView::new(self.services.clone(), id)));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let status = match self.source.error() {
      Some(e) => format!("error: {}", truncate(e, 40)),
      None => format!("page {}/{}", self.current_page(), self.total_pages()),
    };
    let block = Block::default()
      .title(format!(" {} ({status}) ", self.breadcrumb_label()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let rendered = self.mapper.map(self.source.products(), |p| p.id.clone(), product_row);
    ensure_valid_selection(&mut self.list_state, rendered.len());
    let empty = if self.source.error().is_some() {
      "Failed to load products. Press 'r' to retry."
    } else {
      "No products found."
    };
    render_mapped(frame, area, block, &rendered, empty, &mut self.list_state);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.catalog {
      Catalog::All => "Products".to_string(),
      Catalog::Provider(slug) => format!("Provider [{slug}]"),
    }
  }

  fn tick(&mut self, _modals: &mut ModalStores) {
    self.source.poll();
    self.mapper.is_loading = self.source.is_loading();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("Enter", "open").with_priority(20),
      ShortcutInfo::new("h/l", "page").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(id: &str, quantity: u32) -> Product {
    Product {
      id: id.to_string(),
      product_name: format!("Lantern {id}"),
      product_price: 120_000.0,
      quantity,
      ..Product::default()
    }
  }

  #[test]
  fn test_row_marks_sold_out() {
    let line = product_row(&product("1", 0));
    assert!(line.spans.iter().any(|s| s.content == "sold out"));
    let line = product_row(&product("2", 3));
    assert!(!line.spans.iter().any(|s| s.content == "sold out"));
  }
}
