//! Path to view mapping for the TUI.

use crate::config::GuardConfig;
use crate::ui::view::{Services, View};
use crate::ui::views::{
  Audience, CartView, Catalog, DashboardView, Notice, NoticeView, OrderListView, ProductDetailView,
  ProductListView,
};

pub const HOME: &str = "/products";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Products,
  Product(String),
  Provider(String),
  Orders,
  Cart,
  SellerDashboard,
  AdminDashboard,
  SignIn,
  Unauthorized,
  NotFound(String),
}

impl Route {
  /// Match a path; the sign-in and unauthorized paths come from config.
  pub fn parse(path: &str, guard: &GuardConfig) -> Route {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed == guard.login_path.trim_end_matches('/') {
      return Route::SignIn;
    }
    if trimmed == guard.unauthorized_path.trim_end_matches('/') {
      return Route::Unauthorized;
    }

    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
      [] | ["products"] => Route::Products,
      ["products", id] => Route::Product(id.to_string()),
      ["provider", slug] => Route::Provider(slug.to_string()),
      ["orders"] => Route::Orders,
      ["cart"] => Route::Cart,
      ["seller"] | ["seller", "dashboard"] => Route::SellerDashboard,
      ["admin"] | ["admin", "dashboard"] => Route::AdminDashboard,
      _ => Route::NotFound(path.to_string()),
    }
  }

  /// Build the view; `from` is the path a guard redirect came from.
  pub fn build(self, services: &Services, from: Option<String>) -> Box<dyn View> {
    let services = services.clone();
    match self {
      Route::Products => Box::new(ProductListView::new(services, Catalog::All)),
      Route::Product(id) => Box::new(ProductDetailView::new(services, id)),
      Route::Provider(slug) => Box::new(ProductListView::new(services, Catalog::Provider(slug))),
      Route::Orders => Box::new(OrderListView::new(services)),
      Route::Cart => Box::new(CartView::new(services)),
      Route::SellerDashboard => Box::new(DashboardView::new(services, Audience::Seller)),
      Route::AdminDashboard => Box::new(DashboardView::new(services, Audience::Admin)),
      Route::SignIn => Box::new(NoticeView::new(services, Notice::SignIn { from })),
      Route::Unauthorized => Box::new(NoticeView::new(services, Notice::Unauthorized { from })),
      Route::NotFound(path) => Box::new(NoticeView::new(services, Notice::NotFound(path))),
    }
  }
}
