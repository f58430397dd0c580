mod cart;
mod dashboard;
mod notice;
mod order_list;
mod product_detail;
mod product_list;

pub use cart::CartView;
pub use dashboard::{Audience, DashboardView};
pub use notice::{Notice, NoticeView};
pub use order_list::OrderListView;
pub use product_detail::ProductDetailView;
pub use product_list::{Catalog, ProductListView};

#[cfg(test)]
pub(crate) mod testing {
  use httpmock::MockServer;
  use std::sync::Arc;

  use crate::config::Config;
  use crate::resources::testing::client_for;
  use crate::ui::view::Services;

  /// Services backed by a mock server and default settings.
  pub fn services(server: &MockServer) -> Services {
    services_with(server, "")
  }

  /// Like `services`, with extra top-level YAML appended to the config.
  pub fn services_with(server: &MockServer, extra: &str) -> Services {
    let yaml = format!("api:\n  base_url: {}\n{extra}", server.base_url());
    Services {
      client: client_for(server),
      config: Arc::new(Config::parse(&yaml).unwrap()),
    }
  }
}
