//! Seller and admin dashboards.

use serde::{Deserialize, Serialize};

use crate::api::{ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::DecorClient;
use crate::query::Query;

const BASE: &str = "api/Dashboard";

pub mod keys {
  use super::*;

  pub fn all() -> QueryKey {
    QueryKey::new("dashboard")
  }

  pub fn seller() -> QueryKey {
    all().with("provider")
  }

  pub fn admin() -> QueryKey {
    all().with("admin")
  }

  pub fn monthly_revenue() -> QueryKey {
    all().with("monthly_revenue")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Summary {
  pub total_revenue: f64,
  pub total_orders: u64,
  pub total_bookings: u64,
  pub total_customers: u64,
  pub pending_bookings: u64,
  pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopProduct {
  pub product_name: String,
  pub total_sold: u64,
  pub revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonthlyRevenue {
  pub month: u32,
  pub revenue: f64,
}

impl DecorClient {
  pub async fn seller_dashboard(&self) -> Result<Summary, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getProviderDashboard");
    self
      .cached(&keys::seller(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn admin_dashboard(&self) -> Result<Summary, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getAdminDashboard");
    self
      .cached(&keys::admin(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn monthly_revenue(&self) -> Result<Vec<MonthlyRevenue>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getMonthlyRevenue");
    self
      .cached(&keys::monthly_revenue(), self.http().get_data(&endpoint, true))
      .await
  }
}

pub fn seller_dashboard_query(client: &DecorClient) -> Query<Summary> {
  client.query(keys::seller(), true, |c| async move {
    c.seller_dashboard().await
  })
}

pub fn admin_dashboard_query(client: &DecorClient) -> Query<Summary> {
  client.query(keys::admin(), true, |c| async move {
    c.admin_dashboard().await
  })
}

pub fn monthly_revenue_query(client: &DecorClient) -> Query<Vec<MonthlyRevenue>> {
  client.query(keys::monthly_revenue(), true, |c| async move {
    c.monthly_revenue().await
  })
}
