//! Orders placed from the cart.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_present, lenient_string, Page, PageParams};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Order";

pub mod keys {
  use super::*;

  pub fn list() -> QueryKey {
    QueryKey::new("order_list")
  }

  pub fn page(params: &PageParams) -> QueryKey {
    list().with_params(params)
  }

  pub fn detail(id: &str) -> QueryKey {
    QueryKey::new("order").with(id)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Order {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub code: String,
  pub status: String,
  pub total_price: f64,
  pub created_at: String,
  pub address: String,
  pub details: Vec<OrderLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderLine {
  #[serde(deserialize_with = "lenient_string")]
  pub product_id: String,
  pub product_name: String,
  pub quantity: u32,
  pub unit_price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
  pub address_id: String,
  pub payment_method: String,
  pub note: Option<String>,
}

impl Validate for CreateOrder {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.address_id, "Address")?;
    require(&self.payment_method, "Payment method")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrder {
  pub order_id: String,
  pub reason: String,
}

impl Validate for CancelOrder {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.order_id, "Order id")
  }
}

/// Defaults for order listings: newest first.
pub fn default_params() -> PageParams {
  PageParams::default().sorted_by("createdAt", true)
}

impl DecorClient {
  pub async fn order_list(&self, params: &PageParams) -> Result<Page<Order>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("list").params(params);
    self
      .cached(&keys::page(params), self.http().get(&endpoint, true))
      .await
  }

  pub async fn order_detail(&self, id: &str) -> Result<Order, ApiError> {
    let endpoint = Endpoint::new(BASE).path(id);
    self
      .cached(&keys::detail(id), self.http().get_data(&endpoint, true))
      .await
  }

  /// Place an order from the current cart.
  pub async fn create_order(&self, input: &CreateOrder) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("create");
    self
      .mutate(
        input,
        &[keys::list(), super::cart::keys::cart()],
        self.http().post(&endpoint, input, true),
      )
      .await
  }

  pub async fn cancel_order(&self, input: &CancelOrder) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("cancel").path(&input.order_id);
    self
      .mutate(
        input,
        &[keys::list(), keys::detail(&input.order_id)],
        self.http().put(&endpoint, input, true),
      )
      .await
  }
}

pub fn order_list_query(client: &DecorClient, params: PageParams) -> Query<Page<Order>> {
  client.query(keys::page(&params), true, move |c| {
    let params = params.clone();
    async move { c.order_list(&params).await }
  })
}

/// Disabled until an order id is known.
pub fn order_detail_query(client: &DecorClient, id: Option<String>) -> Query<Order> {
  let key = keys::detail(id.as_deref().unwrap_or_default());
  client.query(key, is_present(id.as_deref()), move |c| {
    let id = id.clone().unwrap_or_default();
    async move { c.order_detail(&id).await }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;
  use std::time::Duration;

  #[tokio::test]
  async fn test_cancel_invalidates_order_list() {
    let server = MockServer::start_async().await;
    let list = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/Order/list")
          .query_param("pageIndex", "1")
          .query_param("sortBy", "createdAt");
        then.status(200).json_body(json!({
          "items": [{"id": 1, "code": "ORD-1", "status": "Pending"}],
          "totalCount": 1
        }));
      })
      .await;
    let cancel = server
      .mock_async(|when, then| {
        when.method(PUT).path("/api/Order/cancel/1");
        then.status(200).json_body(json!({"success": true}));
      })
      .await;

    let client = client_for(&server);
    let params = default_params();

    let first = client.order_list(&params).await.unwrap();
    assert_eq!(first.items[0].id, "1");
    client.order_list(&params).await.unwrap();
    list.assert_calls_async(1).await;

    client
      .cancel_order(&CancelOrder {
        order_id: "1".into(),
        reason: "changed my mind".into(),
      })
      .await
      .unwrap();
    cancel.assert_calls_async(1).await;

    client.order_list(&params).await.unwrap();
    list.assert_calls_async(2).await;
  }

  #[tokio::test]
  async fn test_create_order_validates_before_sending() {
    let server = MockServer::start_async().await;
    let create = server
      .mock_async(|when, then| {
        when.method(POST).path("/api/Order/create");
        then.status(200);
      })
      .await;

    let client = client_for(&server);
    let err = client
      .create_order(&CreateOrder {
        address_id: String::new(),
        payment_method: "wallet".into(),
        note: None,
      })
      .await
      .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Address is required");
    create.assert_calls_async(0).await;
  }

  #[tokio::test]
  async fn test_detail_query_disabled_without_id() {
    let server = MockServer::start_async().await;
    let detail = server
      .mock_async(|when, then| {
        when.method(GET).path_includes("/api/Order/");
        then.status(200).json_body(json!({"data": {}}));
      })
      .await;

    let client = client_for(&server);
    for id in [None, Some(String::new()), Some(" ".to_string())] {
      let mut query = order_detail_query(&client, id);
      assert!(!query.is_enabled());
      query.fetch();
      tokio::time::sleep(Duration::from_millis(20)).await;
      query.poll();

      assert!(!query.is_loading());
      assert!(query.data().is_none());
    }
    detail.assert_calls_async(0).await;
  }

  #[tokio::test]
  async fn test_detail_unwraps_envelope() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Order/o-9");
        then.status(200).json_body(json!({
          "data": {"id": "o-9", "status": "Delivered", "totalPrice": 120.5}
        }));
      })
      .await;

    let client = client_for(&server);
    let order = client.order_detail("o-9").await.unwrap();
    assert_eq!(order.status, "Delivered");
    assert_eq!(order.total_price, 120.5);
  }
}
