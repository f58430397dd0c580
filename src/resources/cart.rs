//! Shopping cart. Every write invalidates the whole cart.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient_string;
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Cart";

pub mod keys {
  use super::*;

  pub fn cart() -> QueryKey {
    QueryKey::new("cart")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cart {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub total_price: f64,
  pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CartItem {
  #[serde(deserialize_with = "lenient_string")]
  pub product_id: String,
  pub product_name: String,
  pub quantity: u32,
  pub unit_price: f64,
  pub image: Option<String>,
}

impl CartItem {
  pub fn line_total(&self) -> f64 {
    self.unit_price * f64::from(self.quantity)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: String,
  pub quantity: u32,
}

impl Validate for CartLine {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.product_id, "Product")?;
    if self.quantity == 0 {
      return Err(ApiError::validation("Quantity must be at least 1"));
    }
    Ok(())
  }
}

impl DecorClient {
  pub async fn cart(&self) -> Result<Cart, ApiError> {
    let endpoint = Endpoint::new(BASE);
    self
      .cached(&keys::cart(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn add_to_cart(&self, line: &CartLine) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("addToCart");
    self
      .mutate(line, &[keys::cart()], self.http().post(&endpoint, line, true))
      .await
  }

  pub async fn update_cart_quantity(&self, line: &CartLine) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("updateQuantity");
    self
      .mutate(line, &[keys::cart()], self.http().put(&endpoint, line, true))
      .await
  }

  pub async fn remove_from_cart(&self, product_id: &str) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("removeProduct").path(product_id);
    self
      .mutate(
        &ProductRef(product_id),
        &[keys::cart()],
        self.http().delete(&endpoint, true),
      )
      .await
  }
}

struct ProductRef<'a>(&'a str);

impl Validate for ProductRef<'_> {
  fn validate(&self) -> Result<(), ApiError> {
    require(self.0, "Product")
  }
}

pub fn cart_query(client: &DecorClient) -> Query<Cart> {
  client.query(keys::cart(), true, |c| async move { c.cart().await })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;

  #[test]
  fn test_zero_quantity_rejected() {
    let line = CartLine {
      product_id: "p1".into(),
      quantity: 0,
    };
    assert!(line.validate().unwrap_err().is_validation());
  }

  #[tokio::test]
  async fn test_add_then_read_refetches_cart() {
    let server = MockServer::start_async().await;
    let get = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Cart").header("authorization", "Bearer token");
        then.status(200).json_body(json!({
          "data": {"id": 7, "totalPrice": 30.0, "cartItems": [
            {"productId": 3, "productName": "Lantern", "quantity": 2, "unitPrice": 15.0}
          ]}
        }));
      })
      .await;
    let add = server
      .mock_async(|when, then| {
        when
          .method(POST)
          .path("/api/Cart/addToCart")
          .json_body(json!({"productId": "3", "quantity": 1}));
        then.status(200).json_body(json!({"message": "ok"}));
      })
      .await;

    let client = client_for(&server);
    let cart = client.cart().await.unwrap();
    assert_eq!(cart.cart_items[0].product_id, "3");
    assert_eq!(cart.cart_items[0].line_total(), 30.0);

    client
      .add_to_cart(&CartLine {
        product_id: "3".into(),
        quantity: 1,
      })
      .await
      .unwrap();
    add.assert_calls_async(1).await;

    client.cart().await.unwrap();
    get.assert_calls_async(2).await;
  }

  #[tokio::test]
  async fn test_failed_remove_keeps_cache() {
    let server = MockServer::start_async().await;
    let get = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Cart");
        then.status(200).json_body(json!({"data": {"cartItems": []}}));
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method(DELETE).path("/api/Cart/removeProduct/9");
        then.status(404).json_body(json!({"message": "Product not in cart"}));
      })
      .await;

    let client = client_for(&server);
    client.cart().await.unwrap();
    let err = client.remove_from_cart("9").await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    client.cart().await.unwrap();
    get.assert_calls_async(1).await;
  }
}
