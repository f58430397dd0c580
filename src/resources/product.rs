//! Decoration products sold by providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_present, lenient_opt_string, lenient_string, Page, PageParams};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Product";

pub mod keys {
  use super::*;

  pub fn all() -> QueryKey {
    QueryKey::new("product")
  }

  pub fn list() -> QueryKey {
    all().with("list")
  }

  pub fn page(params: &PageParams) -> QueryKey {
    list().with_params(params)
  }

  pub fn detail(id: &str) -> QueryKey {
    all().with("detail").with(id)
  }

  pub fn by_provider(slug: &str) -> QueryKey {
    all().with("provider").with(slug)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub product_name: String,
  pub description: Option<String>,
  pub product_price: f64,
  pub quantity: u32,
  pub rate: f64,
  pub total_sold: u32,
  #[serde(deserialize_with = "lenient_opt_string")]
  pub category_id: Option<String>,
  pub category_name: Option<String>,
  pub provider: Option<String>,
  #[serde(deserialize_with = "lenient_opt_string")]
  pub provider_id: Option<String>,
  pub slug: Option<String>,
  pub image_urls: Vec<String>,
}

impl Product {
  pub fn in_stock(&self) -> bool {
    self.quantity > 0
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
  pub product_name: String,
  pub description: String,
  pub product_price: f64,
  pub quantity: u32,
  pub category_id: String,
  pub image_urls: Vec<String>,
}

impl Validate for ProductForm {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.product_name, "Product name")?;
    require(&self.category_id, "Category")?;
    if self.product_price.is_nan() || self.product_price <= 0.0 {
      return Err(ApiError::validation("Price must be greater than 0"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateProduct {
  #[serde(skip)]
  pub id: String,
  #[serde(flatten)]
  pub form: ProductForm,
}

impl Validate for UpdateProduct {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.id, "Product id")?;
    self.form.validate()
  }
}

struct ProductId<'a>(&'a str);

impl Validate for ProductId<'_> {
  fn validate(&self) -> Result<(), ApiError> {
    require(self.0, "Product id")
  }
}

pub fn default_params() -> PageParams {
  PageParams::default()
}

impl DecorClient {
  pub async fn product_list(&self, params: &PageParams) -> Result<Page<Product>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getPaginate").params(params);
    self
      .cached(&keys::page(params), self.http().get(&endpoint, false))
      .await
  }

  pub async fn product_detail(&self, id: &str) -> Result<Product, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getById").path(id);
    self
      .cached(&keys::detail(id), self.http().get_data(&endpoint, false))
      .await
  }

  pub async fn products_by_provider(&self, slug: &str) -> Result<Vec<Product>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getProductByProvider").path(slug);
    self
      .cached(&keys::by_provider(slug), self.http().get_data(&endpoint, false))
      .await
  }

  pub async fn create_product(&self, form: &ProductForm) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("create");
    self
      .mutate(form, &[keys::all()], self.http().post(&endpoint, form, true))
      .await
  }

  pub async fn update_product(&self, input: &UpdateProduct) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("update").path(&input.id);
    self
      .mutate(input, &[keys::all()], self.http().put(&endpoint, input, true))
      .await
  }

  /// Deleting also drops the product from the cart.
  pub async fn delete_product(&self, id: &str) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("delete").path(id);
    self
      .mutate(
        &ProductId(id),
        &[keys::all(), super::cart::keys::cart()],
        self.http().delete(&endpoint, true),
      )
      .await
  }
}

pub fn product_list_query(client: &DecorClient, params: PageParams) -> Query<Page<Product>> {
  client.query(keys::page(&params), true, move |c| {
    let params = params.clone();
    async move { c.product_list(&params).await }
  })
}

pub fn product_detail_query(client: &DecorClient, id: Option<String>) -> Query<Product> {
  let key = keys::detail(id.as_deref().unwrap_or_default());
  client.query(key, is_present(id.as_deref()), move |c| {
    let id = id.clone().unwrap_or_default();
    async move { c.product_detail(&id).await }
  })
}

pub fn provider_products_query(client: &DecorClient, slug: Option<String>) -> Query<Vec<Product>> {
  let key = keys::by_provider(slug.as_deref().unwrap_or_default());
  client.query(key, is_present(slug.as_deref()), move |c| {
    let slug = slug.clone().unwrap_or_default();
    async move { c.products_by_provider(&slug).await }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;

  #[test]
  fn test_same_filters_share_key() {
    let a = PageParams::default().filter("categoryId", 2).filter("provider", "lumi");
    let b = PageParams::default().filter("provider", "lumi").filter("categoryId", 2);
    let c = PageParams::default().filter("categoryId", 3);
    assert_eq!(keys::page(&a), keys::page(&b));
    assert_ne!(keys::page(&a), keys::page(&c));
    assert!(keys::page(&a).starts_with(&keys::all()));
  }

  #[test]
  fn test_form_requires_price() {
    let form = ProductForm {
      product_name: "Garland".into(),
      category_id: "1".into(),
      ..ProductForm::default()
    };
    assert_eq!(form.validate().unwrap_err().to_string(), "Price must be greater than 0");
  }

  #[tokio::test]
  async fn test_list_is_public_and_paged() {
    let server = MockServer::start_async().await;
    let list = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/Product/getPaginate")
          .query_param("pageIndex", "2")
          .query_param("pageSize", "10");
        then.status(200).json_body(json!({
          "data": [{"id": 11, "productName": "Garland", "productPrice": 12.0, "quantity": 4}],
          "totalCount": 11
        }));
      })
      .await;

    let client = client_for(&server);
    let params = default_params().page(2);
    let page = client.product_list(&params).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert!(page.items[0].in_stock());
    assert!(!page.has_more(&params));
    list.assert_calls_async(1).await;
  }

  #[tokio::test]
  async fn test_update_invalidates_every_product_key() {
    let server = MockServer::start_async().await;
    let detail = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Product/getById/5");
        then.status(200).json_body(json!({"data": {"id": 5, "productName": "Lamp"}}));
      })
      .await;
    let update = server
      .mock_async(|when, then| {
        when
          .method(PUT)
          .path("/api/Product/update/5")
          .json_body_includes(r#"{"productName": "Lamp XL"}"#);
        then.status(200).json_body(json!({"message": "updated"}));
      })
      .await;

    let client = client_for(&server);
    client.product_detail("5").await.unwrap();
    client
      .update_product(&UpdateProduct {
        id: "5".into(),
        form: ProductForm {
          product_name: "Lamp XL".into(),
          product_price: 40.0,
          category_id: "2".into(),
          ..ProductForm::default()
        },
      })
      .await
      .unwrap();
    client.product_detail("5").await.unwrap();

    update.assert_calls_async(1).await;
    detail.assert_calls_async(2).await;
  }
}
