//! Favorite decoration services.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient_string;
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/FavoriteService";

pub mod keys {
  use super::*;

  pub fn list() -> QueryKey {
    QueryKey::new("favorites")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Favorite {
  #[serde(deserialize_with = "lenient_string")]
  pub favorite_id: String,
  #[serde(deserialize_with = "lenient_string")]
  pub decor_service_id: String,
  pub style: String,
  pub province: Option<String>,
}

struct ServiceId<'a>(&'a str);

impl Validate for ServiceId<'_> {
  fn validate(&self) -> Result<(), ApiError> {
    require(self.0, "Service")
  }
}

impl DecorClient {
  pub async fn favorites(&self) -> Result<Vec<Favorite>, ApiError> {
    let endpoint = Endpoint::new(BASE);
    self
      .cached(&keys::list(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn add_favorite(&self, service_id: &str) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path(service_id);
    self
      .mutate(
        &ServiceId(service_id),
        &[keys::list()],
        self.http().post(&endpoint, &(), true),
      )
      .await
  }

  pub async fn remove_favorite(&self, service_id: &str) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path(service_id);
    self
      .mutate(
        &ServiceId(service_id),
        &[keys::list()],
        self.http().delete(&endpoint, true),
      )
      .await
  }

  /// True when `service_id` is among the cached favorites.
  pub fn is_favorite(&self, service_id: &str) -> bool {
    matches!(
      self.cache().peek::<Vec<Favorite>>(&keys::list()),
      Ok(Some(list)) if list.iter().any(|f| f.decor_service_id == service_id)
    )
  }
}

pub fn favorites_query(client: &DecorClient) -> Query<Vec<Favorite>> {
  client.query(keys::list(), true, |c| async move { c.favorites().await })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_is_favorite_reads_cache() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/FavoriteService");
        then.status(200).json_body(json!({
          "data": [{"favoriteId": 1, "decorServiceId": 8, "style": "Rustic"}]
        }));
      })
      .await;

    let client = client_for(&server);
    assert!(!client.is_favorite("8"));
    client.favorites().await.unwrap();
    assert!(client.is_favorite("8"));
    assert!(!client.is_favorite("9"));
  }
}
