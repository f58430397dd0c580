use serde::{Deserialize, Serialize};

use super::lenient_string;
use crate::api::{ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::DecorClient;
use crate::query::Query;

const BASE: &str = "api/Category";

pub mod keys {
  use super::*;

  pub fn list() -> QueryKey {
    QueryKey::new("category_list")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Category {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub category_name: String,
}

impl DecorClient {
  pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getList");
    self
      .cached(&keys::list(), self.http().get_data(&endpoint, false))
      .await
  }
}

pub fn categories_query(client: &DecorClient) -> Query<Vec<Category>> {
  client.query(keys::list(), true, |c| async move { c.categories().await })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;
  use std::time::Duration;

  #[tokio::test]
  async fn test_query_loads_and_caches_categories() {
    let server = MockServer::start_async().await;
    let list = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Category/getList");
        then.status(200).json_body(json!({
          "data": [{"id": 1, "categoryName": "Lighting"}, {"id": 2, "categoryName": "Flowers"}]
        }));
      })
      .await;

    let client = client_for(&server);
    let mut query = categories_query(&client);
    query.fetch();
    tokio::time::sleep(Duration::from_millis(50)).await;
    query.poll();

    let categories = query.data().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].id, "1");
    assert_eq!(categories[1].category_name, "Flowers");

    client.categories().await.unwrap();
    list.assert_calls_async(1).await;
  }
}
