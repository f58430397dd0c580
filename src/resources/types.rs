//! Decoration types (season, occasion, style).

use serde::{Deserialize, Serialize};

use super::lenient_string;
use crate::api::{ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::DecorClient;
use crate::query::Query;

const BASE: &str = "api/DecorationType";

pub mod keys {
  use super::*;

  pub fn list() -> QueryKey {
    QueryKey::new("decoration_types")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecorationType {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub type_name: String,
}

impl DecorClient {
  pub async fn decoration_types(&self) -> Result<Vec<DecorationType>, ApiError> {
    let endpoint = Endpoint::new(BASE);
    self
      .cached(&keys::list(), self.http().get_data(&endpoint, false))
      .await
  }
}

pub fn decoration_types_query(client: &DecorClient) -> Query<Vec<DecorationType>> {
  client.query(keys::list(), true, |c| async move {
    c.decoration_types().await
  })
}
