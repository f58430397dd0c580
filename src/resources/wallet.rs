use serde::{Deserialize, Serialize};

use super::{lenient_string, Page, PageParams};
use crate::api::{ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::DecorClient;
use crate::query::Query;

const BASE: &str = "api/Wallet";

pub mod keys {
  use super::*;

  pub fn all() -> QueryKey {
    QueryKey::new("wallet")
  }

  pub fn balance() -> QueryKey {
    all().with("balance")
  }

  pub fn transactions(params: &PageParams) -> QueryKey {
    all().with("transactions").with_params(params)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Wallet {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub amount: f64,
  pub transaction_type: String,
  pub transaction_status: String,
  pub transaction_date: String,
}

pub fn default_params() -> PageParams {
  PageParams::default().sorted_by("transactionDate", true)
}

impl DecorClient {
  pub async fn wallet_balance(&self) -> Result<Wallet, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getWalletBalance");
    self
      .cached(&keys::balance(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn wallet_transactions(&self, params: &PageParams) -> Result<Page<Transaction>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getTransactionsDetails").params(params);
    self
      .cached(&keys::transactions(params), self.http().get(&endpoint, true))
      .await
  }
}

pub fn wallet_query(client: &DecorClient) -> Query<Wallet> {
  client.query(keys::balance(), true, |c| async move {
    c.wallet_balance().await
  })
}

pub fn transactions_query(client: &DecorClient, params: PageParams) -> Query<Page<Transaction>> {
  client.query(keys::transactions(&params), true, move |c| {
    let params = params.clone();
    async move { c.wallet_transactions(&params).await }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_transactions_are_paged_and_keyed_by_params() {
    let server = MockServer::start_async().await;
    let first = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/Wallet/getTransactionsDetails")
          .query_param("pageIndex", "1")
          .query_param("sortBy", "transactionDate")
          .query_param("descending", "true");
        then.status(200).json_body(json!({
          "items": [{"id": 9, "amount": -20.0, "transactionType": "Payment"}],
          "totalCount": 11
        }));
      })
      .await;
    let second = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/Wallet/getTransactionsDetails")
          .query_param("pageIndex", "2");
        then.status(200).json_body(json!({"items": [], "totalCount": 11}));
      })
      .await;

    let client = client_for(&server);
    let params = default_params();
    let page = client.wallet_transactions(&params).await.unwrap();
    assert_eq!(page.items[0].id, "9");
    assert!(page.has_more(&params));

    client.wallet_transactions(&params).await.unwrap();
    client.wallet_transactions(&params.clone().page(2)).await.unwrap();
    first.assert_calls_async(1).await;
    second.assert_calls_async(1).await;
  }
}
