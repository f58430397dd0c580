//! Payments for bookings and orders.

use serde::{Deserialize, Serialize};

use super::{lenient_string, Page, PageParams};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Payment";

pub mod keys {
  use super::*;

  pub fn history() -> QueryKey {
    QueryKey::new("payment_history")
  }

  pub fn page(params: &PageParams) -> QueryKey {
    history().with_params(params)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckout {
  /// Booking code or order id being paid.
  pub reference: String,
  pub amount: f64,
}

impl Validate for CreateCheckout {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.reference, "Payment reference")?;
    if self.amount.is_nan() || self.amount <= 0.0 {
      return Err(ApiError::validation("Amount must be greater than 0"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Checkout {
  pub checkout_url: Option<String>,
  pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentRecord {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub amount: f64,
  pub status: String,
  pub transaction_date: String,
  pub description: Option<String>,
}

impl DecorClient {
  /// Paying moves money out of the wallet as well.
  pub async fn create_checkout(&self, input: &CreateCheckout) -> Result<Checkout, ApiError> {
    let endpoint = Endpoint::new(BASE).path("checkout");
    self
      .mutate(
        input,
        &[
          keys::history(),
          super::wallet::keys::all(),
          super::booking::keys::list(),
          super::order::keys::list(),
        ],
        self.http().post(&endpoint, input, true),
      )
      .await
  }

  pub async fn payment_history(&self, params: &PageParams) -> Result<Page<PaymentRecord>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("history").params(params);
    self
      .cached(&keys::page(params), self.http().get(&endpoint, true))
      .await
  }
}

pub fn payment_history_query(client: &DecorClient, params: PageParams) -> Query<Page<PaymentRecord>> {
  client.query(keys::page(&params), true, move |c| {
    let params = params.clone();
    async move { c.payment_history(&params).await }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_checkout_refreshes_wallet_and_history() {
    let server = MockServer::start_async().await;
    let balance = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Wallet/getWalletBalance");
        then.status(200).json_body(json!({"data": {"id": 1, "balance": 500.0}}));
      })
      .await;
    let history = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Payment/history");
        then.status(200).json_body(json!({"items": [], "totalCount": 0}));
      })
      .await;
    let checkout = server
      .mock_async(|when, then| {
        when
          .method(POST)
          .path("/api/Payment/checkout")
          .json_body(json!({"reference": "BK-7", "amount": 120.0}));
        then.status(200).json_body(json!({"status": "Paid"}));
      })
      .await;

    let client = client_for(&server);
    let params = PageParams::default();
    client.wallet_balance().await.unwrap();
    client.payment_history(&params).await.unwrap();

    let result = client
      .create_checkout(&CreateCheckout {
        reference: "BK-7".into(),
        amount: 120.0,
      })
      .await
      .unwrap();
    assert_eq!(result.status, "Paid");
    assert!(result.checkout_url.is_none());
    checkout.assert_calls_async(1).await;

    client.wallet_balance().await.unwrap();
    client.payment_history(&params).await.unwrap();
    balance.assert_calls_async(2).await;
    history.assert_calls_async(2).await;
  }

  #[test]
  fn test_amount_must_be_positive() {
    let input = CreateCheckout {
      reference: "BK-7".into(),
      amount: 0.0,
    };
    assert_eq!(input.validate().unwrap_err().to_string(), "Amount must be greater than 0");
  }
}
