use serde::{Deserialize, Serialize};

use crate::api::{ApiError, Endpoint};
use crate::client::{DecorClient, Validate};

const BASE: &str = "api/TopUp";

/// Smallest accepted top-up.
pub const MIN_AMOUNT: f64 = 10_000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
  pub amount: f64,
}

impl Validate for TopUpRequest {
  fn validate(&self) -> Result<(), ApiError> {
    if self.amount.is_nan() || self.amount < MIN_AMOUNT {
      return Err(ApiError::validation(format!(
        "Top-up amount must be at least {MIN_AMOUNT}"
      )));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopUpResponse {
  pub payment_url: Option<String>,
  pub message: Option<String>,
}

impl DecorClient {
  pub async fn top_up(&self, input: &TopUpRequest) -> Result<TopUpResponse, ApiError> {
    let endpoint = Endpoint::new(BASE).path("deposit");
    self
      .mutate(
        input,
        &[super::wallet::keys::all()],
        self.http().post(&endpoint, input, true),
      )
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use crate::resources::wallet;
  use httpmock::prelude::*;
  use serde_json::json;

  #[tokio::test]
  async fn test_top_up_invalidates_wallet() {
    let server = MockServer::start_async().await;
    let balance = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Wallet/getWalletBalance");
        then.status(200).json_body(json!({"data": {"balance": 50000}}));
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method(POST).path("/api/TopUp/deposit");
        then.status(200).json_body(json!({"paymentUrl": "https://pay.example/1"}));
      })
      .await;

    let client = client_for(&server);
    let wallet::Wallet { balance: before, .. } = client.wallet_balance().await.unwrap();
    assert_eq!(before, 50000.0);

    let response = client.top_up(&TopUpRequest { amount: 20_000.0 }).await.unwrap();
    assert_eq!(response.payment_url.as_deref(), Some("https://pay.example/1"));

    client.wallet_balance().await.unwrap();
    balance.assert_calls_async(2).await;
  }

  #[test]
  fn test_small_amount_rejected() {
    assert!(TopUpRequest { amount: 500.0 }.validate().unwrap_err().is_validation());
  }
}
