//! Service contracts attached to a booking.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_present, lenient_string};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/contract";

pub mod keys {
  use super::*;

  pub fn by_booking(booking_code: &str) -> QueryKey {
    QueryKey::new("contract").with(booking_code)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contract {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub contract_code: String,
  pub booking_code: String,
  pub status: String,
  pub file_url: Option<String>,
  pub is_signed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignContract {
  pub contract_code: String,
  pub booking_code: String,
}

impl Validate for SignContract {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.contract_code, "Contract code")?;
    require(&self.booking_code, "Booking")
  }
}

impl DecorClient {
  pub async fn contract_by_booking(&self, booking_code: &str) -> Result<Contract, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getContractFile").path(booking_code);
    self
      .cached(
        &keys::by_booking(booking_code),
        self.http().get_data(&endpoint, true),
      )
      .await
  }

  pub async fn sign_contract(&self, input: &SignContract) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("sign").path(&input.contract_code);
    self
      .mutate(
        input,
        &[
          keys::by_booking(&input.booking_code),
          super::booking::keys::detail(&input.booking_code),
        ],
        self.http().post(&endpoint, &(), true),
      )
      .await
  }
}

pub fn contract_query(client: &DecorClient, booking_code: Option<String>) -> Query<Contract> {
  let key = keys::by_booking(booking_code.as_deref().unwrap_or_default());
  client.query(key, is_present(booking_code.as_deref()), move |c| {
    let code = booking_code.clone().unwrap_or_default();
    async move { c.contract_by_booking(&code).await }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;
  use std::time::Duration;

  fn sign(booking_code: &str) -> SignContract {
    SignContract {
      contract_code: "CT-1".into(),
      booking_code: booking_code.into(),
    }
  }

  #[tokio::test]
  async fn test_sign_refreshes_contract() {
    let server = MockServer::start_async().await;
    let file = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/contract/getContractFile/B-1");
        then.status(200).json_body(json!({
          "data": {"id": 3, "contractCode": "CT-1", "bookingCode": "B-1", "isSigned": false}
        }));
      })
      .await;
    let signed = server
      .mock_async(|when, then| {
        when.method(POST).path("/api/contract/sign/CT-1");
        then.status(200).json_body(json!({"success": true}));
      })
      .await;

    let client = client_for(&server);
    let contract = client.contract_by_booking("B-1").await.unwrap();
    assert_eq!(contract.id, "3");
    assert!(!contract.is_signed);
    client.contract_by_booking("B-1").await.unwrap();
    file.assert_calls_async(1).await;

    client.sign_contract(&sign("B-1")).await.unwrap();
    signed.assert_calls_async(1).await;

    client.contract_by_booking("B-1").await.unwrap();
    file.assert_calls_async(2).await;
  }

  #[tokio::test]
  async fn test_sign_requires_booking() {
    let server = MockServer::start_async().await;
    let signed = server
      .mock_async(|when, then| {
        when.method(POST).path_includes("/api/contract/sign");
        then.status(200);
      })
      .await;

    let client = client_for(&server);
    let err = client.sign_contract(&sign("")).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Booking is required");
    signed.assert_calls_async(0).await;
  }

  #[tokio::test]
  async fn test_query_disabled_for_blank_booking() {
    let server = MockServer::start_async().await;
    let file = server
      .mock_async(|when, then| {
        when.method(GET).path_includes("/api/contract/");
        then.status(200).json_body(json!({"data": {}}));
      })
      .await;

    let client = client_for(&server);
    let mut query = contract_query(&client, Some(String::new()));
    query.fetch();
    tokio::time::sleep(Duration::from_millis(20)).await;
    query.poll();

    assert!(!query.is_enabled());
    assert!(query.data().is_none());
    file.assert_calls_async(0).await;
  }
}
