//! Provider quotations for a booking.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_present, lenient_string};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Quotation";

pub mod keys {
  use super::*;

  pub fn by_booking(booking_code: &str) -> QueryKey {
    QueryKey::new("quotation").with(booking_code)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Quotation {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub quotation_code: String,
  pub booking_code: String,
  pub status: String,
  pub material_cost: f64,
  pub construction_cost: f64,
  pub deposit_percentage: f64,
  pub items: Vec<QuotationItem>,
}

impl Quotation {
  pub fn total(&self) -> f64 {
    self.material_cost + self.construction_cost
  }

  pub fn deposit(&self) -> f64 {
    self.total() * self.deposit_percentage / 100.0
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuotationItem {
  pub item_name: String,
  pub quantity: u32,
  pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotation {
  pub booking_code: String,
  pub deposit_percentage: f64,
  pub items: Vec<QuotationItem>,
}

impl Validate for CreateQuotation {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.booking_code, "Booking code")?;
    if self.items.is_empty() {
      return Err(ApiError::validation("At least one item is required"));
    }
    if !(0.0..=100.0).contains(&self.deposit_percentage) {
      return Err(ApiError::validation("Deposit must be between 0 and 100 percent"));
    }
    Ok(())
  }
}

/// Customer decision on a quotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDecision {
  pub quotation_code: String,
  #[serde(skip)]
  pub booking_code: String,
  pub reason: Option<String>,
}

impl Validate for QuotationDecision {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.quotation_code, "Quotation code")?;
    require(&self.booking_code, "Booking code")
  }
}

impl DecorClient {
  pub async fn quotation_by_booking(&self, booking_code: &str) -> Result<Quotation, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getQuotationDetailByCustomer").path(booking_code);
    self
      .cached(
        &keys::by_booking(booking_code),
        self.http().get_data(&endpoint, true),
      )
      .await
  }

  pub async fn create_quotation(&self, input: &CreateQuotation) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("createQuotation").path(&input.booking_code);
    self
      .mutate(
        input,
        &[
          keys::by_booking(&input.booking_code),
          super::booking::keys::detail(&input.booking_code),
        ],
        self.http().post(&endpoint, input, true),
      )
      .await
  }

  pub async fn accept_quotation(&self, input: &QuotationDecision) -> Result<Value, ApiError> {
    self.decide_quotation("confirmQuotation", input).await
  }

  pub async fn reject_quotation(&self, input: &QuotationDecision) -> Result<Value, ApiError> {
    self.decide_quotation("rejectQuotation", input).await
  }

  async fn decide_quotation(&self, action: &str, input: &QuotationDecision) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path(action).path(&input.quotation_code);
    self
      .mutate(
        input,
        &[
          keys::by_booking(&input.booking_code),
          super::booking::keys::list(),
          super::booking::keys::detail(&input.booking_code),
        ],
        self.http().put(&endpoint, input, true),
      )
      .await
  }
}

pub fn quotation_query(client: &DecorClient, booking_code: Option<String>) -> Query<Quotation> {
  let key = keys::by_booking(booking_code.as_deref().unwrap_or_default());
  client.query(key, is_present(booking_code.as_deref()), move |c| {
    let code = booking_code.clone().unwrap_or_default();
    async move { c.quotation_by_booking(&code).await }
  })
}
