//! Decoration service bookings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_present, lenient_string, Page, PageParams};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Booking";

pub mod keys {
  use super::*;

  pub fn list() -> QueryKey {
    QueryKey::new("booking_list")
  }

  pub fn page(params: &PageParams) -> QueryKey {
    list().with_params(params)
  }

  pub fn detail(code: &str) -> QueryKey {
    QueryKey::new("booking").with(code)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Booking {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub booking_code: String,
  pub status: String,
  pub service_name: String,
  pub provider_name: Option<String>,
  pub address: String,
  pub survey_date: Option<String>,
  pub total_price: f64,
  pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
  pub decor_service_id: String,
  pub address_id: String,
  pub survey_date: String,
  pub note: Option<String>,
}

impl Validate for CreateBooking {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.decor_service_id, "Service")?;
    require(&self.address_id, "Address")?;
    require(&self.survey_date, "Survey date")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBooking {
  #[serde(skip)]
  pub booking_code: String,
  pub reason: String,
}

impl Validate for CancelBooking {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.booking_code, "Booking code")?;
    require(&self.reason, "Cancel reason")
  }
}

pub fn default_params() -> PageParams {
  PageParams::default().sorted_by("createdAt", true)
}

impl DecorClient {
  pub async fn booking_list(&self, params: &PageParams) -> Result<Page<Booking>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getPaginatedList").params(params);
    self
      .cached(&keys::page(params), self.http().get(&endpoint, true))
      .await
  }

  pub async fn booking_detail(&self, code: &str) -> Result<Booking, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getBookingDetail").path(code);
    self
      .cached(&keys::detail(code), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn create_booking(&self, input: &CreateBooking) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("create");
    self
      .mutate(input, &[keys::list()], self.http().post(&endpoint, input, true))
      .await
  }

  pub async fn cancel_booking(&self, input: &CancelBooking) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("cancel").path(&input.booking_code);
    self
      .mutate(
        input,
        &[keys::list(), keys::detail(&input.booking_code)],
        self.http().put(&endpoint, input, true),
      )
      .await
  }
}

pub fn booking_list_query(client: &DecorClient, params: PageParams) -> Query<Page<Booking>> {
  client.query(keys::page(&params), true, move |c| {
    let params = params.clone();
    async move { c.booking_list(&params).await }
  })
}

pub fn booking_detail_query(client: &DecorClient, code: Option<String>) -> Query<Booking> {
  let key = keys::detail(code.as_deref().unwrap_or_default());
  client.query(key, is_present(code.as_deref()), move |c| {
    let code = code.clone().unwrap_or_default();
    async move { c.booking_detail(&code).await }
  })
}
