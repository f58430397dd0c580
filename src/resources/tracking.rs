//! Progress updates posted by providers during a booking.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_present, lenient_string};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Tracking";

pub mod keys {
  use super::*;

  pub fn by_booking(booking_code: &str) -> QueryKey {
    QueryKey::new("tracking").with(booking_code)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackingEntry {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub task: String,
  pub note: Option<String>,
  pub image_urls: Vec<String>,
  pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTracking {
  pub booking_code: String,
  pub task: String,
  pub note: Option<String>,
  pub image_urls: Vec<String>,
}

impl Validate for AddTracking {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.booking_code, "Booking code")?;
    require(&self.task, "Task")
  }
}

impl DecorClient {
  pub async fn tracking(&self, booking_code: &str) -> Result<Vec<TrackingEntry>, ApiError> {
    let endpoint = Endpoint::new(BASE).path(booking_code);
    self
      .cached(
        &keys::by_booking(booking_code),
        self.http().get_data(&endpoint, true),
      )
      .await
  }

  pub async fn add_tracking(&self, input: &AddTracking) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE);
    self
      .mutate(
        input,
        &[keys::by_booking(&input.booking_code)],
        self.http().post(&endpoint, input, true),
      )
      .await
  }
}

pub fn tracking_query(client: &DecorClient, booking_code: Option<String>) -> Query<Vec<TrackingEntry>> {
  let key = keys::by_booking(booking_code.as_deref().unwrap_or_default());
  client.query(key, is_present(booking_code.as_deref()), move |c| {
    let code = booking_code.clone().unwrap_or_default();
    async move { c.tracking(&code).await }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;
  use std::time::Duration;

  #[tokio::test]
  async fn test_add_tracking_refreshes_timeline() {
    let server = MockServer::start_async().await;
    let timeline = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Tracking/BK-2");
        then.status(200).json_body(json!({
          "data": [{"id": 1, "task": "Survey done", "imageUrls": ["https://img.test/a.png"]}]
        }));
      })
      .await;
    let add = server
      .mock_async(|when, then| {
        when.method(POST).path("/api/Tracking");
        then.status(200).json_body(json!({"success": true}));
      })
      .await;

    let client = client_for(&server);
    let entries = client.tracking("BK-2").await.unwrap();
    assert_eq!(entries[0].image_urls.len(), 1);
    client.tracking("BK-2").await.unwrap();
    timeline.assert_calls_async(1).await;

    client
      .add_tracking(&AddTracking {
        booking_code: "BK-2".into(),
        task: "Materials delivered".into(),
        ..AddTracking::default()
      })
      .await
      .unwrap();
    add.assert_calls_async(1).await;

    client.tracking("BK-2").await.unwrap();
    timeline.assert_calls_async(2).await;
  }

  #[tokio::test]
  async fn test_query_waits_for_booking() {
    let server = MockServer::start_async().await;
    let timeline = server
      .mock_async(|when, then| {
        when.method(GET).path_includes("/api/Tracking");
        then.status(200).json_body(json!({"data": []}));
      })
      .await;

    let client = client_for(&server);
    for code in [None, Some(String::new())] {
      let mut query = tracking_query(&client, code);
      query.fetch();
      tokio::time::sleep(Duration::from_millis(20)).await;
      query.poll();
      assert!(!query.is_loading());
      assert!(query.data().is_none());
    }
    timeline.assert_calls_async(0).await;
  }
}
