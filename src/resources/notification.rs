use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient_string, Page, PageParams};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Notification";

pub mod keys {
  use super::*;

  pub fn list() -> QueryKey {
    QueryKey::new("notifications")
  }

  pub fn page(params: &PageParams) -> QueryKey {
    list().with_params(params)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Notification {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub title: String,
  pub content: String,
  pub url: Option<String>,
  pub is_read: bool,
  pub notified_at: String,
}

struct NotificationId<'a>(&'a str);

impl Validate for NotificationId<'_> {
  fn validate(&self) -> Result<(), ApiError> {
    require(self.0, "Notification id")
  }
}

pub fn default_params() -> PageParams {
  PageParams::default().sorted_by("notifiedAt", true)
}

impl DecorClient {
  pub async fn notifications(&self, params: &PageParams) -> Result<Page<Notification>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("getPaginatedList").params(params);
    self
      .cached(&keys::page(params), self.http().get(&endpoint, true))
      .await
  }

  pub async fn mark_notification_read(&self, id: &str) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("mark-as-read").path(id);
    self
      .mutate(
        &NotificationId(id),
        &[keys::list()],
        self.http().put(&endpoint, &(), true),
      )
      .await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("mark-all-as-read");
    self
      .mutate(&(), &[keys::list()], self.http().put(&endpoint, &(), true))
      .await
  }
}

pub fn notifications_query(client: &DecorClient, params: PageParams) -> Query<Page<Notification>> {
  client.query(keys::page(&params), true, move |c| {
    let params = params.clone();
    async move { c.notifications(&params).await }
  })
}
