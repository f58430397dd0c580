//! One module per marketplace resource.
//!
//! Every module follows the same shape:
//! - `keys`: the cache keys it reads and invalidates
//! - async operations on `DecorClient` (reads cached, writes validated)
//! - `*_query` constructors returning `Query` handles for views

pub mod account;
pub mod booking;
pub mod cart;
pub mod category;
pub mod chat;
pub mod contact;
pub mod contract;
pub mod dashboard;
pub mod favorite;
pub mod follow;
pub mod notification;
pub mod order;
pub mod payment;
pub mod product;
pub mod quotation;
pub mod topup;
pub mod tracking;
pub mod types;
pub mod wallet;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Pagination and filter record, sent as query parameters and used as part
/// of the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
  pub page_index: u32,
  pub page_size: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_by: Option<String>,
  pub descending: bool,
  #[serde(flatten)]
  pub filters: BTreeMap<String, String>,
}

impl Default for PageParams {
  fn default() -> Self {
    Self {
      page_index: 1,
      page_size: 10,
      sort_by: None,
      descending: false,
      filters: BTreeMap::new(),
    }
  }
}

impl PageParams {
  pub fn sorted_by(mut self, field: &str, descending: bool) -> Self {
    self.sort_by = Some(field.to_string());
    self.descending = descending;
    self
  }

  pub fn page(mut self, page_index: u32) -> Self {
    self.page_index = page_index.max(1);
    self
  }

  pub fn page_size(mut self, page_size: u32) -> Self {
    self.page_size = page_size;
    self
  }

  pub fn filter(mut self, name: &str, value: impl ToString) -> Self {
    self.filters.insert(name.to_string(), value.to_string());
    self
  }

  pub fn next_page(&self) -> Self {
    self.clone().page(self.page_index + 1)
  }

  /// Apply caller overrides on top of resource defaults.
  pub fn merge(mut self, overrides: &PageQuery) -> Self {
    if let Some(index) = overrides.page_index {
      self = self.page(index);
    }
    if let Some(size) = overrides.page_size {
      self.page_size = size;
    }
    if let Some(sort_by) = &overrides.sort_by {
      self.sort_by = Some(sort_by.clone());
    }
    if let Some(descending) = overrides.descending {
      self.descending = descending;
    }
    self
      .filters
      .extend(overrides.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
    self
  }
}

/// Caller-supplied overrides for `PageParams`; unset fields keep defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
  pub page_index: Option<u32>,
  pub page_size: Option<u32>,
  pub sort_by: Option<String>,
  pub descending: Option<bool>,
  pub filters: BTreeMap<String, String>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  #[serde(default = "Vec::new", alias = "data", alias = "results")]
  pub items: Vec<T>,
  #[serde(default, alias = "total", alias = "totalItems")]
  pub total_count: u64,
}

impl<T> Page<T> {
  /// True when pages after `params.page_index` remain.
  pub fn has_more(&self, params: &PageParams) -> bool {
    u64::from(params.page_index) * u64::from(params.page_size) < self.total_count
  }
}

impl<T> Default for Page<T> {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      total_count: 0,
    }
  }
}

/// Accept ids sent either as strings or as numbers.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Value::deserialize(deserializer)? {
    Value::String(s) => s,
    Value::Null => String::new(),
    other => other.to_string(),
  })
}

/// A required parameter counts as present only when it is non-blank.
pub(crate) fn is_present(value: Option<&str>) -> bool {
  value.is_some_and(|s| !s.trim().is_empty())
}

/// Optional variant of `lenient_string`.
pub(crate) fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Value::deserialize(deserializer)? {
    Value::Null => None,
    Value::String(s) => Some(s),
    other => Some(other.to_string()),
  })
}

#[cfg(test)]
pub(crate) mod testing {
  use httpmock::MockServer;

  use crate::api::{Credentials, RequestClient};
  use crate::cache::CacheLayer;
  use crate::client::DecorClient;

  /// Client pointed at a mock server, signed in with `token`.
  pub fn client_for(server: &MockServer) -> DecorClient {
    let http = RequestClient::new(&server.base_url())
      .unwrap()
      .with_credentials(Credentials::new(Some("token".into())));
    DecorClient::new(http, CacheLayer::in_memory())
  }
}
