//! Following providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient_string;
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Follow";

pub mod keys {
  use super::*;

  pub fn all() -> QueryKey {
    QueryKey::new("follow")
  }

  pub fn followers() -> QueryKey {
    all().with("followers")
  }

  pub fn following() -> QueryKey {
    all().with("following")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FollowEntry {
  #[serde(deserialize_with = "lenient_string")]
  pub account_id: String,
  pub full_name: String,
  pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
  pub following_id: String,
}

impl Validate for FollowRequest {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.following_id, "Provider")
  }
}

impl DecorClient {
  pub async fn followers(&self) -> Result<Vec<FollowEntry>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("followers");
    self
      .cached(&keys::followers(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn following(&self) -> Result<Vec<FollowEntry>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("followings");
    self
      .cached(&keys::following(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn follow(&self, input: &FollowRequest) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("follow");
    self
      .mutate(input, &[keys::all()], self.http().post(&endpoint, input, true))
      .await
  }

  pub async fn unfollow(&self, input: &FollowRequest) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("unfollow").path(&input.following_id);
    self
      .mutate(input, &[keys::all()], self.http().delete(&endpoint, true))
      .await
  }
}

pub fn followers_query(client: &DecorClient) -> Query<Vec<FollowEntry>> {
  client.query(keys::followers(), true, |c| async move { c.followers().await })
}

pub fn following_query(client: &DecorClient) -> Query<Vec<FollowEntry>> {
  client.query(keys::following(), true, |c| async move { c.following().await })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::testing::client_for;
  use httpmock::prelude::*;
  use serde_json::json;

  fn entries(name: &str) -> Value {
    json!({"data": [{"accountId": 5, "fullName": name}]})
  }

  #[tokio::test]
  async fn test_follow_refreshes_both_lists() {
    let server = MockServer::start_async().await;
    let followers = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Follow/followers");
        then.status(200).json_body(entries("Lan"));
      })
      .await;
    let following = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Follow/followings");
        then.status(200).json_body(entries("Nha Decor"));
      })
      .await;
    let follow = server
      .mock_async(|when, then| {
        when
          .method(POST)
          .path("/api/Follow/follow")
          .json_body(json!({"followingId": "5"}));
        then.status(200).json_body(json!({"success": true}));
      })
      .await;

    let client = client_for(&server);
    assert_eq!(client.followers().await.unwrap()[0].account_id, "5");
    assert_eq!(client.following().await.unwrap()[0].full_name, "Nha Decor");
    client.followers().await.unwrap();
    client.following().await.unwrap();
    followers.assert_calls_async(1).await;
    following.assert_calls_async(1).await;

    client
      .follow(&FollowRequest {
        following_id: "5".into(),
      })
      .await
      .unwrap();
    follow.assert_calls_async(1).await;

    client.followers().await.unwrap();
    client.following().await.unwrap();
    followers.assert_calls_async(2).await;
    following.assert_calls_async(2).await;
  }

  #[tokio::test]
  async fn test_unfollow_requires_provider() {
    let server = MockServer::start_async().await;
    let unfollow = server
      .mock_async(|when, then| {
        when.method(DELETE).path_includes("/api/Follow/unfollow");
        then.status(200);
      })
      .await;

    let client = client_for(&server);
    let err = client
      .unfollow(&FollowRequest {
        following_id: " ".into(),
      })
      .await
      .unwrap_err();

    assert_eq!(err.to_string(), "Provider is required");
    unfollow.assert_calls_async(0).await;
  }
}
