//! Customer/provider chat.

use serde::{Deserialize, Serialize};

use super::{is_present, lenient_string};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const BASE: &str = "api/Chat";

pub mod keys {
  use super::*;

  pub fn conversations() -> QueryKey {
    QueryKey::new("chat").with("conversations")
  }

  pub fn messages(conversation_id: &str) -> QueryKey {
    QueryKey::new("chat").with("messages").with(conversation_id)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Conversation {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  #[serde(deserialize_with = "lenient_string")]
  pub receiver_id: String,
  pub receiver_name: String,
  pub last_message: Option<String>,
  pub unread_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatMessage {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  #[serde(deserialize_with = "lenient_string")]
  pub sender_id: String,
  pub message: String,
  pub sent_time: String,
  pub is_read: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
  pub conversation_id: String,
  pub receiver_id: String,
  pub message: String,
}

impl Validate for SendMessage {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.receiver_id, "Receiver")?;
    require(&self.message, "Message")
  }
}

impl DecorClient {
  pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("conversations");
    self
      .cached(&keys::conversations(), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn chat_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
    let endpoint = Endpoint::new(BASE).path("messages").path(conversation_id);
    self
      .cached(
        &keys::messages(conversation_id),
        self.http().get_data(&endpoint, true),
      )
      .await
  }

  pub async fn send_message(&self, input: &SendMessage) -> Result<ChatMessage, ApiError> {
    let endpoint = Endpoint::new(BASE).path("send");
    self
      .mutate(
        input,
        &[keys::conversations(), keys::messages(&input.conversation_id)],
        self.http().post(&endpoint, input, true),
      )
      .await
  }
}

pub fn conversations_query(client: &DecorClient) -> Query<Vec<Conversation>> {
  client.query(keys::conversations(), true, |c| async move {
    c.conversations().await
  })
}

pub fn messages_query(client: &DecorClient, conversation_id: Option<String>) -> Query<Vec<ChatMessage>> {
  let key = keys::messages(conversation_id.as_deref().unwrap_or_default());
  client.query(key, is_present(conversation_id.as_deref()), move |c| {
    let id = conversation_id.clone().unwrap_or_default();
    async move { c.chat_messages(&id).await }
  })
}
