//! HTTP request client and typed endpoint builder.

use std::fmt;
use std::sync::{Arc, RwLock};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::progress::{NoProgress, ProgressGuard, ProgressSink};

/// Resource path plus query parameters, resolved against the API base URL.
///
/// Segments and parameters are percent-encoded by `url`, never concatenated
/// by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
  segments: Vec<String>,
  query: Vec<(String, String)>,
}

impl Endpoint {
  /// Start from a resource base such as `api/Order`.
  pub fn new(base: &str) -> Self {
    Self {
      segments: base
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect(),
      query: Vec::new(),
    }
  }

  /// Append one path segment (a sub-path or an id).
  pub fn path(mut self, segment: impl ToString) -> Self {
    self.segments.push(segment.to_string());
    self
  }

  pub fn query(mut self, name: &str, value: impl ToString) -> Self {
    self.query.push((name.to_string(), value.to_string()));
    self
  }

  pub fn query_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
    match value {
      Some(v) => self.query(name, v),
      None => self,
    }
  }

  /// Flatten a parameter record into query pairs.
  ///
  /// `null` fields are skipped, arrays become repeated pairs and nested
  /// objects are sent as JSON text.
  pub fn params<P: Serialize>(mut self, params: &P) -> Self {
    let Ok(Value::Object(fields)) = serde_json::to_value(params) else {
      return self;
    };
    for (name, value) in fields {
      match value {
        Value::Null => {}
        Value::Array(items) => {
          for item in items {
            self.query.push((name.clone(), scalar_text(&item)));
          }
        }
        other => self.query.push((name, scalar_text(&other))),
      }
    }
    self
  }

  /// Resolve against `base`, keeping any path prefix the base carries.
  pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|_| ApiError::Config(format!("{} cannot be used as a base URL", base)))?;
      path.pop_if_empty();
      path.extend(&self.segments);
    }
    if !self.query.is_empty() {
      url
        .query_pairs_mut()
        .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.segments.join("/"))?;
    for (i, (name, value)) in self.query.iter().enumerate() {
      let sep = if i == 0 { '?' } else { '&' };
      write!(f, "{}{}={}", sep, name, value)?;
    }
    Ok(())
  }
}

fn scalar_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Body shape of enveloped endpoints: `{ "data": ..., "message": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
  pub data: T,
  #[serde(default)]
  pub message: Option<String>,
}

impl<T> Envelope<T> {
  pub fn into_data(self) -> T {
    self.data
  }
}

/// Shared bearer credential, updated on login/logout.
#[derive(Debug, Clone, Default)]
pub struct Credentials(Arc<RwLock<Option<String>>>);

impl Credentials {
  pub fn new(token: Option<String>) -> Self {
    Self(Arc::new(RwLock::new(token)))
  }

  pub fn token(&self) -> Option<String> {
    self.0.read().ok().and_then(|t| t.clone())
  }

  pub fn set(&self, token: Option<String>) {
    if let Ok(mut slot) = self.0.write() {
      *slot = token;
    }
  }
}

/// HTTP client for the marketplace API.
///
/// Every verb takes an `auth` flag deciding whether the bearer credential is
/// attached. Every request is bracketed by the progress sink.
#[derive(Clone)]
pub struct RequestClient {
  http: Client,
  base_url: Url,
  credentials: Credentials,
  progress: Arc<dyn ProgressSink>,
}

impl RequestClient {
  pub fn new(base_url: &str) -> Result<Self, ApiError> {
    let base_url = Url::parse(base_url)
      .map_err(|e| ApiError::Config(format!("invalid API base URL {}: {}", base_url, e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let http = Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {}", e)))?;

    Ok(Self {
      http,
      base_url,
      credentials: Credentials::default(),
      progress: Arc::new(NoProgress),
    })
  }

  pub fn with_credentials(mut self, credentials: Credentials) -> Self {
    self.credentials = credentials;
    self
  }

  pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
    self.progress = progress;
    self
  }

  pub fn credentials(&self) -> &Credentials {
    &self.credentials
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  pub async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint, auth: bool) -> Result<T, ApiError> {
    self.send(Method::GET, endpoint, None, auth).await
  }

  pub async fn post<B, T>(&self, endpoint: &Endpoint, body: &B, auth: bool) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let body = encode_body(endpoint, body)?;
    self.send(Method::POST, endpoint, Some(body), auth).await
  }

  pub async fn put<B, T>(&self, endpoint: &Endpoint, body: &B, auth: bool) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let body = encode_body(endpoint, body)?;
    self.send(Method::PUT, endpoint, Some(body), auth).await
  }

  pub async fn delete<T: DeserializeOwned>(
    &self,
    endpoint: &Endpoint,
    auth: bool,
  ) -> Result<T, ApiError> {
    self.send(Method::DELETE, endpoint, None, auth).await
  }

  /// GET an enveloped endpoint and unwrap `data`.
  pub async fn get_data<T: DeserializeOwned>(
    &self,
    endpoint: &Endpoint,
    auth: bool,
  ) -> Result<T, ApiError> {
    let envelope: Envelope<T> = self.get(endpoint, auth).await?;
    Ok(envelope.into_data())
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: Method,
    endpoint: &Endpoint,
    body: Option<Value>,
    auth: bool,
  ) -> Result<T, ApiError> {
    let url = endpoint.url(&self.base_url)?;
    let _progress = ProgressGuard::begin(Arc::clone(&self.progress));

    let mut request = self.http.request(method.clone(), url.clone());
    if auth {
      match self.credentials.token() {
        Some(token) => request = request.bearer_auth(token),
        None => debug!(endpoint = %endpoint, "no session token for authenticated request"),
      }
    }
    if let Some(body) = &body {
      request = request.json(body);
    }

    debug!(method = %method, endpoint = %endpoint, auth, "dispatching request");
    let response = request.send().await.map_err(|source| ApiError::Transport {
      url: url.to_string(),
      source,
    })?;

    let status = response.status();
    let bytes = response.bytes().await.map_err(|source| ApiError::Transport {
      url: url.to_string(),
      source,
    })?;

    if !status.is_success() {
      let message = error_message(&bytes)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
      warn!(method = %method, endpoint = %endpoint, status = status.as_u16(), %message, "request failed");
      return Err(ApiError::Status {
        method: method.to_string(),
        url: url.to_string(),
        status: status.as_u16(),
        message,
      });
    }

    let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    serde_json::from_slice(payload).map_err(|source| ApiError::Decode {
      url: url.to_string(),
      source,
    })
  }
}

fn encode_body<B: Serialize + ?Sized>(endpoint: &Endpoint, body: &B) -> Result<Value, ApiError> {
  serde_json::to_value(body).map_err(|source| ApiError::Decode {
    url: endpoint.to_string(),
    source,
  })
}

/// Pull a human readable message out of an error body.
fn error_message(body: &[u8]) -> Option<String> {
  if body.is_empty() {
    return None;
  }
  if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) {
    for field in ["message", "title", "error"] {
      if let Some(Value::String(message)) = fields.get(field) {
        return Some(message.clone());
      }
    }
  }
  let text = String::from_utf8_lossy(body).trim().to_string();
  (!text.is_empty()).then(|| text.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::progress::ActivityIndicator;
  use httpmock::prelude::*;
  use serde_json::json;

  #[derive(Serialize)]
  #[serde(rename_all = "camelCase")]
  struct Filters {
    page_index: u32,
    category_id: Option<String>,
    tags: Vec<&'static str>,
  }

  #[test]
  fn test_endpoint_builds_encoded_url() {
    let base = Url::parse("https://api.example.com/").unwrap();
    let url = Endpoint::new("api/Product")
      .path("search")
      .path("wall art")
      .query("q", "a&b")
      .url(&base)
      .unwrap();
    assert_eq!(
      url.as_str(),
      "https://api.example.com/api/Product/search/wall%20art?q=a%26b"
    );
  }

  #[test]
  fn test_endpoint_keeps_base_prefix() {
    let base = Url::parse("https://example.com/backend").unwrap();
    let url = Endpoint::new("/api/Cart/").url(&base).unwrap();
    assert_eq!(url.as_str(), "https://example.com/backend/api/Cart");
  }

  #[test]
  fn test_params_flatten_into_query() {
    let endpoint = Endpoint::new("api/Product").params(&Filters {
      page_index: 2,
      category_id: None,
      tags: vec!["modern", "rustic"],
    });
    assert_eq!(
      endpoint.to_string(),
      "api/Product?pageIndex=2&tags=modern&tags=rustic"
    );
  }

  #[test]
  fn test_error_message_extraction() {
    assert_eq!(
      error_message(br#"{"message":"Out of stock"}"#),
      Some("Out of stock".to_string())
    );
    assert_eq!(error_message(b"plain failure"), Some("plain failure".to_string()));
    assert_eq!(error_message(b""), None);
  }

  #[tokio::test]
  async fn test_auth_flag_controls_bearer_header() {
    let server = MockServer::start_async().await;
    let with_auth = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/Wallet")
          .header("authorization", "Bearer tok-1");
        then.status(200).json_body(json!({"balance": 10}));
      })
      .await;
    let without_auth = server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Category");
        then.status(200).json_body(json!([]));
      })
      .await;

    let client = RequestClient::new(&server.base_url())
      .unwrap()
      .with_credentials(Credentials::new(Some("tok-1".into())));

    let wallet: Value = client.get(&Endpoint::new("api/Wallet"), true).await.unwrap();
    assert_eq!(wallet, json!({"balance": 10}));
    let categories: Vec<Value> = client.get(&Endpoint::new("api/Category"), false).await.unwrap();
    assert!(categories.is_empty());

    with_auth.assert_calls_async(1).await;
    without_auth.assert_calls_async(1).await;
  }

  #[tokio::test]
  async fn test_status_errors_carry_server_message() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(POST).path("/api/Cart/add");
        then
          .status(400)
          .json_body(json!({"message": "Quantity exceeds stock"}));
      })
      .await;

    let client = RequestClient::new(&server.base_url()).unwrap();
    let err = client
      .post::<_, Value>(&Endpoint::new("api/Cart/add"), &json!({"quantity": 99}), true)
      .await
      .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Quantity exceeds stock"));
  }

  #[tokio::test]
  async fn test_envelope_is_unwrapped_and_empty_body_decodes() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/Dashboard/seller");
        then
          .status(200)
          .json_body(json!({"data": {"orders": 3}, "message": "ok"}));
      })
      .await;
    server
      .mock_async(|when, then| {
        when.method(DELETE).path("/api/Cart/item-1");
        then.status(204);
      })
      .await;

    let client = RequestClient::new(&server.base_url()).unwrap();
    let data: Value = client
      .get_data(&Endpoint::new("api/Dashboard/seller"), true)
      .await
      .unwrap();
    assert_eq!(data, json!({"orders": 3}));

    let unit: () = client
      .delete(&Endpoint::new("api/Cart").path("item-1"), true)
      .await
      .unwrap();
    assert_eq!(unit, ());
  }

  #[tokio::test]
  async fn test_progress_released_after_failure() {
    let indicator = Arc::new(ActivityIndicator::new());
    let client = RequestClient::new("http://127.0.0.1:9")
      .unwrap()
      .with_progress(indicator.clone());

    let result: Result<Value, _> = client.get(&Endpoint::new("api/Order"), false).await;
    assert!(matches!(result, Err(ApiError::Transport { .. })));
    assert!(!indicator.is_busy());
  }
}
