use thiserror::Error;

/// Errors surfaced by the request client, the cache layer and mutations.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Mutation input rejected locally; no request was sent.
  #[error("{0}")]
  Validation(String),

  /// The request never produced a response (connection, TLS, timeout).
  #[error("request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The API answered with a non-success status.
  #[error("{method} {url} returned {status}: {message}")]
  Status {
    method: String,
    url: String,
    status: u16,
    message: String,
  },

  /// The response body did not have the expected shape.
  #[error("failed to decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("cache storage failed: {0}")]
  Cache(String),

  #[error("invalid configuration: {0}")]
  Config(String),
}

impl ApiError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub(crate) fn cache(report: color_eyre::Report) -> Self {
    Self::Cache(format!("{report:#}"))
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation(_))
  }

  /// Text fit for a dialog: the server's own message when there is one.
  pub fn user_message(&self) -> String {
    match self {
      Self::Validation(message) | Self::Status { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }

  /// HTTP status of an application error, if any.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

/// Fail with a validation error when a required text field is blank.
pub fn require(value: &str, field: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::validation(format!("{field} is required")));
  }
  Ok(())
}
