//! Authentication and the signed-in account.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{is_present, lenient_opt_string, lenient_string};
use crate::api::{require, ApiError, Endpoint};
use crate::cache::QueryKey;
use crate::client::{DecorClient, Validate};
use crate::query::Query;

const AUTH: &str = "api/Auth";
const ACCOUNT: &str = "api/Account";

pub mod keys {
  use super::*;

  pub fn profile(user_id: &str) -> QueryKey {
    QueryKey::new("account").with(user_id)
  }

  pub fn all_profiles() -> QueryKey {
    QueryKey::new("account")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoginRequest {
  pub email: String,
  pub password: String,
}

impl Validate for LoginRequest {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.email, "Email")?;
    require(&self.password, "Password")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LoginResponse {
  #[serde(alias = "accessToken")]
  token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
  pub email: String,
  pub password: String,
  pub first_name: String,
  pub last_name: String,
}

impl Validate for RegisterRequest {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.email, "Email")?;
    require(&self.password, "Password")?;
    require(&self.first_name, "First name")?;
    require(&self.last_name, "Last name")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerifyOtp {
  pub email: String,
  pub otp: String,
}

impl Validate for VerifyOtp {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.email, "Email")?;
    require(&self.otp, "OTP")
  }
}

/// Result of registration steps that report failure as a value.
#[derive(Debug)]
pub enum AuthOutcome<T> {
  Accepted(T),
  Rejected(ApiError),
}

impl<T> AuthOutcome<T> {
  pub fn is_accepted(&self) -> bool {
    matches!(self, Self::Accepted(_))
  }

  /// Message to show for a rejected attempt.
  pub fn message(&self) -> Option<String> {
    match self {
      Self::Accepted(_) => None,
      Self::Rejected(e) => Some(e.user_message()),
    }
  }
}

impl<T> From<Result<T, ApiError>> for AuthOutcome<T> {
  fn from(result: Result<T, ApiError>) -> Self {
    match result {
      Ok(value) => Self::Accepted(value),
      Err(e) => Self::Rejected(e),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
  #[serde(deserialize_with = "lenient_string")]
  pub id: String,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
  pub avatar: Option<String>,
  #[serde(alias = "roleId", deserialize_with = "lenient_opt_string")]
  pub role: Option<String>,
}

impl Profile {
  pub fn display_name(&self) -> String {
    let name = format!("{} {}", self.first_name, self.last_name);
    match name.trim() {
      "" => self.email.clone(),
      trimmed => trimmed.to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
  pub user_id: String,
  pub first_name: String,
  pub last_name: String,
  pub phone: Option<String>,
}

impl Validate for UpdateProfile {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.user_id, "User id")?;
    require(&self.first_name, "First name")?;
    require(&self.last_name, "Last name")
  }
}

impl DecorClient {
  /// Exchange credentials for a token and install it on this client.
  pub async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
    let endpoint = Endpoint::new(AUTH).path("login");
    let response: LoginResponse = self
      .mutate(request, &[], self.http().post(&endpoint, request, false))
      .await?;
    if response.token.is_empty() {
      return Err(ApiError::validation("Login response did not contain a token"));
    }
    self.credentials().set(Some(response.token.clone()));
    // Cached reads belonged to the previous identity.
    self.cache().clear()?;
    info!(email = %request.email, "signed in");
    Ok(response.token)
  }

  pub async fn register(&self, request: &RegisterRequest) -> AuthOutcome<Value> {
    let endpoint = Endpoint::new(AUTH).path("register");
    let result = self
      .mutate(request, &[], self.http().post(&endpoint, request, false))
      .await;
    if let Err(e) = &result {
      warn!(email = %request.email, error = %e, "registration rejected");
    }
    result.into()
  }

  pub async fn verify_otp(&self, request: &VerifyOtp) -> AuthOutcome<Value> {
    let endpoint = Endpoint::new(AUTH).path("verify-email");
    self
      .mutate(request, &[], self.http().post(&endpoint, request, false))
      .await
      .into()
  }

  pub async fn profile(&self, user_id: &str) -> Result<Profile, ApiError> {
    let endpoint = Endpoint::new(ACCOUNT).path("getUserById").path(user_id);
    self
      .cached(&keys::profile(user_id), self.http().get_data(&endpoint, true))
      .await
  }

  pub async fn update_profile(&self, input: &UpdateProfile) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(ACCOUNT).path("update-profile");
    self
      .mutate(
        input,
        &[keys::profile(&input.user_id)],
        self.http().put(&endpoint, input, true),
      )
      .await
  }

  pub fn sign_out(&self) -> Result<(), ApiError> {
    self.credentials().set(None);
    self.cache().clear()
  }
}

/// Disabled until the user id is known.
pub fn profile_query(client: &DecorClient, user_id: Option<String>) -> Query<Profile> {
  let key = keys::profile(user_id.as_deref().unwrap_or_default());
  client.query(key, is_present(user_id.as_deref()), move |c| {
    let id = user_id.clone().unwrap_or_default();
    async move { c.profile(&id).await }
  })
}
