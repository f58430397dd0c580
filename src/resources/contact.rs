use serde::Serialize;
use serde_json::Value;

use crate::api::{require, ApiError, Endpoint};
use crate::client::{DecorClient, Validate};

const BASE: &str = "api/Contact";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub message: String,
}

impl Validate for ContactForm {
  fn validate(&self) -> Result<(), ApiError> {
    require(&self.name, "Name")?;
    require(&self.email, "Email")?;
    if !self.email.contains('@') {
      return Err(ApiError::validation("Email is invalid"));
    }
    require(&self.message, "Message")
  }
}

impl DecorClient {
  /// Public form; nothing is cached, so nothing is invalidated.
  pub async fn send_contact(&self, form: &ContactForm) -> Result<Value, ApiError> {
    let endpoint = Endpoint::new(BASE).path("create");
    self
      .mutate(form, &[], self.http().post(&endpoint, form, false))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_email_must_look_like_an_address() {
    let form = ContactForm {
      name: "Kim".into(),
      email: "kim".into(),
      message: "Hello".into(),
      ..ContactForm::default()
    };
    assert_eq!(form.validate().unwrap_err().to_string(), "Email is invalid");
  }
}
