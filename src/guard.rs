//! Role-based navigation guard over the session token.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{GuardConfig, GuardRule};

/// Claim names the API uses for the role.
const ROLE_CLAIMS: [&str; 2] = [
  "role",
  "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
  Proceed,
  Redirect(String),
}

pub struct RouteGuard {
  rules: Vec<GuardRule>,
  matcher: Vec<String>,
  login_path: String,
  unauthorized_path: String,
  key: Option<DecodingKey>,
  validation: Validation,
}

impl RouteGuard {
  /// Without a secret no token verifies, so every guarded path redirects
  /// to login.
  pub fn new(config: &GuardConfig, secret: Option<&str>) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    Self {
      rules: config.rules.clone(),
      matcher: config.matcher.clone(),
      login_path: config.login_path.clone(),
      unauthorized_path: config.unauthorized_path.clone(),
      key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
      validation,
    }
  }

  pub fn login_path(&self) -> &str {
    &self.login_path
  }

  pub fn unauthorized_path(&self) -> &str {
    &self.unauthorized_path
  }

  /// Guard a navigation. Paths outside the matcher pass untouched.
  pub fn check(&self, path: &str, token: Option<&str>) -> GuardDecision {
    let path = strip_query(path);
    if !self.matcher.iter().any(|prefix| has_prefix(path, prefix)) {
      return GuardDecision::Proceed;
    }
    self.evaluate(path, token)
  }

  /// Apply the rules to `path` regardless of the matcher.
  pub fn evaluate(&self, path: &str, token: Option<&str>) -> GuardDecision {
    let path = strip_query(path);
    let Some(role) = token.and_then(|t| self.role_of(t)) else {
      debug!(path, "no verified role, redirecting to login");
      return GuardDecision::Redirect(self.login_path.clone());
    };

    if let Some(rule) = self.rules.iter().find(|r| has_prefix(path, &r.prefix)) {
      if !rule.roles.contains(&role) {
        debug!(path, role, prefix = %rule.prefix, "role not allowed");
        return GuardDecision::Redirect(self.unauthorized_path.clone());
      }
    }
    GuardDecision::Proceed
  }

  /// Verified role number carried by `token`.
  pub fn role_of(&self, token: &str) -> Option<u8> {
    let key = self.key.as_ref()?;
    let claims = match decode::<Map<String, Value>>(token, key, &self.validation) {
      Ok(data) => data.claims,
      Err(e) => {
        debug!(error = %e, "token rejected");
        return None;
      }
    };
    ROLE_CLAIMS
      .iter()
      .find_map(|name| claims.get(*name))
      .and_then(role_number)
  }
}

fn role_number(value: &Value) -> Option<u8> {
  match value {
    Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn strip_query(path: &str) -> &str {
  path.split(['?', '#']).next().unwrap_or(path)
}

/// Segment-aware: `/admin` covers `/admin` and `/admin/x`, not `/administer`.
fn has_prefix(path: &str, prefix: &str) -> bool {
  let prefix = prefix.trim_end_matches('/');
  match path.strip_prefix(prefix) {
    Some(rest) => rest.is_empty() || rest.starts_with('/'),
    None => false,
  }
}
