//! Structural query keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

/// One component of a query key.
///
/// Maps are stored sorted, so two parameter records with the same fields
/// compare equal regardless of the order they were built in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
  Null,
  Bool(bool),
  Int(i64),
  /// Non-integral or out-of-range numbers, kept in their JSON spelling
  /// and written back out as numbers
  #[serde(serialize_with = "serialize_num")]
  Num(String),
  Str(String),
  List(Vec<KeyPart>),
  Map(BTreeMap<String, KeyPart>),
}

impl From<Value> for KeyPart {
  fn from(value: Value) -> Self {
    match value {
      Value::Null => KeyPart::Null,
      Value::Bool(b) => KeyPart::Bool(b),
      Value::Number(n) => match n.as_i64() {
        Some(i) => KeyPart::Int(i),
        None => KeyPart::Num(n.to_string()),
      },
      Value::String(s) => KeyPart::Str(s),
      Value::Array(items) => KeyPart::List(items.into_iter().map(KeyPart::from).collect()),
      Value::Object(fields) => KeyPart::Map(
        fields
          .into_iter()
          .map(|(k, v)| (k, KeyPart::from(v)))
          .collect(),
      ),
    }
  }
}

fn serialize_num<S: Serializer>(spelling: &str, serializer: S) -> Result<S::Ok, S::Error> {
  let number: Number = spelling.parse().map_err(serde::ser::Error::custom)?;
  number.serialize(serializer)
}

impl From<&str> for KeyPart {
  fn from(value: &str) -> Self {
    KeyPart::Str(value.to_string())
  }
}

impl From<String> for KeyPart {
  fn from(value: String) -> Self {
    KeyPart::Str(value)
  }
}

impl From<&String> for KeyPart {
  fn from(value: &String) -> Self {
    KeyPart::Str(value.clone())
  }
}

impl From<i64> for KeyPart {
  fn from(value: i64) -> Self {
    KeyPart::Int(value)
  }
}

impl From<u32> for KeyPart {
  fn from(value: u32) -> Self {
    KeyPart::Int(i64::from(value))
  }
}

impl From<bool> for KeyPart {
  fn from(value: bool) -> Self {
    KeyPart::Bool(value)
  }
}

/// Identifier of a cache slot: a resource tag followed by parameters.
///
/// Two keys address the same slot exactly when they are structurally equal.
/// A key also acts as a prefix for invalidation: `["order_list"]` covers
/// `["order_list", {..page 1..}]` and `["order_list", {..page 2..}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
  /// The empty key; every key starts with it.
  pub fn root() -> Self {
    Self(Vec::new())
  }

  /// Start a key with its resource tag.
  pub fn new(tag: &str) -> Self {
    Self(vec![KeyPart::Str(tag.to_string())])
  }

  /// Append a plain parameter (an id, a flag).
  pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
    self.0.push(part.into());
    self
  }

  /// Append a structured parameter record.
  ///
  /// Records that fail to serialize (maps with non-string keys) are
  /// recorded as `Null`; every parameter type used here serializes cleanly.
  pub fn with_params<P: Serialize>(self, params: &P) -> Self {
    let value = serde_json::to_value(params).unwrap_or(Value::Null);
    self.with(KeyPart::from(value))
  }

  /// The resource tag this key starts with.
  pub fn tag(&self) -> &str {
    match self.0.first() {
      Some(KeyPart::Str(tag)) => tag,
      _ => "",
    }
  }

  pub fn parts(&self) -> &[KeyPart] {
    &self.0
  }

  /// True when `prefix` addresses this key (element-wise prefix match).
  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }

  /// Stable, fixed-length hash of the canonical key.
  pub fn cache_hash(&self) -> String {
    let canonical = serde_json::to_string(self).unwrap_or_else(|_| self.description());
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
  }

  /// Human readable form for logs.
  pub fn description(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
    f.write_str(&rendered)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Serialize;

  #[derive(Serialize)]
  struct PageA {
    page_index: u32,
    page_size: u32,
  }

  #[derive(Serialize)]
  struct PageB {
    page_size: u32,
    page_index: u32,
  }

  #[test]
  fn test_equal_params_share_a_slot() {
    let a = QueryKey::new("order_list").with_params(&PageA {
      page_index: 1,
      page_size: 10,
    });
    let b = QueryKey::new("order_list").with_params(&PageB {
      page_size: 10,
      page_index: 1,
    });
    assert_eq!(a, b);
    assert_eq!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_different_params_use_different_slots() {
    let a = QueryKey::new("order_list").with_params(&PageA {
      page_index: 1,
      page_size: 10,
    });
    let b = QueryKey::new("order_list").with_params(&PageA {
      page_index: 2,
      page_size: 10,
    });
    assert_ne!(a, b);
    assert_ne!(a.cache_hash(), b.cache_hash());
    assert_ne!(QueryKey::new("order"), QueryKey::new("order").with("42"));
  }

  #[test]
  fn test_prefix_matching() {
    let key = QueryKey::new("product").with("p-1");
    assert!(key.starts_with(&QueryKey::new("product")));
    assert!(key.starts_with(&key));
    assert!(!key.starts_with(&QueryKey::new("product").with("p-2")));
    assert!(!QueryKey::new("product").starts_with(&key));
    assert!(!QueryKey::new("products").starts_with(&QueryKey::new("product")));
  }

  #[test]
  fn test_numbers_and_strings_hash_apart() {
    let num = QueryKey::new("product").with_params(&serde_json::json!({"minPrice": 1.5}));
    let text = QueryKey::new("product").with_params(&serde_json::json!({"minPrice": "1.5"}));
    assert_ne!(num, text);
    assert_ne!(num.cache_hash(), text.cache_hash());
    assert_eq!(num.description(), r#"["product",{"minPrice":1.5}]"#);
  }

  #[test]
  fn test_root_covers_every_key() {
    assert!(QueryKey::new("cart").starts_with(&QueryKey::root()));
    assert!(QueryKey::new("order").with("o-1").starts_with(&QueryKey::root()));
  }

  #[test]
  fn test_tag_and_description() {
    let key = QueryKey::new("cart").with(7i64);
    assert_eq!(key.tag(), "cart");
    assert_eq!(key.description(), r#"["cart",7]"#);
    assert_eq!(key.cache_hash().len(), 64);
  }
}
