// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use serde_json::Value;

use crate::JsonObject;

/// Whether a claim is embedded in the payload as plain text or hidden behind
/// a disclosure digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosability {
  /// The claim always appears in plain text; no disclosure exists for it.
  Never,
  /// The claim never appears in plain text; only its digest does, and the
  /// value travels out-of-band in a disclosure.
  Always,
}

/// A claim value together with its nested disclosability structure.
#[derive(Debug, Clone, PartialEq)]
pub enum DisclosableValue {
  /// A plain JSON value with no further disclosable structure inside.
  Plain(Value),
  /// A nested object whose properties carry their own disclosability.
  Object(DisclosableObject),
  /// An array whose elements carry their own disclosability.
  Array(Vec<DisclosableElement>),
}

/// A node of a disclosable tree: a value tagged with its [`Disclosability`].
#[derive(Debug, Clone, PartialEq)]
pub struct DisclosableElement {
  disclosability: Disclosability,
  value: DisclosableValue,
}

impl DisclosableElement {
  /// A plain value, embedded in the payload as-is.
  pub fn plain(value: impl Into<Value>) -> Self {
    Self {
      disclosability: Disclosability::Never,
      value: DisclosableValue::Plain(value.into()),
    }
  }

  /// A selectively disclosable value.
  pub fn sd(value: impl Into<Value>) -> Self {
    Self {
      disclosability: Disclosability::Always,
      value: DisclosableValue::Plain(value.into()),
    }
  }

  /// A nested object, embedded as-is (its properties may still be
  /// selectively disclosable on their own).
  pub fn object(object: DisclosableObject) -> Self {
    Self {
      disclosability: Disclosability::Never,
      value: DisclosableValue::Object(object),
    }
  }

  /// A selectively disclosable nested object.
  pub fn sd_object(object: DisclosableObject) -> Self {
    Self {
      disclosability: Disclosability::Always,
      value: DisclosableValue::Object(object),
    }
  }

  /// A nested array, embedded as-is.
  pub fn array(elements: Vec<DisclosableElement>) -> Self {
    Self {
      disclosability: Disclosability::Never,
      value: DisclosableValue::Array(elements),
    }
  }

  /// A selectively disclosable nested array.
  pub fn sd_array(elements: Vec<DisclosableElement>) -> Self {
    Self {
      disclosability: Disclosability::Always,
      value: DisclosableValue::Array(elements),
    }
  }

  pub fn disclosability(&self) -> Disclosability {
    self.disclosability
  }

  pub fn value(&self) -> &DisclosableValue {
    &self.value
  }

  /// The JSON projection of this element with every disclosure applied.
  pub fn to_json_value(&self) -> Value {
    match &self.value {
      DisclosableValue::Plain(value) => value.clone(),
      DisclosableValue::Object(object) => Value::Object(object.to_json()),
      DisclosableValue::Array(elements) => {
        Value::Array(elements.iter().map(DisclosableElement::to_json_value).collect())
      }
    }
  }
}

/// A credential shape: an insertion-ordered mapping from claim names to
/// [`DisclosableElement`]s.
///
/// The builder is purely data-constructive; reserved claim names and salt
/// generation are the factory's concern.
///
/// ```rust
/// use sd_jwt_core::DisclosableElement;
/// use sd_jwt_core::DisclosableObject;
/// use serde_json::json;
///
/// let address = DisclosableObject::new()
///   .claim("locality", json!("Schulpforta"))
///   .sd_claim("street_address", json!("Schulstr. 12"));
/// let credential = DisclosableObject::new()
///   .claim("iss", json!("https://issuer.example.com"))
///   .sd_object("address", address)
///   .sd_array("nationalities", vec![DisclosableElement::sd(json!("DE")), DisclosableElement::plain(json!("US"))]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisclosableObject {
  claims: IndexMap<String, DisclosableElement>,
}

impl DisclosableObject {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a plain claim.
  pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.claims.insert(name.into(), DisclosableElement::plain(value));
    self
  }

  /// Adds a selectively disclosable claim.
  pub fn sd_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.claims.insert(name.into(), DisclosableElement::sd(value));
    self
  }

  /// Adds a plain nested object.
  pub fn object(mut self, name: impl Into<String>, object: DisclosableObject) -> Self {
    self.claims.insert(name.into(), DisclosableElement::object(object));
    self
  }

  /// Adds a selectively disclosable nested object.
  pub fn sd_object(mut self, name: impl Into<String>, object: DisclosableObject) -> Self {
    self.claims.insert(name.into(), DisclosableElement::sd_object(object));
    self
  }

  /// Adds a plain nested array.
  pub fn array(mut self, name: impl Into<String>, elements: Vec<DisclosableElement>) -> Self {
    self.claims.insert(name.into(), DisclosableElement::array(elements));
    self
  }

  /// Adds a selectively disclosable nested array.
  pub fn sd_array(mut self, name: impl Into<String>, elements: Vec<DisclosableElement>) -> Self {
    self.claims.insert(name.into(), DisclosableElement::sd_array(elements));
    self
  }

  /// Adds an already-built element.
  pub fn element(mut self, name: impl Into<String>, element: DisclosableElement) -> Self {
    self.claims.insert(name.into(), element);
    self
  }

  pub fn get(&self, name: &str) -> Option<&DisclosableElement> {
    self.claims.get(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &DisclosableElement)> {
    self.claims.iter().map(|(name, element)| (name.as_str(), element))
  }

  pub fn len(&self) -> usize {
    self.claims.len()
  }

  pub fn is_empty(&self) -> bool {
    self.claims.is_empty()
  }

  /// The JSON projection of this tree with every disclosure applied, i.e.
  /// the claim set a holder presenting all disclosures reveals.
  pub fn to_json(&self) -> JsonObject {
    self
      .claims
      .iter()
      .map(|(name, element)| (name.clone(), element.to_json_value()))
      .collect()
  }
}

#[cfg(test)]
mod test {
  use super::DisclosableElement;
  use super::DisclosableObject;
  use serde_json::json;

  #[test]
  fn projection_ignores_disclosability() {
    let object = DisclosableObject::new()
      .claim("sub", json!("user_42"))
      .sd_claim("given_name", json!("John"))
      .sd_object(
        "address",
        DisclosableObject::new().claim("country", json!("US")),
      )
      .array(
        "nationalities",
        vec![
          DisclosableElement::sd(json!("US")),
          DisclosableElement::plain(json!("DE")),
        ],
      );

    let expected = json!({
      "sub": "user_42",
      "given_name": "John",
      "address": { "country": "US" },
      "nationalities": ["US", "DE"],
    });
    assert_eq!(serde_json::Value::Object(object.to_json()), expected);
  }

  #[test]
  fn insertion_order_is_kept() {
    let object = DisclosableObject::new()
      .claim("z", json!(1))
      .claim("a", json!(2))
      .claim("m", json!(3));
    let keys: Vec<&str> = object.iter().map(|(name, _)| name).collect();
    assert_eq!(keys, ["z", "a", "m"]);
  }
}
