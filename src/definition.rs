// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::Disclosability;
use crate::DisclosableElement;
use crate::DisclosableObject;
use crate::DisclosableValue;

/// The shape of a claim value in a credential definition. Unlike
/// [`DisclosableValue`], leaves carry no concrete value.
#[derive(Debug, Clone, PartialEq)]
pub enum DefinitionValue {
  /// Any JSON value without further structure requirements.
  Value,
  /// An object whose properties are themselves defined.
  Object(DefinitionObject),
  /// An array of defined elements. Validation applies the element definition
  /// uniformly to every index, so definitions normally hold one template
  /// element.
  Array(Vec<DefinitionElement>),
}

/// A node of a credential definition: a value shape tagged with the
/// [`Disclosability`] every conforming credential must exhibit at that node.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionElement {
  disclosability: Disclosability,
  value: DefinitionValue,
}

impl DefinitionElement {
  /// A claim that must appear in plain text.
  pub fn plain() -> Self {
    Self {
      disclosability: Disclosability::Never,
      value: DefinitionValue::Value,
    }
  }

  /// A claim that must be selectively disclosed.
  pub fn sd() -> Self {
    Self {
      disclosability: Disclosability::Always,
      value: DefinitionValue::Value,
    }
  }

  /// A plain nested object.
  pub fn object(object: DefinitionObject) -> Self {
    Self {
      disclosability: Disclosability::Never,
      value: DefinitionValue::Object(object),
    }
  }

  /// A selectively disclosable nested object.
  pub fn sd_object(object: DefinitionObject) -> Self {
    Self {
      disclosability: Disclosability::Always,
      value: DefinitionValue::Object(object),
    }
  }

  /// A plain nested array.
  pub fn array(elements: Vec<DefinitionElement>) -> Self {
    Self {
      disclosability: Disclosability::Never,
      value: DefinitionValue::Array(elements),
    }
  }

  /// A selectively disclosable nested array.
  pub fn sd_array(elements: Vec<DefinitionElement>) -> Self {
    Self {
      disclosability: Disclosability::Always,
      value: DefinitionValue::Array(elements),
    }
  }

  pub fn disclosability(&self) -> Disclosability {
    self.disclosability
  }

  pub fn value(&self) -> &DefinitionValue {
    &self.value
  }

  /// The definition a [`DisclosableElement`] conforms to by construction.
  pub fn shape_of(element: &DisclosableElement) -> Self {
    let value = match element.value() {
      DisclosableValue::Plain(_) => DefinitionValue::Value,
      DisclosableValue::Object(object) => DefinitionValue::Object(DefinitionObject::shape_of(object)),
      DisclosableValue::Array(elements) => {
        DefinitionValue::Array(elements.iter().map(DefinitionElement::shape_of).collect())
      }
    };
    Self {
      disclosability: element.disclosability(),
      value,
    }
  }
}

/// A credential definition: the typed schema a recreated payload is validated
/// against, mirroring the disclosable tree structure with valueless leaves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionObject {
  claims: IndexMap<String, DefinitionElement>,
}

impl DefinitionObject {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a claim that must appear in plain text.
  pub fn claim(mut self, name: impl Into<String>) -> Self {
    self.claims.insert(name.into(), DefinitionElement::plain());
    self
  }

  /// Adds a claim that must be selectively disclosed.
  pub fn sd_claim(mut self, name: impl Into<String>) -> Self {
    self.claims.insert(name.into(), DefinitionElement::sd());
    self
  }

  /// Adds an already-built element definition.
  pub fn element(mut self, name: impl Into<String>, element: DefinitionElement) -> Self {
    self.claims.insert(name.into(), element);
    self
  }

  pub fn get(&self, name: &str) -> Option<&DefinitionElement> {
    self.claims.get(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &DefinitionElement)> {
    self.claims.iter().map(|(name, element)| (name.as_str(), element))
  }

  pub fn len(&self) -> usize {
    self.claims.len()
  }

  pub fn is_empty(&self) -> bool {
    self.claims.is_empty()
  }

  /// The definition a [`DisclosableObject`] conforms to by construction.
  pub fn shape_of(object: &DisclosableObject) -> Self {
    Self {
      claims: object
        .iter()
        .map(|(name, element)| (name.to_owned(), DefinitionElement::shape_of(element)))
        .collect(),
    }
  }
}
