// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

use crate::ClaimPath;
use crate::Disclosability;
use crate::DefinitionElement;
use crate::DefinitionObject;
use crate::DefinitionValue;
use crate::DisclosureLedger;
use crate::JsonObject;

/// Standard JWT/VC metadata claims excluded from definition validation.
pub(crate) const WELL_KNOWN_CLAIMS: &[&str] = &[
  "iss",
  "sub",
  "aud",
  "exp",
  "nbf",
  "iat",
  "jti",
  "vct",
  "vct#integrity",
];

/// A single definition violation, located by the [`ClaimPath`] of the
/// offending node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
  #[error("attribute {0} is not part of the definition")]
  UnknownObjectAttribute(ClaimPath),

  #[error("attribute {0} does not have the type required by the definition")]
  WrongAttributeType(ClaimPath),

  #[error("attribute {0} was not disclosed in the required manner")]
  IncorrectlyDisclosed(ClaimPath),
}

/// Cross-checks a recreated payload against a [`DefinitionObject`], enforcing
/// that every claim was disclosed in the manner the definition requires.
///
/// Validation is exhaustive: all violations are collected instead of stopping
/// at the first one.
pub struct DefinitionValidator {
  definition: DefinitionObject,
}

impl DefinitionValidator {
  pub fn new(definition: DefinitionObject) -> Self {
    Self { definition }
  }

  /// Validates `payload` (as produced by
  /// [`SdObjectDecoder::decode`](crate::SdObjectDecoder::decode), together
  /// with its `ledger`) against the definition. An empty result means the
  /// payload conforms.
  pub fn validate(&self, payload: &JsonObject, ledger: &DisclosureLedger) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    self.validate_object(payload, &self.definition, &ClaimPath::root(), ledger, &mut errors);
    errors
  }

  fn validate_object(
    &self,
    object: &JsonObject,
    definition: &DefinitionObject,
    path: &ClaimPath,
    ledger: &DisclosureLedger,
    errors: &mut Vec<ValidationError>,
  ) {
    for (key, value) in object {
      if path.is_root() && WELL_KNOWN_CLAIMS.contains(&key.as_str()) {
        continue;
      }

      let child_path = path.claim(key.as_str());
      let Some(element) = definition.get(key) else {
        errors.push(ValidationError::UnknownObjectAttribute(child_path));
        continue;
      };

      self.validate_element(value, element, child_path, path, ledger, errors);
    }
  }

  fn validate_element(
    &self,
    value: &Value,
    element: &DefinitionElement,
    child_path: ClaimPath,
    parent_path: &ClaimPath,
    ledger: &DisclosureLedger,
    errors: &mut Vec<ValidationError>,
  ) {
    let disclosed = ledger.depth(&child_path) > ledger.depth(parent_path);
    let conforming = match element.disclosability() {
      Disclosability::Always => disclosed,
      Disclosability::Never => !disclosed,
    };
    if !conforming {
      errors.push(ValidationError::IncorrectlyDisclosed(child_path.clone()));
    }

    // A null value has no structure to check, but its disclosability (above)
    // follows the same rule as any other value.
    if value.is_null() {
      return;
    }

    match element.value() {
      DefinitionValue::Value => {}
      DefinitionValue::Object(definition) => match value.as_object() {
        Some(object) => self.validate_object(object, definition, &child_path, ledger, errors),
        None => errors.push(ValidationError::WrongAttributeType(child_path)),
      },
      DefinitionValue::Array(templates) => match value.as_array() {
        Some(array) => {
          // Array definitions are applied uniformly; a non-uniform template
          // cannot be matched against indices, so the body is skipped.
          let Some(template) = uniform_template(templates) else {
            return;
          };
          for (index, element_value) in array.iter().enumerate() {
            self.validate_element(
              element_value,
              template,
              child_path.array_element(index),
              &child_path,
              ledger,
              errors,
            );
          }
        }
        None => errors.push(ValidationError::WrongAttributeType(child_path)),
      },
    }
  }
}

fn uniform_template(templates: &[DefinitionElement]) -> Option<&DefinitionElement> {
  let (first, rest) = templates.split_first()?;
  rest.iter().all(|template| template == first).then_some(first)
}
