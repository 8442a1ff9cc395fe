// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::Error;
use crate::RESERVED_CLAIM_NAMES;
use serde_json::Value;
use std::fmt::Display;

/// A disclosable value.
/// Both object properties and array elements disclosures are supported.
///
/// See: https://www.ietf.org/archive/id/draft-ietf-oauth-selective-disclosure-jwt-07.html#name-disclosures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disclosure {
  /// The salt value.
  pub salt: String,
  /// The claim name, None for array elements.
  pub claim_name: Option<String>,
  /// The claim Value which can be of any type.
  pub claim_value: Value,
  /// Base64Url-encoded disclosure. The digest is always computed over this
  /// exact string, so a parsed disclosure re-digests byte-for-byte.
  encoded: String,
}

impl Disclosure {
  /// Creates a new object-property [`Disclosure`] of the form `[salt, name, value]`.
  pub fn for_property(salt: String, claim_name: String, claim_value: Value) -> Self {
    let encoded = Self::encode(&salt, Some(&claim_name), &claim_value);
    Self {
      salt,
      claim_name: Some(claim_name),
      claim_value,
      encoded,
    }
  }

  /// Creates a new array-element [`Disclosure`] of the form `[salt, value]`.
  pub fn for_array_element(salt: String, claim_value: Value) -> Self {
    let encoded = Self::encode(&salt, None, &claim_value);
    Self {
      salt,
      claim_name: None,
      claim_value,
      encoded,
    }
  }

  // The `", "` separators match the encoding used for the test vectors of the IETF draft.
  fn encode(salt: &str, claim_name: Option<&str>, claim_value: &Value) -> String {
    let input = if let Some(name) = claim_name {
      format!(
        "[{}, {}, {}]",
        Value::from(salt),
        Value::from(name),
        claim_value
      )
    } else {
      format!("[{}, {}]", Value::from(salt), claim_value)
    };

    multibase::Base::Base64Url.encode(input)
  }

  /// Parses a Base64Url-encoded disclosure into a [`Disclosure`].
  ///
  /// ## Error
  ///
  /// Returns an [`Error::InvalidDisclosure`] if input is not a valid disclosure.
  pub fn parse(disclosure: &str) -> Result<Self, Error> {
    let decoded: Vec<Value> = multibase::Base::Base64Url
      .decode(disclosure)
      .map_err(|_e| {
        Error::InvalidDisclosure(format!(
          "Base64 decoding of the disclosure was not possible {}",
          disclosure
        ))
      })
      .and_then(|data| {
        serde_json::from_slice(&data).map_err(|_e| {
          Error::InvalidDisclosure(format!(
            "decoded disclosure could not be serialized as an array {}",
            disclosure
          ))
        })
      })?;

    let salt = decoded
      .first()
      .and_then(Value::as_str)
      .ok_or(Error::InvalidDisclosure(
        "salt could not be parsed as a string".to_string(),
      ))?
      .to_owned();

    match decoded.len() {
      2 => Ok(Self {
        salt,
        claim_name: None,
        claim_value: decoded.into_iter().nth(1).expect("length 2"),
        encoded: disclosure.to_owned(),
      }),
      3 => {
        let claim_name = decoded
          .get(1)
          .and_then(Value::as_str)
          .ok_or(Error::InvalidDisclosure(
            "claim name could not be parsed as a string".to_string(),
          ))?
          .to_owned();
        if RESERVED_CLAIM_NAMES.contains(&claim_name.as_str()) {
          return Err(Error::InvalidDisclosure(format!(
            "claim name {claim_name} is reserved"
          )));
        }
        Ok(Self {
          salt,
          claim_name: Some(claim_name),
          claim_value: decoded.into_iter().nth(2).expect("length 3"),
          encoded: disclosure.to_owned(),
        })
      }
      len => Err(Error::InvalidDisclosure(format!(
        "deserialized array has an invalid length of {}",
        len
      ))),
    }
  }

  /// Returns the Base64Url-encoded string this disclosure digests to.
  pub fn as_str(&self) -> &str {
    &self.encoded
  }
}

impl Display for Disclosure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.encoded)
  }
}
