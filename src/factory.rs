// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use serde_json::json;
use serde_json::Value;

use crate::DecoyGenerator;
use crate::Disclosability;
use crate::DisclosableElement;
use crate::DisclosableObject;
use crate::DisclosableValue;
use crate::Disclosure;
use crate::Error;
use crate::Hasher;
use crate::JsonObject;
use crate::RandomDecoyGenerator;
use crate::RandomSaltProvider;
use crate::Result;
use crate::SaltProvider;
#[cfg(feature = "sha")]
use crate::Sha256Hasher;

pub(crate) const DIGESTS_KEY: &str = "_sd";
pub(crate) const ARRAY_DIGEST_KEY: &str = "...";
pub(crate) const SD_ALG: &str = "_sd_alg";
pub(crate) const RESERVED_CLAIM_NAMES: &[&str] = &[DIGESTS_KEY, SD_ALG, ARRAY_DIGEST_KEY];

/// The issued representation of a disclosable tree: the JWT claim set holding
/// digest placeholders, and the disclosures backing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdPayload {
  /// The claim set, with an `_sd_alg` property iff `disclosures` is non-empty.
  pub object: JsonObject,
  /// The disclosures generated for every selectively disclosable node.
  pub disclosures: Vec<Disclosure>,
}

/// Transforms a [`DisclosableObject`] into an SD-JWT claim set by substituting
/// selectively disclosable values with their corresponding disclosure digests.
#[cfg(not(feature = "sha"))]
pub struct SdObjectFactory<H: Hasher> {
  /// The hash function used to create digests.
  hasher: H,
  /// Source of per-disclosure salts.
  salt_provider: Box<dyn SaltProvider>,
  /// Source of decoy digests.
  decoy_generator: Box<dyn DecoyGenerator>,
  /// Minimum number of digests per `_sd` array, padded with decoys.
  min_digests: Option<usize>,
}

/// Transforms a [`DisclosableObject`] into an SD-JWT claim set by substituting
/// selectively disclosable values with their corresponding disclosure digests.
#[cfg(feature = "sha")]
pub struct SdObjectFactory<H: Hasher = Sha256Hasher> {
  /// The hash function used to create digests.
  hasher: H,
  /// Source of per-disclosure salts.
  salt_provider: Box<dyn SaltProvider>,
  /// Source of decoy digests.
  decoy_generator: Box<dyn DecoyGenerator>,
  /// Minimum number of digests per `_sd` array, padded with decoys.
  min_digests: Option<usize>,
}

#[cfg(feature = "sha")]
impl SdObjectFactory {
  /// Creates a new [`SdObjectFactory`] with the `sha-256` hash function.
  pub fn new() -> SdObjectFactory<Sha256Hasher> {
    Self::with_hasher(Sha256Hasher::new())
  }
}

#[cfg(feature = "sha")]
impl Default for SdObjectFactory {
  fn default() -> Self {
    Self::new()
  }
}

impl<H: Hasher> SdObjectFactory<H> {
  /// Creates a new [`SdObjectFactory`] with a custom hash function to create digests.
  pub fn with_hasher(hasher: H) -> Self {
    Self {
      hasher,
      salt_provider: Box::new(RandomSaltProvider::default()),
      decoy_generator: Box::new(RandomDecoyGenerator::default()),
      min_digests: None,
    }
  }

  /// Replaces the source of per-disclosure salts.
  pub fn with_salt_provider(mut self, salt_provider: Box<dyn SaltProvider>) -> Self {
    self.salt_provider = salt_provider;
    self
  }

  /// Replaces the source of decoy digests.
  pub fn with_decoy_generator(mut self, decoy_generator: Box<dyn DecoyGenerator>) -> Self {
    self.decoy_generator = decoy_generator;
    self
  }

  /// Pads every emitted `_sd` array with decoy digests up to at least
  /// `min_digests` entries, hiding the number of selectively disclosable
  /// claims per object.
  pub fn with_min_digests(mut self, min_digests: usize) -> Self {
    self.min_digests = Some(min_digests);
    self
  }

  pub fn hasher(&self) -> &H {
    &self.hasher
  }

  /// Issues the SD-JWT claim set for `object`.
  ///
  /// Every `Always` disclosable node is replaced by a digest placeholder (an
  /// `_sd` entry for object properties, a `{"...": <digest>}` object for array
  /// elements) and emitted as a [`Disclosure`]. `_sd_alg` is set at the root
  /// iff at least one disclosure was emitted.
  ///
  /// ## Error
  /// * [`Error::ReservedClaimName`] if any claim is named `_sd`, `_sd_alg` or `...`.
  /// * [`Error::SaltCollision`] if the salt provider repeats itself; a broken
  ///   source of randomness must not silently weaken a credential.
  pub fn issue(&mut self, object: &DisclosableObject) -> Result<SdPayload> {
    let mut disclosures: Vec<Disclosure> = Vec::new();
    let mut salts: HashSet<String> = HashSet::new();
    let mut payload = self.encode_object(object, &mut disclosures, &mut salts)?;

    if !disclosures.is_empty() {
      payload.insert(SD_ALG.to_owned(), Value::String(self.hasher.alg_name().to_owned()));
    }

    Ok(SdPayload {
      object: payload,
      disclosures,
    })
  }

  fn encode_object(
    &mut self,
    object: &DisclosableObject,
    disclosures: &mut Vec<Disclosure>,
    salts: &mut HashSet<String>,
  ) -> Result<JsonObject> {
    let mut output = JsonObject::new();
    let mut digests: Vec<String> = Vec::new();

    for (name, element) in object.iter() {
      if name.is_empty() || RESERVED_CLAIM_NAMES.contains(&name) {
        return Err(Error::ReservedClaimName(name.to_owned()));
      }

      let value = self.encode_value(element.value(), disclosures, salts)?;
      match element.disclosability() {
        Disclosability::Never => {
          output.insert(name.to_owned(), value);
        }
        Disclosability::Always => {
          let salt = self.next_salt(salts)?;
          let disclosure = Disclosure::for_property(salt, name.to_owned(), value);
          digests.push(self.hasher.encoded_digest(disclosure.as_str()));
          disclosures.push(disclosure);
        }
      }
    }

    if !digests.is_empty() {
      self.pad_with_decoys(&mut digests);
      // Sorting is deterministic and, since digests are pseudo-random, leaks
      // neither the per-claim origin nor which entries are decoys.
      digests.sort_unstable();
      output.insert(
        DIGESTS_KEY.to_owned(),
        Value::Array(digests.into_iter().map(Value::String).collect()),
      );
    }

    Ok(output)
  }

  fn encode_array(
    &mut self,
    elements: &[DisclosableElement],
    disclosures: &mut Vec<Disclosure>,
    salts: &mut HashSet<String>,
  ) -> Result<Vec<Value>> {
    let mut output = Vec::with_capacity(elements.len());

    for element in elements {
      let value = self.encode_value(element.value(), disclosures, salts)?;
      match element.disclosability() {
        Disclosability::Never => output.push(value),
        Disclosability::Always => {
          let salt = self.next_salt(salts)?;
          let disclosure = Disclosure::for_array_element(salt, value);
          let digest = self.hasher.encoded_digest(disclosure.as_str());
          disclosures.push(disclosure);
          output.push(json!({ ARRAY_DIGEST_KEY: digest }));
        }
      }
    }

    Ok(output)
  }

  fn encode_value(
    &mut self,
    value: &DisclosableValue,
    disclosures: &mut Vec<Disclosure>,
    salts: &mut HashSet<String>,
  ) -> Result<Value> {
    match value {
      DisclosableValue::Plain(value) => Ok(value.clone()),
      DisclosableValue::Object(object) => Ok(Value::Object(self.encode_object(object, disclosures, salts)?)),
      DisclosableValue::Array(elements) => Ok(Value::Array(self.encode_array(elements, disclosures, salts)?)),
    }
  }

  fn next_salt(&mut self, salts: &mut HashSet<String>) -> Result<String> {
    let salt = self.salt_provider.salt();
    if !salts.insert(salt.clone()) {
      return Err(Error::SaltCollision(salt));
    }
    Ok(salt)
  }

  fn pad_with_decoys(&mut self, digests: &mut Vec<String>) {
    let Some(min_digests) = self.min_digests else {
      return;
    };
    while digests.len() < min_digests {
      let decoy = self.decoy_generator.decoy_digest(&self.hasher);
      // Retry on the (astronomically unlikely) collision with a real digest.
      if digests.contains(&decoy) {
        continue;
      }
      digests.push(decoy);
    }
  }
}

#[cfg(all(test, feature = "sha"))]
mod test {
  use super::SdObjectFactory;
  use crate::DisclosableElement;
  use crate::DisclosableObject;
  use crate::Error;
  use crate::SaltProvider;
  use serde_json::json;
  use serde_json::Value;

  struct IncrementalSaltProvider(u32);

  impl SaltProvider for IncrementalSaltProvider {
    fn salt(&mut self) -> String {
      self.0 += 1;
      format!("salt-{}", self.0)
    }
  }

  struct BrokenSaltProvider;

  impl SaltProvider for BrokenSaltProvider {
    fn salt(&mut self) -> String {
      "always-the-same".to_owned()
    }
  }

  #[test]
  fn plain_claims_are_embedded() {
    let tree = DisclosableObject::new()
      .claim("sub", json!("user_42"))
      .claim("updated_at", json!(1570000000));
    let payload = SdObjectFactory::new().issue(&tree).unwrap();
    assert!(payload.disclosures.is_empty());
    assert_eq!(payload.object.get("sub").unwrap(), "user_42");
    // Without disclosures there is nothing to hash.
    assert!(payload.object.get("_sd_alg").is_none());
    assert!(payload.object.get("_sd").is_none());
  }

  #[test]
  fn sd_claims_leave_only_digests() {
    let tree = DisclosableObject::new()
      .claim("sub", json!("user_42"))
      .sd_claim("street_address", json!("Schulstr. 12"));
    let payload = SdObjectFactory::new().issue(&tree).unwrap();

    assert_eq!(payload.disclosures.len(), 1);
    assert_eq!(payload.object.get("_sd_alg").unwrap(), "sha-256");
    assert!(payload.object.get("street_address").is_none());
    let sd = payload.object.get("_sd").unwrap().as_array().unwrap();
    assert_eq!(sd.len(), 1);
  }

  #[test]
  fn issuance_is_deterministic_with_injected_salts() {
    let tree = DisclosableObject::new()
      .sd_claim("a", json!(1))
      .sd_claim("b", json!(2))
      .sd_claim("c", json!(3));
    let issue = || {
      SdObjectFactory::new()
        .with_salt_provider(Box::new(IncrementalSaltProvider(0)))
        .issue(&tree)
        .unwrap()
    };
    assert_eq!(issue(), issue());
  }

  #[test]
  fn decoys_pad_to_minimum() {
    let tree = DisclosableObject::new()
      .claim("sub", json!("user_42"))
      .sd_claim("nickname", json!("JD"))
      .object(
        "address",
        DisclosableObject::new()
          .sd_claim("street_address", json!("123 Main St"))
          .sd_claim("locality", json!("Anytown")),
      );
    let payload = SdObjectFactory::new().with_min_digests(5).issue(&tree).unwrap();

    assert_eq!(payload.disclosures.len(), 3);
    let root_sd = payload.object.get("_sd").unwrap().as_array().unwrap();
    assert_eq!(root_sd.len(), 5);
    let address_sd = payload
      .object
      .get("address")
      .and_then(Value::as_object)
      .and_then(|address| address.get("_sd"))
      .and_then(Value::as_array)
      .unwrap();
    assert_eq!(address_sd.len(), 5);
  }

  #[test]
  fn decoys_are_not_added_without_digests() {
    let tree = DisclosableObject::new().claim("sub", json!("user_42"));
    let payload = SdObjectFactory::new().with_min_digests(5).issue(&tree).unwrap();
    assert!(payload.object.get("_sd").is_none());
  }

  #[test]
  fn reserved_claim_names_are_rejected() {
    for name in ["_sd", "_sd_alg", "..."] {
      let tree = DisclosableObject::new().sd_claim(name, json!("foo"));
      assert!(matches!(
        SdObjectFactory::new().issue(&tree).unwrap_err(),
        Error::ReservedClaimName(_)
      ));
    }
  }

  #[test]
  fn repeated_salt_is_fatal() {
    let tree = DisclosableObject::new().sd_claim("a", json!(1)).sd_claim("b", json!(2));
    let error = SdObjectFactory::new()
      .with_salt_provider(Box::new(BrokenSaltProvider))
      .issue(&tree)
      .unwrap_err();
    assert!(matches!(error, Error::SaltCollision(_)));
  }

  #[test]
  fn array_elements_are_concealed_in_place() {
    let tree = DisclosableObject::new().array(
      "nationalities",
      vec![
        DisclosableElement::sd(json!("US")),
        DisclosableElement::plain(json!("DE")),
      ],
    );
    let payload = SdObjectFactory::new().issue(&tree).unwrap();
    let array = payload.object.get("nationalities").unwrap().as_array().unwrap();

    assert_eq!(payload.disclosures.len(), 1);
    assert!(array[0].get("...").is_some());
    assert_eq!(array[1], json!("DE"));
  }
}
