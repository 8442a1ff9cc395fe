// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::ClaimPath;
use crate::Disclosure;
use crate::DisclosureLedger;
use crate::Error;
use crate::Hasher;
use crate::HasherRegistry;
use crate::JsonObject;
use crate::Result;
use crate::ARRAY_DIGEST_KEY;
use crate::DIGESTS_KEY;
use crate::RESERVED_CLAIM_NAMES;
use crate::SD_ALG;

/// Nesting depth is attacker-controlled through the disclosure bag (disclosed
/// values may themselves contain digests), so recreation refuses to recurse
/// past this bound instead of risking stack exhaustion.
pub const MAX_NESTING_DEPTH: usize = 64;

/// The result of recreating a claim set: the processed payload with all
/// digest markers resolved or dropped, and the ledger recording which
/// disclosures were consumed at which claim path.
#[derive(Debug, Clone)]
pub struct RecreatedObject {
  /// The processed claims, free of `_sd`, `_sd_alg` and `...` markers.
  pub claims: JsonObject,
  /// The per-path record of consumed disclosures.
  pub ledger: DisclosureLedger,
}

/// Observer of the recreation walk, invoked once per consumed disclosure with
/// the claim path the disclosure resolved to.
pub trait DisclosureVisitor {
  fn on_disclosure(&mut self, path: &ClaimPath, disclosure: &Disclosure);
}

/// Substitutes digests in an SD-JWT claim set by their corresponding plain
/// text values provided by disclosures.
pub struct SdObjectDecoder {
  hashers: HasherRegistry,
}

impl SdObjectDecoder {
  /// Creates a new [`SdObjectDecoder`] with the `sha-256`, `sha-384` and
  /// `sha-512` hashers.
  #[cfg(feature = "sha")]
  pub fn new() -> Self {
    Self {
      hashers: HasherRegistry::new(),
    }
  }

  /// Creates a new [`SdObjectDecoder`] resolving `_sd_alg` against the given
  /// registry.
  pub fn with_registry(hashers: HasherRegistry) -> Self {
    Self { hashers }
  }

  /// The hasher registry used to resolve `_sd_alg`.
  pub fn registry_mut(&mut self) -> &mut HasherRegistry {
    &mut self.hashers
  }

  /// Recreates the claim set of `object` by substituting its digests with the
  /// values carried by `disclosures`.
  ///
  /// Digests without a matching disclosure are dropped silently: presenting a
  /// subset of the issued disclosures is how a holder conceals claims. Every
  /// provided disclosure however MUST be consumed by the payload.
  ///
  /// ## Error
  /// * [`Error::MissingSdAlg`] if disclosures are present but the payload has
  ///   no `_sd_alg` claim, [`Error::MissingHasher`] if the named algorithm is
  ///   not registered.
  /// * [`Error::DuplicateDisclosure`] / [`Error::DuplicateDigest`] if the
  ///   same digest backs two disclosures or appears twice in the payload.
  /// * [`Error::ClaimCollision`] if a disclosed claim name already exists in
  ///   its object, [`Error::ReservedClaimName`] if it is reserved.
  /// * [`Error::UnusedDisclosures`] if disclosures are left over after the walk.
  /// * [`Error::MaximumDepthReached`] on nesting deeper than [`MAX_NESTING_DEPTH`].
  pub fn decode(&self, object: &JsonObject, disclosures: &[Disclosure]) -> Result<RecreatedObject> {
    self.decode_inner(object, disclosures, None)
  }

  /// Same as [`SdObjectDecoder::decode`], additionally reporting every
  /// consumed disclosure to `visitor`.
  pub fn decode_with_visitor(
    &self,
    object: &JsonObject,
    disclosures: &[Disclosure],
    visitor: &mut dyn DisclosureVisitor,
  ) -> Result<RecreatedObject> {
    self.decode_inner(object, disclosures, Some(visitor))
  }

  fn decode_inner<'a>(
    &self,
    object: &JsonObject,
    disclosures: &'a [Disclosure],
    visitor: Option<&'a mut dyn DisclosureVisitor>,
  ) -> Result<RecreatedObject> {
    // A payload without disclosures needs no hasher at all.
    let mut pending: BTreeMap<String, &Disclosure> = BTreeMap::new();
    if !disclosures.is_empty() {
      let hasher = self.determine_hasher(object)?;
      for disclosure in disclosures {
        let digest = hasher.encoded_digest(disclosure.as_str());
        if pending.insert(digest.clone(), disclosure).is_some() {
          return Err(Error::DuplicateDisclosure(digest));
        }
      }
    }

    let mut walk = Walk {
      pending,
      seen_digests: BTreeSet::new(),
      consumed: 0,
      ledger: DisclosureLedger::new(),
      visitor,
    };

    let root = ClaimPath::root();
    walk.ledger.record(root.clone(), Vec::new());
    let claims = walk.decode_object(object, &root, &[], 0)?;

    if walk.consumed != disclosures.len() {
      return Err(Error::UnusedDisclosures(disclosures.len() - walk.consumed));
    }

    Ok(RecreatedObject {
      claims,
      ledger: walk.ledger,
    })
  }

  fn determine_hasher(&self, object: &JsonObject) -> Result<&dyn Hasher> {
    let alg = object
      .get(SD_ALG)
      .ok_or(Error::MissingSdAlg)?
      .as_str()
      .ok_or(Error::DataTypeMismatch(
        "the value of `_sd_alg` is not a string".to_string(),
      ))?;
    self.hashers.get(alg).ok_or_else(|| Error::MissingHasher(alg.to_string()))
  }
}

#[cfg(feature = "sha")]
impl Default for SdObjectDecoder {
  fn default() -> Self {
    Self::new()
  }
}

struct Walk<'a> {
  /// Digest → disclosure, drained as disclosures are consumed.
  pending: BTreeMap<String, &'a Disclosure>,
  /// Every digest encountered so far, decoys included.
  seen_digests: BTreeSet<String>,
  consumed: usize,
  ledger: DisclosureLedger,
  visitor: Option<&'a mut dyn DisclosureVisitor>,
}

impl Walk<'_> {
  fn decode_object(
    &mut self,
    object: &JsonObject,
    path: &ClaimPath,
    trail: &[Disclosure],
    depth: usize,
  ) -> Result<JsonObject> {
    let mut output = JsonObject::new();

    // Plain keys first, preserving input order; disclosed keys follow in the
    // order their digests appear in `_sd`.
    for (key, value) in object {
      if key == DIGESTS_KEY || (key == SD_ALG && path.is_root()) {
        continue;
      }
      let child_path = path.claim(key.as_str());
      let decoded = self.decode_value(value, &child_path, trail, depth + 1)?;
      output.insert(key.clone(), decoded);
    }

    let Some(sd_value) = object.get(DIGESTS_KEY) else {
      return Ok(output);
    };
    let sd_array = sd_value
      .as_array()
      .ok_or(Error::DataTypeMismatch(format!("{} is not an array", DIGESTS_KEY)))?;

    for digest in sd_array {
      let digest = digest
        .as_str()
        .ok_or(Error::DataTypeMismatch(format!("{} is not a string", digest)))?;
      self.note_digest(digest)?;

      // No disclosure for this digest: either a decoy or a concealed claim.
      let Some(disclosure) = self.pending.remove(digest) else {
        continue;
      };

      let claim_name = disclosure.claim_name.clone().ok_or_else(|| {
        Error::InvalidDisclosure(format!("array element disclosure {} found in an `_sd` array", disclosure))
      })?;
      if RESERVED_CLAIM_NAMES.contains(&claim_name.as_str()) {
        return Err(Error::ReservedClaimName(claim_name));
      }
      if output.contains_key(&claim_name) {
        return Err(Error::ClaimCollision(claim_name));
      }

      let child_path = path.claim(claim_name.as_str());
      self.consume(&child_path, disclosure);
      let mut child_trail = trail.to_vec();
      child_trail.push(disclosure.clone());

      // Disclosed values may themselves contain digests.
      let decoded = self.decode_value(&disclosure.claim_value, &child_path, &child_trail, depth + 1)?;
      output.insert(claim_name, decoded);
    }

    Ok(output)
  }

  fn decode_array(
    &mut self,
    array: &[Value],
    path: &ClaimPath,
    trail: &[Disclosure],
    depth: usize,
  ) -> Result<Vec<Value>> {
    let mut output: Vec<Value> = Vec::new();

    for value in array {
      if let Some(object) = value.as_object() {
        if let Some(digest_value) = object.get(ARRAY_DIGEST_KEY) {
          if object.len() != 1 {
            return Err(Error::InvalidArrayDisclosureObject);
          }
          let digest = digest_value
            .as_str()
            .ok_or(Error::DataTypeMismatch(format!("{} is not a string", ARRAY_DIGEST_KEY)))?;
          self.note_digest(digest)?;

          // An element the holder chose not to disclose is dropped.
          let Some(disclosure) = self.pending.remove(digest) else {
            continue;
          };
          if disclosure.claim_name.is_some() {
            return Err(Error::InvalidDisclosure(
              "array element disclosure must have two entries".to_string(),
            ));
          }

          let child_path = path.array_element(output.len());
          self.consume(&child_path, disclosure);
          let mut child_trail = trail.to_vec();
          child_trail.push(disclosure.clone());

          let decoded = self.decode_value(&disclosure.claim_value, &child_path, &child_trail, depth + 1)?;
          output.push(decoded);
          continue;
        }
      }

      let child_path = path.array_element(output.len());
      let decoded = self.decode_value(value, &child_path, trail, depth + 1)?;
      output.push(decoded);
    }

    Ok(output)
  }

  fn decode_value(&mut self, value: &Value, path: &ClaimPath, trail: &[Disclosure], depth: usize) -> Result<Value> {
    if depth > MAX_NESTING_DEPTH {
      return Err(Error::MaximumDepthReached(MAX_NESTING_DEPTH));
    }
    self.ledger.record(path.clone(), trail.to_vec());

    match value {
      Value::Object(object) => Ok(Value::Object(self.decode_object(object, path, trail, depth)?)),
      Value::Array(array) => Ok(Value::Array(self.decode_array(array, path, trail, depth)?)),
      _ => Ok(value.clone()),
    }
  }

  fn note_digest(&mut self, digest: &str) -> Result<()> {
    if !self.seen_digests.insert(digest.to_owned()) {
      return Err(Error::DuplicateDigest(digest.to_owned()));
    }
    Ok(())
  }

  fn consume(&mut self, path: &ClaimPath, disclosure: &Disclosure) {
    self.consumed += 1;
    if let Some(visitor) = self.visitor.as_deref_mut() {
      visitor.on_disclosure(path, disclosure);
    }
  }
}
