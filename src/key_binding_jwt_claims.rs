// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::Hasher;
use crate::Jwt;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A JWT proving possession of the key bound to an SD-JWT.
pub type KeyBindingJwt = Jwt<KeyBindingJwtClaims>;

/// Claims set for key binding JWT.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeyBindingJwtClaims {
  pub iat: i64,
  pub aud: String,
  pub nonce: String,
  pub sd_hash: String,
  #[serde(flatten)]
  pub properties: BTreeMap<String, Value>,
}

impl KeyBindingJwtClaims {
  pub const KB_JWT_HEADER_TYP: &'static str = "kb+jwt";

  /// Creates a new [`KeyBindingJwtClaims`].
  /// `sd_hash` is computed over `<jwt>~<disclosure 1>~...~<disclosure N>~`,
  /// the presentation the key binding commits to.
  pub fn new(hasher: &dyn Hasher, jwt: String, disclosures: Vec<String>, nonce: String, aud: String, iat: i64) -> Self {
    let disclosures = disclosures.iter().join("~");
    let sd_jwt = if disclosures.is_empty() {
      format!("{}~", jwt)
    } else {
      format!("{}~{}~", jwt, disclosures)
    };
    let hash = hasher.encoded_digest(&sd_jwt);
    Self {
      iat,
      aud,
      nonce,
      sd_hash: hash,
      properties: BTreeMap::new(),
    }
  }
}

/// Associates a key with the holder of an SD-JWT, conveyed in the `cnf` claim.
///
/// See [RFC7800](https://www.rfc-editor.org/rfc/rfc7800.html#section-3.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredKeyBinding {
  /// A JSON Web Key (JWK).
  Jwk(crate::JsonObject),
  /// A JWK in its JWE compact serialization form.
  Jwe(String),
  /// A key ID.
  Kid(String),
  /// A JWK from a JWK Set identified by `kid`.
  Jwu {
    /// The URL of the JWK Set.
    jwu: String,
    /// The `kid` of a JWK from the JWK Set.
    kid: String,
  },
  /// A non-standard confirmation method.
  #[serde(untagged)]
  Custom(Value),
}
