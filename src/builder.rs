// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context as _;
use serde_json::Value;

use crate::DecoyGenerator;
use crate::DisclosableObject;
use crate::Error;
use crate::Jwt;
use crate::JwsSigner;
use crate::RequiredKeyBinding;
use crate::Result;
use crate::SaltProvider;
use crate::SdJwt;
use crate::SdJwtClaims;
use crate::SdObjectFactory;
use crate::SdPayload;
#[cfg(feature = "sha")]
use crate::Sha256Hasher;
use crate::Hasher;
use crate::HEADER_TYP;

/// Builder structure to create an issuable SD-JWT from a disclosable tree.
pub struct SdJwtBuilder<H: Hasher> {
  factory: SdObjectFactory<H>,
  object: DisclosableObject,
  key_bind: Option<RequiredKeyBinding>,
}

#[cfg(feature = "sha")]
impl SdJwtBuilder<Sha256Hasher> {
  /// Creates a new [`SdJwtBuilder`] with the `sha-256` hash function.
  pub fn new(object: DisclosableObject) -> Self {
    Self::new_with_factory(object, SdObjectFactory::new())
  }
}

impl<H: Hasher> SdJwtBuilder<H> {
  /// Creates a new [`SdJwtBuilder`] issuing through the given factory.
  pub fn new_with_factory(object: DisclosableObject, factory: SdObjectFactory<H>) -> Self {
    Self {
      factory,
      object,
      key_bind: None,
    }
  }

  /// Replaces the source of per-disclosure salts.
  pub fn with_salt_provider(mut self, salt_provider: Box<dyn SaltProvider>) -> Self {
    self.factory = self.factory.with_salt_provider(salt_provider);
    self
  }

  /// Replaces the source of decoy digests.
  pub fn with_decoy_generator(mut self, decoy_generator: Box<dyn DecoyGenerator>) -> Self {
    self.factory = self.factory.with_decoy_generator(decoy_generator);
    self
  }

  /// Pads every emitted `_sd` array with decoy digests up to at least
  /// `min_digests` entries.
  pub fn with_min_digests(mut self, min_digests: usize) -> Self {
    self.factory = self.factory.with_min_digests(min_digests);
    self
  }

  /// Require a proof of possession of a given key from the holder.
  ///
  /// This operation adds a JWT confirmation (`cnf`) claim as specified in
  /// [RFC7800](https://www.rfc-editor.org/rfc/rfc7800.html#section-3).
  pub fn require_key_binding(mut self, key_bind: RequiredKeyBinding) -> Self {
    self.key_bind = Some(key_bind);
    self
  }

  /// Issues the disclosable tree and creates an SD-JWT signed by `signer`.
  pub async fn finish<S>(self, signer: &S, alg: &str) -> Result<SdJwt>
  where
    S: JwsSigner,
  {
    let SdJwtBuilder {
      mut factory,
      object,
      key_bind,
    } = self;
    let SdPayload {
      object: payload,
      disclosures,
    } = factory.issue(&object)?;

    let mut claims = serde_json::from_value::<SdJwtClaims>(Value::Object(payload))
      .map_err(|e| Error::DeserializationError(format!("invalid SD-JWT claims: {e}")))?;
    claims.cnf = key_bind;

    let Value::Object(header) = serde_json::json!({
      "typ": HEADER_TYP,
      "alg": alg,
    }) else {
      unreachable!();
    };

    // Sign exactly the object the claims serialize to, so the payload bytes
    // stay stable across serialize/deserialize round trips.
    let Ok(Value::Object(claims_object)) = serde_json::to_value(&claims) else {
      unreachable!();
    };

    let jws = signer
      .sign(&header, &claims_object)
      .await
      .map_err(|e| anyhow::anyhow!("jws failed: {e}"))
      .and_then(|jws_bytes| String::from_utf8(jws_bytes).context("invalid JWS"))
      .map_err(|e| Error::JwsSignerFailure(e.to_string()))?;

    let jwt: Jwt<SdJwtClaims> = jws.parse()?;

    Ok(SdJwt::new(jwt, disclosures, None))
  }
}

#[cfg(all(test, feature = "sha"))]
mod test {
  use super::SdJwtBuilder;
  use crate::DisclosableObject;
  use crate::JsonObject;
  use crate::JwsSigner;
  use crate::RequiredKeyBinding;
  use crate::SdJwt;
  use async_trait::async_trait;
  use multibase::Base;
  use serde_json::json;

  /// Produces syntactically valid but unsigned JWS tokens.
  struct NoopSigner;

  #[async_trait]
  impl JwsSigner for NoopSigner {
    type Error = std::convert::Infallible;

    async fn sign(&self, header: &JsonObject, payload: &JsonObject) -> Result<Vec<u8>, Self::Error> {
      let header = Base::Base64Url.encode(serde_json::to_vec(header).unwrap());
      let payload = Base::Base64Url.encode(serde_json::to_vec(payload).unwrap());
      Ok(format!("{header}.{payload}.signature").into_bytes())
    }
  }

  #[tokio::test]
  async fn finish_builds_a_parseable_sd_jwt() {
    let tree = DisclosableObject::new()
      .claim("iss", json!("https://issuer.example.com"))
      .sd_claim("given_name", json!("John"))
      .sd_claim("family_name", json!("Doe"));
    let sd_jwt = SdJwtBuilder::new(tree)
      .require_key_binding(RequiredKeyBinding::Kid("key-1".to_owned()))
      .finish(&NoopSigner, "HS256")
      .await
      .unwrap();

    assert_eq!(sd_jwt.disclosures().len(), 2);
    assert_eq!(sd_jwt.claims()._sd.len(), 2);
    assert_eq!(sd_jwt.claims()._sd_alg.as_deref(), Some("sha-256"));
    assert_eq!(sd_jwt.header().get("typ").unwrap(), "sd-jwt");
    assert!(matches!(
      sd_jwt.required_key_bind(),
      Some(RequiredKeyBinding::Kid(kid)) if kid == "key-1"
    ));

    let reparsed = SdJwt::parse(&sd_jwt.presentation()).unwrap();
    assert_eq!(reparsed, sd_jwt);
  }

  #[tokio::test]
  async fn finish_without_disclosable_claims_omits_sd_alg() {
    let tree = DisclosableObject::new().claim("iss", json!("https://issuer.example.com"));
    let sd_jwt = SdJwtBuilder::new(tree).finish(&NoopSigner, "HS256").await.unwrap();
    assert!(sd_jwt.claims()._sd_alg.is_none());
    assert!(sd_jwt.disclosures().is_empty());
    assert!(sd_jwt.presentation().ends_with('~'));
  }
}
