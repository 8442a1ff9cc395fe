// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

pub type JsonObject = Map<String, Value>;

/// JSON Web Signature (JWS) Signer.
///
/// Signing is outside the scope of this crate and supplied by the host; the
/// issuance builder only needs this capability at its very end.
#[async_trait]
pub trait JwsSigner {
  type Error: Error;
  /// Creates a JWS. The algorithm used for signing must be read from the
  /// `header.alg` property.
  async fn sign(&self, header: &JsonObject, payload: &JsonObject) -> Result<Vec<u8>, Self::Error>;
}
