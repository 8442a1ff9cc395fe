// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = ::core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum Error {
  #[error("invalid disclosure: {0}")]
  InvalidDisclosure(String),

  #[error("no hasher can be specified for the hashing algorithm {0}")]
  MissingHasher(String),

  #[error("`_sd_alg` is missing even though disclosures are present")]
  MissingSdAlg,

  #[error("data type is not expected: {0}")]
  DataTypeMismatch(String),

  #[error("claim {0} of disclosure already exists")]
  ClaimCollision(String),

  #[error("digest {0} appears multiple times")]
  DuplicateDigest(String),

  #[error("multiple disclosures hash to the digest {0}")]
  DuplicateDisclosure(String),

  #[error("{0} disclosures were not used in the payload")]
  UnusedDisclosures(usize),

  #[error("claim name {0} is reserved")]
  ReservedClaimName(String),

  #[error("salt {0} was generated twice within one credential")]
  SaltCollision(String),

  #[error("salt size must be greater or equal 16")]
  InvalidSaltSize,

  #[error("nesting depth exceeds the supported maximum of {0}")]
  MaximumDepthReached(usize),

  #[error("array disclosure object contains keys other than `...`")]
  InvalidArrayDisclosureObject,

  #[error("invalid input: {0}")]
  DeserializationError(String),

  #[error("signer failed: {0}")]
  JwsSignerFailure(String),
}
