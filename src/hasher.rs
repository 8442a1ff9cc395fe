// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

#[cfg(feature = "sha")]
use crypto::hashes::sha::SHA256;
#[cfg(feature = "sha")]
use crypto::hashes::sha::SHA256_LEN;
#[cfg(feature = "sha")]
use crypto::hashes::sha::SHA384;
#[cfg(feature = "sha")]
use crypto::hashes::sha::SHA384_LEN;
#[cfg(feature = "sha")]
use crypto::hashes::sha::SHA512;
#[cfg(feature = "sha")]
use crypto::hashes::sha::SHA512_LEN;

/// Used to implement hash functions to be used for encoding/decoding.
///
/// ## Note
///
/// Implementations of this trait are expected only for algorithms listed in
/// the IANA "Named Information Hash Algorithm" registry.
/// See [Hash Function Claim](https://www.ietf.org/archive/id/draft-ietf-oauth-selective-disclosure-jwt-06.html#name-hash-function-claim)
pub trait Hasher: Sync + Send {
  /// Digests input to produce unique fixed-size hash value in bytes.
  fn digest(&self, input: &[u8]) -> Vec<u8>;

  /// Returns the name of hash function used.
  ///
  /// ## Note
  ///
  /// The hash algorithm identifier MUST be a hash algorithm value from the
  /// "Hash Name String" column in the IANA "Named Information Hash Algorithm"
  fn alg_name(&self) -> &'static str;

  /// Returns the base64url-encoded digest of a `disclosure`.
  fn encoded_digest(&self, disclosure: &str) -> String {
    // "The digest MUST be taken over the US-ASCII bytes of the base64url-encoded Disclosure".
    let ascii_bytes: Vec<u8> = disclosure.bytes().filter(|&byte| byte <= 127).collect();
    let hash = self.digest(&ascii_bytes);
    // "The bytes of the digest MUST then be base64url-encoded".
    multibase::Base::Base64Url.encode(hash)
  }
}

/// An implementation of [`Hasher`] that uses the `sha-256` hash function.
#[cfg(feature = "sha")]
#[derive(Debug, Clone, Default)]
pub struct Sha256Hasher;

#[cfg(feature = "sha")]
impl Sha256Hasher {
  pub const ALG_NAME: &'static str = "sha-256";

  /// Creates a new [`Sha256Hasher`].
  pub fn new() -> Self {
    Sha256Hasher {}
  }
}

#[cfg(feature = "sha")]
impl Hasher for Sha256Hasher {
  fn digest(&self, input: &[u8]) -> Vec<u8> {
    let mut digest = [0; SHA256_LEN];
    SHA256(input, &mut digest);
    digest.to_vec()
  }

  fn alg_name(&self) -> &'static str {
    Sha256Hasher::ALG_NAME
  }
}

/// An implementation of [`Hasher`] that uses the `sha-384` hash function.
#[cfg(feature = "sha")]
#[derive(Debug, Clone, Default)]
pub struct Sha384Hasher;

#[cfg(feature = "sha")]
impl Sha384Hasher {
  pub const ALG_NAME: &'static str = "sha-384";

  /// Creates a new [`Sha384Hasher`].
  pub fn new() -> Self {
    Sha384Hasher {}
  }
}

#[cfg(feature = "sha")]
impl Hasher for Sha384Hasher {
  fn digest(&self, input: &[u8]) -> Vec<u8> {
    let mut digest = [0; SHA384_LEN];
    SHA384(input, &mut digest);
    digest.to_vec()
  }

  fn alg_name(&self) -> &'static str {
    Sha384Hasher::ALG_NAME
  }
}

/// An implementation of [`Hasher`] that uses the `sha-512` hash function.
#[cfg(feature = "sha")]
#[derive(Debug, Clone, Default)]
pub struct Sha512Hasher;

#[cfg(feature = "sha")]
impl Sha512Hasher {
  pub const ALG_NAME: &'static str = "sha-512";

  /// Creates a new [`Sha512Hasher`].
  pub fn new() -> Self {
    Sha512Hasher {}
  }
}

#[cfg(feature = "sha")]
impl Hasher for Sha512Hasher {
  fn digest(&self, input: &[u8]) -> Vec<u8> {
    let mut digest = [0; SHA512_LEN];
    SHA512(input, &mut digest);
    digest.to_vec()
  }

  fn alg_name(&self) -> &'static str {
    Sha512Hasher::ALG_NAME
  }
}

/// Registry of [`Hasher`] implementations, keyed by their IANA algorithm name.
///
/// An algorithm may additionally be reachable through aliases registered with
/// [`HasherRegistry::register_alias`].
pub struct HasherRegistry {
  hashers: BTreeMap<String, Box<dyn Hasher>>,
  aliases: BTreeMap<String, String>,
}

impl HasherRegistry {
  /// Creates a registry without any hashers.
  pub fn empty() -> Self {
    Self {
      hashers: BTreeMap::new(),
      aliases: BTreeMap::new(),
    }
  }

  /// Creates a registry with the `sha-256`, `sha-384` and `sha-512` hashers.
  #[cfg(feature = "sha")]
  pub fn new() -> Self {
    let mut registry = Self::empty();
    registry.register(Box::new(Sha256Hasher::new()));
    registry.register(Box::new(Sha384Hasher::new()));
    registry.register(Box::new(Sha512Hasher::new()));
    registry
  }

  /// Registers a hasher under its [`Hasher::alg_name`].
  ///
  /// If a hasher for the same algorithm already exists, it will be replaced and
  /// the existing hasher will be returned, otherwise `None`.
  pub fn register(&mut self, hasher: Box<dyn Hasher>) -> Option<Box<dyn Hasher>> {
    let alg_name = hasher.as_ref().alg_name().to_string();

    self.hashers.insert(alg_name, hasher)
  }

  /// Registers `alias` as an additional name for `algorithm`.
  pub fn register_alias(&mut self, alias: impl Into<String>, algorithm: impl Into<String>) {
    self.aliases.insert(alias.into(), algorithm.into());
  }

  /// Removes the hasher registered for `algorithm`, if any.
  pub fn remove(&mut self, algorithm: &str) -> Option<Box<dyn Hasher>> {
    self.hashers.remove(algorithm)
  }

  /// Looks up a hasher by algorithm name or alias.
  pub fn get(&self, name: &str) -> Option<&dyn Hasher> {
    let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
    self.hashers.get(name).map(AsRef::as_ref)
  }
}

#[cfg(feature = "sha")]
impl Default for HasherRegistry {
  fn default() -> Self {
    Self::new()
  }
}
