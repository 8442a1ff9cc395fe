// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::Error;
use crate::Hasher;
use crate::Result;
use rand::Rng;

/// Size of random data used to generate the salts for disclosures in bytes.
pub(crate) const DEFAULT_SALT_SIZE: usize = 16;
pub(crate) const MIN_SALT_SIZE: usize = 16;

/// Source of the per-disclosure salts used at issuance.
///
/// Salts MUST be unique within one credential; the factory treats a repeated
/// salt as a fatal [`Error::SaltCollision`](crate::Error::SaltCollision).
/// Tests inject deterministic implementations to produce reproducible
/// disclosures.
pub trait SaltProvider {
  /// Returns the next salt as a base64url string.
  fn salt(&mut self) -> String;
}

/// A [`SaltProvider`] drawing cryptographically random bytes from
/// [`rand::thread_rng`].
#[derive(Debug)]
pub struct RandomSaltProvider {
  salt_size: usize,
}

impl RandomSaltProvider {
  /// Creates a provider emitting salts of `salt_size` random bytes.
  ///
  /// ## Error
  /// [`Error::InvalidSaltSize`] if `salt_size` is smaller than 16.
  pub fn new(salt_size: usize) -> Result<Self> {
    if salt_size < MIN_SALT_SIZE {
      return Err(Error::InvalidSaltSize);
    }
    Ok(Self { salt_size })
  }
}

impl Default for RandomSaltProvider {
  fn default() -> Self {
    Self {
      salt_size: DEFAULT_SALT_SIZE,
    }
  }
}

impl SaltProvider for RandomSaltProvider {
  fn salt(&mut self) -> String {
    gen_rand(self.salt_size)
  }
}

/// Produces decoy digests: digest-shaped values with no disclosure pre-image,
/// inserted into `_sd` arrays to obscure the number of real selectively
/// disclosable claims.
pub trait DecoyGenerator {
  /// Returns a base64url-encoded digest-width value under `hasher`.
  fn decoy_digest(&mut self, hasher: &dyn Hasher) -> String;
}

/// A [`DecoyGenerator`] hashing random bytes, so that no pre-image disclosure
/// can exist.
pub struct RandomDecoyGenerator {
  entropy: usize,
}

impl Default for RandomDecoyGenerator {
  fn default() -> Self {
    Self { entropy: 32 }
  }
}

impl DecoyGenerator for RandomDecoyGenerator {
  fn decoy_digest(&mut self, hasher: &dyn Hasher) -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..self.entropy).map(|_| rng.gen()).collect();
    multibase::Base::Base64Url.encode(hasher.digest(&random_bytes))
  }
}

pub(crate) fn gen_rand(len: usize) -> String {
  let mut rng = rand::thread_rng();
  let random_bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
  multibase::Base::Base64Url.encode(random_bytes)
}
