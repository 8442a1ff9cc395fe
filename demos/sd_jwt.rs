// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use async_trait::async_trait;
use josekit::jws::alg::hmac::HmacJwsSigner;
use josekit::jws::JwsHeader;
use josekit::jws::HS256;
use serde_json::json;

use sd_jwt_core::DefinitionObject;
use sd_jwt_core::DefinitionValidator;
use sd_jwt_core::DisclosableObject;
use sd_jwt_core::JsonObject;
use sd_jwt_core::JwsSigner;
use sd_jwt_core::SdJwt;
use sd_jwt_core::SdJwtBuilder;
use sd_jwt_core::SdObjectDecoder;

/// Creating JWTs is outside the scope of this library, josekit is used here
/// as an example.
struct JosekitSigner(HmacJwsSigner);

#[async_trait]
impl JwsSigner for JosekitSigner {
  type Error = josekit::JoseError;

  async fn sign(&self, header: &JsonObject, payload: &JsonObject) -> Result<Vec<u8>, Self::Error> {
    let header = JwsHeader::from_map(header.clone())?;
    let payload = serde_json::to_vec(payload).expect("payload is a JSON object");
    josekit::jws::serialize_compact(&payload, &header, &self.0).map(String::into_bytes)
  }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  let key = b"0123456789ABCDEF0123456789ABCDEF";

  // Describe which claims are always visible and which are selectively
  // disclosable.
  let address = DisclosableObject::new()
    .claim("street_address", json!("123 Main St"))
    .claim("locality", json!("Anytown"))
    .claim("region", json!("Anystate"))
    .claim("country", json!("US"));
  let credential = DisclosableObject::new()
    .claim("sub", json!("user_42"))
    .claim("given_name", json!("John"))
    .claim("family_name", json!("Doe"))
    .sd_claim("email", json!("johndoe@example.com"))
    .sd_claim("phone_number", json!("+1-202-555-0101"))
    .sd_object("address", address)
    .claim("birthdate", json!("1940-01-01"));

  // Issue the SD-JWT.
  let signer = JosekitSigner(HS256.signer_from_bytes(key)?);
  let sd_jwt = SdJwtBuilder::new(credential).finish(&signer, "HS256").await?;
  println!("issued SD-JWT: {}", sd_jwt.presentation());

  // The holder conceals the phone number by dropping its disclosure.
  let mut presented = SdJwt::parse(&sd_jwt.presentation())?;
  presented.retain_disclosures(|disclosure| disclosure.claim_name.as_deref() != Some("phone_number"));
  let presentation = presented.presentation();
  println!("presented SD-JWT: {presentation}");

  // The verifier checks the JWS before trusting the claim set.
  let verifier = HS256.verifier_from_bytes(key)?;
  let jwt_segment = presentation.split('~').next().unwrap();
  let (payload_bytes, _header) = josekit::jws::deserialize_compact(jwt_segment, &verifier)?;
  let payload: JsonObject = serde_json::from_slice(&payload_bytes)?;

  // Recreate the disclosed claims.
  let received = SdJwt::parse(&presentation)?;
  let recreated = SdObjectDecoder::new().decode(&payload, received.disclosures())?;
  println!(
    "recreated claims: {}",
    serde_json::to_string_pretty(&recreated.claims)?
  );

  // Check the presentation against the credential definition.
  let definition = DefinitionObject::new()
    .claim("given_name")
    .claim("family_name")
    .claim("birthdate")
    .sd_claim("email")
    .element(
      "address",
      sd_jwt_core::DefinitionElement::sd_object(
        DefinitionObject::new()
          .claim("street_address")
          .claim("locality")
          .claim("region")
          .claim("country"),
      ),
    );
  let errors = DefinitionValidator::new(definition).validate(&recreated.claims, &recreated.ledger);
  println!("definition violations: {errors:?}");

  Ok(())
}
