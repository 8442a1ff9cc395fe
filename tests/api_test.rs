// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use josekit::jws::alg::hmac::HmacJwsSigner;
use josekit::jws::JwsHeader;
use josekit::jws::HS256;
use serde_json::json;
use serde_json::Value;

use sd_jwt_core::DefinitionObject;
use sd_jwt_core::DefinitionValidator;
use sd_jwt_core::DisclosableElement;
use sd_jwt_core::DisclosableObject;
use sd_jwt_core::Hasher;
use sd_jwt_core::JsonObject;
use sd_jwt_core::JwsSigner;
use sd_jwt_core::KeyBindingJwt;
use sd_jwt_core::KeyBindingJwtClaims;
use sd_jwt_core::RequiredKeyBinding;
use sd_jwt_core::SdJwt;
use sd_jwt_core::SdJwtBuilder;
use sd_jwt_core::SdObjectDecoder;
use sd_jwt_core::Sha256Hasher;

const KEY: &[u8] = b"0123456789ABCDEF0123456789ABCDEF";

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

fn signer() -> JosekitSigner {
  JosekitSigner(HS256.signer_from_bytes(KEY).unwrap())
}

fn address_credential() -> DisclosableObject {
  let address = DisclosableObject::new()
    .claim("street_address", json!("123 Main St"))
    .claim("locality", json!("Anytown"))
    .claim("region", json!("Anystate"))
    .claim("country", json!("US"));
  DisclosableObject::new()
    .claim("sub", json!("user_42"))
    .claim("given_name", json!("John"))
    .claim("family_name", json!("Doe"))
    .sd_claim("email", json!("johndoe@example.com"))
    .sd_claim("phone_number", json!("+1-202-555-0101"))
    .sd_object("address", address)
    .claim("birthdate", json!("1940-01-01"))
    .array(
      "nationalities",
      vec![
        DisclosableElement::sd(json!("US")),
        DisclosableElement::plain(json!("DE")),
      ],
    )
}

#[tokio::test]
async fn issue_present_verify_and_validate() {
  let tree = address_credential();
  let sd_jwt = SdJwtBuilder::new(tree.clone())
    .finish(&signer(), "HS256")
    .await
    .unwrap();
  assert_eq!(sd_jwt.disclosures().len(), 4);

  let presentation = sd_jwt.presentation();

  // The verifier splits the presentation and checks the JWS before trusting
  // the claim set.
  let received = SdJwt::parse(&presentation).unwrap();
  let verifier = HS256.verifier_from_bytes(KEY).unwrap();
  let jwt_segment = presentation.split('~').next().unwrap();
  let (payload_bytes, _header) = josekit::jws::deserialize_compact(jwt_segment, &verifier).unwrap();
  let payload: JsonObject = serde_json::from_slice(&payload_bytes).unwrap();

  let recreated = SdObjectDecoder::new().decode(&payload, received.disclosures()).unwrap();
  assert_eq!(Value::Object(recreated.claims.clone()), Value::Object(tree.to_json()));

  let definition = DefinitionObject::shape_of(&tree);
  let errors = DefinitionValidator::new(definition).validate(&recreated.claims, &recreated.ledger);
  assert!(errors.is_empty());
}

#[tokio::test]
async fn partially_disclosed_presentation() {
  let tree = address_credential();
  let mut sd_jwt = SdJwtBuilder::new(tree).finish(&signer(), "HS256").await.unwrap();

  // The holder reveals nothing but the email address.
  sd_jwt.retain_disclosures(|disclosure| disclosure.claim_name.as_deref() == Some("email"));
  let presentation = sd_jwt.presentation();

  let received = SdJwt::parse(&presentation).unwrap();
  let recreated = received.into_recreated_claims(&SdObjectDecoder::new()).unwrap();
  assert_eq!(recreated.claims.get("email").unwrap(), "johndoe@example.com");
  assert!(recreated.claims.get("phone_number").is_none());
  assert!(recreated.claims.get("address").is_none());
  assert_eq!(recreated.claims.get("nationalities").unwrap(), &json!(["DE"]));
}

#[tokio::test]
async fn presentation_with_key_binding() {
  let tree = address_credential();
  let sd_jwt = SdJwtBuilder::new(tree)
    .require_key_binding(RequiredKeyBinding::Kid("holder-key-1".to_owned()))
    .finish(&signer(), "HS256")
    .await
    .unwrap();

  let mut presented = SdJwt::parse(&sd_jwt.presentation()).unwrap();
  assert!(matches!(
    presented.required_key_bind(),
    Some(RequiredKeyBinding::Kid(kid)) if kid == "holder-key-1"
  ));

  // The key binding commits to the presentation it is attached to.
  let hasher = Sha256Hasher::new();
  let kb_claims = KeyBindingJwtClaims::new(
    &hasher,
    presented.presentation().split('~').next().unwrap().to_owned(),
    presented.disclosures().iter().map(ToString::to_string).collect(),
    "nonce-12345".to_owned(),
    "https://verifier.example.com".to_owned(),
    1683000000,
  );

  let mut kb_header = JwsHeader::new();
  kb_header.set_token_type(KeyBindingJwtClaims::KB_JWT_HEADER_TYP);
  let kb_jwt_string = josekit::jws::serialize_compact(
    &serde_json::to_vec(&kb_claims).unwrap(),
    &kb_header,
    &HS256.signer_from_bytes(KEY).unwrap(),
  )
  .unwrap();
  let kb_jwt: KeyBindingJwt = kb_jwt_string.parse().unwrap();
  presented.attach_key_binding_jwt(kb_jwt);

  let presentation = presented.presentation();
  assert!(!presentation.ends_with('~'));

  let reparsed = SdJwt::parse(&presentation).unwrap();
  let kb_claims = &reparsed.key_binding_jwt().unwrap().claims;
  let committed_part = &presentation[..presentation.rfind('~').unwrap() + 1];
  assert_eq!(kb_claims.sd_hash, hasher.encoded_digest(committed_part));
  assert_eq!(kb_claims.aud, "https://verifier.example.com");
}
