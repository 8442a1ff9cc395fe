mod builder;
mod claim_path;
mod decoder;
mod definition;
mod disclosable;
mod disclosure;
mod error;
mod factory;
mod hasher;
mod jwt;
mod key_binding_jwt_claims;
mod salt;
mod sd_jwt;
mod signer;
mod validator;

pub use builder::*;
pub use claim_path::*;
pub use decoder::*;
pub use definition::*;
pub use disclosable::*;
pub use disclosure::*;
pub use error::*;
pub use factory::*;
pub use hasher::*;
pub use jwt::*;
pub use key_binding_jwt_claims::*;
pub use salt::*;
pub use sd_jwt::*;
pub use signer::*;
pub use validator::*;
