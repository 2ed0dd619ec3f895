pub mod error;
pub mod factory;
pub mod jwks;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::AuthError;
pub use factory::build_token_verifier;
pub use jwks::{JwksCache, JwksClient};
pub use verifier::{Claims, TokenVerifier};
