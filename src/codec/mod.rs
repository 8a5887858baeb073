//! Decoding of the tokens that arrive in response headers.

mod expiry;
mod front_token;

pub use expiry::decode_expiry;
pub use front_token::decode_identity;
