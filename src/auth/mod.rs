//! Authentication module
//!
//! Signs connection URLs for the speech service.

mod signer;

pub use signer::{rfc1123, sign, AuthSigner, SignedRequestUrl};
