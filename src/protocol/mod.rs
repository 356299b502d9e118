//! # The ACME wire protocol: JWS assembly, nonce tracking, transport.
//!
//! Everything an ACME request needs between "resource name plus
//! payload" and "decoded server response" lives here: the base64url
//! codec, the protected-header and flattened-JWS types, the
//! injectable HTTP [`Transport`](transport::Transport), the response
//! decode pipeline, the directory cache and the
//! [`AcmeClient`](client::AcmeClient) request engine that ties them
//! together.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod base64;
pub mod client;
pub mod directory;
pub mod errors;
pub mod jose;
pub mod response;
pub mod transport;

pub use client::AcmeClient;
pub use errors::{Error, Problem};

/// A result type which uses [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
