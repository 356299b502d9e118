#![doc = include_str!("../README.md")]
#![deny(rust_2018_idioms, nonstandard_style, future_incompatible)]

pub mod key;
pub mod protocol;

pub use crate::key::{AccountKey, Jwk, KeyKind};
pub use crate::protocol::client::AcmeClient;
pub use crate::protocol::directory::DirectoryUrl;
pub use crate::protocol::errors::{Error, Problem};
pub use crate::protocol::jose::Payload;
pub use crate::protocol::response::{Body, DecodedResponse};
pub use crate::protocol::transport::{HttpTransport, RawResponse, Transport};
