//! Missive is an email library that builds RFC 5322 messages and hands them to pluggable
//! byte sinks. It provides:
//!
//! * A strongly typed message builder
//! * RFC 2047 encoded words and header folding
//! * MIME bodies: 7bit, quoted-printable and base64, multipart with collision-free boundaries
//! * Unique Message-IDs from a secure random source
//! * Pluggable email transports
//!
//! Serialization never partially succeeds: it returns the complete message or an [`Error`].
//!
//! ## Optional features
//!
//! * **hostname**: Use the machine hostname as the Message-ID domain
//! * **file-transport**: Transport that writes messages into a file
//! * **file-transport-envelope**: Also save the envelope of messages written by the file transport
//! * **tracing**: Logging using the `tracing` crate
//! * **serde**: Serialization/Deserialization of entities

#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    unsafe_code
)]

pub use crate::address::Envelope;
pub use crate::error::Error;
pub use crate::message::Message;
#[cfg(feature = "file-transport")]
pub use crate::transport::file::FileTransport;
pub use crate::transport::Transport;

mod address;
mod error;
pub mod message;
pub mod transport;
