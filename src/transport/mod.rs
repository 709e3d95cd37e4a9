//! ### Sending Messages
//!
//! A transport is the byte sink a serialized message is handed to. It gets
//! the [`Envelope`] and the exact bytes of the message; how it reaches a
//! relay, a file or nowhere at all is up to the transport.
//!
//! The following transports are available:
//!
//! * The `FileTransport` creates a file containing the email content to be sent. It can be used
//!   for debugging or if you want to keep all sent emails.
//! * The `StubTransport` is useful for debugging and testing, it keeps sent messages in memory
//!   and can be told to fail.

use std::{error::Error as StdError, fmt};

use crate::{address::Envelope, Message};

#[cfg(feature = "file-transport")]
pub mod file;
pub mod stub;

/// Blocking Transport method for emails
pub trait Transport {
    /// Result types for the transport
    type Ok: fmt::Debug;
    type Error: StdError + From<crate::Error>;

    /// Serializes the message, assigning its Message-ID, and sends it
    fn send(&self, message: &mut Message) -> Result<Self::Ok, Self::Error> {
        let raw = message.formatted()?;
        self.send_raw(message.envelope(), &raw)
    }

    /// Sends already serialized bytes, appended to the sink verbatim
    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error>;
}
