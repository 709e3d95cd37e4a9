//! The stub transport keeps messages in memory instead of sending them.
//! It can be configured to fail, which makes it useful for testing code
//! that handles delivery errors.
//!
//! ```rust
//! # use std::error::Error;
//! use missive::{message::{Message, Part}, transport::stub::StubTransport, Transport};
//!
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut email = Message::builder()
//!     .from("NoBody <nobody@domain.tld>")
//!     .reply_to("Yuin <yuin@domain.tld>")
//!     .to("Hei <hei@domain.tld>")
//!     .subject("Happy new year")
//!     .body(Part::text_plain("Be happy!".into()))
//!     .build()?;
//!
//! let sender = StubTransport::new_ok();
//! sender.send(&mut email)?;
//! assert_eq!(sender.messages().len(), 1);
//! # Ok(())
//! # }
//! ```

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{address::Envelope, Transport};

/// Stub transport errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured failure
    #[error("stub transport error")]
    Stub,
    /// The message could not be serialized
    #[error(transparent)]
    Message(#[from] crate::Error),
}

/// This transport logs messages and always returns the given response
#[derive(Clone)]
pub struct StubTransport {
    response: Result<(), ()>,
    messages: Arc<Mutex<Vec<(Envelope, Vec<u8>)>>>,
}

impl fmt::Debug for StubTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubTransport")
            .field("response", &self.response)
            .finish()
    }
}

impl StubTransport {
    /// Creates a new transport that always returns the given response
    pub fn new(response: Result<(), ()>) -> StubTransport {
        StubTransport {
            response,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a new transport that always returns a success response
    pub fn new_ok() -> StubTransport {
        Self::new(Ok(()))
    }

    /// Creates a new transport that always returns an error
    pub fn new_error() -> StubTransport {
        Self::new(Err(()))
    }

    /// Envelopes and bytes of every message sent so far, failed ones included
    pub fn messages(&self) -> Vec<(Envelope, Vec<u8>)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for StubTransport {
    type Ok = ();
    type Error = Error;

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((envelope.clone(), email.to_vec()));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            from = ?envelope.from(),
            to = ?envelope.to(),
            bytes = email.len(),
            ok = self.response.is_ok(),
            "stub transport received message"
        );

        self.response.map_err(|()| Error::Stub)
    }
}
