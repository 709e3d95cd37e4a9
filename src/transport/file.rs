//! The file transport writes the emails to the given directory. The name of the file will be
//! `email_id.eml`, with `email_id` a random UUID.
//! It can be useful for testing purposes, or if you want to keep track of sent messages.
//!
//! With the `file-transport-envelope` feature, the envelope is also saved as
//! `email_id.json`, and [`FileTransport::read`] loads both back.
//!
//! ```rust
//! # use std::error::Error;
//! use std::env::temp_dir;
//! use missive::{message::{Message, Part}, FileTransport, Transport};
//!
//! # fn main() -> Result<(), Box<dyn Error>> {
//! // Write to the local temp directory
//! let sender = FileTransport::new(temp_dir());
//! let mut email = Message::builder()
//!     .from("NoBody <nobody@domain.tld>")
//!     .reply_to("Yuin <yuin@domain.tld>")
//!     .to("Hei <hei@domain.tld>")
//!     .subject("Happy new year")
//!     .body(Part::text_plain("Be happy!".into()))
//!     .build()?;
//!
//! let id = sender.send(&mut email)?;
//! # std::fs::remove_file(temp_dir().join(format!("{}.eml", id)))?;
//! # Ok(())
//! # }
//! ```

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use uuid::Uuid;

use crate::{address::Envelope, Transport};

/// File transport errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message could not be serialized
    #[error(transparent)]
    Message(#[from] crate::Error),
    /// Writing or reading a file failed
    #[error("file transport i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The envelope could not be (de)serialized
    #[cfg(feature = "file-transport-envelope")]
    #[error("envelope json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the content and the envelope information to a file
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileTransport {
    path: PathBuf,
    #[cfg(feature = "file-transport-envelope")]
    save_envelope: bool,
}

impl FileTransport {
    /// Creates a new transport to the given directory
    ///
    /// Writes the email content in eml format.
    pub fn new<P: AsRef<Path>>(path: P) -> FileTransport {
        FileTransport {
            path: PathBuf::from(path.as_ref()),
            #[cfg(feature = "file-transport-envelope")]
            save_envelope: false,
        }
    }

    /// Creates a new transport to the given directory
    ///
    /// Writes the email content in eml format and the envelope
    /// in json format.
    #[cfg(feature = "file-transport-envelope")]
    pub fn with_envelope<P: AsRef<Path>>(path: P) -> FileTransport {
        FileTransport {
            path: PathBuf::from(path.as_ref()),
            save_envelope: true,
        }
    }

    /// Read a message that was written using the file transport.
    ///
    /// Reads the envelope and the raw message content.
    #[cfg(feature = "file-transport-envelope")]
    pub fn read(&self, email_id: &str) -> Result<(Envelope, Vec<u8>), Error> {
        let eml = fs::read(self.path(email_id, "eml"))?;
        let json = fs::read(self.path(email_id, "json"))?;
        let envelope = serde_json::from_slice(&json)?;
        Ok((envelope, eml))
    }

    fn path<I: fmt::Display>(&self, email_id: I, extension: &str) -> PathBuf {
        self.path.join(format!("{}.{}", email_id, extension))
    }
}

impl Transport for FileTransport {
    type Ok = Uuid;
    type Error = Error;

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        let email_id = Uuid::new_v4();

        let file = self.path(&email_id, "eml");
        fs::write(&file, email)?;

        #[cfg(feature = "file-transport-envelope")]
        {
            if self.save_envelope {
                let buf = serde_json::to_vec(envelope)?;
                fs::write(self.path(&email_id, "json"), buf)?;
            }
        }
        #[cfg(not(feature = "file-transport-envelope"))]
        let _ = envelope;

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %file.display(), bytes = email.len(), "message written");

        Ok(email_id)
    }
}
