//! Provides a strongly typed way to build emails
//!
//! ### Creating messages
//!
//! This section explains how to create emails.
//!
//! ## Usage
//!
//! ### Format email messages
//!
//! #### With string body
//!
//! The easiest way how we can create email message with simple string.
//!
//! ```rust
//! # use std::error::Error;
//! use missive::message::{Message, Part};
//!
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut m = Message::builder()
//!     .from("NoBody <nobody@domain.tld>")
//!     .reply_to("Yuin <yuin@domain.tld>")
//!     .to("Hei <hei@domain.tld>")
//!     .subject("Happy new year")
//!     .body(Part::text_plain("Be happy!".into()))
//!     .build()?;
//!
//! let bytes = m.formatted()?;
//! # Ok(())
//! # }
//! ```
//!
//! Will produce:
//!
//! ```sh
//! Date: Sat, 01 Jan 2022 10:00:00 GMT
//! From: NoBody <nobody@domain.tld>
//! Reply-To: Yuin <yuin@domain.tld>
//! To: Hei <hei@domain.tld>
//! Message-ID: <1641031200000000000.4242.7311806104163581547@localhost.localdomain>
//! Subject: Happy new year
//! MIME-Version: 1.0
//! Content-Type: text/plain; charset=utf-8
//! Content-Transfer-Encoding: 7bit
//!
//! Be happy!
//! ```
//!
//! #### With alternative and attachments
//!
//! ```rust
//! # use std::error::Error;
//! use missive::message::{Attachment, Message, MultiPartKind, Part};
//!
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut m = Message::builder()
//!     .from("NoBody <nobody@domain.tld>")
//!     .to("Hei <hei@domain.tld>")
//!     .subject("Rust is fun")
//!     .multipart(MultiPartKind::Alternative)
//!     .part(Part::text_plain("Hello world!".into()))
//!     .part(Part::text_html("<p><b>Hello</b>, world!</p>".into()))
//!     .attachment(Attachment::new("notes.txt", "plain notes"))
//!     .build()?;
//!
//! let bytes = m.formatted()?;
//! # Ok(())
//! # }
//! ```
//!
//! Parts come first, then attachments, all under one `multipart/mixed`
//! boundary. Without attachments the declared kind is used.

use std::time::SystemTime;

pub use self::{
    header::{Disposition, ListSeparator, Mailboxes},
    mimebody::{assemble, Attachment, Boundary, MultiPartKind, Part},
    serializer::Serializer,
};
use crate::{
    address::{addr_spec, Envelope},
    Error,
};

// `header::From` would shadow the `From` trait
use self::header::{
    Cc, Comments, Date, Header, HeaderName, HeaderValue, Headers, Importance, InReplyTo, Keywords,
    Priority, References, ReplyTo, Sender, Sensitivity, Subject, To,
};

pub mod encoder;
pub mod header;
pub mod message_id;
pub mod mimebody;
mod serializer;

/// Names the serializer writes itself, unavailable to custom headers
const MANAGED_HEADERS: &[&str] = &[
    "Date",
    "From",
    "Sender",
    "Reply-To",
    "To",
    "Cc",
    "Bcc",
    "Message-ID",
    "In-Reply-To",
    "References",
    "Subject",
    "Comments",
    "Keywords",
    "Importance",
    "Priority",
    "Sensitivity",
    "MIME-Version",
    "Content-Type",
    "Content-Transfer-Encoding",
];

/// A builder for messages
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    date: Option<SystemTime>,
    from: Vec<String>,
    sender: Option<String>,
    reply_to: Vec<String>,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    message_id: Option<String>,
    in_reply_to: Vec<String>,
    references: Vec<String>,
    subject: Option<String>,
    comments: Option<String>,
    keywords: Vec<String>,
    importance: Option<Importance>,
    priority: Option<Priority>,
    sensitivity: Option<Sensitivity>,
    custom: Vec<(String, String)>,
    body: Option<Part>,
    parts: Vec<Part>,
    attachments: Vec<Attachment>,
    multipart: MultiPartKind,
    list_separator: ListSeparator,
}

impl MessageBuilder {
    /// Creates a new default message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `Date` header to the given time
    ///
    /// Defaults to the time of [`build`](Self::build).
    pub fn date(mut self, date: SystemTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Set `Date` header to current date/time
    pub fn date_now(self) -> Self {
        self.date(SystemTime::now())
    }

    /// Add mailbox to `From` header
    pub fn from<S: Into<String>>(mut self, mbox: S) -> Self {
        self.from.push(mbox.into());
        self
    }

    /// Set `Sender` header
    ///
    /// Only written when it differs from `From`. Without `From` it is used
    /// as the author.
    pub fn sender<S: Into<String>>(mut self, mbox: S) -> Self {
        self.sender = Some(mbox.into());
        self
    }

    /// Add mailbox to `Reply-To` header
    pub fn reply_to<S: Into<String>>(mut self, mbox: S) -> Self {
        self.reply_to.push(mbox.into());
        self
    }

    /// Add mailbox to `To` header
    pub fn to<S: Into<String>>(mut self, mbox: S) -> Self {
        self.to.push(mbox.into());
        self
    }

    /// Add mailbox to `Cc` header
    pub fn cc<S: Into<String>>(mut self, mbox: S) -> Self {
        self.cc.push(mbox.into());
        self
    }

    /// Add a blind copy recipient
    ///
    /// Bcc recipients only appear in the [`Envelope`], never in the headers.
    pub fn bcc<S: Into<String>>(mut self, mbox: S) -> Self {
        self.bcc.push(mbox.into());
        self
    }

    /// Use a known `Message-ID` instead of generating one
    pub fn message_id<S: Into<String>>(mut self, id: S) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Add id to `In-Reply-To` header
    pub fn in_reply_to<S: Into<String>>(mut self, id: S) -> Self {
        self.in_reply_to.push(id.into());
        self
    }

    /// Add id to `References` header
    pub fn references<S: Into<String>>(mut self, id: S) -> Self {
        self.references.push(id.into());
        self
    }

    /// Set `Subject` header to message
    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn comments<S: Into<String>>(mut self, comments: S) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// Add phrase to `Keywords` header
    pub fn keyword<S: Into<String>>(mut self, keyword: S) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }

    /// Add a custom header, such as `X-Mailer`
    ///
    /// Written after the standard fields, encoded as free text.
    pub fn header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.custom.push((name.into(), value.into()));
        self
    }

    /// Set the single part body
    ///
    /// When parts or attachments are added too, it becomes the first part.
    pub fn body(mut self, body: Part) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a body part
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Append an attachment, after every part
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Multipart subtype used when there are no attachments
    pub fn multipart(mut self, kind: MultiPartKind) -> Self {
        self.multipart = kind;
        self
    }

    /// Separator between address list entries, `;` by default
    pub fn list_separator(mut self, separator: ListSeparator) -> Self {
        self.list_separator = separator;
        self
    }

    fn mailboxes(&self, entries: &[String]) -> Mailboxes {
        Mailboxes::from(entries.to_vec()).with_separator(self.list_separator)
    }

    /// Validates and encodes every header, then builds the message
    pub fn build(self) -> Result<Message, Error> {
        let authors = if self.from.is_empty() {
            match &self.sender {
                Some(sender) => vec![sender.clone()],
                None => return Err(Error::MissingFrom),
            }
        } else {
            self.from.clone()
        };

        let envelope = Envelope::new(
            self.sender.as_deref().or_else(|| authors.first().map(String::as_str)),
            self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter()),
        )?;

        let mut leading = Headers::with_capacity(6);
        leading.set(&Date(self.date.unwrap_or_else(SystemTime::now)))?;
        leading.set(&header::From(self.mailboxes(&authors)))?;
        if let Some(sender) = &self.sender {
            let distinct = !(authors.len() == 1 && addr_spec(&authors[0]) == addr_spec(sender));
            if distinct {
                leading.set(&Sender(sender.clone()))?;
            }
        }
        if !self.reply_to.is_empty() {
            leading.set(&ReplyTo(self.mailboxes(&self.reply_to)))?;
        }
        if !self.to.is_empty() {
            leading.set(&To(self.mailboxes(&self.to)))?;
        }
        if !self.cc.is_empty() {
            leading.set(&Cc(self.mailboxes(&self.cc)))?;
        }

        let mut trailing = Headers::with_capacity(9 + self.custom.len());
        if !self.in_reply_to.is_empty() {
            trailing.set(&InReplyTo(self.in_reply_to.clone()))?;
        }
        if !self.references.is_empty() {
            trailing.set(&References(self.references.clone()))?;
        }
        if let Some(subject) = &self.subject {
            trailing.set(&Subject(subject.clone()))?;
        }
        if let Some(comments) = &self.comments {
            trailing.set(&Comments(comments.clone()))?;
        }
        if !self.keywords.is_empty() {
            trailing.set(&Keywords(self.keywords.clone()))?;
        }
        if let Some(importance) = &self.importance {
            trailing.set(importance)?;
        }
        if let Some(priority) = &self.priority {
            trailing.set(priority)?;
        }
        if let Some(sensitivity) = &self.sensitivity {
            trailing.set(sensitivity)?;
        }
        for (name, value) in self.custom {
            let name = HeaderName::new_from_ascii(name)?;
            if MANAGED_HEADERS.iter().any(|m| m.eq_ignore_ascii_case(&name)) {
                return Err(Error::InvalidHeaderName(name.to_string()));
            }
            trailing.append_raw(HeaderValue::new(name, value)?);
        }

        // Validated now so a bad id fails here rather than at send time
        if let Some(id) = &self.message_id {
            header::MessageId(id.clone()).display()?;
        }

        Ok(Message {
            leading,
            trailing,
            message_id: self.message_id,
            envelope,
            body: self.body,
            parts: self.parts,
            attachments: self.attachments,
            multipart: self.multipart,
        })
    }
}

/// Email message which can be formatted
///
/// Headers are validated and encoded when the message is built. The
/// Message-ID is assigned by the first serialization and kept afterwards.
#[derive(Clone, Debug)]
pub struct Message {
    leading: Headers,
    trailing: Headers,
    message_id: Option<String>,
    envelope: Envelope,
    body: Option<Part>,
    parts: Vec<Part>,
    attachments: Vec<Attachment>,
    multipart: MultiPartKind,
}

impl Message {
    /// Create a new message builder without headers
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Get the message envelope
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// `Message-ID`, once assigned
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Caller supplied value of a header set at build time
    pub fn header(&self, name: &str) -> Option<&str> {
        self.leading
            .get_raw(name)
            .or_else(|| self.trailing.get_raw(name))
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Whether the body gets a multipart wrapper
    pub fn is_multipart(&self) -> bool {
        let parts = self.parts.len() + self.body.iter().count();
        !self.attachments.is_empty() || parts > 1
    }

    /// Get message content formatted for sending
    pub fn formatted(&mut self) -> Result<Vec<u8>, Error> {
        Serializer::new().serialize(self)
    }
}
