use super::{Header, HeaderName, HeaderValue};
use crate::{message::header::writer::HeaderWriter, Error};

/// What goes between entries of an address list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ListSeparator {
    /// `a@example.com; b@example.com`
    Semicolon,
    /// `a@example.com, b@example.com`, the RFC 5322 `address-list` form
    Comma,
}

impl ListSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            ListSeparator::Semicolon => ";",
            ListSeparator::Comma => ",",
        }
    }
}

impl Default for ListSeparator {
    fn default() -> Self {
        ListSeparator::Semicolon
    }
}

/// An ordered list of mailboxes, `addr@example.com` or `Name <addr@example.com>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mailboxes {
    entries: Vec<String>,
    separator: ListSeparator,
}

impl Mailboxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mailbox, builder style
    pub fn with<S: Into<String>>(mut self, mailbox: S) -> Self {
        self.push(mailbox);
        self
    }

    pub fn with_separator(mut self, separator: ListSeparator) -> Self {
        self.separator = separator;
        self
    }

    pub fn push<S: Into<String>>(&mut self, mailbox: S) {
        self.entries.push(mailbox.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn encode(&self, name: &str) -> Result<String, Error> {
        let mut writer = HeaderWriter::new(name);
        writer.write_mailboxes(&self.entries, self.separator.as_str())?;
        Ok(writer.finish())
    }
}

impl std::convert::From<Vec<String>> for Mailboxes {
    fn from(entries: Vec<String>) -> Self {
        Self {
            entries,
            separator: ListSeparator::default(),
        }
    }
}

macro_rules! mailbox_header {
    ($(#[$doc:meta])*($type_name: ident, $header_name: expr)) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $type_name(pub String);

        impl Header for $type_name {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($header_name)
            }

            fn display(&self) -> Result<HeaderValue, Error> {
                let name = Self::name();
                let mut writer = HeaderWriter::new(&name);
                writer.write_mailbox("", &self.0, "")?;
                let encoded = writer.finish();
                Ok(HeaderValue::dangerous_new_pre_encoded(name, self.0.clone(), encoded))
            }
        }
    };
}

macro_rules! mailboxes_header {
    ($(#[$doc:meta])*($type_name: ident, $header_name: expr)) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $type_name(pub Mailboxes);

        impl Header for $type_name {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($header_name)
            }

            fn display(&self) -> Result<HeaderValue, Error> {
                let name = Self::name();
                let encoded = self.0.encode(&name)?;
                let raw = self.0.entries.join(self.0.separator.as_str());
                Ok(HeaderValue::dangerous_new_pre_encoded(name, raw, encoded))
            }
        }

        impl std::convert::From<Mailboxes> for $type_name {
            #[inline]
            fn from(mailboxes: Mailboxes) -> Self {
                Self(mailboxes)
            }
        }
    };
}

mailbox_header! {
    /**

    `Sender` header

    The mailbox of the agent responsible for the actual transmission,
    when it differs from the authors in `From`.

     */
    (Sender, "Sender")
}

mailboxes_header! {
    /**

    `From` header

    This header contains [`Mailboxes`][self::Mailboxes].

     */
    (From, "From")
}

mailboxes_header! {
    /**

    `Reply-To` header

    This header contains [`Mailboxes`][self::Mailboxes].

     */
    (ReplyTo, "Reply-To")
}

mailboxes_header! {
    /**

    `To` header

    This header contains [`Mailboxes`][self::Mailboxes].

     */
    (To, "To")
}

mailboxes_header! {
    /**

    `Cc` header

    This header contains [`Mailboxes`][self::Mailboxes].

     */
    (Cc, "Cc")
}
