/*!

## Headers widely used in email messages

Every header is a typed value implementing [`Header`]. Turning one into a
[`HeaderValue`] validates it and encodes it: RFC 2047 encoded words for text
outside printable ASCII, folding to keep lines within 78 characters.

*/

use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    ops::Deref,
};

use crate::Error;

pub use self::{content::*, mailbox::*, special::*, textual::*};

mod content;
mod mailbox;
mod special;
mod textual;
pub(crate) mod writer;

use self::writer::HeaderWriter;

/// A typed header
pub trait Header: Clone {
    /// Field name, as written before the colon
    fn name() -> HeaderName;

    /// Validates and encodes the header
    fn display(&self) -> Result<HeaderValue, Error>;
}

/// Rejects CR and LF anywhere in caller supplied header content
pub(crate) fn reject_line_breaks(name: &str, value: &str) -> Result<(), Error> {
    if value.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(Error::HeaderInjection(name.to_owned()));
    }
    Ok(())
}

/// A validated header field name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderName(Cow<'static, str>);

impl HeaderName {
    /// Validates a caller supplied name: printable ASCII without `:`
    pub fn new_from_ascii(name: String) -> Result<Self, Error> {
        reject_line_breaks(&name, &name)?;
        if name.is_empty() || !name.bytes().all(|b| (33..=126).contains(&b) && b != b':') {
            return Err(Error::InvalidHeaderName(name));
        }
        Ok(HeaderName(Cow::Owned(name)))
    }

    /// Builds a name known to be valid at compile time
    pub(crate) const fn new_from_ascii_str(name: &'static str) -> Self {
        HeaderName(Cow::Borrowed(name))
    }
}

impl Deref for HeaderName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HeaderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A header ready to be written: its name, the caller's value and the
/// encoded, folded form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderValue {
    name: HeaderName,
    raw_value: String,
    encoded_value: String,
}

impl HeaderValue {
    /// Encodes `raw_value` as unstructured text
    pub fn new(name: HeaderName, raw_value: String) -> Result<Self, Error> {
        let mut writer = HeaderWriter::new(&name);
        writer.write_text(&raw_value)?;
        let encoded_value = writer.finish();

        Ok(Self {
            name,
            raw_value,
            encoded_value,
        })
    }

    /// Wraps a value some other writer already encoded
    pub(crate) fn dangerous_new_pre_encoded(
        name: HeaderName,
        raw_value: String,
        encoded_value: String,
    ) -> Self {
        Self {
            name,
            raw_value,
            encoded_value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn encoded_value(&self) -> &str {
        &self.encoded_value
    }
}

/// Insertion ordered header collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: Vec<HeaderValue>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            headers: Vec::with_capacity(capacity),
        }
    }

    /// Encodes `header` and inserts it, replacing any header of the same name
    pub fn set<H: Header>(&mut self, header: &H) -> Result<(), Error> {
        let value = header.display()?;
        self.insert_raw(value);
        Ok(())
    }

    /// Inserts an encoded value, replacing any header of the same name in place
    pub fn insert_raw(&mut self, value: HeaderValue) {
        match self.find_mut(value.name()) {
            Some(existing) => *existing = value,
            None => self.headers.push(value),
        }
    }

    /// Appends an encoded value, keeping earlier headers of the same name
    pub fn append_raw(&mut self, value: HeaderValue) {
        self.headers.push(value);
    }

    /// Caller supplied value of the first header named `name`
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.find(name).map(HeaderValue::raw_value)
    }

    /// Encoded value of the first header named `name`
    pub fn get_encoded(&self, name: &str) -> Option<&str> {
        self.find(name).map(HeaderValue::encoded_value)
    }

    pub fn remove_raw(&mut self, name: &str) -> Option<HeaderValue> {
        let idx = self
            .headers
            .iter()
            .position(|h| h.name().eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeaderValue> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn find(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|h| h.name().eq_ignore_ascii_case(name))
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut HeaderValue> {
        self.headers
            .iter_mut()
            .find(|h| h.name().eq_ignore_ascii_case(name))
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for header in &self.headers {
            f.write_str(header.name())?;
            f.write_str(": ")?;
            f.write_str(header.encoded_value())?;
            f.write_str("\r\n")?;
        }
        Ok(())
    }
}
