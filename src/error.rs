//! Error type for message construction and serialization

/// Everything that can go wrong while building or serializing a [`Message`](crate::Message)
///
/// There is no partial success: when serialization returns one of these,
/// no bytes were produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The secure random source failed. There is no fallback to a weaker source.
    #[error("secure random source unavailable: {0}")]
    RandomnessUnavailable(String),
    /// A header name or value contained a CR or LF byte
    #[error("header injection attempt in `{0}` field")]
    HeaderInjection(String),
    /// A header name contained a byte outside printable ASCII, or a colon
    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),
    /// 7bit content contained a byte >= 0x80 or a forbidden control byte
    #[error("byte {byte:#04x} at offset {offset} is not allowed in 7bit content")]
    NonAsciiContent { offset: usize, byte: u8 },
    /// A Message-ID domain was not a dot-atom
    #[error("invalid Message-ID domain `{0}`")]
    InvalidDomain(String),
    /// A line would exceed the 998 byte limit of RFC 5322
    #[error("line of {0} bytes exceeds the 998 byte limit")]
    LineTooLong(usize),
    /// No boundary absent from every encoded part was found
    #[error("no collision-free multipart boundary found after {0} attempts")]
    BoundaryCollision(usize),
    /// Neither `From` nor `Sender` was set
    #[error("missing `From` or `Sender` mailbox")]
    MissingFrom,
    /// None of `To`, `Cc` or `Bcc` was set
    #[error("missing recipient")]
    MissingRecipient,
}
