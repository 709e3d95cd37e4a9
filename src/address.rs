//! SMTP envelope

/// Bare `addr-spec` of a mailbox: the part between angle brackets when
/// there is a display name, the whole trimmed value otherwise
pub(crate) fn addr_spec(mailbox: &str) -> &str {
    let mailbox = mailbox.trim();
    match (mailbox.rfind('<'), mailbox.ends_with('>')) {
        (Some(start), true) => mailbox[start + 1..mailbox.len() - 1].trim(),
        _ => mailbox,
    }
}

/// Simple email envelope representation
///
/// We only accept mailboxes, and do not support source routes (as mentioned in RFC5321)
#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Envelope {
    /// The envelope recipient's addresses
    ///
    /// This can not be empty.
    forward_path: Vec<String>,
    /// The envelope sender address
    reverse_path: Option<String>,
}

impl Envelope {
    /// Creates a new envelope, which may fail if `to` is empty.
    ///
    /// Both sides take mailboxes and keep only their bare addresses. Repeated
    /// recipients are dropped, first occurrence wins.
    pub fn new<I, S>(from: Option<&str>, to: I) -> Result<Envelope, crate::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut forward_path: Vec<String> = Vec::new();
        for mailbox in to {
            let addr = addr_spec(mailbox.as_ref());
            if !forward_path.iter().any(|a| a == addr) {
                forward_path.push(addr.to_owned());
            }
        }
        if forward_path.is_empty() {
            return Err(crate::Error::MissingRecipient);
        }

        Ok(Envelope {
            forward_path,
            reverse_path: from.map(|f| addr_spec(f).to_owned()),
        })
    }

    /// Destination addresses of the envelope
    pub fn to(&self) -> &[String] {
        self.forward_path.as_slice()
    }

    /// Source address of the envelope
    pub fn from(&self) -> Option<&str> {
        self.reverse_path.as_deref()
    }
}
