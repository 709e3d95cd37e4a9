use super::{Header, HeaderName, HeaderValue};
use crate::{message::header::writer::HeaderWriter, Error};

macro_rules! text_header {
    ($(#[$doc:meta])*($type_name: ident, $header_name: expr)) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $type_name(pub String);

        impl Header for $type_name {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($header_name)
            }

            fn display(&self) -> Result<HeaderValue, Error> {
                HeaderValue::new(Self::name(), self.0.clone())
            }
        }

        impl From<String> for $type_name {
            #[inline]
            fn from(text: String) -> Self {
                Self(text)
            }
        }
    };
}

macro_rules! ids_header {
    ($(#[$doc:meta])*($type_name: ident, $header_name: expr)) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $type_name(pub Vec<String>);

        impl Header for $type_name {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($header_name)
            }

            fn display(&self) -> Result<HeaderValue, Error> {
                let name = Self::name();
                let mut writer = HeaderWriter::new(&name);
                writer.write_tokens(&self.0)?;
                let encoded = writer.finish();
                Ok(HeaderValue::dangerous_new_pre_encoded(
                    name,
                    self.0.join(" "),
                    encoded,
                ))
            }
        }
    };
}

text_header! {
    /// `Subject` header, free text
    (Subject, "Subject")
}

text_header! {
    /// `Comments` header, free text
    (Comments, "Comments")
}

ids_header! {
    /// `In-Reply-To` header: ids of the messages this one answers
    (InReplyTo, "In-Reply-To")
}

ids_header! {
    /// `References` header: ids of the preceding reply chain
    (References, "References")
}

/// `Keywords` header, phrases joined by commas
#[derive(Debug, Clone, PartialEq)]
pub struct Keywords(pub Vec<String>);

impl Header for Keywords {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Keywords")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        HeaderValue::new(Self::name(), self.0.join(", "))
    }
}

/// `Message-ID` header
///
/// Ids are generated by [`MessageIdGenerator`](crate::message::message_id::MessageIdGenerator)
/// in `<left@right>` form and never encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageId(pub String);

impl Header for MessageId {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Message-ID")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        let name = Self::name();
        let mut writer = HeaderWriter::new(&name);
        writer.write_tokens(&[&self.0])?;
        let encoded = writer.finish();
        Ok(HeaderValue::dangerous_new_pre_encoded(
            name,
            self.0.clone(),
            encoded,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::{InReplyTo, Keywords, MessageId, References, Subject};
    use crate::{message::header::Headers, Error};

    #[test]
    fn format_ascii() {
        let mut headers = Headers::new();
        headers.set(&Subject("Sample subject".into())).unwrap();

        assert_eq!(format!("{}", headers), "Subject: Sample subject\r\n");
    }

    #[test]
    fn format_utf8() {
        let mut headers = Headers::new();
        headers.set(&Subject("Тема сообщения".into())).unwrap();

        assert_eq!(
            format!("{}", headers),
            "Subject: =?UTF-8?B?0KLQtdC80LAg0YHQvtC+0LHRidC10L3QuNGP?=\r\n"
        );
    }

    #[test]
    fn format_keywords() {
        let mut headers = Headers::new();
        headers
            .set(&Keywords(vec!["invoice".into(), "Q3 report".into()]))
            .unwrap();

        assert_eq!(format!("{}", headers), "Keywords: invoice, Q3 report\r\n");
    }

    #[test]
    fn format_ids() {
        let mut headers = Headers::new();
        headers
            .set(&MessageId("<1.2.3@example.com>".into()))
            .unwrap();
        headers
            .set(&InReplyTo(vec!["<0.1.2@example.com>".into()]))
            .unwrap();
        headers
            .set(&References(vec![
                "<0.0.1@example.com>".into(),
                "<0.1.2@example.com>".into(),
            ]))
            .unwrap();

        assert_eq!(
            format!("{}", headers),
            concat!(
                "Message-ID: <1.2.3@example.com>\r\n",
                "In-Reply-To: <0.1.2@example.com>\r\n",
                "References: <0.0.1@example.com> <0.1.2@example.com>\r\n",
            )
        );
    }

    #[test]
    fn ids_reject_injection() {
        let mut headers = Headers::new();
        assert!(matches!(
            headers.set(&References(vec!["<a@b>\r\nX-Evil: 1".into()])),
            Err(Error::HeaderInjection(_))
        ));
        assert!(headers.is_empty());
    }
}
