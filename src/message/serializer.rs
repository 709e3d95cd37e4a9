use crate::{
    message::{
        header::{Header, Headers, MessageId, MIME_VERSION_1_0},
        message_id::{MessageIdGenerator, OsRandom, RandomSource},
        mimebody::{self, Part},
        Message,
    },
    Error,
};

/// Turns a [`Message`] into the bytes of an RFC 5322 document
///
/// The Message-ID is generated on the first successful run and stored on the
/// message, later runs reuse it.
#[derive(Debug)]
pub struct Serializer<R = OsRandom> {
    ids: MessageIdGenerator<R>,
    boundary_rng: fastrand::Rng,
}

impl Default for Serializer<OsRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<OsRandom> {
    pub fn new() -> Self {
        Self::with_generator(MessageIdGenerator::default())
    }
}

impl<R: RandomSource> Serializer<R> {
    /// Uses `ids` for Message-ID generation
    pub fn with_generator(ids: MessageIdGenerator<R>) -> Self {
        Self {
            ids,
            boundary_rng: fastrand::Rng::new(),
        }
    }

    /// Makes multipart boundaries reproducible
    pub fn boundary_seed(self, seed: u64) -> Self {
        Self {
            boundary_rng: fastrand::Rng::with_seed(seed),
            ..self
        }
    }

    pub fn serialize(&self, message: &mut Message) -> Result<Vec<u8>, Error> {
        let message_id = match &message.message_id {
            Some(id) => id.clone(),
            None => self.ids.generate()?,
        };

        let mut headers = Headers::with_capacity(
            message.leading.len() + message.trailing.len() + 4,
        );
        for value in message.leading.iter() {
            headers.append_raw(value.clone());
        }
        headers.append_raw(MessageId(message_id.clone()).display()?);
        for value in message.trailing.iter() {
            headers.append_raw(value.clone());
        }

        let body = self.body(message, &mut headers)?;

        let head = headers.to_string();
        let mut out = Vec::with_capacity(head.len() + 2 + body.len());
        out.extend_from_slice(head.as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&body);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message_id = %message_id,
            bytes = out.len(),
            multipart = message.is_multipart(),
            "message serialized"
        );

        message.message_id = Some(message_id);
        Ok(out)
    }

    /// Adds the MIME headers and returns the encoded body
    fn body(&self, message: &Message, headers: &mut Headers) -> Result<Vec<u8>, Error> {
        if !message.is_multipart() {
            let part = message
                .body
                .as_ref()
                .or_else(|| message.parts.first());
            let part = match part {
                Some(part) => part,
                None => return Ok(Vec::new()),
            };

            let encoded = part.encode()?;
            headers.set(&MIME_VERSION_1_0)?;
            for value in encoded.headers.iter() {
                headers.append_raw(value.clone());
            }
            return Ok(encoded.body);
        }

        let parts: Vec<Part> = message
            .body
            .iter()
            .chain(message.parts.iter())
            .cloned()
            .collect();
        let (content_type, body) = mimebody::assemble(
            message.multipart,
            &parts,
            &message.attachments,
            &self.boundary_rng,
        )?;
        headers.set(&MIME_VERSION_1_0)?;
        headers.set(&content_type)?;
        Ok(body)
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::atomic::{AtomicU64, Ordering},
        time::{Duration, SystemTime},
    };

    use super::Serializer;
    use crate::{
        message::{
            message_id::{MessageIdGenerator, RandomSource},
            Attachment, Message, MultiPartKind, Part,
        },
        Error,
    };

    struct Counter(AtomicU64);

    impl RandomSource for Counter {
        fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), Error> {
            let n = self.0.fetch_add(1, Ordering::SeqCst).to_be_bytes();
            dest.copy_from_slice(&n[..dest.len()]);
            Ok(())
        }
    }

    struct Broken;

    impl RandomSource for Broken {
        fn fill_bytes(&self, _dest: &mut [u8]) -> Result<(), Error> {
            Err(Error::RandomnessUnavailable("no entropy".into()))
        }
    }

    fn serializer() -> Serializer<Counter> {
        Serializer::with_generator(
            MessageIdGenerator::new(Counter(AtomicU64::new(1)))
                .with_domain("example.com")
                .unwrap(),
        )
        .boundary_seed(42)
    }

    fn date() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(784_887_151)
    }

    fn head_and_body(bytes: &[u8]) -> (String, String) {
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let idx = text.find("\r\n\r\n").unwrap();
        (text[..idx + 2].to_owned(), text[idx + 4..].to_owned())
    }

    #[test]
    fn header_order() {
        let mut message = Message::builder()
            .date(date())
            .from("a@x.com")
            .sender("Bot <bot@x.com>")
            .reply_to("r@x.com")
            .to("b@y.com")
            .cc("c@y.com")
            .bcc("hidden@z.com")
            .in_reply_to("<0.0.0@example.com>")
            .references("<0.0.0@example.com>")
            .subject("Order")
            .comments("none")
            .keyword("k")
            .importance(crate::message::header::Importance::Low)
            .priority(crate::message::header::Priority::Normal)
            .sensitivity(crate::message::header::Sensitivity::Private)
            .header("X-Mailer", "missive")
            .body(Part::text_plain("Hi".into()))
            .build()
            .unwrap();

        let bytes = serializer().serialize(&mut message).unwrap();
        let (head, body) = head_and_body(&bytes);
        let id = message.message_id().unwrap().to_owned();

        assert_eq!(
            head,
            format!(
                concat!(
                    "Date: Tue, 15 Nov 1994 08:12:31 GMT\r\n",
                    "From: a@x.com\r\n",
                    "Sender: Bot <bot@x.com>\r\n",
                    "Reply-To: r@x.com\r\n",
                    "To: b@y.com\r\n",
                    "Cc: c@y.com\r\n",
                    "Message-ID: {}\r\n",
                    "In-Reply-To: <0.0.0@example.com>\r\n",
                    "References: <0.0.0@example.com>\r\n",
                    "Subject: Order\r\n",
                    "Comments: none\r\n",
                    "Keywords: k\r\n",
                    "Importance: low\r\n",
                    "Priority: normal\r\n",
                    "Sensitivity: Private\r\n",
                    "X-Mailer: missive\r\n",
                    "MIME-Version: 1.0\r\n",
                    "Content-Type: text/plain; charset=utf-8\r\n",
                    "Content-Transfer-Encoding: 7bit\r\n",
                ),
                id
            )
        );
        assert!(id.ends_with(".1@example.com>"));
        assert!(!head.contains("hidden"));
        assert_eq!(body, "Hi");
    }

    #[test]
    fn id_is_stable() {
        let serializer = serializer();
        let mut message = Message::builder()
            .from("a@x.com")
            .to("b@y.com")
            .build()
            .unwrap();
        assert_eq!(message.message_id(), None);

        let first = serializer.serialize(&mut message).unwrap();
        let id = message.message_id().unwrap().to_owned();
        let second = serializer.serialize(&mut message).unwrap();

        assert_eq!(message.message_id(), Some(id.as_str()));
        assert_eq!(first, second);
    }

    #[test]
    fn randomness_failure_leaves_message_untouched() {
        let serializer = Serializer::with_generator(MessageIdGenerator::new(Broken));
        let mut message = Message::builder()
            .from("a@x.com")
            .to("b@y.com")
            .build()
            .unwrap();

        assert!(matches!(
            serializer.serialize(&mut message),
            Err(Error::RandomnessUnavailable(_))
        ));
        assert_eq!(message.message_id(), None);
    }

    #[test]
    fn no_body_means_no_mime_headers() {
        let mut message = Message::builder()
            .date(date())
            .from("a@x.com")
            .to("b@y.com")
            .subject("Héllo")
            .build()
            .unwrap();

        let bytes = serializer().serialize(&mut message).unwrap();
        let (head, body) = head_and_body(&bytes);
        assert!(head.contains("Subject: =?UTF-8?B?SMOpbGxv?=\r\n"));
        assert!(!head.contains("MIME-Version"));
        assert_eq!(body, "");
    }

    #[test]
    fn single_part_list_is_not_wrapped() {
        let mut message = Message::builder()
            .from("a@x.com")
            .to("b@y.com")
            .part(Part::text_html("<b>hi</b>".into()))
            .build()
            .unwrap();

        let bytes = serializer().serialize(&mut message).unwrap();
        let (head, body) = head_and_body(&bytes);
        assert!(head.contains("Content-Type: text/html; charset=utf-8\r\n"));
        assert!(!head.contains("multipart"));
        assert_eq!(body, "<b>hi</b>");
    }

    #[test]
    fn body_is_prepended_to_parts() {
        let mut message = Message::builder()
            .from("a@x.com")
            .to("b@y.com")
            .multipart(MultiPartKind::Alternative)
            .body(Part::text_plain("plain".into()))
            .part(Part::text_html("<p>html</p>".into()))
            .build()
            .unwrap();

        let bytes = serializer().serialize(&mut message).unwrap();
        let (head, body) = head_and_body(&bytes);
        assert!(head.contains("Content-Type: multipart/alternative;"));
        assert!(body.find("plain").unwrap() < body.find("<p>html</p>").unwrap());
    }

    #[test]
    fn seeded_boundaries_repeat() {
        let build = || {
            Message::builder()
                .date(date())
                .from("a@x.com")
                .to("b@y.com")
                .message_id("<fixed.1@example.com>")
                .body(Part::text_plain("see attached".into()))
                .attachment(Attachment::new("data.bin", vec![0u8, 1, 2]))
                .build()
                .unwrap()
        };

        let a = serializer().serialize(&mut build()).unwrap();
        let b = serializer().serialize(&mut build()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seven_bit_failure_is_reported() {
        let mut message = Message::builder()
            .from("a@x.com")
            .to("b@y.com")
            .body(
                Part::text_plain("naïve".into())
                    .encoding(crate::message::header::ContentTransferEncoding::SevenBit),
            )
            .build()
            .unwrap();

        assert!(matches!(
            serializer().serialize(&mut message),
            Err(Error::NonAsciiContent { offset: 2, .. })
        ));
        assert_eq!(message.message_id(), None);
    }
}
