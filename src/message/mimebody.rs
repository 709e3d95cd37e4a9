//! Body parts, attachments and multipart assembly

use std::iter::repeat_with;

use crate::{
    message::{
        encoder,
        header::{
            ContentDisposition, ContentId, ContentTransferEncoding, ContentType, Disposition,
            Headers,
        },
    },
    Error,
};

/// Longest line a text body may have to be sent as 7bit by default
const SEVEN_BIT_LINE: usize = 76;

/// Whether `body` can go out unchanged: ASCII without NUL, CRLF line
/// breaks only and short lines
fn fits_seven_bit(body: &[u8]) -> bool {
    let mut line = 0;
    let mut prev = 0u8;
    for (i, &b) in body.iter().enumerate() {
        match b {
            0 | 0x80..=0xff => return false,
            b'\r' if body.get(i + 1) != Some(&b'\n') => return false,
            b'\n' if prev != b'\r' => return false,
            b'\r' => {}
            b'\n' => line = 0,
            _ => {
                line += 1;
                if line > SEVEN_BIT_LINE {
                    return false;
                }
            }
        }
        prev = b;
    }
    true
}

fn default_encoding(content_type: &ContentType, body: &[u8]) -> ContentTransferEncoding {
    if fits_seven_bit(body) {
        ContentTransferEncoding::SevenBit
    } else if content_type.essence().starts_with("text/") {
        ContentTransferEncoding::QuotedPrintable
    } else {
        ContentTransferEncoding::Base64
    }
}

/// Headers and encoded body of one MIME entity
#[derive(Debug, Clone)]
pub(crate) struct EncodedPart {
    pub(crate) headers: Headers,
    pub(crate) body: Vec<u8>,
}

impl EncodedPart {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.headers.to_string().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
    }
}

/// One unit of body content
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    content_type: ContentType,
    encoding: ContentTransferEncoding,
    body: Vec<u8>,
}

impl Part {
    /// Creates a part, picking 7bit when the content allows it and
    /// quoted-printable or base64 otherwise
    pub fn new<B: Into<Vec<u8>>>(content_type: ContentType, body: B) -> Self {
        let body = body.into();
        Self {
            encoding: default_encoding(&content_type, &body),
            content_type,
            body,
        }
    }

    /// `text/plain; charset=utf-8`
    pub fn text_plain(text: String) -> Self {
        Self::new(ContentType::text_plain_utf8(), text)
    }

    /// `text/html; charset=utf-8`
    pub fn text_html(text: String) -> Self {
        Self::new(ContentType::text_html_utf8(), text)
    }

    pub fn charset<S: Into<String>>(mut self, charset: S) -> Self {
        self.content_type = self.content_type.with_charset(charset);
        self
    }

    /// Overrides the transfer encoding
    pub fn encoding(mut self, encoding: ContentTransferEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn transfer_encoding(&self) -> ContentTransferEncoding {
        self.encoding
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn encode(&self) -> Result<EncodedPart, Error> {
        let mut headers = Headers::with_capacity(2);
        headers.set(&self.content_type)?;
        headers.set(&self.encoding)?;
        Ok(EncodedPart {
            headers,
            body: encoder::encode(self.encoding, &self.body)?,
        })
    }
}

/// A file carried by the message
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    filename: String,
    content_type: ContentType,
    disposition: Disposition,
    content_id: Option<String>,
    encoding: ContentTransferEncoding,
    body: Vec<u8>,
}

impl Attachment {
    /// An `application/octet-stream` attachment, base64 encoded
    pub fn new<S: Into<String>, B: Into<Vec<u8>>>(filename: S, body: B) -> Self {
        Self {
            filename: filename.into(),
            content_type: ContentType::from(mime::APPLICATION_OCTET_STREAM),
            disposition: Disposition::Attachment,
            content_id: None,
            encoding: ContentTransferEncoding::Base64,
            body: body.into(),
        }
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Marks the attachment for display inside the message body
    pub fn inline(mut self) -> Self {
        self.disposition = Disposition::Inline;
        self
    }

    /// Id for `cid:` references from HTML parts
    pub fn content_id<S: Into<String>>(mut self, id: S) -> Self {
        self.content_id = Some(id.into());
        self
    }

    pub fn encoding(mut self, encoding: ContentTransferEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn encode(&self) -> Result<EncodedPart, Error> {
        let mut headers = Headers::with_capacity(4);
        headers.set(&self.content_type)?;
        headers.set(&self.encoding)?;
        headers.set(&ContentDisposition {
            disposition: self.disposition,
            filename: Some(self.filename.clone()),
        })?;
        if let Some(id) = &self.content_id {
            headers.set(&ContentId(id.clone()))?;
        }
        Ok(EncodedPart {
            headers,
            body: encoder::encode(self.encoding, &self.body)?,
        })
    }
}

/// `multipart/*` subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MultiPartKind {
    /// Independent parts, in order
    Mixed,
    /// The same content in different formats, plainest first
    Alternative,
    /// A root part plus the resources it references
    Related,
}

impl MultiPartKind {
    pub fn subtype(self) -> &'static str {
        match self {
            MultiPartKind::Mixed => "mixed",
            MultiPartKind::Alternative => "alternative",
            MultiPartKind::Related => "related",
        }
    }
}

impl Default for MultiPartKind {
    fn default() -> Self {
        MultiPartKind::Mixed
    }
}

/// Boundary lengths tried in order, one per attempt
/// The longest keeps `boundary="..."` within a 78 character line
const BOUNDARY_LENGTHS: [usize; 4] = [40, 50, 60, 66];

/// A multipart delimiter token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// Random alphanumeric token of `len` characters
    pub fn generate(rng: &fastrand::Rng, len: usize) -> Self {
        Boundary(repeat_with(|| rng.alphanumeric()).take(len).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn occurs_in(&self, haystack: &[u8]) -> bool {
        let needle = self.0.as_bytes();
        haystack.len() >= needle.len() && haystack.windows(needle.len()).any(|w| w == needle)
    }

    /// Picks a boundary absent from every segment, growing it on each collision
    fn choose(rng: &fastrand::Rng, segments: &[Vec<u8>]) -> Result<Self, Error> {
        for &len in BOUNDARY_LENGTHS.iter() {
            let boundary = Self::generate(rng, len);
            if !segments.iter().any(|s| boundary.occurs_in(s)) {
                return Ok(boundary);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(length = len, "multipart boundary collided with content");
        }
        Err(Error::BoundaryCollision(BOUNDARY_LENGTHS.len()))
    }
}

/// Assembles parts then attachments into one multipart body
///
/// The top level type is `multipart/mixed` whenever there are attachments,
/// `kind` otherwise. Returns the `Content-Type` to declare and the body.
pub fn assemble(
    kind: MultiPartKind,
    parts: &[Part],
    attachments: &[Attachment],
    rng: &fastrand::Rng,
) -> Result<(ContentType, Vec<u8>), Error> {
    let kind = if attachments.is_empty() {
        kind
    } else {
        MultiPartKind::Mixed
    };

    let mut segments = Vec::with_capacity(parts.len() + attachments.len());
    for part in parts {
        let mut segment = Vec::new();
        part.encode()?.write_to(&mut segment);
        segments.push(segment);
    }
    for attachment in attachments {
        let mut segment = Vec::new();
        attachment.encode()?.write_to(&mut segment);
        segments.push(segment);
    }

    let boundary = Boundary::choose(rng, &segments)?;
    let delimiter = format!("--{}", boundary.as_str());

    let mut body = Vec::with_capacity(
        segments.iter().map(|s| s.len() + delimiter.len() + 4).sum::<usize>()
            + delimiter.len()
            + 4,
    );
    for segment in &segments {
        body.extend_from_slice(delimiter.as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(segment);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(delimiter.as_bytes());
    body.extend_from_slice(b"--\r\n");

    Ok((ContentType::multipart(kind.subtype(), boundary.as_str()), body))
}

#[cfg(test)]
mod test {
    use fastrand::Rng;

    use super::{assemble, Attachment, Boundary, MultiPartKind, Part};
    use crate::{
        message::header::{ContentTransferEncoding, ContentType},
        Error,
    };

    fn boundary_of(ct: &ContentType) -> String {
        ct.param("boundary").unwrap().to_owned()
    }

    #[test]
    fn text_parts_pick_encoding() {
        let plain = Part::text_plain("Hello\r\nworld".into());
        assert_eq!(plain.transfer_encoding(), ContentTransferEncoding::SevenBit);

        let bare_lf = Part::text_plain("Hello\nworld".into());
        assert_eq!(
            bare_lf.transfer_encoding(),
            ContentTransferEncoding::QuotedPrintable
        );

        let utf8 = Part::text_html("<p>Привет</p>".into());
        assert_eq!(
            utf8.transfer_encoding(),
            ContentTransferEncoding::QuotedPrintable
        );

        let long = Part::text_plain("a".repeat(77));
        assert_eq!(
            long.transfer_encoding(),
            ContentTransferEncoding::QuotedPrintable
        );

        let binary = Part::new(ContentType::from(mime::IMAGE_PNG), vec![0x89, b'P', b'N', b'G']);
        assert_eq!(binary.transfer_encoding(), ContentTransferEncoding::Base64);
    }

    #[test]
    fn part_headers() {
        let part = Part::new(ContentType::from(mime::TEXT_PLAIN), "Hi").charset("us-ascii");
        let encoded = part.encode().unwrap();
        assert_eq!(
            encoded.headers.to_string(),
            concat!(
                "Content-Type: text/plain; charset=us-ascii\r\n",
                "Content-Transfer-Encoding: 7bit\r\n",
            )
        );
        assert_eq!(encoded.body, b"Hi");
    }

    #[test]
    fn forced_seven_bit_rejects_utf8() {
        let part = Part::text_plain("Grüße".into()).encoding(ContentTransferEncoding::SevenBit);
        assert!(matches!(
            part.encode(),
            Err(Error::NonAsciiContent { offset: 2, byte: 0xc3 })
        ));
    }

    #[test]
    fn attachment_headers() {
        let attachment = Attachment::new("logo.png", vec![1, 2, 3])
            .content_type(ContentType::from(mime::IMAGE_PNG))
            .inline()
            .content_id("logo");
        let encoded = attachment.encode().unwrap();
        assert_eq!(
            encoded.headers.to_string(),
            concat!(
                "Content-Type: image/png\r\n",
                "Content-Transfer-Encoding: base64\r\n",
                "Content-Disposition: inline; filename=\"logo.png\"\r\n",
                "Content-ID: <logo>\r\n",
            )
        );
        assert_eq!(encoded.body, b"AQID");
    }

    #[test]
    fn assemble_alternative() {
        let rng = Rng::with_seed(1);
        let parts = [
            Part::text_plain("Hello".into()),
            Part::text_html("<p>Hello</p>".into()),
        ];
        let (ct, body) = assemble(MultiPartKind::Alternative, &parts, &[], &rng).unwrap();

        assert_eq!(ct.essence(), "multipart/alternative");
        let boundary = boundary_of(&ct);
        assert_eq!(boundary.len(), 40);
        assert!(boundary.bytes().all(|b| b.is_ascii_alphanumeric()));

        let expected = format!(
            concat!(
                "--{b}\r\n",
                "Content-Type: text/plain; charset=utf-8\r\n",
                "Content-Transfer-Encoding: 7bit\r\n",
                "\r\n",
                "Hello\r\n",
                "--{b}\r\n",
                "Content-Type: text/html; charset=utf-8\r\n",
                "Content-Transfer-Encoding: 7bit\r\n",
                "\r\n",
                "<p>Hello</p>\r\n",
                "--{b}--\r\n",
            ),
            b = boundary
        );
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn attachments_force_mixed() {
        let rng = Rng::with_seed(2);
        let parts = [Part::text_plain("Hello".into())];
        let attachments = [Attachment::new("a.bin", vec![0xff; 10])];
        let (ct, body) =
            assemble(MultiPartKind::Alternative, &parts, &attachments, &rng).unwrap();

        assert_eq!(ct.essence(), "multipart/mixed");
        let delimiter = format!("--{}", boundary_of(&ct));
        let body = String::from_utf8(body).unwrap();
        assert_eq!(body.matches(&delimiter).count(), 3);
        assert!(body.ends_with(&format!("{}--\r\n", delimiter)));
    }

    #[test]
    fn boundary_regenerated_on_collision() {
        let probe = Rng::with_seed(7);
        let first = Boundary::generate(&probe, 40);

        let parts = [Part::text_plain(format!("--{}\r\n", first.as_str()))];
        let rng = Rng::with_seed(7);
        let (ct, body) = assemble(MultiPartKind::Mixed, &parts, &[], &rng).unwrap();

        let boundary = boundary_of(&ct);
        assert_ne!(boundary, first.as_str());
        assert_eq!(boundary.len(), 50);
        assert_eq!(String::from_utf8(body).unwrap().matches(&boundary).count(), 2);
    }

    #[test]
    fn boundary_collision_exhausted() {
        let probe = Rng::with_seed(9);
        let adversarial: Vec<String> = [40, 50, 60, 66]
            .iter()
            .map(|&len| Boundary::generate(&probe, len).as_str().to_owned())
            .collect();

        let parts = [Part::text_plain(adversarial.join("\r\n"))];
        let rng = Rng::with_seed(9);
        assert!(matches!(
            assemble(MultiPartKind::Mixed, &parts, &[], &rng),
            Err(Error::BoundaryCollision(4))
        ));
    }
}
