//! Body content transfer encoding (RFC 2045 section 6)

use crate::{message::header::ContentTransferEncoding, Error};

/// Longest line allowed anywhere in a message, CRLF included
pub(crate) const MAX_LINE_LENGTH: usize = 998;

/// Line length for base64 output, CRLF excluded
const BASE64_LINE_LENGTH: usize = 78 - 2;

/// Encoder trait
pub trait EncoderCodec: Send {
    /// Encode chunk of data
    fn encode_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>, Error>;

    /// Encode end of stream
    ///
    /// Stateful encoders like *base64* flush what they held back here.
    fn finish_chunk(&mut self) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }

    /// Encode all data
    fn encode_all(&mut self, source: &[u8]) -> Result<Vec<u8>, Error> {
        let mut chunk = self.encode_chunk(source)?;
        let end = self.finish_chunk()?;
        chunk.extend_from_slice(&end);
        Ok(chunk)
    }
}

/// 7bit codec
///
/// Passes data through after checking it: only ASCII, no NUL, CR and LF
/// only as CRLF pairs, and lines short enough for RFC 5322.
struct SevenBitCodec {
    offset: usize,
    line_bytes: usize,
    pending_cr: bool,
}

impl SevenBitCodec {
    pub fn new() -> Self {
        SevenBitCodec {
            offset: 0,
            line_bytes: 0,
            pending_cr: false,
        }
    }

    fn reject(&self, offset: usize, byte: u8) -> Error {
        Error::NonAsciiContent { offset, byte }
    }
}

impl EncoderCodec for SevenBitCodec {
    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, Error> {
        for &byte in chunk {
            let offset = self.offset;
            self.offset += 1;

            if self.pending_cr {
                self.pending_cr = false;
                if byte == b'\n' {
                    self.line_bytes = 0;
                    continue;
                }
                return Err(self.reject(offset - 1, b'\r'));
            }

            match byte {
                b'\r' => self.pending_cr = true,
                b'\n' | 0 | 0x80..=0xff => return Err(self.reject(offset, byte)),
                _ => {
                    self.line_bytes += 1;
                    if self.line_bytes + 2 > MAX_LINE_LENGTH {
                        return Err(Error::LineTooLong(self.line_bytes + 2));
                    }
                }
            }
        }

        Ok(chunk.to_vec())
    }

    fn finish_chunk(&mut self) -> Result<Vec<u8>, Error> {
        if self.pending_cr {
            return Err(self.reject(self.offset - 1, b'\r'));
        }
        Ok(Vec::new())
    }
}

/// Quoted-Printable codec
///
/// CRLF pairs only survive as hard line breaks when they reach the encoder
/// together, so input is held until the end of stream.
struct QuotedPrintableCodec {
    pending: Vec<u8>,
}

impl QuotedPrintableCodec {
    pub fn new() -> Self {
        QuotedPrintableCodec {
            pending: Vec::new(),
        }
    }
}

impl EncoderCodec for QuotedPrintableCodec {
    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, Error> {
        self.pending.extend_from_slice(chunk);
        Ok(Vec::new())
    }

    fn finish_chunk(&mut self) -> Result<Vec<u8>, Error> {
        let pending = std::mem::take(&mut self.pending);
        Ok(quoted_printable::encode(pending))
    }
}

/// Base64 codec
struct Base64Codec {
    line_wrapper: LineWrapper,
    last_padding: Vec<u8>,
}

impl Base64Codec {
    pub fn new() -> Self {
        Base64Codec {
            line_wrapper: LineWrapper::new(BASE64_LINE_LENGTH),
            last_padding: Vec::with_capacity(3),
        }
    }
}

impl EncoderCodec for Base64Codec {
    fn encode_chunk(&mut self, mut chunk: &[u8]) -> Result<Vec<u8>, Error> {
        let mut out = String::with_capacity((self.last_padding.len() + chunk.len()) * 4 / 3 + 4);

        if !self.last_padding.is_empty() {
            let len = chunk.len().min(3 - self.last_padding.len());
            self.last_padding.extend_from_slice(&chunk[..len]);
            chunk = &chunk[len..];

            if self.last_padding.len() < 3 {
                return Ok(Vec::new());
            }
            base64::encode_config_buf(&self.last_padding, base64::STANDARD, &mut out);
            self.last_padding.clear();
        }

        let len = chunk.len() - (chunk.len() % 3);
        base64::encode_config_buf(&chunk[..len], base64::STANDARD, &mut out);
        self.last_padding.extend_from_slice(&chunk[len..]);

        Ok(self.line_wrapper.wrap(out.as_bytes()))
    }

    fn finish_chunk(&mut self) -> Result<Vec<u8>, Error> {
        if self.last_padding.is_empty() {
            return Ok(Vec::new());
        }
        let tail = base64::encode_config(&self.last_padding, base64::STANDARD);
        self.last_padding.clear();
        Ok(self.line_wrapper.wrap(tail.as_bytes()))
    }
}

/// Breaks a stream without line breaks of its own into CRLF terminated lines
///
/// A break is only written once more data follows, so output never ends
/// with a dangling CRLF.
struct LineWrapper {
    max_length: usize,
    line_bytes: usize,
}

impl LineWrapper {
    fn new(max_length: usize) -> Self {
        LineWrapper {
            max_length,
            line_bytes: 0,
        }
    }

    fn wrap(&mut self, mut chunk: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(chunk.len() + chunk.len() / self.max_length * 2 + 2);
        while !chunk.is_empty() {
            if self.line_bytes == self.max_length {
                out.extend_from_slice(b"\r\n");
                self.line_bytes = 0;
            }
            let split_pos = chunk.len().min(self.max_length - self.line_bytes);
            out.extend_from_slice(&chunk[..split_pos]);
            self.line_bytes += split_pos;
            chunk = &chunk[split_pos..];
        }
        out
    }
}

/// Returns a fresh codec for `encoding`
pub fn codec(encoding: ContentTransferEncoding) -> Box<dyn EncoderCodec> {
    use self::ContentTransferEncoding::*;
    match encoding {
        SevenBit => Box::new(SevenBitCodec::new()),
        QuotedPrintable => Box::new(QuotedPrintableCodec::new()),
        Base64 => Box::new(Base64Codec::new()),
    }
}

/// Encodes a whole body with `encoding`
pub fn encode(encoding: ContentTransferEncoding, body: &[u8]) -> Result<Vec<u8>, Error> {
    codec(encoding).encode_all(body)
}

#[cfg(test)]
mod test {
    use super::{
        encode, Base64Codec, EncoderCodec, LineWrapper, QuotedPrintableCodec, SevenBitCodec,
    };
    use crate::{message::header::ContentTransferEncoding, Error};
    use std::str::from_utf8;

    fn encoded(result: Result<Vec<u8>, Error>) -> String {
        from_utf8(&result.unwrap()).unwrap().to_owned()
    }

    #[test]
    fn seven_bit_encode() {
        let mut c = SevenBitCodec::new();

        assert_eq!(encoded(c.encode_all(b"Hello,\r\nworld!")), "Hello,\r\nworld!");

        let mut c = SevenBitCodec::new();
        match c.encode_all("Hello, мир!".as_bytes()) {
            Err(Error::NonAsciiContent { offset, byte }) => {
                assert_eq!(offset, 7);
                assert_eq!(byte, 0xd0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn seven_bit_rejects_bare_line_breaks() {
        assert!(matches!(
            SevenBitCodec::new().encode_all(b"one\ntwo"),
            Err(Error::NonAsciiContent { offset: 3, byte: b'\n' })
        ));
        assert!(matches!(
            SevenBitCodec::new().encode_all(b"one\rtwo"),
            Err(Error::NonAsciiContent { offset: 3, byte: b'\r' })
        ));
        assert!(matches!(
            SevenBitCodec::new().encode_all(b"trailing\r"),
            Err(Error::NonAsciiContent { offset: 8, byte: b'\r' })
        ));
        assert!(matches!(
            SevenBitCodec::new().encode_all(b"nul\0"),
            Err(Error::NonAsciiContent { offset: 3, byte: 0 })
        ));
    }

    #[test]
    fn seven_bit_crlf_split_across_chunks() {
        let mut c = SevenBitCodec::new();
        assert_eq!(c.encode_chunk(b"line\r").unwrap(), b"line\r");
        assert_eq!(c.encode_chunk(b"\nnext").unwrap(), b"\nnext");
        assert!(c.finish_chunk().unwrap().is_empty());
    }

    #[test]
    fn seven_bit_line_limit() {
        let line = vec![b'a'; 996];
        assert!(SevenBitCodec::new().encode_all(&line).is_ok());

        let line = vec![b'a'; 997];
        assert!(matches!(
            SevenBitCodec::new().encode_all(&line),
            Err(Error::LineTooLong(999))
        ));
    }

    #[test]
    fn quoted_printable_encode() {
        let mut c = QuotedPrintableCodec::new();

        assert_eq!(
            encoded(c.encode_all("Привет, мир!".as_bytes())),
            "=D0=9F=D1=80=D0=B8=D0=B2=D0=B5=D1=82, =D0=BC=D0=B8=D1=80!"
        );

        assert_eq!(
            encoded(c.encode_all("Текст письма в уникоде".as_bytes())),
            "=D0=A2=D0=B5=D0=BA=D1=81=D1=82 =D0=BF=D0=B8=D1=81=D1=8C=D0=BC=D0=B0 =D0=B2 =\r\n=D1=83=D0=BD=D0=B8=D0=BA=D0=BE=D0=B4=D0=B5"
        );
    }

    #[test]
    fn quoted_printable_keeps_crlf_and_escapes_equals() {
        let out = encoded(encode(
            ContentTransferEncoding::QuotedPrintable,
            b"a=b\r\nc\r\n",
        ));
        assert_eq!(out, "a=3Db\r\nc\r\n");
    }

    #[test]
    fn quoted_printable_chunks_hold_crlf_pairs() {
        let mut c = QuotedPrintableCodec::new();
        assert!(c.encode_chunk(b"one\r").unwrap().is_empty());
        assert!(c.encode_chunk(b"\ntwo").unwrap().is_empty());
        assert_eq!(c.finish_chunk().unwrap(), b"one\r\ntwo");
    }

    #[test]
    fn base64_encode() {
        let mut c = Base64Codec::new();

        assert_eq!(
            encoded(c.encode_all("Привет, мир!".as_bytes())),
            "0J/RgNC40LLQtdGCLCDQvNC40YAh"
        );

        let mut c = Base64Codec::new();

        assert_eq!(
            encoded(c.encode_all("Текст письма в уникоде подлиннее.".as_bytes())),
            concat!(
                "0KLQtdC60YHRgiDQv9C40YHRjNC80LAg0LIg0YPQvdC40LrQvtC00LUg0L/QvtC00LvQuNC90L3Q\r\n",
                "tdC1Lg=="
            )
        );
    }

    #[test]
    fn base64_encode_all() {
        let mut c = Base64Codec::new();

        assert_eq!(
            encoded(c.encode_all(
                "Ну прямо супер-длинный текст письма в уникоде, который уж точно ну никак не поместиться в 78 байт, как ни крути, я гарантирую это."
                    .as_bytes()
            )),
            concat!("0J3RgyDQv9GA0Y/QvNC+INGB0YPQv9C10YAt0LTQu9C40L3QvdGL0Lkg0YLQtdC60YHRgiDQv9C4\r\n",
                    "0YHRjNC80LAg0LIg0YPQvdC40LrQvtC00LUsINC60L7RgtC+0YDRi9C5INGD0LYg0YLQvtGH0L3Q\r\n",
                    "viDQvdGDINC90LjQutCw0Log0L3QtSDQv9C+0LzQtdGB0YLQuNGC0YzRgdGPINCyIDc4INCx0LDQ\r\n",
                    "udGCLCDQutCw0Log0L3QuCDQutGA0YPRgtC4LCDRjyDQs9Cw0YDQsNC90YLQuNGA0YPRjiDRjdGC\r\n",
                    "0L4u")
        );
    }

    #[test]
    fn base64_encode_chunked() {
        let mut c = Base64Codec::new();
        assert_eq!(encoded(c.encode_chunk(b"Chunk.")), "Q2h1bmsu");
        assert_eq!(encoded(c.finish_chunk()), "");

        let mut c = Base64Codec::new();
        assert_eq!(encoded(c.encode_chunk(b"Chunk")), "Q2h1");
        assert_eq!(encoded(c.finish_chunk()), "bms=");

        let mut c = Base64Codec::new();
        assert_eq!(encoded(c.encode_chunk(b"Ch")), "");
        assert_eq!(encoded(c.encode_chunk(b"un")), "Q2h1");
        assert_eq!(encoded(c.finish_chunk()), "bg==");
    }

    #[test]
    fn base64_exact_line_has_no_trailing_break() {
        // 57 input bytes encode to exactly one 76 character line
        let out = encoded(encode(ContentTransferEncoding::Base64, &[0u8; 57]));
        assert_eq!(out.len(), 76);
        assert!(!out.contains("\r\n"));

        let out = encoded(encode(ContentTransferEncoding::Base64, &[0u8; 58]));
        assert_eq!(out.split("\r\n").count(), 2);
    }

    #[test]
    fn line_wrapper_spans_chunks() {
        let mut w = LineWrapper::new(4);
        assert_eq!(w.wrap(b"abc"), b"abc");
        assert_eq!(w.wrap(b"def"), b"d\r\nef");
        assert_eq!(w.wrap(b"gh"), b"gh");
        assert_eq!(w.wrap(b"i"), b"\r\ni");
    }
}
