use std::{
    fmt::{Display, Formatter as FmtFormatter, Result as FmtResult, Write},
    str::FromStr,
};

use mime::Mime;

use super::{Header, HeaderName, HeaderValue};
use crate::{message::header::writer::HeaderWriter, Error};

/// `Content-Transfer-Encoding` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentTransferEncoding {
    SevenBit,
    QuotedPrintable,
    Base64,
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::SevenBit
    }
}

impl Display for ContentTransferEncoding {
    fn fmt(&self, f: &mut FmtFormatter) -> FmtResult {
        use self::ContentTransferEncoding::*;
        f.write_str(match *self {
            SevenBit => "7bit",
            QuotedPrintable => "quoted-printable",
            Base64 => "base64",
        })
    }
}

impl FromStr for ContentTransferEncoding {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use self::ContentTransferEncoding::*;
        match s {
            "7bit" => Ok(SevenBit),
            "quoted-printable" => Ok(QuotedPrintable),
            "base64" => Ok(Base64),
            _ => Err(s.into()),
        }
    }
}

impl Header for ContentTransferEncoding {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-Transfer-Encoding")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        let value = self.to_string();
        Ok(HeaderValue::dangerous_new_pre_encoded(
            Self::name(),
            value.clone(),
            value,
        ))
    }
}

/// RFC 2045 `tspecials`, plus space and controls
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| (0x21..=0x7e).contains(&b) && !b"()<>@,;:\\\"/[]?=".contains(&b))
}

fn quote_into(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

/// Renders `type/subtype; name=value; ...` as tokens which fold between
/// parameters only
fn param_tokens(essence: &str, params: &[(String, String)]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(params.len() + 1);
    tokens.push(essence.to_owned());

    for (name, value) in params {
        if let Some(last) = tokens.last_mut() {
            last.push(';');
        }
        let mut token = format!("{}=", name);
        if name != "boundary" && is_token(value) {
            token.push_str(value);
        } else {
            quote_into(value, &mut token);
        }
        tokens.push(token);
    }
    tokens
}

fn structured_value(name: HeaderName, tokens: &[String]) -> Result<HeaderValue, Error> {
    let mut writer = HeaderWriter::new(&name);
    writer.write_tokens(tokens)?;
    let encoded = writer.finish();
    Ok(HeaderValue::dangerous_new_pre_encoded(
        name,
        tokens.join(" "),
        encoded,
    ))
}

/// `Content-Type` header: a MIME type and its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    essence: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    /// `text/plain; charset=utf-8`
    pub fn text_plain_utf8() -> Self {
        Self::from(mime::TEXT_PLAIN_UTF_8)
    }

    /// `text/html; charset=utf-8`
    pub fn text_html_utf8() -> Self {
        Self::from(mime::TEXT_HTML_UTF_8)
    }

    /// `multipart/<subtype>; boundary="<boundary>"`
    pub(crate) fn multipart(subtype: &str, boundary: &str) -> Self {
        Self {
            essence: format!("multipart/{}", subtype),
            params: vec![("boundary".to_owned(), boundary.to_owned())],
        }
    }

    /// Sets a parameter, replacing any previous value
    pub fn with_param<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(param) => param.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    pub fn with_charset<S: Into<String>>(self, charset: S) -> Self {
        self.with_param("charset", charset)
    }

    /// `type/subtype`, without parameters
    pub fn essence(&self) -> &str {
        &self.essence
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_multipart(&self) -> bool {
        self.essence.starts_with("multipart/")
    }
}

impl From<Mime> for ContentType {
    fn from(mime: Mime) -> Self {
        Self {
            essence: mime.essence_str().to_owned(),
            params: mime
                .params()
                .map(|(name, value)| (name.as_str().to_owned(), value.as_str().to_owned()))
                .collect(),
        }
    }
}

impl FromStr for ContentType {
    type Err = mime::FromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Mime>().map(Self::from)
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut FmtFormatter) -> FmtResult {
        f.write_str(&param_tokens(&self.essence, &self.params).join(" "))
    }
}

impl Header for ContentType {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-Type")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        structured_value(Self::name(), &param_tokens(&self.essence, &self.params))
    }
}

/// RFC 2231 `attribute-char`
fn is_attr_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b)
}

/// Percent encoded pieces of `value`, none longer than `max`, never
/// splitting an escape
fn rfc2231_pieces(value: &str, max: usize) -> Vec<String> {
    let mut pieces = vec![String::new()];
    for b in value.bytes() {
        let mut escaped = String::with_capacity(3);
        if is_attr_char(b) {
            escaped.push(b as char);
        } else {
            let _ = write!(escaped, "%{:02X}", b);
        }

        let fits = pieces.last().map_or(false, |p| p.len() + escaped.len() <= max);
        if !fits {
            pieces.push(String::new());
        }
        if let Some(piece) = pieces.last_mut() {
            piece.push_str(&escaped);
        }
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

// Keeps `filename*N*=utf-8''<piece>;` within a folded line
const RFC2231_PIECE: usize = 48;

/// Whether a part is shown inline or offered as a download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Display for Disposition {
    fn fmt(&self, f: &mut FmtFormatter) -> FmtResult {
        f.write_str(match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        })
    }
}

/// `Content-Disposition` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    pub disposition: Disposition,
    pub filename: Option<String>,
}

impl ContentDisposition {
    pub fn inline() -> Self {
        Self {
            disposition: Disposition::Inline,
            filename: None,
        }
    }

    pub fn inline_with_name<S: Into<String>>(filename: S) -> Self {
        Self {
            disposition: Disposition::Inline,
            filename: Some(filename.into()),
        }
    }

    pub fn attachment<S: Into<String>>(filename: S) -> Self {
        Self {
            disposition: Disposition::Attachment,
            filename: Some(filename.into()),
        }
    }

    fn tokens(&self) -> Vec<String> {
        let mut tokens = vec![self.disposition.to_string()];
        let filename = match &self.filename {
            Some(filename) => filename,
            None => return tokens,
        };

        if let Some(last) = tokens.last_mut() {
            last.push(';');
        }

        if filename.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
            let mut token = String::from("filename=");
            quote_into(filename, &mut token);
            tokens.push(token);
            return tokens;
        }

        let pieces = rfc2231_pieces(filename, RFC2231_PIECE);
        if pieces.len() == 1 {
            tokens.push(format!("filename*=utf-8''{}", pieces[0]));
            return tokens;
        }
        let last = pieces.len() - 1;
        for (i, piece) in pieces.iter().enumerate() {
            let charset = if i == 0 { "utf-8''" } else { "" };
            let separator = if i == last { "" } else { ";" };
            tokens.push(format!("filename*{}*={}{}{}", i, charset, piece, separator));
        }
        tokens
    }
}

impl Header for ContentDisposition {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-Disposition")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        if let Some(filename) = &self.filename {
            super::reject_line_breaks(&Self::name(), filename)?;
        }
        structured_value(Self::name(), &self.tokens())
    }
}

/// `Content-ID` header, referenced from HTML as `cid:`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentId(pub String);

impl Header for ContentId {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-ID")
    }

    fn display(&self) -> Result<HeaderValue, Error> {
        let id = self.0.trim();
        let id = if id.starts_with('<') && id.ends_with('>') {
            id.to_owned()
        } else {
            format!("<{}>", id)
        };
        structured_value(Self::name(), &[id])
    }
}
