//! Folding and RFC 2047 encoding of header field values
//!
//! The writer produces what goes after `Name: ` and before the final CRLF.
//! Lines are kept within 78 characters including CRLF by folding at
//! whitespace. Words that cannot travel as printable ASCII are carried in
//! `=?UTF-8?B?...?=` or `=?UTF-8?Q?...?=` encoded words, whichever is shorter.

use super::reject_line_breaks;
use crate::{message::encoder::MAX_LINE_LENGTH, Error};

/// Folding target, CRLF excluded
const SOFT_LINE_LENGTH: usize = 78 - 2;

/// RFC 2047 section 2 limit for one encoded word
const MAX_ENCODED_WORD: usize = 75;

/// `=?UTF-8?X?` plus `?=`
const WORD_OVERHEAD: usize = 12;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordEncoding {
    Base64,
    Q,
}

impl WordEncoding {
    /// Picks the encoding with the shorter output, base64 on a tie
    fn choose(text: &str) -> Self {
        let q: usize = text.bytes().map(q_cost).sum();
        if q < base64_len(text.len()) {
            WordEncoding::Q
        } else {
            WordEncoding::Base64
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            WordEncoding::Base64 => "=?UTF-8?B?",
            WordEncoding::Q => "=?UTF-8?Q?",
        }
    }

    /// Byte length of the longest prefix of `text` whose payload fits in
    /// `budget`, never splitting a character and never less than one character
    fn fit(self, text: &str, budget: usize) -> usize {
        let mut end = 0;
        let mut q = 0;
        for (idx, ch) in text.char_indices() {
            let next = idx + ch.len_utf8();
            let cost = match self {
                WordEncoding::Base64 => base64_len(next),
                WordEncoding::Q => q + text.as_bytes()[idx..next].iter().map(|&b| q_cost(b)).sum::<usize>(),
            };
            if end > 0 && cost > budget {
                break;
            }
            end = next;
            q = cost;
        }
        end
    }

    fn payload_len(self, text: &str) -> usize {
        match self {
            WordEncoding::Base64 => base64_len(text.len()),
            WordEncoding::Q => text.bytes().map(q_cost).sum(),
        }
    }

    fn encode_into(self, text: &str, out: &mut String) {
        out.push_str(self.prefix());
        match self {
            WordEncoding::Base64 => base64::encode_config_buf(text, base64::STANDARD, out),
            WordEncoding::Q => {
                for b in text.bytes() {
                    if is_q_literal(b) {
                        out.push(b as char);
                    } else if b == b' ' {
                        out.push('_');
                    } else {
                        out.push('=');
                        out.push(HEX[usize::from(b >> 4)] as char);
                        out.push(HEX[usize::from(b & 0x0f)] as char);
                    }
                }
            }
        }
        out.push_str("?=");
    }
}

/// Characters RFC 2047 section 5 (3) allows literally in a Q word inside a phrase
fn is_q_literal(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'!' | b'*' | b'+' | b'-' | b'/')
}

fn q_cost(b: u8) -> usize {
    if is_q_literal(b) || b == b' ' {
        1
    } else {
        3
    }
}

fn base64_len(bytes: usize) -> usize {
    (bytes + 2) / 3 * 4
}

fn is_wsp(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// A word and the whitespace run before it, as byte offsets into the source
#[derive(Debug, Clone, Copy)]
struct Word {
    ws_start: usize,
    start: usize,
    end: usize,
}

/// Splits `text` into words, returning them and the offset of trailing whitespace
fn split_words(text: &str) -> (Vec<Word>, usize) {
    let bytes = text.as_bytes();
    let mut words = Vec::new();
    let mut pos = 0;
    loop {
        let ws_start = pos;
        while pos < bytes.len() && is_wsp(bytes[pos]) {
            pos += 1;
        }
        let start = pos;
        while pos < bytes.len() && !is_wsp(bytes[pos]) {
            pos += 1;
        }
        if start == pos {
            return (words, ws_start);
        }
        words.push(Word {
            ws_start,
            start,
            end: pos,
        });
    }
}

fn is_printable_ascii(word: &str) -> bool {
    word.bytes().all(|b| (0x21..=0x7e).contains(&b))
}

/// Builds a folded, encoded header value
#[derive(Debug)]
pub(crate) struct HeaderWriter<'a> {
    name: &'a str,
    buf: String,
    line_len: usize,
    line_has_content: bool,
}

impl<'a> HeaderWriter<'a> {
    /// Starts a value for `name`, accounting for the `Name: ` prefix
    pub(crate) fn new(name: &'a str) -> Self {
        HeaderWriter {
            name,
            buf: String::new(),
            line_len: name.len() + 2,
            line_has_content: false,
        }
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }

    fn fold(&mut self) {
        self.buf.push_str("\r\n");
        self.line_len = 0;
        self.line_has_content = false;
    }

    fn push(&mut self, s: &str) -> Result<(), Error> {
        self.buf.push_str(s);
        self.line_len += s.len();

        if self.line_len + 2 > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong(self.line_len + 2));
        }
        Ok(())
    }

    fn fits(&self, ws: &str, width: usize) -> bool {
        self.line_len + ws.len() + width <= SOFT_LINE_LENGTH
    }

    /// Writes a whitespace run that precedes something `reserve` wide
    ///
    /// Every character of the run is a folding point. The run is broken
    /// wherever the line would overflow, and once more before its last
    /// character when that moves the following item onto a line it fits on.
    fn push_ws(&mut self, ws: &str, reserve: usize) -> Result<(), Error> {
        let last = ws.len().saturating_sub(1);
        for (i, ch) in ws.char_indices() {
            let width = if i == last { 1 + reserve } else { 1 };
            let helps = self.line_has_content || width <= SOFT_LINE_LENGTH;
            if !self.buf.is_empty()
                && self.line_len > 0
                && helps
                && self.line_len + width > SOFT_LINE_LENGTH
            {
                self.fold();
            }
            self.buf.push(ch);
            self.line_len += 1;
        }

        if self.line_len + 2 > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong(self.line_len + 2));
        }
        Ok(())
    }

    /// Writes `token` as an unbreakable unit, folding inside `ws` if the
    /// current line is full
    pub(crate) fn write_token(&mut self, ws: &str, token: &str) -> Result<(), Error> {
        self.push_ws(ws, token.len())?;
        self.push(token)?;
        self.line_has_content = true;
        Ok(())
    }

    /// Writes `text` as a sequence of encoded words
    ///
    /// Adjacent encoded words are separated by a space, which decoders drop,
    /// so `text` comes back in one piece.
    fn write_encoded(&mut self, ws: &str, text: &str) -> Result<(), Error> {
        let encoding = WordEncoding::choose(text);
        let mut rest = text;
        let mut sep = ws;

        while let Some(ch) = rest.chars().next() {
            let smallest = WORD_OVERHEAD + encoding.payload_len(&rest[..ch.len_utf8()]);
            self.push_ws(sep, smallest)?;

            let room = SOFT_LINE_LENGTH
                .saturating_sub(self.line_len)
                .min(MAX_ENCODED_WORD)
                .max(smallest);
            let (word, tail) = rest.split_at(encoding.fit(rest, room - WORD_OVERHEAD));

            let mut encoded = String::with_capacity(room);
            encoding.encode_into(word, &mut encoded);
            self.push(&encoded)?;
            self.line_has_content = true;

            rest = tail;
            sep = " ";
        }
        Ok(())
    }

    /// Writes words from `text`, with `lead` standing in for missing
    /// whitespace before the first one
    ///
    /// Runs of words that need encoding become a single encoded span, so the
    /// whitespace between them survives decoding.
    fn write_words(&mut self, lead: &str, text: &str) -> Result<(), Error> {
        let (words, trailing) = split_words(text);
        let needs_encoding = self.encoding_plan(lead, text, &words);

        let mut i = 0;
        while i < words.len() {
            let first = words[i];
            let ws = if first.ws_start == first.start {
                lead
            } else {
                &text[first.ws_start..first.start]
            };

            if needs_encoding[i] {
                let mut last = i;
                while last + 1 < words.len() && needs_encoding[last + 1] {
                    last += 1;
                }
                self.write_encoded(ws, &text[first.start..words[last].end])?;
                i = last + 1;
            } else {
                self.write_token(ws, &text[first.start..first.end])?;
                i += 1;
            }
        }

        self.push_ws(&text[trailing..], 0)
    }

    /// Which of `words` must be carried in encoded words
    ///
    /// A word is measured on its own: whitespace before it can always be
    /// folded, so only a word that fits on no line at all is encoded for
    /// its length. The first word is glued to the line when nothing
    /// precedes it.
    fn encoding_plan(&self, lead: &str, text: &str, words: &[Word]) -> Vec<bool> {
        words
            .iter()
            .map(|w| {
                let word = &text[w.start..w.end];
                let glued = w.ws_start == w.start && lead.is_empty();
                let line = if glued { self.line_len } else { 1 };
                !is_printable_ascii(word)
                    || word.contains("=?")
                    || line + word.len() > SOFT_LINE_LENGTH
            })
            .collect()
    }

    /// Unstructured text, such as `Subject`
    pub(crate) fn write_text(&mut self, text: &str) -> Result<(), Error> {
        reject_line_breaks(self.name, text)?;
        self.write_words("", text)
    }

    /// One mailbox: `addr@example.com` or `Display Name <addr@example.com>`
    ///
    /// The display name is encoded as a phrase. The address is never encoded.
    /// `terminator` is glued to the end, so folding happens after it.
    pub(crate) fn write_mailbox(
        &mut self,
        ws: &str,
        mailbox: &str,
        terminator: &str,
    ) -> Result<(), Error> {
        reject_line_breaks(self.name, mailbox)?;
        let mailbox = mailbox.trim();

        let (name, addr) = match mailbox.rfind('<') {
            Some(idx) if mailbox.ends_with('>') => (mailbox[..idx].trim(), &mailbox[idx..]),
            _ => ("", mailbox),
        };

        // Prefer breaking between entries over breaking inside one
        let width = if name.is_empty() || is_printable_ascii(&name.replace(' ', "")) {
            mailbox.len() + terminator.len()
        } else {
            WORD_OVERHEAD + base64_len(name.len()) + 1 + addr.len() + terminator.len()
        };
        if self.line_has_content && !self.fits(ws, width) && ws.len() + width <= SOFT_LINE_LENGTH
        {
            self.fold();
        }

        let addr = format!("{}{}", addr, terminator);
        if name.is_empty() {
            return self.write_token(ws, &addr);
        }

        // An encoded word inside quotes is never decoded, so a quoted name
        // is encoded whole or not at all
        let quoted = name.len() >= 2 && name.starts_with('"') && name.ends_with('"');
        if quoted && self.encoding_plan(ws, name, &split_words(name).0).contains(&true) {
            let unquoted = unquote(&name[1..name.len() - 1]);
            self.write_encoded(ws, &unquoted)?;
        } else {
            self.write_words(ws, name)?;
        }
        self.write_token(" ", &addr)
    }

    /// Address list, entries joined by `separator`
    pub(crate) fn write_mailboxes<S: AsRef<str>>(
        &mut self,
        mailboxes: &[S],
        separator: &str,
    ) -> Result<(), Error> {
        for (i, mailbox) in mailboxes.iter().enumerate() {
            let ws = if i == 0 { "" } else { " " };
            let terminator = if i + 1 == mailboxes.len() { "" } else { separator };
            self.write_mailbox(ws, mailbox.as_ref(), terminator)?;
        }
        Ok(())
    }

    /// Structured tokens such as message ids, never encoded
    pub(crate) fn write_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<(), Error> {
        for (i, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            reject_line_breaks(self.name, token)?;
            self.write_token(if i == 0 { "" } else { " " }, token.trim())?;
        }
        Ok(())
    }
}

/// Removes quoted-pair backslashes from the inside of a quoted string
fn unquote(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
