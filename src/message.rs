use super::header::HeaderMap;
use super::mimeheaders::{MimeContentTransferEncoding, MimeContentTypeHeader};
use super::results::{Error, ParsingResult};
use super::rfc5322::{is_field_line, Rfc5322Parser};

/// Marks the type of a multipart message
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MimeMultipartType {
    /// Entries which are independent.
    ///
    /// This value is the default.
    ///
    /// As defined by Section 5.1.3 of RFC 2046
    Mixed,
    /// Entries which are interchangeable, such that the system can choose
    /// whichever is "best" for its use.
    ///
    /// As defined by Section 5.1.4 of RFC 2046
    Alternative,
    /// Entries are (typically) a collection of messages.
    ///
    /// As defined by Section 5.1.5 of RFC 2046
    Digest,
    /// Entry order does not matter, and could be displayed simultaneously.
    ///
    /// As defined by Section 5.1.6 of RFC 2046
    Parallel,
    /// Entries make up one compound object, the first being the root
    /// unless a `start` parameter names another.
    ///
    /// As defined by RFC 2387
    Related,
}

impl MimeMultipartType {
    /// Returns the appropriate `MimeMultipartType` for the given subtype
    /// of a `multipart/*` content type.
    pub fn from_subtype(subtype: &str) -> MimeMultipartType {
        match subtype {
            "alternative" => MimeMultipartType::Alternative,
            "digest" => MimeMultipartType::Digest,
            "parallel" => MimeMultipartType::Parallel,
            "related" => MimeMultipartType::Related,
            _ => MimeMultipartType::Mixed,
        }
    }
}

/// A MIME message, or one part of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeMessage {
    /// The headers for this message
    pub headers: HeaderMap,

    /// The content of this message, still transfer encoded.
    ///
    /// For a multipart message this is the preamble, the content between
    /// the final header and the first boundary.
    pub body: Vec<u8>,

    /// The child messages of a multipart message
    pub children: Vec<MimeMessage>,

    /// Set when the message was split into `children`
    pub multipart: Option<MimeMultipartType>,
}

impl MimeMessage {
    /// Parse `raw` into a MimeMessage.
    ///
    /// Recurses down into each message, supporting an unlimited depth of messages.
    ///
    /// The header section runs up to the first blank line, or up to the
    /// first line that is neither a header field nor a continuation.
    /// A `multipart/*` message without a boundary parameter is left as a
    /// single part.
    pub fn parse(raw: &[u8]) -> MimeMessage {
        let (header_bytes, body) = split_header_section(raw);
        let header_text = String::from_utf8_lossy(header_bytes);
        let headers = Rfc5322Parser::new(&header_text).consume_headers();
        MimeMessage::from_headers(headers, body)
    }

    // Make a message from a header map and body, parsing out any multi-part
    // messages that are discovered by looking at the Content-Type header.
    fn from_headers(headers: HeaderMap, body: &[u8]) -> MimeMessage {
        let content_type = headers
            .get_value::<MimeContentTypeHeader>("Content-Type")
            .unwrap_or_else(MimeContentTypeHeader::text_plain);

        let boundary = content_type.params.get("boundary").filter(|b| !b.is_empty());
        match (&content_type.content_type.0[..], boundary) {
            // Only consider a multipart message if we have a boundary, otherwise don't
            // bother and just assume it's a single message.
            ("multipart", Some(boundary)) => {
                let mut parts = split_boundary(body, boundary.as_bytes());
                // The first entry is the preamble, and part of the parent.
                let preamble = if parts.is_empty() {
                    Vec::new()
                } else {
                    parts.remove(0).to_vec()
                };
                let children = parts.into_iter().map(MimeMessage::parse).collect();
                MimeMessage {
                    headers,
                    body: preamble,
                    children,
                    multipart: Some(MimeMultipartType::from_subtype(&content_type.content_type.1)),
                }
            }
            _ => MimeMessage {
                headers,
                body: body.to_vec(),
                children: Vec::new(),
                multipart: None,
            },
        }
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart.is_some()
    }

    /// The parsed Content-Type, defaulting to `text/plain` as RFC 2045
    /// Section 5.2 specifies.
    pub fn content_type(&self) -> MimeContentTypeHeader {
        self.headers
            .get_value("Content-Type")
            .unwrap_or_else(MimeContentTypeHeader::text_plain)
    }

    /// The body with its Content-Transfer-Encoding undone.
    ///
    /// Unknown encodings are passed through untouched. A multipart message
    /// has no payload of its own.
    pub fn decoded_body(&self) -> ParsingResult<Vec<u8>> {
        if self.is_multipart() {
            return Err(Error::decode("a multipart message has no payload"));
        }
        let encoding = self
            .headers
            .get_value("Content-Transfer-Encoding")
            .unwrap_or(MimeContentTransferEncoding::Identity);
        encoding.decode(&self.body)
    }
}

// Splits a raw message into its header section and body.
fn split_header_section(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut pos = 0;
    for line in raw.split_inclusive(|&b| b == b'\n') {
        let content = trim_line_break(line);
        if content.is_empty() {
            return (&raw[..pos], &raw[pos + line.len()..]);
        }
        let continuation = pos > 0 && (content[0] == b' ' || content[0] == b'\t');
        if !continuation && !is_field_line(content) {
            return (&raw[..pos], &raw[pos..]);
        }
        pos += line.len();
    }
    (raw, &raw[raw.len()..])
}

fn trim_line_break(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

// Split `body` up on the `boundary` string.
//
// The first entry returned is the preamble. The line break in front of a
// delimiter line belongs to the delimiter, and everything after the close
// delimiter (`--boundary--`) is epilogue and dropped.
fn split_boundary<'a>(body: &'a [u8], boundary: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut part_start = 0;
    let mut pos = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let line_start = pos;
        pos += line.len();

        let rest = match trim_line_break(line).strip_prefix(b"--") {
            Some(rest) => rest,
            None => continue,
        };
        let rest = match rest.strip_prefix(boundary) {
            Some(rest) => rest,
            None => continue,
        };
        let is_close = rest.starts_with(b"--");
        let rest = if is_close { &rest[2..] } else { rest };
        if !rest.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }

        parts.push(strip_trailing_break(&body[part_start..line_start]));
        if is_close {
            return parts;
        }
        part_start = pos;
    }

    // No close delimiter, so what remains is the last part
    if part_start < body.len() || !parts.is_empty() {
        parts.push(&body[part_start..]);
    }
    parts
}

fn strip_trailing_break(part: &[u8]) -> &[u8] {
    if let Some(part) = part.strip_suffix(b"\r\n") {
        part
    } else {
        part.strip_suffix(b"\n").unwrap_or(part)
    }
}
