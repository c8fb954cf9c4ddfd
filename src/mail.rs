//! The view of a parsed message that attachment extraction works from.
use std::fmt;

use chrono::{DateTime, FixedOffset};

use super::address::angle_address;
use super::message::{MimeMessage, MimeMultipartType};
use super::mimeheaders::{MimeContentDisposition, MimeContentTypeHeader};
use super::results::{Error, ParsingResult};
use super::rfc822::{month_label, parse_date};

/// The header Gmail exports a message's labels in.
pub const GMAIL_LABELS_HEADER: &str = "X-Gmail-Labels";

/// Parts which are shown as the body of a message rather than attached to
/// it, unless they are marked as attachments or are not the first of
/// their type.
const BODY_TYPES: [(&str, &str); 4] = [
    ("text", "plain"),
    ("text", "html"),
    ("multipart", "related"),
    ("multipart", "alternative"),
];

/// A message read from an archive.
#[derive(Debug, Clone)]
pub struct MailMessage {
    mime: MimeMessage,
}

impl MailMessage {
    pub fn new(mime: MimeMessage) -> MailMessage {
        MailMessage { mime }
    }

    pub fn mime(&self) -> &MimeMessage {
        &self.mime
    }

    fn decoded_header(&self, name: &str) -> String {
        self.mime
            .headers
            .get(name)
            .map(|h| h.decoded_value())
            .unwrap_or_default()
    }

    /// The decoded `Subject`, empty if there is none.
    pub fn subject(&self) -> String {
        self.decoded_header("Subject")
    }

    /// The address of the `From` header, empty if there is none.
    pub fn sender(&self) -> String {
        angle_address(&self.decoded_header("From")).to_string()
    }

    /// The parsed `Date` header.
    pub fn sent_date(&self) -> ParsingResult<DateTime<FixedOffset>> {
        match self.mime.headers.get("Date") {
            Some(header) => parse_date(header.raw_value()),
            None => Err(Error::date("no Date header")),
        }
    }

    /// The `Year-Month` label of the `Date` header, if it could be parsed.
    pub fn sent(&self) -> Option<String> {
        self.sent_date().ok().map(|date| month_label(&date))
    }

    /// The raw label list kept in `header`, empty if there is none.
    pub fn labels(&self, header: &str) -> String {
        self.decoded_header(header)
    }

    /// Returns true if any of `ignore_labels` occurs in the labels kept in
    /// `header`. Matching is by plain, case-sensitive substring.
    pub fn has_any_label<S: AsRef<str>>(&self, ignore_labels: &[S], header: &str) -> bool {
        let labels = self.labels(header);
        ignore_labels
            .iter()
            .any(|label| labels.contains(label.as_ref()))
    }

    pub fn is_multipart(&self) -> bool {
        self.mime.is_multipart()
    }

    /// The parts of this message which are attachments.
    ///
    /// Only the direct children of a `multipart/*` message are considered,
    /// and never those of a `multipart/alternative` one. For
    /// `multipart/related` everything but the root part is an attachment.
    /// Otherwise the first `text/plain`, `text/html`, `multipart/related`
    /// and `multipart/alternative` children are taken as the message body,
    /// unless their Content-Disposition says `attachment`.
    pub fn attachments(&self) -> Vec<Attachment> {
        let children = &self.mime.children;
        match self.mime.multipart {
            None | Some(MimeMultipartType::Alternative) => Vec::new(),
            Some(MimeMultipartType::Related) => {
                let start = self.mime.content_type().param("start");
                if let Some(start) = start {
                    let root = children.iter().position(|part| {
                        part.headers
                            .get("Content-ID")
                            .map_or(false, |id| id.raw_value() == start)
                    });
                    if let Some(root) = root {
                        return children
                            .iter()
                            .enumerate()
                            .filter(|&(i, _)| i != root)
                            .map(|(_, part)| Attachment::new(part))
                            .collect();
                    }
                }
                children.iter().skip(1).map(Attachment::new).collect()
            }
            Some(_) => {
                let mut seen: Vec<String> = Vec::new();
                let mut attachments = Vec::new();
                for part in children {
                    let attachment = Attachment::new(part);
                    let content_type = part.content_type();
                    let minor = &content_type.content_type.1;
                    let is_body_type = BODY_TYPES.iter().any(|&(ma, mi)| content_type.is(ma, mi));
                    if is_body_type && !attachment.is_marked_attachment() && !seen.contains(minor) {
                        seen.push(minor.clone());
                        continue;
                    }
                    attachments.push(attachment);
                }
                attachments
            }
        }
    }
}

/// One line per message: the month, the sender padded out to 50
/// columns, and the subject.
impl fmt::Display for MailMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {:<50} {}",
            self.sent().unwrap_or_else(|| "None".to_string()),
            self.sender(),
            self.subject()
        )
    }
}

/// A part of a message which is attached to it.
#[derive(Debug, Clone, Copy)]
pub struct Attachment<'a> {
    part: &'a MimeMessage,
}

impl<'a> Attachment<'a> {
    pub fn new(part: &'a MimeMessage) -> Attachment<'a> {
        Attachment { part }
    }

    pub fn part(&self) -> &'a MimeMessage {
        self.part
    }

    fn disposition(&self) -> Option<MimeContentDisposition> {
        self.part.headers.get_value("Content-Disposition")
    }

    fn is_marked_attachment(&self) -> bool {
        self.disposition().map_or(false, |d| d.is_attachment())
    }

    pub fn content_type(&self) -> MimeContentTypeHeader {
        self.part.content_type()
    }

    /// The file name from the Content-Disposition `filename` parameter,
    /// or failing that the Content-Type `name` parameter.
    ///
    /// Surrounding whitespace is removed, and an empty name is no name.
    pub fn filename(&self) -> Option<String> {
        self.disposition()
            .and_then(|d| d.param("filename"))
            .or_else(|| self.content_type().param("name"))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// The content of the attachment with its transfer encoding undone.
    pub fn payload(&self) -> ParsingResult<Vec<u8>> {
        self.part.decoded_body()
    }
}
