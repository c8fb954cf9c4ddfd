//! Attachment extraction: deciding which messages to process, and writing
//! their attachments out under `<output>/<Year-Mon>/`.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::mail::{MailMessage, GMAIL_LABELS_HEADER};
use super::mbox::MboxReader;
use super::message::MimeMessage;
use super::results::ParsingResult;

/// Characters removed from attachment file names, as they either cannot
/// appear in a file name or would change the directory it lands in.
pub const ILLEGAL_FILENAME_CHARS: [char; 11] =
    ['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\n', '\t'];

/// The label that marks a message as spam in a Gmail export.
pub const DEFAULT_SPAM_LABEL: &str = "Spam";

/// The output directory used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "attachments";

/// Settings for an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Root of the directory tree attachments are written to
    pub output_dir: PathBuf,
    /// Messages with any of these in their labels are skipped
    pub ignore_labels: Vec<String>,
    /// The header holding a message's labels
    pub label_header: String,
}

impl Default for ExtractConfig {
    fn default() -> ExtractConfig {
        ExtractConfig {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            ignore_labels: vec![DEFAULT_SPAM_LABEL.to_string()],
            label_header: GMAIL_LABELS_HEADER.to_string(),
        }
    }
}

/// What to do with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Extract its attachments
    Process,
    /// It carries one of the ignored labels
    SkipSpam,
    /// It is not multipart, so it can have no attachments
    SkipNoAttachment,
    /// It lacks a sender, a subject or a parseable date
    SkipMissingMetadata,
}

/// The fields every processed message must have, and which its
/// attachments are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// `Year-Mon` label of the Date header
    pub sent: String,
    pub sender: String,
    pub subject: String,
}

impl Metadata {
    /// Returns None unless all of the fields are present and non-empty.
    pub fn of(message: &MailMessage) -> Option<Metadata> {
        let sender = message.sender();
        let subject = message.subject();
        if sender.is_empty() || subject.is_empty() {
            return None;
        }
        let sent = message.sent()?;
        Some(Metadata {
            sent,
            sender,
            subject,
        })
    }
}

/// Decide what to do with `message`. The checks run cheapest first:
/// labels, then structure, then the metadata.
pub fn classify<S: AsRef<str>>(
    message: &MailMessage,
    ignore_labels: &[S],
    label_header: &str,
) -> Outcome {
    match classify_with_metadata(message, ignore_labels, label_header) {
        Ok(_) => Outcome::Process,
        Err(skip) => skip,
    }
}

/// As `classify`, but a message to process comes back as its metadata.
/// `Err` holds the reason to skip it.
pub fn classify_with_metadata<S: AsRef<str>>(
    message: &MailMessage,
    ignore_labels: &[S],
    label_header: &str,
) -> Result<Metadata, Outcome> {
    if message.has_any_label(ignore_labels, label_header) {
        Err(Outcome::SkipSpam)
    } else if !message.is_multipart() {
        Err(Outcome::SkipNoAttachment)
    } else {
        Metadata::of(message).ok_or(Outcome::SkipMissingMetadata)
    }
}

/// Remove `ILLEGAL_FILENAME_CHARS` from `name`.
///
/// Nothing is put in their place, so two names can end up the same; the
/// attachment written last wins.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c))
        .collect()
}

/// `<root>/<sent>/<sent>--<sender>--<filename>`
pub fn attachment_path(root: &Path, sent: &str, sender: &str, filename: &str) -> PathBuf {
    root.join(sent)
        .join(format!("{}--{}--{}", sent, sender, filename))
}

/// Counters for a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub messages: usize,
    pub processed: usize,
    pub skipped_spam: usize,
    pub skipped_no_attachment: usize,
    pub skipped_missing_metadata: usize,
    pub files_written: usize,
    pub unnamed_attachments: usize,
    pub undecodable_attachments: usize,
}

/// Runs the extraction, reporting each processed message and each file
/// written to `report`.
pub struct Extractor<W> {
    config: ExtractConfig,
    report: W,
    summary: Summary,
}

impl<W: Write> Extractor<W> {
    pub fn new(config: ExtractConfig, report: W) -> Extractor<W> {
        Extractor {
            config,
            report,
            summary: Summary::default(),
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn into_report(self) -> W {
        self.report
    }

    /// Extract every attachment in the archive at `path`.
    ///
    /// Fails if the archive cannot be opened or is not an mbox archive, or
    /// on the first error reading it or writing an attachment. Files
    /// written before an error are left in place.
    pub fn extract_archive<P: AsRef<Path>>(&mut self, path: P) -> ParsingResult<Summary> {
        let mbox = MboxReader::open(path)?;
        self.extract_all(mbox)
    }

    /// Extract every attachment of `messages`.
    pub fn extract_all<I>(&mut self, messages: I) -> ParsingResult<Summary>
    where
        I: IntoIterator<Item = ParsingResult<MimeMessage>>,
    {
        for message in messages {
            let message = MailMessage::new(message?);
            self.extract_message(&message)?;
        }

        let s = &self.summary;
        info!(
            messages = s.messages,
            processed = s.processed,
            skipped_spam = s.skipped_spam,
            skipped_no_attachment = s.skipped_no_attachment,
            skipped_missing_metadata = s.skipped_missing_metadata,
            files_written = s.files_written,
            unnamed_attachments = s.unnamed_attachments,
            undecodable_attachments = s.undecodable_attachments,
            "extraction finished"
        );
        Ok(self.summary.clone())
    }

    /// Write out the attachments of a single message, returning the paths
    /// written.
    pub fn extract_message(&mut self, message: &MailMessage) -> ParsingResult<Vec<PathBuf>> {
        self.summary.messages += 1;

        let screened = classify_with_metadata(
            message,
            self.config.ignore_labels.as_slice(),
            &self.config.label_header,
        );
        let metadata = match screened {
            Ok(metadata) => metadata,
            Err(Outcome::SkipSpam) => {
                debug!(subject = %message.subject(), "skipping message with an ignored label");
                self.summary.skipped_spam += 1;
                return Ok(Vec::new());
            }
            Err(Outcome::SkipNoAttachment) => {
                debug!(subject = %message.subject(), "skipping message that is not multipart");
                self.summary.skipped_no_attachment += 1;
                return Ok(Vec::new());
            }
            Err(_) => {
                debug!(
                    sender = %message.sender(),
                    subject = %message.subject(),
                    date = ?message.sent_date().err(),
                    "skipping message without sender, subject or date"
                );
                self.summary.skipped_missing_metadata += 1;
                return Ok(Vec::new());
            }
        };

        self.summary.processed += 1;
        writeln!(self.report, "{}", message)?;

        let dir = self.config.output_dir.join(&metadata.sent);
        let mut written = Vec::new();
        for attachment in message.attachments() {
            let filename = match attachment.filename() {
                Some(filename) => sanitize_filename(&filename),
                None => {
                    let (major, minor) = attachment.content_type().content_type;
                    if attachment.part().body.is_empty() {
                        debug!(content_type = %format!("{}/{}", major, minor), "skipping empty part without a file name");
                    } else {
                        warn!(
                            content_type = %format!("{}/{}", major, minor),
                            sender = %metadata.sender,
                            "skipping part without a file name"
                        );
                    }
                    self.summary.unnamed_attachments += 1;
                    continue;
                }
            };

            let payload = match attachment.payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(
                        filename = %filename,
                        sender = %metadata.sender,
                        error = %e,
                        "skipping attachment that could not be decoded"
                    );
                    self.summary.undecodable_attachments += 1;
                    continue;
                }
            };

            fs::create_dir_all(&dir)?;
            let path = attachment_path(
                &self.config.output_dir,
                &metadata.sent,
                &metadata.sender,
                &filename,
            );
            fs::write(&path, &payload)?;
            writeln!(self.report, "    {}", path.display())?;
            self.summary.files_written += 1;
            written.push(path);
        }

        Ok(written)
    }
}
