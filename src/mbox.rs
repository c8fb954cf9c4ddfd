//! Splitting of mbox archives into their messages.
//!
//! Each message in an mbox archive is introduced by an envelope line which
//! starts with `From `. The envelope line itself is not part of the message.
//!
//! Lines inside a message body which start with `From ` are taken as the
//! start of the next message. Archives written by mailers that quote such
//! lines as `>From ` split correctly, and the quoting is left in place.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::trace;

use super::message::MimeMessage;
use super::results::{Error, ParsingResult};

/// The marker at the start of every envelope line.
pub const FROM_LINE: &[u8] = b"From ";

/// A forward-only reader over the messages of an mbox archive.
///
/// Only one message is held in memory at a time, so archives of any size
/// can be read. Iterating yields each message parsed; `next_record` gives
/// the raw bytes instead.
pub struct MboxReader<R> {
    reader: R,
    finished: bool,
}

impl MboxReader<BufReader<File>> {
    /// Open the archive at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> ParsingResult<Self> {
        let file = File::open(path)?;
        MboxReader::new(BufReader::new(file))
    }
}

impl<R: BufRead> MboxReader<R> {
    /// Start reading an archive from `reader`, which must be positioned
    /// at an envelope line.
    ///
    /// Fails with `Error::MalformedArchive` if the first line does not
    /// start with `From `.
    pub fn new(mut reader: R) -> ParsingResult<Self> {
        let mut first_line = Vec::new();
        reader.read_until(b'\n', &mut first_line)?;
        if !first_line.starts_with(FROM_LINE) {
            let first_line = String::from_utf8_lossy(&first_line)
                .trim_end_matches(|c| c == '\r' || c == '\n')
                .to_string();
            return Err(Error::MalformedArchive { first_line });
        }

        Ok(MboxReader {
            reader,
            finished: false,
        })
    }

    /// Read the raw bytes of the next message, without its envelope line.
    ///
    /// Returns None once the end of the archive has been reached.
    pub fn next_record(&mut self) -> Option<ParsingResult<Vec<u8>>> {
        if self.finished {
            return None;
        }

        let mut record = Vec::new();
        loop {
            let line_start = record.len();
            match self.reader.read_until(b'\n', &mut record) {
                Ok(0) => {
                    self.finished = true;
                    break;
                }
                Ok(_) if record[line_start..].starts_with(FROM_LINE) => {
                    record.truncate(line_start);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }

        trace!(bytes = record.len(), "read mbox record");
        Some(Ok(record))
    }
}

impl<R: BufRead> Iterator for MboxReader<R> {
    type Item = ParsingResult<MimeMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
            .map(|record| record.map(|raw| MimeMessage::parse(&raw)))
    }
}
