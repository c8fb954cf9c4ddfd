#[macro_use]
extern crate lazy_static;

pub use extract::{ExtractConfig, Extractor, Outcome, Summary};
pub use header::{FromHeader, Header, HeaderMap};
pub use mail::{Attachment, MailMessage};
pub use mbox::MboxReader;
pub use message::{MimeMessage, MimeMultipartType};
pub use results::{Error, ParsingResult};

pub mod address;
pub mod extract;
pub mod mail;
pub mod mbox;
pub mod mimeheaders;
pub mod results;
pub mod rfc2045;
pub mod rfc2047;
pub mod rfc5322;
pub mod rfc822;
mod header;
mod message;
