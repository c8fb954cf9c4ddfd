use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The archive does not start with a `From ` envelope line.
    #[error("not an mbox archive, first line is {first_line:?}")]
    MalformedArchive { first_line: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to decode content: {0}")]
    Decode(String),

    #[error("invalid date: {0}")]
    Date(String),
}

impl Error {
    pub fn decode<S: Into<String>>(desc: S) -> Self {
        Error::Decode(desc.into())
    }

    pub fn date<S: Into<String>>(desc: S) -> Self {
        Error::Date(desc.into())
    }
}

pub type ParsingResult<T> = Result<T, Error>;
