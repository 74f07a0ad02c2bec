use super::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{what} needs {expected} bytes, got {actual}"))]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[snafu(display("unknown message kind {kind:#04x}"))]
    UnknownKind { kind: u8 },

    #[snafu(display("frame of {len} bytes exceeds limit of {max}"))]
    FrameTooLarge { len: usize, max: usize },

    #[snafu(display("height {height} does not fit in {} bytes", Height::SIZE))]
    HeightOverflow { height: u64 },

    #[snafu(display("invalid success flag {byte:#04x}"))]
    InvalidFlag { byte: u8 },

    #[snafu(display("invalid hex: {source}"))]
    Hex { source: hex::FromHexError },

    #[snafu(display("invalid integer `{input}`: {source}"))]
    ParseInt {
        input: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("register payload is not UTF-8: {source}"))]
    Utf8 { source: std::string::FromUtf8Error },

    #[snafu(display("I/O error: {source}"))]
    Io { source: std::io::Error },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;
