use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Initialization(String),
    NotInitialized,
    Unreachable(String),
    CommandRejected(String),
    Unexpected(String),
    Protocol(String),
    Io(std::io::Error),
}

impl Error {
    /// Whether cached state may have diverged from the cloud and must be re-read.
    pub fn needs_resync(&self) -> bool {
        matches!(self, Error::CommandRejected(_) | Error::Unexpected(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Initialization(msg) => write!(f, "initialization failed: {msg}"),
            Error::NotInitialized => write!(f, "not initialized"),
            Error::Unreachable(what) => write!(f, "cloud unreachable: {what}"),
            Error::CommandRejected(what) => write!(f, "command rejected: {what}"),
            Error::Unexpected(msg) => write!(f, "unexpected error: {msg}"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
