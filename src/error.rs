use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    InvalidConfig(String),
    InvalidShape(String),
    InvalidData(String),
    /// The network has no input/output widths yet; call `fit` or `bind` first.
    NotFitted,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::InvalidShape(msg) => write!(f, "invalid shape: {msg}"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            Error::NotFitted => write!(f, "network is not bound to input/output widths yet"),
        }
    }
}

impl std::error::Error for Error {}
