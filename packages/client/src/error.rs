use std::fmt;

use crate::address::Address;

/// Which schema object a conflict response refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Database,
    Frame,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Database => write!(f, "database"),
            ResourceKind::Frame => write!(f, "frame"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid address '{address}': {message}")]
    AddressParse { address: String, message: String },

    #[error("there are no available hosts")]
    NoAvailableHost,

    #[error("host not in cluster: {address}")]
    HostNotFound { address: Address },

    #[error("service unavailable at {host}: {message}")]
    ServiceUnavailable { host: Address, message: String },

    #[error("{kind} already exists")]
    AlreadyExists { kind: ResourceKind },

    #[error("server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("query error: {message}")]
    Query { message: String },

    #[error("malformed response: {message}")]
    Decode { message: String },

    #[error("query targets database '{actual}', batch is bound to '{expected}'")]
    DatabaseMismatch { expected: String, actual: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// True for a conflict on the given kind of schema object.
    pub fn is_already_exists(&self, expected: ResourceKind) -> bool {
        matches!(self, Error::AlreadyExists { kind } if *kind == expected)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
