use std::fmt::{self, Display, Formatter};
use std::result;

use thiserror::Error;

/// The check that rejected a presented credential.
///
/// This is meant for local logging. Peers only ever learn that the request was unauthorized.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mismatch {
    Username,
    Secret,
    Realm,
    Nonce,
    Response,
    Url,
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mismatch::Username => "username",
            Mismatch::Secret => "secret",
            Mismatch::Realm => "realm",
            Mismatch::Nonce => "nonce",
            Mismatch::Response => "response digest",
            Mismatch::Url => "request URL",
        })
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum Error {
    /// The validator or sender could not be set up from the given inputs.
    #[error("Cannot set up authentication: {0}")]
    Construction(String),
    /// A challenge or response header violates the wire grammar.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),
    /// The peer used a method that is not allowed or not implemented.
    #[error("Unsupported authentication method: {0}")]
    UnsupportedMethod(String),
    /// The credential was well-formed but wrong.
    #[error("Invalid credentials: {0} mismatch")]
    InvalidCredential(Mismatch),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub(crate) fn missing(what: &'static str, ctx: &str) -> Self {
        Error::MalformedHeader(format!("missing \"{}\" in header: {}", what, ctx))
    }

    /// Returns the mismatch reason if this is a credential rejection.
    pub fn mismatch(&self) -> Option<Mismatch> {
        match self {
            Error::InvalidCredential(m) => Some(*m),
            _ => None,
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::MalformedHeader(format!("invalid base64: {}", e))
    }
}
