use crate::digest::Ha1;
use crate::utils::ct_eq;
use crate::{Algorithm, Error, Result};
use std::fmt::{self, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Secret half of a credential.
///
/// A `Hashed` secret holds `H(identity:realm:plaintext)` computed offline, so a deployment
/// does not need to keep the plaintext around. Both forms verify the same submissions.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    Plain(String),
    Hashed { algorithm: Algorithm, digest: Vec<u8> },
}

impl Secret {
    pub fn plain<S: Into<String>>(secret: S) -> Self {
        Secret::Plain(secret.into())
    }

    /// Hash a plaintext secret into the stored form for the given identity and realm
    pub fn hashed(algorithm: Algorithm, identity: &str, realm: &str, plaintext: &str) -> Self {
        let a1 = format!("{}:{}:{}", identity, realm, plaintext);
        Secret::Hashed {
            algorithm,
            digest: algorithm.digest(a1.as_bytes()),
        }
    }

    /// Parse a secret literal: either a raw string, or `<tag>:<base64 digest>` where
    /// the tag is one of `md5`, `sha256`, `sha512-256`.
    ///
    /// # Errors
    /// A recognised tag followed by something that is not a digest of the right size.
    pub fn parse(literal: &str) -> Result<Self> {
        Ok(match parse_hashed_literal(literal, "secret")? {
            Some((algorithm, digest)) => Secret::Hashed { algorithm, digest },
            None => Secret::plain(literal),
        })
    }

    /// The plaintext, if this secret still has it
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Secret::Plain(s) => Some(s),
            Secret::Hashed { .. } => None,
        }
    }

    /// Algorithm a pre-hashed secret is bound to
    pub fn algorithm(&self) -> Option<Algorithm> {
        match self {
            Secret::Plain(_) => None,
            Secret::Hashed { algorithm, .. } => Some(*algorithm),
        }
    }

    /// Resolve HA1 for the given identity and realm.
    ///
    /// Returns `None` for a hashed secret bound to another algorithm.
    pub fn resolve(&self, identity: &str, realm: &str, algorithm: Algorithm) -> Option<Ha1> {
        match self {
            Secret::Plain(s) => {
                let a1 = format!("{}:{}:{}", identity, realm, s);
                Some(Ha1::from_bytes(algorithm.digest(a1.as_bytes())))
            }
            Secret::Hashed {
                algorithm: stored,
                digest,
            } if *stored == algorithm => Some(Ha1::from_bytes(digest.clone())),
            Secret::Hashed { .. } => None,
        }
    }

    /// Check a plaintext candidate (as received in a Basic response) against this secret
    pub fn verify(&self, identity: &str, realm: &str, candidate: &str) -> bool {
        match self {
            Secret::Plain(s) => ct_eq(s.as_bytes(), candidate.as_bytes()),
            Secret::Hashed { algorithm, digest } => {
                let a1 = format!("{}:{}:{}", identity, realm, candidate);
                ct_eq(&algorithm.digest(a1.as_bytes()), digest)
            }
        }
    }

    /// Check a plaintext candidate against a secret kept next to a hashed [`Identity`].
    ///
    /// Such a secret is not bound to identity and realm: the hashed form holds `H(plaintext)`.
    pub fn verify_unbound(&self, candidate: &str) -> bool {
        match self {
            Secret::Plain(s) => ct_eq(s.as_bytes(), candidate.as_bytes()),
            Secret::Hashed { algorithm, digest } => {
                ct_eq(&algorithm.digest(candidate.as_bytes()), digest)
            }
        }
    }

    /// Render the `<tag>:<base64>` literal of a hashed secret
    pub fn to_literal(&self) -> Option<String> {
        match self {
            Secret::Plain(_) => None,
            Secret::Hashed { algorithm, digest } => Some(format!(
                "{}:{}",
                algorithm.secret_tag(),
                STANDARD.encode(digest)
            )),
        }
    }
}

impl FromStr for Secret {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Secret::parse(s)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Plain(_) => f.write_str("Plain(..)"),
            Secret::Hashed { algorithm, .. } => write!(f, "Hashed({}, ..)", algorithm),
        }
    }
}

/// Identity half of a credential.
///
/// A `Hashed` identity holds `H(identity)`, so the user name is not stored either. Such an
/// identity can only be checked against Basic responses, which carry the plaintext name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Plain(String),
    Hashed { algorithm: Algorithm, digest: Vec<u8> },
}

impl Identity {
    pub fn plain<S: Into<String>>(identity: S) -> Self {
        Identity::Plain(identity.into())
    }

    pub fn hashed(algorithm: Algorithm, plaintext: &str) -> Self {
        Identity::Hashed {
            algorithm,
            digest: algorithm.digest(plaintext.as_bytes()),
        }
    }

    /// Parse an identity literal, in the same `<tag>:<base64 digest>` form as [`Secret::parse`]
    pub fn parse(literal: &str) -> Result<Self> {
        Ok(match parse_hashed_literal(literal, "identity")? {
            Some((algorithm, digest)) => Identity::Hashed { algorithm, digest },
            None => Identity::plain(literal),
        })
    }

    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Identity::Plain(s) => Some(s),
            Identity::Hashed { .. } => None,
        }
    }

    pub fn is_hashed(&self) -> bool {
        matches!(self, Identity::Hashed { .. })
    }

    /// Compare a submitted user name, constant time
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Identity::Plain(s) => ct_eq(s.as_bytes(), candidate.as_bytes()),
            Identity::Hashed { algorithm, digest } => {
                ct_eq(&algorithm.digest(candidate.as_bytes()), digest)
            }
        }
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity::plain(s)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Identity::Plain(s)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Identity::parse(s)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Plain(s) => f.write_str(s),
            Identity::Hashed { algorithm, digest } => {
                write!(f, "{}:{}", algorithm.secret_tag(), STANDARD.encode(digest))
            }
        }
    }
}

/// Split `<tag>:<base64>` into algorithm and digest. `None` when the literal has no
/// recognised tag and is to be taken as plaintext.
fn parse_hashed_literal(literal: &str, what: &str) -> Result<Option<(Algorithm, Vec<u8>)>> {
    let (tag, encoded) = match literal.split_once(':') {
        Some(parts) => parts,
        None => return Ok(None),
    };

    let algorithm = match Algorithm::from_secret_tag(tag) {
        Some(a) => a,
        None => return Ok(None),
    };

    let digest = STANDARD.decode(encoded).map_err(|e| {
        Error::Construction(format!("{} {} is not valid base64: {}", tag, what, e))
    })?;

    if digest.len() != algorithm.output_len() {
        return Err(Error::Construction(format!(
            "{} {} must be {} bytes, got {}",
            tag,
            what,
            algorithm.output_len(),
            digest.len()
        )));
    }

    Ok(Some((algorithm, digest)))
}
