use crate::{Error, Result};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use digest::{Digest, DynDigest};
use md5::Md5;
use sha2::{Sha256, Sha512_256};

/// Authentication method offered in a challenge or used in a response
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AuthMethod {
    Basic,
    Digest,
}

impl AuthMethod {
    /// Parse a method tag, returning `None` for schemes this crate does not implement
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("basic") {
            Some(AuthMethod::Basic)
        } else if tag.eq_ignore_ascii_case("digest") {
            Some(AuthMethod::Digest)
        } else {
            None
        }
    }
}

impl FromStr for AuthMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AuthMethod::from_tag(s).ok_or_else(|| Error::UnsupportedMethod(s.into()))
    }
}

impl Display for AuthMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthMethod::Basic => "Basic",
            AuthMethod::Digest => "Digest",
        })
    }
}

/// Hash function used for digest computation and for pre-hashed secrets
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[allow(non_camel_case_types)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "MD5"))]
    Md5,
    #[cfg_attr(feature = "serde", serde(rename = "SHA-256"))]
    Sha256,
    #[cfg_attr(feature = "serde", serde(rename = "SHA-512-256"))]
    Sha512_256,
}

impl Algorithm {
    /// Calculate the raw digest of bytes using the selected algorithm
    pub fn digest(self, bytes: &[u8]) -> Vec<u8> {
        let mut hash: Box<dyn DynDigest> = match self {
            Algorithm::Md5 => Box::new(Md5::new()),
            Algorithm::Sha256 => Box::new(Sha256::new()),
            Algorithm::Sha512_256 => Box::new(Sha512_256::new()),
        };

        hash.update(bytes);
        hash.finalize().into_vec()
    }

    /// Calculate a lowercase hex hash of bytes using the selected algorithm
    pub fn hash(self, bytes: &[u8]) -> String {
        hex::encode(self.digest(bytes))
    }

    /// Calculate a hash of string's bytes using the selected algorithm
    pub fn hash_str(self, s: &str) -> String {
        self.hash(s.as_bytes())
    }

    /// Digest size in bytes
    pub fn output_len(self) -> usize {
        match self {
            Algorithm::Md5 => 16,
            Algorithm::Sha256 | Algorithm::Sha512_256 => 32,
        }
    }

    /// Tag used in the `<tag>:<base64>` pre-hashed secret literal
    pub fn secret_tag(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512_256 => "sha512-256",
        }
    }

    pub(crate) fn from_secret_tag(tag: &str) -> Option<Self> {
        match tag {
            "md5" => Some(Algorithm::Md5),
            "sha256" => Some(Algorithm::Sha256),
            "sha512-256" => Some(Algorithm::Sha512_256),
            _ => None,
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Parse from the format used in WWW-Authenticate
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("MD5") {
            Ok(Algorithm::Md5)
        } else if s.eq_ignore_ascii_case("SHA-256") {
            Ok(Algorithm::Sha256)
        } else if s.eq_ignore_ascii_case("SHA-512-256") {
            Ok(Algorithm::Sha512_256)
        } else {
            Err(Error::MalformedHeader(format!("unknown algorithm: {}", s)))
        }
    }
}

impl Display for Algorithm {
    /// Format to the form used in headers
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Md5 => "MD5",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha512_256 => "SHA-512-256",
        })
    }
}

/// Request method (part of the digest input)
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Method<'a> {
    Announce,
    Describe,
    GetParameter,
    Options,
    Pause,
    Play,
    Record,
    Redirect,
    Setup,
    SetParameter,
    Teardown,
    Other(&'a str),
}

impl<'a> From<&'a str> for Method<'a> {
    fn from(s: &'a str) -> Self {
        match s {
            "ANNOUNCE" => Method::Announce,
            "DESCRIBE" => Method::Describe,
            "GET_PARAMETER" => Method::GetParameter,
            "OPTIONS" => Method::Options,
            "PAUSE" => Method::Pause,
            "PLAY" => Method::Play,
            "RECORD" => Method::Record,
            "REDIRECT" => Method::Redirect,
            "SETUP" => Method::Setup,
            "SET_PARAMETER" => Method::SetParameter,
            "TEARDOWN" => Method::Teardown,
            other => Method::Other(other),
        }
    }
}

impl<'a> Display for Method<'a> {
    /// Convert to the uppercase method token
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Announce => "ANNOUNCE",
            Method::Describe => "DESCRIBE",
            Method::GetParameter => "GET_PARAMETER",
            Method::Options => "OPTIONS",
            Method::Pause => "PAUSE",
            Method::Play => "PLAY",
            Method::Record => "RECORD",
            Method::Redirect => "REDIRECT",
            Method::Setup => "SETUP",
            Method::SetParameter => "SET_PARAMETER",
            Method::Teardown => "TEARDOWN",
            Method::Other(s) => s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_names() {
        assert_eq!(Algorithm::from_str("md5").unwrap(), Algorithm::Md5);
        assert_eq!(Algorithm::from_str("SHA-256").unwrap(), Algorithm::Sha256);
        assert_eq!(
            Algorithm::from_str("sha-512-256").unwrap(),
            Algorithm::Sha512_256
        );
        assert!(Algorithm::from_str("MD5-sess").is_err());
        assert_eq!(Algorithm::Sha512_256.to_string(), "SHA-512-256");
        assert_eq!(Algorithm::default(), Algorithm::Md5);
    }

    #[test]
    fn test_algorithm_hash() {
        assert_eq!(
            Algorithm::Md5.hash_str("Mufasa:testrealm@host.com:CircleOfLife"),
            "4945ecf42b1bb868634058a845bedde8"
        );
        for algo in [Algorithm::Md5, Algorithm::Sha256, Algorithm::Sha512_256] {
            assert_eq!(algo.digest(b"x").len(), algo.output_len());
            assert_eq!(
                Algorithm::from_secret_tag(algo.secret_tag()),
                Some(algo)
            );
        }
    }

    #[test]
    fn test_auth_method_tags() {
        assert_eq!(AuthMethod::from_tag("DIGEST"), Some(AuthMethod::Digest));
        assert_eq!(AuthMethod::from_tag("basic"), Some(AuthMethod::Basic));
        assert_eq!(AuthMethod::from_tag("Bearer"), None);
        assert_eq!(
            "Negotiate".parse::<AuthMethod>(),
            Err(Error::UnsupportedMethod("Negotiate".into()))
        );
    }

    #[test]
    fn test_method_token() {
        assert_eq!(Method::from("GET_PARAMETER"), Method::GetParameter);
        assert_eq!(Method::from("PLAY").to_string(), "PLAY");
        assert_eq!(Method::from("FLUSH"), Method::Other("FLUSH"));
        assert_eq!(Method::Other("FLUSH").to_string(), "FLUSH");
    }
}
