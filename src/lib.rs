//! This crate implements request authentication for RTSP sessions: the Basic scheme and the
//! RFC 2069 flavour of the Digest scheme, which is what cameras, media servers and players
//! speak to each other.
//!
//! There are two roles. A [`Validator`] lives on the server, hands out the challenge and checks
//! the `Authorization` header of every request. A [`Sender`] lives on the client, is built from
//! the challenge of a 401 response and signs each subsequent request.
//!
//! Secrets can be given in plain text or pre-hashed as `<tag>:<base64 digest>`, where the
//! digest is `H(identity:realm:plaintext)` (see [`Secret`]). The identity itself can be
//! stored hashed as well (see [`Identity`]), in which case only Basic can be checked.
//!
//! # Examples
//!
//! Basic usage:
//!
//! ```
//! use rtsp_auth::{AuthMethod, Method, Sender, Validator};
//!
//! // Server side, once per protected scope
//! let validator = Validator::new("testuser", "testpass", &[AuthMethod::Digest]).unwrap();
//!
//! // Values for the WWW-Authenticate header of the 401 response
//! let www_authenticate = validator.generate_header();
//!
//! // Client side, once per challenge. It can be reused for every following request.
//! let sender = Sender::new(&www_authenticate, "testuser", "testpass").unwrap();
//! let authorization = sender.generate_header(Method::Announce, "rtsp://myhost/mypath");
//!
//! // Back on the server
//! assert!(validator
//!     .validate_header(&authorization, Method::Announce, "rtsp://myhost/mypath")
//!     .is_ok());
//! ```
//!
//! Validation failures carry the reason for local logging. The peer should only ever see a
//! generic 401.

mod credential;
mod digest;
mod enums;
mod error;
mod header;
#[cfg(feature = "http")]
mod http_headers;
mod sender;
mod utils;
mod validator;

pub use error::{Error, Mismatch, Result};

pub use crate::credential::{Identity, Secret};
pub use crate::digest::{compute_ha1, compute_response, generate_nonce, Ha1, NONCE_LEN};
pub use crate::enums::*;
pub use crate::header::{
    decode_basic_token, encode_basic_token, Challenge, DigestResponse, MethodVariant, Response,
};
pub use crate::sender::Sender;
pub use crate::utils::QuoteForDigest;
pub use crate::validator::{UrlMatch, UrlPolicy, Validator, ValidatorConfig, DEFAULT_REALM};

/// Parse the WWW-Authenticate header value.
/// It's just a convenience method to call [`Challenge::decode()`].
pub fn parse(www_authenticate: &str) -> Result<Challenge> {
    Challenge::decode([www_authenticate])
}

#[test]
fn test_concrete_scenario() {
    let va = Validator::new("testuser", "testpass", &[AuthMethod::Digest]).unwrap();
    let challenge = va.generate_header();

    let se = Sender::new(&challenge, "testuser", "testpass").unwrap();
    let resp = se.generate_header(Method::Announce, "rtsp://myhost/mypath");
    assert_eq!(
        va.validate_header(&resp, Method::Announce, "rtsp://myhost/mypath"),
        Ok(())
    );

    let se = Sender::new(&challenge, "testuser", "test1pass").unwrap();
    let resp = se.generate_header(Method::Announce, "rtsp://myhost/mypath");
    assert!(matches!(
        va.validate_header(&resp, Method::Announce, "rtsp://myhost/mypath"),
        Err(Error::InvalidCredential(_))
    ));
}

#[test]
fn test_parse() {
    let challenge = crate::parse(r#"Digest realm="IPCAM", nonce="abcd""#).unwrap();
    assert_eq!(
        challenge.get(AuthMethod::Digest).map(MethodVariant::realm),
        Some("IPCAM")
    );
    assert!(challenge.get(AuthMethod::Basic).is_none());
}
