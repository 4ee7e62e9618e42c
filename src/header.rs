use crate::utils::QuoteForDigest;
use crate::{Algorithm, AuthMethod, Error, Result};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

//region Challenge

/// One authentication method offered by a server
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum MethodVariant {
    Basic {
        realm: String,
    },
    Digest {
        realm: String,
        nonce: String,
        algorithm: Algorithm,
    },
}

impl MethodVariant {
    pub fn method(&self) -> AuthMethod {
        match self {
            MethodVariant::Basic { .. } => AuthMethod::Basic,
            MethodVariant::Digest { .. } => AuthMethod::Digest,
        }
    }

    pub fn realm(&self) -> &str {
        match self {
            MethodVariant::Basic { realm } | MethodVariant::Digest { realm, .. } => realm,
        }
    }

    /// Parse a single challenge entry.
    ///
    /// Returns `Ok(None)` if the entry uses a scheme this crate does not implement.
    ///
    /// # Errors
    /// If the entry is a Basic or Digest challenge with bad syntax or missing parameters.
    pub fn parse(entry: &str) -> Result<Option<Self>> {
        let (scheme, params) = split_scheme(entry);

        let method = match AuthMethod::from_tag(scheme) {
            Some(m) => m,
            None => return Ok(None),
        };

        let mut kv = parse_header_map(params)?;

        let realm = kv
            .remove("realm")
            .ok_or_else(|| Error::missing("realm", entry))?;

        Ok(Some(match method {
            AuthMethod::Basic => MethodVariant::Basic { realm },
            AuthMethod::Digest => MethodVariant::Digest {
                realm,
                nonce: kv
                    .remove("nonce")
                    .ok_or_else(|| Error::missing("nonce", entry))?,
                algorithm: match kv.get("algorithm") {
                    Some(a) => Algorithm::from_str(a)?,
                    None => Algorithm::default(),
                },
            },
        }))
    }
}

impl Display for MethodVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MethodVariant::Basic { realm } => {
                write!(f, "Basic realm=\"{}\"", realm.quote_for_digest())
            }
            MethodVariant::Digest {
                realm,
                nonce,
                algorithm,
            } => write!(
                f,
                "Digest realm=\"{}\", nonce=\"{}\", algorithm={}",
                realm.quote_for_digest(),
                nonce.quote_for_digest(),
                algorithm
            ),
        }
    }
}

/// Server challenge: every method the server is willing to accept, in its preference order
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Challenge {
    pub variants: Vec<MethodVariant>,
}

impl Challenge {
    pub fn new(variants: Vec<MethodVariant>) -> Self {
        Self { variants }
    }

    /// One header value per variant, in order
    pub fn encode(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.to_string()).collect()
    }

    /// Decode from one or more header values.
    ///
    /// A single value may also carry several comma-joined challenges. Entries with an
    /// unknown scheme, or malformed Basic/Digest entries, are skipped.
    ///
    /// # Errors
    /// If no recognised, well-formed entry remains.
    pub fn decode<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut variants = vec![];
        let mut last_err = None;

        for value in values {
            for entry in split_challenges(value.as_ref()) {
                match MethodVariant::parse(entry) {
                    Ok(Some(v)) => variants.push(v),
                    Ok(None) => {
                        tracing::debug!(entry, "skipping challenge with unsupported scheme");
                    }
                    Err(e) => {
                        tracing::debug!(entry, error = %e, "skipping malformed challenge");
                        last_err = Some(e);
                    }
                }
            }
        }

        if variants.is_empty() {
            return Err(last_err.unwrap_or_else(|| {
                Error::MalformedHeader("no Basic or Digest challenge found".into())
            }));
        }

        Ok(Self { variants })
    }

    /// First offered variant of the given method
    pub fn get(&self, method: AuthMethod) -> Option<&MethodVariant> {
        self.variants.iter().find(|v| v.method() == method)
    }
}

impl Display for Challenge {
    /// Single-line form, challenges joined by commas
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, v) in self.variants.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            Display::fmt(v, f)?;
        }
        Ok(())
    }
}

impl FromStr for Challenge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode([s])
    }
}

//endregion

//region Response

/// Digest response parameters
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DigestResponse {
    pub username: String,
    pub realm: String,
    pub nonce: String,
    /// Request target exactly as the client hashed it
    pub uri: String,
    /// Hex-encoded response digest
    pub response: String,
    /// Absent means MD5
    pub algorithm: Option<Algorithm>,
}

/// Client proof sent with a request
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Response {
    /// base64 of `identity:secret`
    Basic { token: String },
    Digest(DigestResponse),
}

impl Response {
    pub fn basic(identity: &str, secret: &str) -> Self {
        Response::Basic {
            token: encode_basic_token(identity, secret),
        }
    }

    pub fn method(&self) -> AuthMethod {
        match self {
            Response::Basic { .. } => AuthMethod::Basic,
            Response::Digest(_) => AuthMethod::Digest,
        }
    }

    /// Decode the `Authorization` header value
    ///
    /// # Errors
    /// `UnsupportedMethod` for schemes other than Basic and Digest, `MalformedHeader` for
    /// syntax errors and missing fields.
    pub fn parse(input: &str) -> Result<Self> {
        let (scheme, rest) = split_scheme(input);

        if scheme.is_empty() {
            return Err(Error::MalformedHeader("empty authorization header".into()));
        }

        match AuthMethod::from_tag(scheme) {
            Some(AuthMethod::Basic) => {
                if rest.is_empty() || rest.contains(|c: char| c.is_ascii_whitespace()) {
                    return Err(Error::MalformedHeader(format!(
                        "expected a single Basic token: {}",
                        input
                    )));
                }
                Ok(Response::Basic {
                    token: rest.to_string(),
                })
            }
            Some(AuthMethod::Digest) => {
                let mut kv = parse_header_map(rest)?;
                let mut required =
                    |what: &'static str| kv.remove(what).ok_or_else(|| Error::missing(what, input));

                let username = required("username")?;
                let realm = required("realm")?;
                let nonce = required("nonce")?;
                let uri = required("uri")?;
                let response = required("response")?;

                let algorithm = match kv.get("algorithm") {
                    Some(a) => Some(Algorithm::from_str(a)?),
                    None => None,
                };

                Ok(Response::Digest(DigestResponse {
                    username,
                    realm,
                    nonce,
                    uri,
                    response,
                    algorithm,
                }))
            }
            None => Err(Error::UnsupportedMethod(scheme.into())),
        }
    }

    /// Identity and secret carried by a Basic response, `None` for Digest
    pub fn basic_credentials(&self) -> Result<Option<(String, String)>> {
        match self {
            Response::Basic { token } => decode_basic_token(token).map(Some),
            Response::Digest(_) => Ok(None),
        }
    }

    /// Produce a header string (also accessible through the Display trait)
    pub fn to_header_string(&self) -> String {
        self.to_string()
    }
}

/// base64 of `identity:secret`
pub fn encode_basic_token(identity: &str, secret: &str) -> String {
    STANDARD.encode(format!("{}:{}", identity, secret))
}

/// Split a Basic token into identity and secret
pub fn decode_basic_token(token: &str) -> Result<(String, String)> {
    let raw = STANDARD.decode(token)?;
    let decoded = String::from_utf8(raw)
        .map_err(|_| Error::MalformedHeader("Basic credentials are not UTF-8".into()))?;

    match decoded.split_once(':') {
        Some((user, pass)) => Ok((user.to_string(), pass.to_string())),
        None => Err(Error::MalformedHeader(
            "Basic credentials lack a ':' separator".into(),
        )),
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Response::Basic { token } => write!(f, "Basic {}", token),
            Response::Digest(d) => {
                f.write_str("Digest ")?;

                f.write_fmt(format_args!(
                    "username=\"{}\"",
                    d.username.quote_for_digest()
                ))?;
                f.write_fmt(format_args!(", realm=\"{}\"", d.realm.quote_for_digest()))?;
                f.write_fmt(format_args!(", nonce=\"{}\"", d.nonce.quote_for_digest()))?;
                f.write_fmt(format_args!(", uri=\"{}\"", d.uri.quote_for_digest()))?;
                f.write_fmt(format_args!(
                    ", response=\"{}\"",
                    d.response.quote_for_digest()
                ))?;

                // algorithm can be omitted if it is the default value
                if let Some(algo) = d.algorithm.filter(|a| *a != Algorithm::Md5) {
                    f.write_fmt(format_args!(", algorithm={}", algo))?;
                }

                Ok(())
            }
        }
    }
}

impl FromStr for Response {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

//endregion

//region Parsing helpers

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Split `<scheme> <rest>`
fn split_scheme(entry: &str) -> (&str, &str) {
    let entry = entry.trim();
    match entry.find(|c: char| c.is_ascii_whitespace()) {
        Some(i) => (&entry[..i], entry[i..].trim_start()),
        None => (entry, ""),
    }
}

/// Does the text after a top-level comma begin a new challenge (`token SP` not followed by `=`)?
fn starts_challenge(rest: &str) -> bool {
    let rest = rest.trim_start();
    let token_len = rest.find(|c: char| !is_token_char(c)).unwrap_or(rest.len());
    if token_len == 0 {
        return false;
    }

    let after = &rest[token_len..];
    if after.is_empty() || after.starts_with(',') {
        return true;
    }
    if !after.starts_with(|c: char| c.is_ascii_whitespace()) {
        return false;
    }
    !after.trim_start().starts_with('=')
}

/// Split a header value holding one or more comma-joined challenges
fn split_challenges(value: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, b) in value.bytes().enumerate() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_quotes = false;
            }
            continue;
        }

        match b {
            b'"' => in_quotes = true,
            b',' if starts_challenge(&value[i + 1..]) => {
                parts.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(value[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Helper func that parses the `key=value, key="quoted value"` list of an auth header.
/// Keys are lowercased.
pub(crate) fn parse_header_map(input: &str) -> Result<HashMap<String, String>> {
    #[derive(Debug, Clone, Copy)]
    enum ParserState {
        White,
        Name(usize),
        ValueBegin,
        ValueQuoted,
        ValueQuotedNextLiteral,
        ValuePlain,
    }

    let mut state = ParserState::White;

    let mut parsed = HashMap::<String, String>::new();
    let mut current_token = String::new();
    let mut current_value = String::new();

    for (idx, c) in input.char_indices() {
        match state {
            ParserState::White => {
                if c.is_alphabetic() {
                    state = ParserState::Name(idx);
                } else if !(c == ',' || c.is_whitespace()) {
                    return Err(Error::MalformedHeader(format!(
                        "unexpected '{}' in header: {}",
                        c, input
                    )));
                }
            }
            ParserState::Name(name_start) => {
                if c == '=' {
                    current_token = input[name_start..idx].trim().to_ascii_lowercase();
                    state = ParserState::ValueBegin;
                } else if c == ',' || c == '"' {
                    return Err(Error::MalformedHeader(format!(
                        "expected '=' after parameter name in header: {}",
                        input
                    )));
                }
            }
            ParserState::ValueBegin => {
                current_value.clear();
                state = match c {
                    '"' => ParserState::ValueQuoted,
                    ',' => {
                        parsed.insert(std::mem::take(&mut current_token), String::new());
                        ParserState::White
                    }
                    c if c.is_whitespace() => ParserState::ValueBegin,
                    _ => {
                        current_value.push(c);
                        ParserState::ValuePlain
                    }
                };
            }
            ParserState::ValueQuoted => {
                match c {
                    '"' => {
                        parsed.insert(
                            std::mem::take(&mut current_token),
                            std::mem::take(&mut current_value),
                        );
                        state = ParserState::White;
                    }
                    '\\' => {
                        state = ParserState::ValueQuotedNextLiteral;
                    }
                    _ => {
                        current_value.push(c);
                    }
                };
            }
            ParserState::ValuePlain => {
                if c == ',' || c.is_ascii_whitespace() {
                    parsed.insert(
                        std::mem::take(&mut current_token),
                        std::mem::take(&mut current_value),
                    );
                    state = ParserState::White;
                } else {
                    current_value.push(c);
                }
            }
            ParserState::ValueQuotedNextLiteral => {
                current_value.push(c);
                state = ParserState::ValueQuoted
            }
        }
    }

    match state {
        ParserState::ValuePlain => {
            parsed.insert(current_token, current_value);
        }
        ParserState::ValueBegin => {
            parsed.insert(current_token, String::new());
        }
        ParserState::White => {}
        _ => {
            return Err(Error::MalformedHeader(format!(
                "unexpected end of header ({:?}): {}",
                state, input
            )))
        }
    }

    Ok(parsed)
}

//endregion
