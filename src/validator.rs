use crate::digest::{compute_response, generate_nonce, Ha1};
use crate::header::{decode_basic_token, Challenge, DigestResponse, MethodVariant, Response};
use crate::utils::ct_eq;
use crate::{Algorithm, AuthMethod, Error, Identity, Method, Mismatch, Result, Secret};
use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// Realm used when none is configured
pub const DEFAULT_REALM: &str = "IPCAM";

//region URL policy

/// Decides whether the request target a client signed is acceptable for the resource
/// the server is handling.
pub trait UrlPolicy: Send + Sync {
    fn matches(&self, expected: &str, submitted: &str) -> bool;
}

/// Built-in URL policies
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UrlMatch {
    /// Accept the exact URL, a URL extending it past a `/` boundary, or a base URL with a
    /// trailing slash whose last control attribute segment (e.g. `trackID=0`) the client
    /// left out. The server root never stands in for a longer path.
    #[default]
    PrefixBoundary,
    /// Accept only the exact URL
    Exact,
}

impl UrlPolicy for UrlMatch {
    fn matches(&self, expected: &str, submitted: &str) -> bool {
        match self {
            UrlMatch::Exact => expected == submitted,
            UrlMatch::PrefixBoundary => prefix_boundary(expected, submitted),
        }
    }
}

fn prefix_boundary(expected: &str, submitted: &str) -> bool {
    if expected == submitted {
        return true;
    }
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }

    // client appended a per-substream suffix to the session URL
    if let Some(rest) = submitted.strip_prefix(expected) {
        return expected.ends_with('/') || rest.starts_with('/');
    }

    // client signed the base URL and omitted the substream control attribute
    if let Some(rest) = expected.strip_prefix(submitted) {
        return submitted.ends_with('/')
            && has_path(submitted)
            && !rest.contains('/')
            && rest.contains('=');
    }

    false
}

/// Whether the URL has a path beyond the bare `/` after the authority
fn has_path(url: &str) -> bool {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    match after_scheme.find('/') {
        Some(i) => after_scheme.len() > i + 1,
        None => false,
    }
}

//endregion

//region Config

/// Server-side settings
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValidatorConfig {
    pub realm: String,
    /// Allowed methods, in the order they are offered
    pub methods: Vec<AuthMethod>,
    /// Digest hash function. When unset, a pre-hashed secret's algorithm is used, else MD5.
    pub algorithm: Option<Algorithm>,
    pub url_match: UrlMatch,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            realm: DEFAULT_REALM.to_string(),
            methods: vec![AuthMethod::Basic, AuthMethod::Digest],
            algorithm: None,
            url_match: UrlMatch::default(),
        }
    }
}

//endregion

//region Validator

/// Server role: issues the challenge and checks client responses against one credential.
///
/// The nonce is drawn once at construction. All checks take `&self`, so a single validator
/// can be shared between connections without locking.
///
/// Errors returned by [`validate_header`](Validator::validate_header) distinguish the failed
/// check for local diagnostics; callers should answer the peer with a plain "401 Unauthorized"
/// whatever the variant.
pub struct Validator {
    identity: Identity,
    secret: Secret,
    realm: String,
    methods: Vec<AuthMethod>,
    algorithm: Algorithm,
    nonce: String,
    ha1: Option<Ha1>,
    url_policy: Box<dyn UrlPolicy>,
}

impl Validator {
    /// Construct with the default realm, drawing the nonce from the OS random source.
    ///
    /// `identity` and `secret` are literals, see [`Identity::parse`] and [`Secret::parse`].
    pub fn new(identity: &str, secret: &str, methods: &[AuthMethod]) -> Result<Self> {
        let config = ValidatorConfig {
            methods: methods.to_vec(),
            ..ValidatorConfig::default()
        };

        Self::with_config(
            Identity::parse(identity)?,
            Secret::parse(secret)?,
            config,
            &mut OsRng,
        )
    }

    /// Construct from a configuration, drawing the nonce from `rng`
    ///
    /// A hashed identity can only be checked with Basic, so Digest is not offered for it.
    ///
    /// # Errors
    /// If no usable method is allowed, or a pre-hashed secret cannot serve the configured
    /// Digest algorithm.
    pub fn with_config<R: RngCore + CryptoRng>(
        identity: impl Into<Identity>,
        secret: Secret,
        config: ValidatorConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let identity = identity.into();

        let mut methods: Vec<AuthMethod> = Vec::with_capacity(config.methods.len());
        for m in config.methods {
            if !methods.contains(&m) {
                methods.push(m);
            }
        }

        if methods.is_empty() {
            return Err(Error::Construction(
                "at least one authentication method must be allowed".into(),
            ));
        }

        if identity.is_hashed() && methods.contains(&AuthMethod::Digest) {
            methods.retain(|m| *m != AuthMethod::Digest);
            if methods.is_empty() {
                return Err(Error::Construction(
                    "a hashed identity can only be checked with Basic".into(),
                ));
            }
            tracing::debug!("identity is hashed, Digest is not offered");
        }

        let digest_allowed = methods.contains(&AuthMethod::Digest);

        let algorithm = match (config.algorithm, secret.algorithm()) {
            (Some(configured), Some(stored)) if digest_allowed && configured != stored => {
                return Err(Error::Construction(format!(
                    "secret is hashed with {} but Digest is configured for {}",
                    stored, configured
                )));
            }
            (Some(configured), _) => configured,
            (None, Some(stored)) => stored,
            (None, None) => Algorithm::default(),
        };

        let ha1 = match identity.plaintext() {
            Some(plain) if digest_allowed => {
                let ha1 = secret
                    .resolve(plain, &config.realm, algorithm)
                    .ok_or_else(|| {
                        Error::Construction(format!("secret cannot be used with {}", algorithm))
                    })?;
                Some(ha1)
            }
            _ => None,
        };

        let nonce = generate_nonce(rng);

        tracing::debug!(
            realm = %config.realm,
            methods = ?methods,
            algorithm = %algorithm,
            "authentication validator ready"
        );

        Ok(Self {
            identity,
            secret,
            realm: config.realm,
            methods,
            algorithm,
            nonce,
            ha1,
            url_policy: Box::new(config.url_match),
        })
    }

    /// Replace the rule deciding which submitted request targets are acceptable
    pub fn with_url_policy<P: UrlPolicy + 'static>(mut self, policy: P) -> Self {
        self.url_policy = Box::new(policy);
        self
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn methods(&self) -> &[AuthMethod] {
        &self.methods
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The challenge, one variant per allowed method
    pub fn challenge(&self) -> Challenge {
        Challenge::new(
            self.methods
                .iter()
                .map(|m| match m {
                    AuthMethod::Basic => MethodVariant::Basic {
                        realm: self.realm.clone(),
                    },
                    AuthMethod::Digest => MethodVariant::Digest {
                        realm: self.realm.clone(),
                        nonce: self.nonce.clone(),
                        algorithm: self.algorithm,
                    },
                })
                .collect(),
        )
    }

    /// `WWW-Authenticate` header values, one per allowed method
    pub fn generate_header(&self) -> Vec<String> {
        tracing::trace!(realm = %self.realm, "issuing authentication challenge");
        self.challenge().encode()
    }

    /// Check an `Authorization` header value for a request.
    ///
    /// `expected_url` is the request target the server resolved for this request. It is
    /// compared against the URL a Digest response was computed over. Basic responses carry no
    /// URL.
    pub fn validate_header(
        &self,
        authorization: &str,
        method: Method<'_>,
        expected_url: &str,
    ) -> Result<()> {
        let res = self.check(authorization, method, expected_url);

        if let Err(e) = &res {
            tracing::debug!(
                error = %e,
                method = %method,
                url = expected_url,
                "authorization rejected"
            );
        }

        res
    }

    fn check(&self, authorization: &str, method: Method<'_>, expected_url: &str) -> Result<()> {
        let response = Response::parse(authorization)?;

        if !self.methods.contains(&response.method()) {
            return Err(Error::UnsupportedMethod(response.method().to_string()));
        }

        match response {
            Response::Basic { token } => self.check_basic(&token),
            Response::Digest(d) => self.check_digest(&d, method, expected_url),
        }
    }

    fn check_basic(&self, token: &str) -> Result<()> {
        let (user, pass) = decode_basic_token(token)?;

        if !self.identity.matches(&user) {
            return Err(Error::InvalidCredential(Mismatch::Username));
        }

        let verified = match &self.identity {
            Identity::Plain(identity) => self.secret.verify(identity, &self.realm, &pass),
            Identity::Hashed { .. } => self.secret.verify_unbound(&pass),
        };

        if !verified {
            return Err(Error::InvalidCredential(Mismatch::Secret));
        }

        Ok(())
    }

    fn check_digest(
        &self,
        d: &DigestResponse,
        method: Method<'_>,
        expected_url: &str,
    ) -> Result<()> {
        if d.realm != self.realm {
            return Err(Error::InvalidCredential(Mismatch::Realm));
        }

        if d.nonce != self.nonce {
            return Err(Error::InvalidCredential(Mismatch::Nonce));
        }

        if !self.identity.matches(&d.username) {
            return Err(Error::InvalidCredential(Mismatch::Username));
        }

        if d.algorithm.map_or(false, |a| a != self.algorithm) {
            return Err(Error::InvalidCredential(Mismatch::Response));
        }

        let ha1 = self
            .ha1
            .as_ref()
            .ok_or_else(|| Error::UnsupportedMethod(AuthMethod::Digest.to_string()))?;

        let expected = compute_response(self.algorithm, ha1, method, &d.uri, &self.nonce);
        let submitted =
            hex::decode(&d.response).map_err(|_| Error::InvalidCredential(Mismatch::Response))?;

        if !ct_eq(&expected, &submitted) {
            return Err(Error::InvalidCredential(Mismatch::Response));
        }

        if !self.url_policy.matches(expected_url, &d.uri) {
            return Err(Error::InvalidCredential(Mismatch::Url));
        }

        Ok(())
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("identity", &self.identity)
            .field("secret", &self.secret)
            .field("realm", &self.realm)
            .field("methods", &self.methods)
            .field("algorithm", &self.algorithm)
            .field("nonce", &self.nonce)
            .finish_non_exhaustive()
    }
}

//endregion
