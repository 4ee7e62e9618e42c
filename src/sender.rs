use crate::digest::{compute_response, Ha1};
use crate::header::{encode_basic_token, Challenge, DigestResponse, MethodVariant, Response};
use crate::{Algorithm, AuthMethod, Error, Method, Result, Secret};
use std::fmt;

/// Parameters retained from one offered variant
#[derive(Clone)]
enum Prepared {
    Digest {
        realm: String,
        nonce: String,
        algorithm: Algorithm,
        ha1: Ha1,
    },
    Basic {
        token: String,
    },
}

impl Prepared {
    fn method(&self) -> AuthMethod {
        match self {
            Prepared::Digest { .. } => AuthMethod::Digest,
            Prepared::Basic { .. } => AuthMethod::Basic,
        }
    }
}

// the Basic token is the secret in disguise
impl fmt::Debug for Prepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prepared::Digest {
                realm,
                nonce,
                algorithm,
                ..
            } => f
                .debug_struct("Digest")
                .field("realm", realm)
                .field("nonce", nonce)
                .field("algorithm", algorithm)
                .finish_non_exhaustive(),
            Prepared::Basic { .. } => f.write_str("Basic(..)"),
        }
    }
}

/// Client role: built once from a server challenge, then signs every following request.
///
/// Digest is preferred over Basic when both are offered, since it never puts the secret on
/// the wire in recoverable form.
#[derive(Debug, Clone)]
pub struct Sender {
    identity: String,
    preferred: Prepared,
    alternatives: Vec<Prepared>,
}

impl Sender {
    /// Construct from the `WWW-Authenticate` header values of a 401 response.
    ///
    /// `secret` is a secret literal, see [`Secret::parse`].
    ///
    /// # Errors
    /// If the challenge cannot be decoded or offers nothing this sender can answer.
    pub fn new<S: AsRef<str>>(
        www_authenticate: &[S],
        identity: &str,
        secret: &str,
    ) -> Result<Self> {
        let challenge = Challenge::decode(www_authenticate)
            .map_err(|e| Error::Construction(format!("unusable challenge: {}", e)))?;

        Self::with_methods(
            &challenge,
            identity,
            Secret::parse(secret)?,
            &[AuthMethod::Digest, AuthMethod::Basic],
        )
    }

    /// Construct from a decoded challenge, answering only with `methods`, in that order of
    /// preference.
    ///
    /// Every usable variant is retained. Among variants of the same method the one offered
    /// first is preferred.
    pub fn with_methods(
        challenge: &Challenge,
        identity: impl Into<String>,
        secret: Secret,
        methods: &[AuthMethod],
    ) -> Result<Self> {
        let identity = identity.into();
        let mut prepared: Vec<Prepared> = vec![];

        for variant in &challenge.variants {
            let method = variant.method();
            if !methods.contains(&method) {
                continue;
            }

            match variant {
                MethodVariant::Digest {
                    realm,
                    nonce,
                    algorithm,
                } => match secret.resolve(&identity, realm, *algorithm) {
                    Some(ha1) => prepared.push(Prepared::Digest {
                        realm: realm.clone(),
                        nonce: nonce.clone(),
                        algorithm: *algorithm,
                        ha1,
                    }),
                    None => {
                        tracing::debug!(
                            %algorithm,
                            "hashed secret does not fit the Digest challenge"
                        );
                    }
                },
                MethodVariant::Basic { .. } => match secret.plaintext() {
                    Some(plain) => prepared.push(Prepared::Basic {
                        token: encode_basic_token(&identity, plain),
                    }),
                    None => {
                        tracing::debug!("Basic challenge needs a plaintext secret");
                    }
                },
            }
        }

        prepared.sort_by_key(|p| methods.iter().position(|m| *m == p.method()));

        let mut prepared = prepared.into_iter();
        let preferred = prepared.next().ok_or_else(|| {
            Error::Construction("no offered authentication method can be used".into())
        })?;

        Ok(Self {
            identity,
            preferred,
            alternatives: prepared.collect(),
        })
    }

    /// Method used for every response
    pub fn method(&self) -> AuthMethod {
        self.preferred.method()
    }

    /// All methods usable with the retained challenge, preferred first
    pub fn methods(&self) -> Vec<AuthMethod> {
        let mut methods = vec![];
        for p in std::iter::once(&self.preferred).chain(&self.alternatives) {
            if !methods.contains(&p.method()) {
                methods.push(p.method());
            }
        }
        methods
    }

    /// Build the response for one outgoing request.
    ///
    /// `url` is used verbatim and must be the exact request target sent on the wire.
    pub fn response(&self, method: Method<'_>, url: &str) -> Response {
        match &self.preferred {
            Prepared::Digest {
                realm,
                nonce,
                algorithm,
                ha1,
            } => Response::Digest(DigestResponse {
                username: self.identity.clone(),
                realm: realm.clone(),
                nonce: nonce.clone(),
                uri: url.to_string(),
                response: hex::encode(compute_response(*algorithm, ha1, method, url, nonce)),
                algorithm: Some(*algorithm),
            }),
            Prepared::Basic { token } => Response::Basic {
                token: token.clone(),
            },
        }
    }

    /// `Authorization` header value for one outgoing request
    pub fn generate_header(&self, method: Method<'_>, url: &str) -> String {
        self.response(method, url).to_string()
    }
}
