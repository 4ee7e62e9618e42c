use crate::{Algorithm, Method, Secret};
use std::fmt::{self, Display, Formatter};

use rand::{CryptoRng, RngCore};

/// Size of the server nonce in random bytes (hex-encoded on the wire)
pub const NONCE_LEN: usize = 16;

/// Credential-derived digest of `identity:realm:secret`
#[derive(Clone, PartialEq, Eq)]
pub struct Ha1(Vec<u8>);

impl Ha1 {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Ha1(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase, fixed-width hex as used inside the response digest input
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

// keep key material out of logs
impl fmt::Debug for Ha1 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Ha1(..)")
    }
}

impl Display for Ha1 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compute HA1 for a credential.
///
/// A plain secret is hashed as `identity:realm:secret`. A pre-hashed secret is returned as-is,
/// or `None` when it was produced with a different algorithm than the one requested.
pub fn compute_ha1(
    algorithm: Algorithm,
    identity: &str,
    realm: &str,
    secret: &Secret,
) -> Option<Ha1> {
    secret.resolve(identity, realm, algorithm)
}

/// Compute the response digest `H(hex(HA1):nonce:hex(H(method:uri)))`
pub fn compute_response(
    algorithm: Algorithm,
    ha1: &Ha1,
    method: Method<'_>,
    uri: &str,
    nonce: &str,
) -> Vec<u8> {
    let ha2 = algorithm.hash_str(&format!("{method}:{uri}", method = method, uri = uri));

    let tmp = format!(
        "{ha1}:{nonce}:{ha2}",
        ha1 = ha1.to_hex(),
        nonce = nonce,
        ha2 = ha2
    );
    algorithm.digest(tmp.as_bytes())
}

/// Draw a fresh server nonce from the given source of randomness
pub fn generate_nonce<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);
    hex::encode(nonce_bytes)
}
