//! Glue for the `http` crate's header types, which RTSP stacks commonly reuse.

use crate::{Error, Method, Result, Sender, Validator};

use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::{HeaderMap, HeaderValue};

impl<'a> From<&'a http::Method> for Method<'a> {
    fn from(m: &'a http::Method) -> Self {
        Method::from(m.as_str())
    }
}

fn to_header_value(s: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(s).map_err(|e| Error::MalformedHeader(format!("{}: {}", e, s)))
}

impl Validator {
    /// Append one `WWW-Authenticate` header per allowed method
    pub fn append_www_authenticate(&self, headers: &mut HeaderMap) -> Result<()> {
        for value in self.generate_header() {
            headers.append(WWW_AUTHENTICATE, to_header_value(&value)?);
        }
        Ok(())
    }

    /// Check the `Authorization` header of a request
    pub fn validate_headers(
        &self,
        headers: &HeaderMap,
        method: Method<'_>,
        expected_url: &str,
    ) -> Result<()> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| Error::MalformedHeader("no Authorization header".into()))?
            .to_str()
            .map_err(|_| {
                Error::MalformedHeader("Authorization header is not visible ASCII".into())
            })?;

        self.validate_header(value, method, expected_url)
    }
}

impl Sender {
    /// Construct from every `WWW-Authenticate` header of a 401 response
    pub fn from_headers(headers: &HeaderMap, identity: &str, secret: &str) -> Result<Self> {
        let values: Vec<&str> = headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        Sender::new(&values, identity, secret)
    }

    /// `Authorization` header value for one outgoing request
    pub fn authorization(&self, method: Method<'_>, url: &str) -> Result<HeaderValue> {
        to_header_value(&self.generate_header(method, url))
    }
}

impl<'a> TryFrom<&'a HeaderMap> for crate::Challenge {
    type Error = Error;

    fn try_from(headers: &'a HeaderMap) -> Result<Self> {
        let values = headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok());

        crate::Challenge::decode(values)
    }
}
