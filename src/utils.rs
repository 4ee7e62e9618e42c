use subtle::ConstantTimeEq;

/// slash quoting for header quoted-strings
pub trait QuoteForDigest {
    fn quote_for_digest(&self) -> String;
}

impl QuoteForDigest for str {
    fn quote_for_digest(&self) -> String {
        self.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

impl QuoteForDigest for String {
    fn quote_for_digest(&self) -> String {
        self.as_str().quote_for_digest()
    }
}

/// Compare two byte strings without an early exit on the first differing byte
pub(crate) fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
