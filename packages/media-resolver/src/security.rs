//! Redacted credentials.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A bearer token that never shows up in logs or debug output.
pub struct LookupToken(SecretBox<str>);

impl LookupToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// The raw token. Only call this when building a request.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for LookupToken {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for LookupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for LookupToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for LookupToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_redacted() {
        let token = LookupToken::new("s3cret");
        assert_eq!(format!("{:?}", token), "[REDACTED]");
        assert_eq!(token.expose(), "s3cret");
        assert_eq!(token.clone().expose(), "s3cret");
    }
}
