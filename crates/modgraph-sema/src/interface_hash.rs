//! Interface fingerprint for incremental builds.
//!
//! The parser feeds every interface-affecting token of a file into an
//! [`InterfaceHasher`]; the resulting digest changes only when the token
//! sequence changes, so the build system can skip dependents when a file's
//! interface is untouched.

use std::fmt;

use sha2::{Digest, Sha256};

/// Separates tokens so that `["ab"]` and `["a", "b"]` hash differently.
const TOKEN_SEPARATOR: [u8; 1] = [0];

#[derive(Debug, Clone, Default)]
pub struct InterfaceHasher {
    hasher: Sha256,
    tokens: usize,
}

impl InterfaceHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_token(&mut self, token: &str) {
        debug_assert!(!token.is_empty(), "empty interface token");
        self.hasher.update(token.as_bytes());
        self.hasher.update(TOKEN_SEPARATOR);
        self.tokens += 1;
    }

    pub fn token_count(&self) -> usize {
        self.tokens
    }

    /// Consumes the accumulator; a digest can only be taken once.
    pub fn finalize(self) -> InterfaceHash {
        InterfaceHash(self.hasher.finalize().into())
    }
}

/// Fixed-width digest of a file's interface tokens
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceHash([u8; 32]);

impl InterfaceHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for InterfaceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InterfaceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceHash({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(tokens: &[&str]) -> InterfaceHash {
        let mut hasher = InterfaceHasher::new();
        for token in tokens {
            hasher.record_token(token);
        }
        hasher.finalize()
    }

    #[test]
    fn identical_sequences_are_stable() {
        let tokens = ["public", "func", "foo", "(", ")"];
        assert_eq!(digest(&tokens), digest(&tokens));
    }

    #[test]
    fn token_boundaries_matter() {
        assert_ne!(digest(&["ab"]), digest(&["a", "b"]));
        assert_ne!(digest(&["a", "bc"]), digest(&["ab", "c"]));
    }

    #[test]
    fn order_matters() {
        assert_ne!(digest(&["a", "b"]), digest(&["b", "a"]));
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let hex = digest(&["x"]).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
