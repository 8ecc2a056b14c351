// ABOUTME: PKCE (RFC 7636) challenge computation and verifier validation
// ABOUTME: Supports S256 and plain challenge methods with constant-time comparison
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

/// PKCE code challenge method (RFC 7636 Section 4.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeChallengeMethod {
    /// `base64url(SHA-256(verifier))`, no padding
    S256,
    /// Challenge equals the verifier unchanged
    Plain,
}

impl fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S256 => write!(f, "S256"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

impl FromStr for CodeChallengeMethod {
    type Err = UnsupportedChallengeMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S256" => Ok(Self::S256),
            "plain" => Ok(Self::Plain),
            other => Err(UnsupportedChallengeMethod(other.to_owned())),
        }
    }
}

/// Error for a `code_challenge_method` outside {S256, plain}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedChallengeMethod(pub String);

impl fmt::Display for UnsupportedChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "code_challenge_method must be 'S256' or 'plain', got '{}'",
            self.0
        )
    }
}

impl std::error::Error for UnsupportedChallengeMethod {}

/// A code challenge recorded at authorization time, carried forward
/// unchanged onto the grant derived from the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    /// The challenge value as supplied by the client
    pub challenge: String,
    /// How the challenge was derived from the verifier
    pub method: CodeChallengeMethod,
}

/// Compute the challenge for a verifier under the given method
#[must_use]
pub fn challenge_from_verifier(verifier: &str, method: CodeChallengeMethod) -> String {
    match method {
        CodeChallengeMethod::S256 => {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(hasher.finalize())
        }
        CodeChallengeMethod::Plain => verifier.to_owned(),
    }
}

/// Validate verifier format per RFC 7636 Section 4.1: 43–128 characters,
/// unreserved charset only
#[must_use]
pub fn is_valid_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len())
        && verifier
            .chars()
            .all(|c| matches!(c, 'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~'))
}

/// Check a supplied verifier against a stored challenge.
///
/// Recomputes the challenge and compares in constant time so the comparison
/// leaks nothing about how far a near-miss matched.
#[must_use]
pub fn verifier_matches(
    stored_challenge: &str,
    verifier: &str,
    method: CodeChallengeMethod,
) -> bool {
    let computed = challenge_from_verifier(verifier, method);
    computed
        .as_bytes()
        .ct_eq(stored_challenge.as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7636 Appendix B reference vector
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_s256_reference_vector() {
        assert_eq!(
            challenge_from_verifier(RFC_VERIFIER, CodeChallengeMethod::S256),
            RFC_CHALLENGE
        );
    }

    #[test]
    fn test_s256_match_and_mismatch() {
        assert!(verifier_matches(
            RFC_CHALLENGE,
            RFC_VERIFIER,
            CodeChallengeMethod::S256
        ));
        assert!(!verifier_matches(
            RFC_CHALLENGE,
            "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXl",
            CodeChallengeMethod::S256
        ));
    }

    #[test]
    fn test_plain_is_identity() {
        let verifier = "a".repeat(43);
        assert_eq!(
            challenge_from_verifier(&verifier, CodeChallengeMethod::Plain),
            verifier
        );
        assert!(verifier_matches(
            &verifier,
            &verifier,
            CodeChallengeMethod::Plain
        ));
        assert!(!verifier_matches(
            &verifier,
            &"b".repeat(43),
            CodeChallengeMethod::Plain
        ));
    }

    #[test]
    fn test_verifier_format() {
        assert!(is_valid_verifier(RFC_VERIFIER));
        assert!(is_valid_verifier(&"a".repeat(43)));
        assert!(is_valid_verifier(&"a".repeat(128)));
        assert!(!is_valid_verifier(&"a".repeat(42)));
        assert!(!is_valid_verifier(&"a".repeat(129)));
        assert!(!is_valid_verifier(&format!("{}!", "a".repeat(43))));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            "S256".parse::<CodeChallengeMethod>().unwrap(),
            CodeChallengeMethod::S256
        );
        assert_eq!(
            "plain".parse::<CodeChallengeMethod>().unwrap(),
            CodeChallengeMethod::Plain
        );
        assert!("s256".parse::<CodeChallengeMethod>().is_err());
    }
}
