//! Signed bearer tokens.
//!
//! Tokens use the JWT compact form with a fixed `HS256` header:
//! `base64url(header).base64url(claims).base64url(hmac_sha256(key, header.claims))`.
//! Only the two claims this service issues are understood: `user_id` and `exp`.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use executive_core::UserId;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("signing key rejected")]
    InvalidKey,
    #[error("token encoding failed")]
    Encoding,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

/// Issues and verifies access tokens with a single shared key.
#[derive(Clone)]
pub struct TokenSigner {
    key: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    #[must_use]
    pub const fn new(key: SecretString, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    /// Issue a token for `user_id` that expires `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the claims cannot be encoded.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the claims cannot be encoded.
    pub fn issue_at(&self, user_id: UserId, now: i64) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id,
            exp: now.saturating_add(ttl),
        };
        let header = Header {
            alg: "HS256".to_owned(),
            typ: "JWT".to_owned(),
        };

        let header = serde_json::to_vec(&header).map_err(|_| TokenError::Encoding)?;
        let claims = serde_json::to_vec(&claims).map_err(|_| TokenError::Encoding)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = self.mac(signing_input.as_bytes())?.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` for a malformed token, a non-HS256 header, a bad
    /// signature, or an expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify as if the current time were `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// See [`TokenSigner::verify`].
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlgorithm);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Malformed)?;
        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        let signing_input = token
            .get(..signing_input_len)
            .ok_or(TokenError::Malformed)?;
        // verify_slice compares in constant time.
        self.mac(signing_input.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: Claims = decode_json(claims_b64)?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| TokenError::InvalidKey)?;
        mac.update(data);
        Ok(mac)
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("k3y-mat3rial-for-unit-tests-0123456789"),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_issue_then_verify() {
        let user = UserId::generate();
        let token = signer().issue_at(user, NOW).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = signer().verify_at(&token, NOW + 10).unwrap();
        assert_eq!(claims.user_id, user);
        assert_eq!(claims.exp, NOW + 3600);
    }

    #[test]
    fn test_expired() {
        let token = signer().issue_at(UserId::generate(), NOW).unwrap();
        assert_eq!(
            signer().verify_at(&token, NOW + 3600),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_key() {
        let token = signer().issue_at(UserId::generate(), NOW).unwrap();
        let other = TokenSigner::new(
            SecretString::from("a-different-key-entirely-9876543210"),
            Duration::from_secs(3600),
        );
        assert_eq!(other.verify_at(&token, NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_claims() {
        let token = signer().issue_at(UserId::generate(), NOW).unwrap();
        let forged_claims = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"user_id":"{}","exp":{}}}"#,
            UserId::generate(),
            NOW + 999_999
        ));
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_claims;
        assert_eq!(
            signer().verify_at(&parts.join("."), NOW),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_rejects_other_algorithms() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"user_id":"{}","exp":{}}}"#,
            UserId::generate(),
            NOW + 60
        ));
        let token = format!("{header}.{claims}.");
        assert_eq!(
            signer().verify_at(&token, NOW),
            Err(TokenError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn test_malformed() {
        for bad in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert_eq!(signer().verify_at(bad, NOW), Err(TokenError::Malformed), "{bad}");
        }
    }
}
