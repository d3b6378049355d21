//! Unverified decoding of compact ID tokens
//!
//! A compact token is three dot-separated base64url segments: header,
//! payload and signature. Only the payload is read here, and only to obtain
//! a display identity and an expiry instant. The signature is never checked;
//! the backend verifies the token on every request.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::WoodstoveError;
use crate::session::types::User;

/// Claims read from the token payload.
#[derive(Debug, Deserialize)]
struct Claims {
    email: String,
    name: String,
    picture: String,
    exp: f64,
}

/// Identity and expiry extracted from a compact token.
///
/// # Examples
///
/// ```
/// use woodstove::credential::decode;
///
/// // {"email":"a@b.com","name":"A","picture":"p","exp":9999999999}
/// let token = "eyJhbGciOiJIUzI1NiJ9.\
///     eyJlbWFpbCI6ImFAYi5jb20iLCJuYW1lIjoiQSIsInBpY3R1cmUiOiJwIiwiZXhwIjo5OTk5OTk5OTk5fQ.\
///     sig";
/// let credential = decode(token).unwrap();
/// assert_eq!(credential.email, "a@b.com");
/// assert!(!credential.is_expired_at(chrono::Utc::now()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCredential {
    /// Email address of the signed-in account.
    pub email: String,
    /// Human-readable account name (`name` claim).
    pub display_name: String,
    /// Profile picture URL (`picture` claim).
    pub avatar_url: String,
    /// Expiry as seconds since the Unix epoch (`exp` claim).
    pub expires_at_epoch_seconds: f64,
}

impl DecodedCredential {
    /// Returns `true` when `exp * 1000 <= now` in milliseconds.
    ///
    /// No clock-skew buffer is applied; a token expiring exactly now is
    /// expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_epoch_seconds * 1000.0 <= now.timestamp_millis() as f64
    }

    /// Returns the expiry as a UTC timestamp, or `None` when `exp` is out of
    /// the representable range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis((self.expires_at_epoch_seconds * 1000.0) as i64)
    }

    /// The display identity carried by the token.
    pub fn user(&self) -> User {
        User {
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// Decodes the payload segment of a compact token.
///
/// # Errors
///
/// Returns [`WoodstoveError::MalformedToken`] when the token does not have
/// exactly three segments, the payload is not valid base64, the payload is
/// not a JSON object, or any of `email`, `name`, `picture`, `exp` is missing
/// or has the wrong type.
pub fn decode(token: &str) -> Result<DecodedCredential, WoodstoveError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(WoodstoveError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let payload = decode_segment(segments[1])?;
    let claims: Claims = serde_json::from_slice(&payload)
        .map_err(|e| WoodstoveError::MalformedToken(format!("invalid payload claims: {e}")))?;

    Ok(DecodedCredential {
        email: claims.email,
        display_name: claims.name,
        avatar_url: claims.picture,
        expires_at_epoch_seconds: claims.exp,
    })
}

/// Base64url is canonical, but tokens produced by hand or by older tooling
/// sometimes use the standard alphabet and padding; both are accepted.
fn decode_segment(segment: &str) -> Result<Vec<u8>, WoodstoveError> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| WoodstoveError::MalformedToken(format!("invalid payload encoding: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    /// Builds an unsigned compact token around the given payload JSON.
    pub(crate) fn token_with_payload(payload: &str) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.sig",
            URL_SAFE_NO_PAD.encode(payload.as_bytes())
        )
    }

    pub(crate) fn token_expiring_at(exp: i64) -> String {
        token_with_payload(&format!(
            r#"{{"email":"a@b.com","name":"A","picture":"p","exp":{exp}}}"#
        ))
    }

    #[test]
    fn test_decode_valid_token_copies_claims() {
        let credential = decode(&token_expiring_at(9_999_999_999)).expect("decode");
        assert_eq!(credential.email, "a@b.com");
        assert_eq!(credential.display_name, "A");
        assert_eq!(credential.avatar_url, "p");
        assert_eq!(credential.expires_at_epoch_seconds, 9_999_999_999.0);
    }

    #[test]
    fn test_decode_ignores_signature_and_extra_claims() {
        let token = token_with_payload(
            r#"{"email":"x@y.z","name":"X","picture":"u","exp":1,"aud":"client","iss":"https://accounts.google.com"}"#,
        )
        .replace(".sig", ".not-a-real-signature");
        let credential = decode(&token).expect("decode");
        assert_eq!(credential.email, "x@y.z");
    }

    #[test]
    fn test_decode_accepts_padded_standard_alphabet() {
        let payload = r#"{"email":"a@b.com","name":"A?>","picture":"p","exp":9999999999}"#;
        let token = format!("h.{}.s", STANDARD_NO_PAD.encode(payload) + "==");
        let credential = decode(&token).expect("decode");
        assert_eq!(credential.display_name, "A?>");
    }

    #[test]
    fn test_decode_rejects_wrong_segment_count() {
        for token in ["", "onlyone", "two.parts", "a.b.c.d"] {
            let err = decode(token).unwrap_err();
            assert!(matches!(err, WoodstoveError::MalformedToken(_)), "{token}");
        }
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let err = decode("h.!!!not base64!!!.s").unwrap_err();
        assert!(err.to_string().contains("invalid payload encoding"));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = decode(&token_with_payload("{not json")).unwrap_err();
        assert!(matches!(err, WoodstoveError::MalformedToken(_)));
    }

    #[test]
    fn test_decode_rejects_non_object_payload() {
        let err = decode(&token_with_payload("[1,2,3]")).unwrap_err();
        assert!(matches!(err, WoodstoveError::MalformedToken(_)));
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let err = decode(&token_with_payload(r#"{"email":"a@b.com","name":"A","exp":1}"#))
            .unwrap_err();
        assert!(err.to_string().contains("picture"));
    }

    #[test]
    fn test_decode_rejects_mistyped_exp() {
        let err = decode(&token_with_payload(
            r#"{"email":"a@b.com","name":"A","picture":"p","exp":"soon"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, WoodstoveError::MalformedToken(_)));
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let at_now = decode(&token_expiring_at(1_700_000_000)).expect("decode");
        let later = decode(&token_expiring_at(1_700_000_001)).expect("decode");
        assert!(at_now.is_expired_at(now));
        assert!(!later.is_expired_at(now));
        assert!(later.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_fractional_exp_is_compared_in_millis() {
        let token = token_with_payload(
            r#"{"email":"a@b.com","name":"A","picture":"p","exp":1700000000.5}"#,
        );
        let credential = decode(&token).expect("decode");
        let now = DateTime::from_timestamp_millis(1_700_000_000_400).expect("valid timestamp");
        assert!(!credential.is_expired_at(now));
        assert!(credential.is_expired_at(now + Duration::milliseconds(100)));
    }

    #[test]
    fn test_user_and_expires_at() {
        let credential = decode(&token_expiring_at(1_800_000_000)).expect("decode");
        let user = credential.user();
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.display_name, "A");
        assert_eq!(user.avatar_url, "p");
        assert_eq!(
            credential.expires_at(),
            DateTime::from_timestamp(1_800_000_000, 0)
        );
    }
}
