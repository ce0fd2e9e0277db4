//! Identity token decoding.
//!
//! The token's payload segment is read for profile claims only. The
//! signature is not checked here; the token comes straight from the
//! identity provider's sign-in flow and is trusted as such.

use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// The signed-in user's public profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

/// Extract the profile claims from a JWT-shaped identity token.
pub fn decode_id_token(token: &str) -> Result<UserProfile, AuthError> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_header), Some(payload), Some(_signature)) if !payload.is_empty() => payload,
        _ => {
            return Err(AuthError::InvalidToken(
                "expected three dot-separated segments".to_string(),
            ))
        }
    };

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidToken(format!("payload is not base64url: {}", e)))?;

    serde_json::from_slice::<UserProfile>(&bytes)
        .map_err(|e| AuthError::InvalidToken(format!("payload claims: {}", e)))
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_decode_profile() {
        let token = encode_test_token(&serde_json::json!({
            "iss": "https://accounts.google.com",
            "email": "ada@example.com",
            "name": "Ada Lovelace",
            "picture": "https://example.com/ada.png",
            "exp": 1999999999
        }));

        let profile = decode_id_token(&token).unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.name, "Ada Lovelace");
        assert_eq!(profile.picture, "https://example.com/ada.png");
    }

    #[test]
    fn test_missing_optional_claims() {
        let token = encode_test_token(&serde_json::json!({ "email": "a@b.c" }));
        let profile = decode_id_token(&token).unwrap();
        assert_eq!(profile.name, "");
        assert_eq!(profile.picture, "");
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let payload = general_purpose::URL_SAFE.encode(r#"{"email":"x@y.z"}"#);
        let token = format!("h.{}.s", payload);
        assert_eq!(decode_id_token(&token).unwrap().email, "x@y.z");
    }

    #[test]
    fn test_malformed_tokens() {
        for token in ["", "abc", "a.b", "a..c", "a.!!!.c"] {
            let err = decode_id_token(token).unwrap_err();
            assert_eq!(err.to_string(), "Failed to decode user information");
        }
    }

    #[test]
    fn test_payload_without_email() {
        let token = encode_test_token(&serde_json::json!({ "name": "Nobody" }));
        assert!(decode_id_token(&token).is_err());
    }
}
