use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;

use crate::error::Error;
use crate::models::Identity;

// The identity segment is plain base64; servers differ on whether they pad it.
const FRONT_TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes the identity carried in the first segment of a front token.
pub fn decode_identity(front_token: &str) -> Result<Identity, Error> {
    let segment = front_token.split('.').next().unwrap_or_default();
    let bytes = FRONT_TOKEN_ENGINE
        .decode(segment.trim())
        .map_err(|e| Error::Decode(format!("Invalid front token encoding: {}", e)))?;
    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Decode(format!("Invalid front token payload: {}", e)))?;

    // Other claim shapes are tolerated; only a usable uid is required.
    let user_id = match claims.get("uid") {
        Some(Value::String(uid)) if !uid.is_empty() => uid.clone(),
        Some(Value::Number(uid)) => uid.to_string(),
        _ => return Err(Error::Decode("Front token has no uid".into())),
    };
    let email = claims
        .get("up")
        .and_then(|up| up.get("email"))
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .map(str::to_string);

    Ok(Identity::new(user_id, email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose;
    use serde_json::json;

    fn front_token(payload: serde_json::Value) -> String {
        let encoded = general_purpose::STANDARD.encode(payload.to_string());
        format!("{}.1700000000000.V2", encoded)
    }

    #[test]
    fn test_decode_identity_with_email() {
        let token = front_token(json!({"uid": "u1", "up": {"email": "a@b.com"}}));
        let identity = decode_identity(&token).expect("identity should decode");
        assert_eq!(
            identity,
            Identity {
                user_id: "u1".to_string(),
                email: Some("a@b.com".to_string()),
                username: "u1".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_identity_without_profile() {
        let token = front_token(json!({"uid": "u2", "ate": 1700000000000u64}));
        let identity = decode_identity(&token).expect("identity should decode");
        assert_eq!(identity.user_id, "u2");
        assert_eq!(identity.email, None);
    }

    #[test]
    fn test_decode_identity_unpadded_segment() {
        let encoded = general_purpose::STANDARD_NO_PAD.encode(r#"{"uid":"u3"}"#);
        let identity = decode_identity(&encoded).expect("unpadded segment should decode");
        assert_eq!(identity.username, "u3");
    }

    #[test]
    fn test_decode_identity_rejects_malformed() {
        assert!(decode_identity("%%%.x.y").is_err());
        assert!(decode_identity("").is_err());
        let not_json = general_purpose::STANDARD.encode("not json");
        assert!(decode_identity(&not_json).is_err());
        let no_uid = front_token(json!({"up": {"email": "a@b.com"}}));
        assert!(matches!(decode_identity(&no_uid), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_identity_tolerates_odd_claim_shapes() {
        let numeric = front_token(json!({"uid": 42, "up": {"email": "n@b.com"}}));
        let identity = decode_identity(&numeric).expect("numeric uid should decode");
        assert_eq!(identity.user_id, "42");
        assert_eq!(identity.email.as_deref(), Some("n@b.com"));

        let string_profile = front_token(json!({"uid": "u4", "up": "opaque"}));
        assert_eq!(decode_identity(&string_profile).expect("should decode").email, None);

        let array_profile = front_token(json!({"uid": "u5", "up": ["a@b.com"]}));
        assert_eq!(decode_identity(&array_profile).expect("should decode").user_id, "u5");

        let odd_email = front_token(json!({"uid": "u6", "up": {"email": 7}}));
        assert_eq!(decode_identity(&odd_email).expect("should decode").email, None);
    }
}
