use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: f64,
}

/// Reads the `exp` claim of a JWT access token.
///
/// The signature is not checked and an already expired token still decodes:
/// the client only needs the server's stated lifetime, not proof of it.
pub fn decode_expiry(access_token: &str) -> Result<DateTime<Utc>, Error> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let decoded = decode::<ExpiryClaim>(access_token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| Error::Decode(format!("Failed to decode access token: {}", e)))?;

    let exp = decoded.claims.exp;
    if !exp.is_finite() {
        return Err(Error::Decode("exp claim is not a finite number".into()));
    }
    DateTime::from_timestamp(exp.trunc() as i64, 0)
        .ok_or_else(|| Error::Decode(format!("exp claim {} is out of range", exp)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    fn mint(exp: i64) -> String {
        let claims = Claims {
            sub: "u1".to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .expect("Failed to encode JWT")
    }

    #[test]
    fn test_decode_expiry_reads_exp() {
        let exp = Utc::now().timestamp() + 900;
        let expiry = decode_expiry(&mint(exp)).expect("token should decode");
        assert_eq!(expiry.timestamp(), exp);
    }

    #[test]
    fn test_decode_expiry_accepts_expired_tokens() {
        let exp = Utc::now().timestamp() - 3600;
        let expiry = decode_expiry(&mint(exp)).expect("expired token should still decode");
        assert_eq!(expiry.timestamp(), exp);
    }

    #[test]
    fn test_decode_expiry_rejects_garbage() {
        assert!(matches!(decode_expiry("opaque-token"), Err(Error::Decode(_))));
        assert!(matches!(decode_expiry("a.b.c"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_expiry_requires_exp() {
        #[derive(Serialize)]
        struct NoExp {
            sub: String,
        }
        let token = encode(
            &Header::default(),
            &NoExp {
                sub: "u1".to_string(),
            },
            &EncodingKey::from_secret(b"secret"),
        )
        .expect("Failed to encode JWT");
        assert!(decode_expiry(&token).is_err());
    }
}
