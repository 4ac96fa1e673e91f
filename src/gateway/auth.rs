use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity established for a connection once a token verifies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub user_id: i64,
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token is malformed or its signature does not verify")]
    InvalidToken,
    #[error("{0} key-id resolution is not implemented for this core's scope")]
    Unsupported(&'static str),
}

/// Resolves the key material used to verify a connection's bearer token.
/// Mirrors the source's multi-source key lookup (static secret, PEM file,
/// JWKS by key id) as a policy enum behind one verification method; only
/// `Static` has a concrete implementation here; `Pem`/`Jwks` are deferred
/// per the identity-provider non-goal and exist so the seam is complete.
#[derive(Clone, Debug)]
pub enum AuthVerifier {
    Static { secret: String },
    Pem { public_key_pem: String },
    Jwks { jwks_url: String },
}

impl AuthVerifier {
    pub fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        match self {
            AuthVerifier::Static { secret } => {
                let key = DecodingKey::from_secret(secret.as_bytes());
                let mut validation = Validation::new(Algorithm::HS256);
                validation.required_spec_claims.clear();
                validation.validate_exp = false;
                let data = decode::<AuthClaims>(token, &key, &validation)
                    .map_err(|_| AuthError::InvalidToken)?;
                Ok(data.claims)
            }
            AuthVerifier::Pem { .. } => Err(AuthError::Unsupported("pem")),
            AuthVerifier::Jwks { .. } => Err(AuthError::Unsupported("jwks")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[test]
    fn static_verifier_accepts_a_token_signed_with_its_own_secret() {
        let verifier = AuthVerifier::Static {
            secret: "test-secret".to_string(),
        };
        let claims = AuthClaims {
            user_id: 99,
            exp: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let verified = verifier.verify(&token).unwrap();
        assert_eq!(verified.user_id, 99);
    }

    #[test]
    fn static_verifier_rejects_a_token_signed_with_a_different_secret() {
        let verifier = AuthVerifier::Static {
            secret: "test-secret".to_string(),
        };
        let claims = AuthClaims {
            user_id: 99,
            exp: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"wrong-secret"),
        )
        .unwrap();

        assert!(verifier.verify(&token).is_err());
    }
}
