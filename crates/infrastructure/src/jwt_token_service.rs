//! HS256 token service for sign-up and session tokens.
//!
//! Both token kinds share one secret; the `purpose` claim keeps a sign-up
//! token from being replayed as a session and vice versa. Sign-up tokens are
//! minted by the external-provider exchange, which holds the same secret;
//! this service only decodes them.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use wordhoard_application::{IdentityTokenDecoder, SessionTokenIssuer, SignupClaims};
use wordhoard_core::{AppError, AppResult};
use wordhoard_domain::UserId;

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

const SIGNUP_PURPOSE: &str = "signup";
const SESSION_PURPOSE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct SignupTokenClaims {
    purpose: String,
    provider: String,
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionTokenClaims {
    purpose: String,
    sub: String,
    iat: i64,
    exp: i64,
}

/// JSON Web Token adapter for the identity and session token ports.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
}

impl JwtTokenService {
    /// Creates a service signing with `secret`; session tokens live for
    /// `session_ttl`.
    pub fn new(secret: &str, session_ttl: Duration) -> AppResult<Self> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::validation(format!(
                "token secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }
        if session_ttl <= Duration::zero() {
            return Err(AppError::validation("session token lifetime must be positive"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            session_ttl,
        })
    }

    /// Resolves a session token to the user it was issued for.
    pub fn verify_session_token(&self, token: &str) -> AppResult<UserId> {
        let claims = decode::<SessionTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Unauthorized("invalid or expired session token".to_owned()))?
            .claims;

        if claims.purpose != SESSION_PURPOSE {
            return Err(AppError::Unauthorized("not a session token".to_owned()));
        }

        UserId::parse(&claims.sub)
            .map_err(|_| AppError::Unauthorized("session token subject is malformed".to_owned()))
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign token: {error}")))
    }
}

impl IdentityTokenDecoder for JwtTokenService {
    fn decode_signup_token(&self, token: &str) -> AppResult<SignupClaims> {
        let claims = decode::<SignupTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Unauthorized("invalid or expired sign-up token".to_owned()))?
            .claims;

        if claims.purpose != SIGNUP_PURPOSE {
            return Err(AppError::Unauthorized("not a sign-up token".to_owned()));
        }

        Ok(SignupClaims {
            provider: claims.provider,
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }
}

impl SessionTokenIssuer for JwtTokenService {
    fn issue_session_token(&self, user_id: UserId) -> AppResult<String> {
        let issued_at = Utc::now();
        self.sign(&SessionTokenClaims {
            purpose: SESSION_PURPOSE.to_owned(),
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.session_ttl).timestamp(),
        })
    }
}
