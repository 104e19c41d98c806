use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Serialize;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity, Role};
use crate::{config::JwtConfig, state::AppState};

pub const AUTHENTICATION_SCOPE: &str = "authentication";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token signing failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// An issued bearer token. Only the signed value and expiry reach the client.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub signed: String,
    #[serde(skip)]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
}

/// HS256 keys derived from the signing secret, plus the default token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self::from_secret(cfg.secret.as_bytes(), Duration::hours(cfg.ttl_hours))
    }

    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(
        &self,
        subject: i64,
        role: Role,
        ttl: Duration,
        scope: &str,
    ) -> Result<Token, TokenError> {
        // Whole seconds, so expiry == issued_at + ttl survives the round trip.
        let now = OffsetDateTime::now_utc();
        let issued_at = now - Duration::nanoseconds(now.nanosecond() as i64);
        let expiry = issued_at + ttl;

        let claims = Claims {
            sub: subject.to_string(),
            role,
            scope: scope.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: expiry.unix_timestamp(),
        };
        let signed = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Encoding)?;
        debug!(user_id = subject, %role, scope, "jwt signed");

        Ok(Token {
            signed,
            issued_at,
            expiry,
        })
    }

    pub fn issue_authentication(&self, subject: i64, role: Role) -> Result<Token, TokenError> {
        self.issue(subject, role, self.ttl, AUTHENTICATION_SCOPE)
    }

    /// Verifies an authentication-scope token.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_scoped(token, AUTHENTICATION_SCOPE)
    }

    pub fn verify_scoped(&self, token: &str, scope: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp == now still counts as valid.
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            }
        })?;
        let claims = data.claims;

        if claims.scope != scope {
            return Err(TokenError::Malformed);
        }
        let user_id = match claims.sub.parse::<i64>() {
            Ok(id) if id >= 1 => id,
            _ => return Err(TokenError::Malformed),
        };

        debug!(user_id, role = %claims.role, "jwt verified");
        Ok(Identity {
            user_id,
            role: claims.role,
        })
    }
}
