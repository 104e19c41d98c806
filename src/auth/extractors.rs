use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::claims::{Identity, Role};
use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

/// Identity of a caller that presented a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

/// Identity of an authenticated caller holding the admin role.
///
/// Only constructible from an [`AuthUser`], so the role check can never run
/// ahead of token verification.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Identity);

/// Reads `Authorization: Bearer <token>`. Anything else is malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenError::Malformed)?
        .to_str()
        .map_err(|_| TokenError::Malformed)?;

    let token = value.strip_prefix("Bearer ").ok_or(TokenError::Malformed)?;
    if token.is_empty() || token.contains(' ') {
        return Err(TokenError::Malformed);
    }
    Ok(token)
}

/// Insufficient privilege renders exactly like a bad token.
pub fn require_role(identity: &Identity, required: Role) -> Result<(), AppError> {
    if identity.has_role(required) {
        Ok(())
    } else {
        warn!(user_id = identity.user_id, role = %identity.role, required = %required, "role check failed");
        Err(AppError::InvalidToken)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let identity = bearer_token(&parts.headers)
            .and_then(|token| keys.verify(token))
            .map_err(|e| {
                warn!(error = %e, "authentication failed");
                AppError::from(e)
            })?;
        Ok(AuthUser(identity))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        require_role(&identity, Role::Admin)?;
        Ok(AdminUser(identity))
    }
}
