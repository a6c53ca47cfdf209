use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use uuid::Uuid;

use crate::auth::{TokenError, verify_token};
use crate::error::ApiError;
use crate::models::{AppState, Role};

/// The authenticated actor, decoded from the bearer token. Threaded into
/// handlers explicitly instead of being stashed on the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            // Extract Authorization: Bearer <token>
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::Unauthorized("Access token is required".into()))?;

            let claims = verify_token(&state.jwt_secret, authz.token()).map_err(|e| match e {
                TokenError::Expired => ApiError::Unauthorized("Token has expired".into()),
                TokenError::Invalid => ApiError::Unauthorized("Invalid token".into()),
            })?;

            if claims.email.is_empty() {
                return Err(ApiError::Unauthorized("Invalid token".into()));
            }
            let role = Role::parse(&claims.role)
                .ok_or_else(|| ApiError::Unauthorized("Invalid token".into()))?;

            Ok(AuthContext {
                user_id: claims.user_id,
                email: claims.email,
                role,
            })
        }
    }
}

/// Role gate. The 403 message enumerates what was required and what the
/// caller actually holds.
pub fn authorize(auth: &AuthContext, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&auth.role) {
        return Ok(());
    }
    let required = allowed
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ApiError::Forbidden(format!(
        "Access denied. Required roles: {required}. Your role: {}",
        auth.role.as_str()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            role,
        }
    }

    #[test]
    fn authorize_allows_listed_role() {
        assert!(authorize(&ctx(Role::Doctor), &[Role::Doctor]).is_ok());
        assert!(authorize(&ctx(Role::Patient), &[Role::Doctor, Role::Patient]).is_ok());
    }

    #[test]
    fn authorize_rejects_with_enumerating_message() {
        let err = authorize(&ctx(Role::Patient), &[Role::Doctor]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Access denied. Required roles: DOCTOR. Your role: PATIENT"
        );

        let err = authorize(&ctx(Role::Doctor), &[Role::Patient]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Access denied. Required roles: PATIENT. Your role: DOCTOR"
        );
    }
}
