//! Authentication middleware
//!
//! JWT authentication and the capability guard applied to each route group.
//! The token only identifies the account; role and active flag are read
//! from the users table on every request.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::{is_permitted, Capability, Role};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::decode_token;
use crate::services::UserService;
use crate::AppState;

/// Authenticated account as currently stored
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Option<Role>,
}

impl AuthUser {
    /// Check if the user's role grants a capability
    pub fn can(&self, capability: Capability) -> bool {
        is_permitted(self.role, capability)
    }

    /// Fail with `Forbidden` unless the role grants `capability`
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden(capability))
        }
    }
}

/// Authentication middleware that validates the bearer token and stores the
/// resulting [`AuthUser`] in the request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|header| header.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    let claims = match decode_token(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => {
            return AppError::Unauthorized("Invalid user ID in token".to_string()).into_response()
        }
    };

    let user = match UserService::new(state.db.clone()).get_user(user_id).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => {
            return AppError::Unauthorized("Account no longer exists".to_string()).into_response()
        }
        Err(err) => return err.into_response(),
    };

    if !user.is_active {
        tracing::info!(%user_id, "Rejected token for deactivated account");
        return AppError::Unauthorized("Account is disabled".to_string()).into_response();
    }

    if user.role != claims.role {
        tracing::debug!(
            %user_id,
            token_role = ?claims.role,
            role = ?user.role,
            "Role changed since token was issued"
        );
    }

    request.extensions_mut().insert(AuthUser {
        user_id,
        username: user.username,
        role: user.role,
    });

    next.run(request).await
}

/// Capability guard. Install with
/// `middleware::from_fn_with_state(Capability::RecordSales, require_capability)`
/// on a route group that sits behind [`auth_middleware`].
pub async fn require_capability(
    State(capability): State<Capability>,
    request: Request,
    next: Next,
) -> Response {
    let denied = match request.extensions().get::<AuthUser>() {
        Some(user) => match user.require(capability) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    user_id = %user.user_id,
                    role = ?user.role,
                    %capability,
                    "Capability denied"
                );
                Some(err)
            }
        },
        None => Some(AppError::Unauthorized("Authentication required".to_string())),
    };

    match denied {
        None => next.run(request).await,
        Some(err) => err.into_response(),
    }
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Option<Role>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "tester".to_string(),
            role,
        }
    }

    #[test]
    fn test_cashier_may_record_sales() {
        assert!(user(Some(Role::Cashier)).require(Capability::RecordSales).is_ok());
    }

    #[test]
    fn test_pharmacist_may_not_receive_stock() {
        let err = user(Some(Role::Pharmacist))
            .require(Capability::ReceiveStock)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(Capability::ReceiveStock)));
    }

    #[test]
    fn test_roleless_user_has_no_capability() {
        assert!(!user(None).can(Capability::ViewDashboard));
    }
}
