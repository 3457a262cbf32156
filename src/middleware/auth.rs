use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    services::user::UserService,
    utils::jwt::decode_token,
};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::DatabaseConnection;

/// Verified identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// Role of the current request. Resolution fails closed: any problem
/// with the bearer token degrades the caller to `Anonymous` instead of
/// rejecting the request, and each handler enforces the role it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(Identity),
    Admin(Identity),
}

impl Caller {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::User(identity) | Caller::Admin(identity) => Some(identity),
            Caller::Anonymous => None,
        }
    }

    /// At least an authenticated user. Required for create/submit.
    pub fn require_user(&self) -> AppResult<&Identity> {
        self.identity().ok_or(AppError::Unauthorized)
    }

    /// Admin only. Required for update/delete and report review.
    pub fn require_admin(&self) -> AppResult<&Identity> {
        match self {
            Caller::Admin(identity) => Ok(identity),
            Caller::User(_) => Err(AppError::Forbidden),
            Caller::Anonymous => Err(AppError::Unauthorized),
        }
    }
}

/// Resolves the caller role for every request and stores it in the
/// request extensions. Never rejects; role checks happen per handler.
pub async fn caller_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<AuthConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = resolve_caller(&db, &config, request.headers()).await;
    request.extensions_mut().insert(caller);
    next.run(request).await
}

async fn resolve_caller(db: &DatabaseConnection, config: &AuthConfig, headers: &HeaderMap) -> Caller {
    let Some(token) = extract_bearer_token(headers) else {
        return Caller::Anonymous;
    };

    let claims = match decode_token(&token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("Rejected bearer token: {}", err);
            return Caller::Anonymous;
        }
    };

    // First authenticated action creates the user row; afterwards this
    // is a plain lookup.
    let service = UserService::new(db.clone());
    let user = match service.ensure_exists(&claims.sub, &claims.email).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!("Could not resolve user '{}': {}", claims.sub, err);
            return Caller::Anonymous;
        }
    };

    let identity = Identity {
        id: user.id.clone(),
        email: user.email,
    };

    if user.is_admin || config.is_admin_subject(&identity.id) {
        Caller::Admin(identity)
    } else {
        Caller::User(identity)
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Caller>()
            .cloned()
            .unwrap_or(Caller::Anonymous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: "subject-1".to_string(),
            email: "user@example.org".to_string(),
        }
    }

    #[test]
    fn anonymous_cannot_mutate() {
        assert!(matches!(
            Caller::Anonymous.require_user(),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            Caller::Anonymous.require_admin(),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn user_is_not_admin() {
        let caller = Caller::User(identity());
        assert!(caller.require_user().is_ok());
        assert!(matches!(caller.require_admin(), Err(AppError::Forbidden)));
    }

    #[test]
    fn admin_is_also_a_user() {
        let caller = Caller::Admin(identity());
        assert!(caller.require_user().is_ok());
        assert!(caller.require_admin().is_ok());
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc.def.ghi".parse().unwrap(),
        );
        assert_eq!(
            extract_bearer_token(&headers),
            Some("abc.def.ghi".to_string())
        );

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
