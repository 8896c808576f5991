//! # Authentication Module
//!
//! Verifies bearer tokens issued by the hosted identity provider and enforces
//! which roles may reach which routes.
//!
//! Tokens are HS256 JWTs carrying the caller's id (`sub`), role and optional
//! display name. A verified caller is stored in the request extensions as an
//! [`AuthUser`] for handlers to pick up with `Extension<AuthUser>`.
//!
//! Route-level rules live in [`route_policy`]. Rules that depend on the
//! resource being touched (a provider editing only their own settings, a
//! patient cancelling only their own appointment) are checked in the handlers.

use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use medshare_core::{errors::ShareError, models::provider::Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, config::ApiConfig, middleware::error_handling::AppError};

/// Claims carried by identity provider tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub name: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            name: claims.name,
        }
    }
}

/// Who may call a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

impl RoutePolicy {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            RoutePolicy::Public | RoutePolicy::Authenticated => true,
            RoutePolicy::Roles(roles) => roles.contains(&role),
        }
    }
}

/// Decides the access rule for a request line.
///
/// Anything not listed explicitly requires a signed-in caller of any role.
pub fn route_policy(method: &Method, path: &str) -> RoutePolicy {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match segments.as_slice() {
        ["health"] | ["version"] => RoutePolicy::Public,
        ["api", "providers", _, "working-hours"] if *method == Method::PUT => {
            RoutePolicy::Roles(&[Role::Provider, Role::Admin])
        }
        ["api", "appointments"] if *method == Method::POST => {
            RoutePolicy::Roles(&[Role::Patient, Role::Admin])
        }
        _ => RoutePolicy::Authenticated,
    }
}

/// Verifies a token and returns its claims.
pub fn verify_token(config: &ApiConfig, token: &str) -> Result<Claims, ShareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    match &config.jwt_audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ShareError::Authentication(format!("Invalid token: {}", e)))
}

/// Signs claims with the shared secret, as the identity provider does.
pub fn issue_token(config: &ApiConfig, claims: &Claims) -> eyre::Result<String> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok(token)
}

/// Authentication and role authorization middleware
///
/// Public routes pass straight through. Every other route needs a valid
/// `Authorization: Bearer <token>` header (401 otherwise) and a role the
/// route's policy permits (403 otherwise).
pub async fn require_auth(
    State(state): State<Arc<ApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let policy = route_policy(request.method(), request.uri().path());
    if policy == RoutePolicy::Public {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ShareError::Authentication("Missing bearer token".to_string()))?;

    let user = AuthUser::from(verify_token(&state.config, token.trim())?);

    if !policy.permits(user.role) {
        tracing::warn!(
            user_id = %user.user_id,
            role = %user.role,
            path = %request.uri().path(),
            "Role not permitted for route"
        );
        return Err(AppError(ShareError::Authorization(format!(
            "Role '{}' may not access this resource",
            user.role
        ))));
    }

    tracing::debug!(user_id = %user.user_id, role = %user.role, "Authenticated request");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
