use axum::{
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use medshare_api::middleware::{
    auth::{Claims, RoutePolicy, issue_token, route_policy, verify_token},
    error_handling::AppError,
};
use medshare_core::{errors::ShareError, models::provider::Role};
use medshare_db::MockClinicStore;
use pretty_assertions::assert_eq;
use rstest::rstest;
use uuid::Uuid;

use crate::test_utils::*;

#[rstest]
#[case(ShareError::NotFound("Resource not found".into()), StatusCode::NOT_FOUND)]
#[case(ShareError::Validation("Invalid input".into()), StatusCode::BAD_REQUEST)]
#[case(ShareError::InvalidConfiguration("end before start".into()), StatusCode::BAD_REQUEST)]
#[case(ShareError::InvalidRange("too long".into()), StatusCode::BAD_REQUEST)]
#[case(ShareError::Conflict("slot taken".into()), StatusCode::CONFLICT)]
#[case(ShareError::Authentication("Invalid token".into()), StatusCode::UNAUTHORIZED)]
#[case(ShareError::Authorization("Not authorized".into()), StatusCode::FORBIDDEN)]
#[case(ShareError::Database(eyre::eyre!("Database error")), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(
    ShareError::Internal(Box::new(std::io::Error::other("Internal error"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_handling_status(#[case] error: ShareError, #[case] expected: StatusCode) {
    let response = AppError(error).into_response();
    assert_eq!(response.status(), expected);
}

#[rstest]
#[case(Method::GET, "/health", RoutePolicy::Public)]
#[case(Method::GET, "/version", RoutePolicy::Public)]
#[case(Method::GET, "/api/providers/abc/availability", RoutePolicy::Authenticated)]
#[case(Method::GET, "/api/providers/abc/working-hours", RoutePolicy::Authenticated)]
#[case(
    Method::PUT,
    "/api/providers/abc/working-hours",
    RoutePolicy::Roles(&[Role::Provider, Role::Admin])
)]
#[case(Method::POST, "/api/appointments", RoutePolicy::Roles(&[Role::Patient, Role::Admin]))]
#[case(Method::POST, "/api/appointments/abc/cancel", RoutePolicy::Authenticated)]
fn test_route_policy(#[case] method: Method, #[case] path: &str, #[case] expected: RoutePolicy) {
    assert_eq!(route_policy(&method, path), expected);
}

#[test]
fn test_role_policy_permits() {
    let policy = RoutePolicy::Roles(&[Role::Patient, Role::Admin]);
    assert!(policy.permits(Role::Patient));
    assert!(policy.permits(Role::Admin));
    assert!(!policy.permits(Role::Provider));
    assert!(RoutePolicy::Authenticated.permits(Role::Provider));
}

#[test]
fn test_verify_token_round_trip() {
    let config = test_config();
    let user_id = Uuid::new_v4();
    let claims = Claims {
        sub: user_id,
        role: Role::Provider,
        name: Some("Dr. Grey".to_string()),
        exp: (Utc::now() + Duration::minutes(5)).timestamp() as usize,
        aud: None,
    };

    let token = issue_token(&config, &claims).unwrap();
    let verified = verify_token(&config, &token).unwrap();

    assert_eq!(verified.sub, user_id);
    assert_eq!(verified.role, Role::Provider);
}

#[test]
fn test_verify_token_rejects_expired_and_foreign_tokens() {
    let config = test_config();
    let expired = Claims {
        sub: Uuid::new_v4(),
        role: Role::Patient,
        name: None,
        exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
        aud: None,
    };
    let token = issue_token(&config, &expired).unwrap();
    assert!(matches!(
        verify_token(&config, &token),
        Err(ShareError::Authentication(_))
    ));

    let mut other = test_config();
    other.jwt_secret = "someone-else".to_string();
    let fresh = Claims {
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        ..expired
    };
    let foreign = issue_token(&other, &fresh).unwrap();
    assert!(matches!(
        verify_token(&config, &foreign),
        Err(ShareError::Authentication(_))
    ));
}

#[test]
fn test_verify_token_checks_audience_when_configured() {
    let mut config = test_config();
    config.jwt_audience = Some("medshare".to_string());
    let mut claims = Claims {
        sub: Uuid::new_v4(),
        role: Role::Patient,
        name: None,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        aud: Some("billing".to_string()),
    };

    let token = issue_token(&config, &claims).unwrap();
    assert!(verify_token(&config, &token).is_err());

    claims.aud = Some("medshare".to_string());
    let token = issue_token(&config, &claims).unwrap();
    assert!(verify_token(&config, &token).is_ok());
}

#[tokio::test]
async fn test_health_is_public() {
    let response = server(MockClinicStore::new()).get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<serde_json::Value>()["status"], "ok");
}

#[tokio::test]
async fn test_version_reports_package() {
    let response = server(MockClinicStore::new()).get("/version").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["service"], "medshare-api");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let mut store = MockClinicStore::new();
    store.expect_get_provider().never();

    let response = server(store)
        .get(&format!("/api/providers/{}/availability", Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let mut store = MockClinicStore::new();
    store.expect_get_provider().never();

    let response = server(store)
        .get(&format!("/api/providers/{}/working-hours", Uuid::new_v4()))
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body = response.json::<serde_json::Value>();
    assert!(body["error"].as_str().unwrap().starts_with("Authentication error"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = server(MockClinicStore::new()).get("/api/unknown").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
