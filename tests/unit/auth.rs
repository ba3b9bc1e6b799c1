use axum::http::{HeaderMap, HeaderValue, header};
use task_board::config::AuthConfig;
use task_board::error::AppError;
use task_board::middleware::auth::{TokenService, extract_access_token};
use uuid::Uuid;

fn token_service() -> TokenService {
    TokenService::new(AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        access_token_expires_in: 3600,
        refresh_token_expires_in: 14 * 24 * 3600,
        bcrypt_cost: 4,
    })
}

#[test]
fn access_token_carries_identity() {
    let service = token_service();
    let user_id = Uuid::new_v4();
    let issued = service
        .generate_access_token(user_id, "ada@example.com")
        .unwrap();
    assert_eq!(issued.expires_in, 3600);

    let claims = service.verify_access_token(&issued.token).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "ada@example.com");
    assert_eq!(claims.jti, issued.jti);
}

#[test]
fn each_token_gets_its_own_jti() {
    let service = token_service();
    let user_id = Uuid::new_v4();
    let a = service.generate_access_token(user_id, "a@example.com").unwrap();
    let b = service.generate_access_token(user_id, "a@example.com").unwrap();
    assert_ne!(a.jti, b.jti);
}

#[test]
fn refresh_token_is_rejected_as_access_token() {
    let service = token_service();
    let refresh = service.generate_refresh_token(Uuid::new_v4()).unwrap();
    assert!(service.verify_access_token(&refresh.token).is_err());
    assert!(service.verify_refresh_token(&refresh.token).is_ok());
}

#[test]
fn access_token_is_rejected_as_refresh_token() {
    let service = token_service();
    let access = service
        .generate_access_token(Uuid::new_v4(), "ada@example.com")
        .unwrap();
    let err = service.verify_refresh_token(&access.token).unwrap_err();
    assert!(matches!(err, AppError::Forbidden { .. }));
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let other = TokenService::new(AuthConfig {
        jwt_secret: "someone-else".to_string(),
        access_token_expires_in: 3600,
        refresh_token_expires_in: 3600,
        bcrypt_cost: 4,
    });
    let issued = other
        .generate_access_token(Uuid::new_v4(), "x@example.com")
        .unwrap();
    let err = token_service().verify_access_token(&issued.token).unwrap_err();
    assert!(!matches!(err, AppError::TokenExpired));
}

#[test]
fn bearer_header_wins_over_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
    headers.insert(header::COOKIE, HeaderValue::from_static("accessToken=from-cookie"));
    assert_eq!(extract_access_token(&headers).as_deref(), Some("from-header"));

    headers.remove(header::AUTHORIZATION);
    assert_eq!(extract_access_token(&headers).as_deref(), Some("from-cookie"));
}
