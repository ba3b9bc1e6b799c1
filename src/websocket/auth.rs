use axum::http::HeaderMap;
use serde::Deserialize;

use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::auth::{AuthUserInfo, authenticate, extract_access_token},
};

#[derive(Debug, Deserialize)]
pub struct WebSocketAuthQuery {
    pub token: Option<String>,
}

/// Query-string token first; browsers may instead send the auth cookie with the upgrade.
pub fn socket_token(query: &WebSocketAuthQuery, headers: &HeaderMap) -> Option<String> {
    query
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| extract_access_token(headers))
}

/// A refused upgrade is always 401; REST callers still see 410 and 406.
pub fn socket_auth_error(err: AppError) -> AppError {
    match err {
        AppError::TokenExpired => AppError::auth("Token expired"),
        AppError::NotAcceptable { message } => AppError::auth(message),
        other => other,
    }
}

/// 验证WebSocket连接的JWT token
pub async fn authenticate_socket(
    state: &AppState,
    query: &WebSocketAuthQuery,
    headers: &HeaderMap,
) -> AppResult<AuthUserInfo> {
    let token = socket_token(query, headers)
        .ok_or_else(|| AppError::auth("Missing authentication token"))?;
    authenticate(state, &token).await.map_err(socket_auth_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn query_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("accessToken=cookie-token"));

        let query = WebSocketAuthQuery { token: Some("query-token".to_string()) };
        assert_eq!(socket_token(&query, &headers).as_deref(), Some("query-token"));

        let blank = WebSocketAuthQuery { token: Some("  ".to_string()) };
        assert_eq!(socket_token(&blank, &headers).as_deref(), Some("cookie-token"));

        let none = WebSocketAuthQuery { token: None };
        assert!(socket_token(&none, &HeaderMap::new()).is_none());
    }

    #[test]
    fn expired_and_inactive_refusals_are_unauthorized() {
        use axum::http::StatusCode;

        let expired = socket_auth_error(AppError::TokenExpired);
        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);

        let inactive = socket_auth_error(AppError::not_acceptable("Your account is not active!"));
        assert_eq!(inactive.status_code(), StatusCode::UNAUTHORIZED);
        assert!(inactive.to_string().contains("not active"));

        let missing_user = socket_auth_error(AppError::auth("Unauthorized! (User not found)"));
        assert_eq!(missing_user.status_code(), StatusCode::UNAUTHORIZED);
    }
}
