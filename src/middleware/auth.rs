use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    AppState,
    cache,
    config::AuthConfig,
    db::{models::user::AuthUser, repositories::UserRepo},
    error::{AppError, AppResult},
};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

pub const ACCESS_TOKEN_TYPE: &str = "access";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user_id
    pub email: String,
    pub exp: u64,    // expiration time
    pub iat: u64,    // issued at
    pub jti: String, // JWT ID
    pub typ: String, // access | refresh
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub exp: u64,
    pub iat: u64,
    pub jti: String,
    pub typ: String,
}

impl RefreshClaims {
    pub fn remaining_ttl(&self) -> u64 {
        self.exp.saturating_sub(now_secs())
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub expires_in: u64,
}

/// JWT issuing and verification.
#[derive(Clone)]
pub struct TokenService {
    config: AuthConfig,
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn access_ttl(&self) -> u64 {
        self.config.access_token_expires_in
    }

    pub fn refresh_ttl(&self) -> u64 {
        self.config.refresh_token_expires_in
    }

    pub fn generate_access_token(&self, user_id: Uuid, email: &str) -> AppResult<IssuedToken> {
        let now = now_secs();
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            exp: now + self.config.access_token_expires_in,
            iat: now,
            jti: jti.clone(),
            typ: ACCESS_TOKEN_TYPE.to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(IssuedToken {
            token,
            jti,
            expires_in: self.config.access_token_expires_in,
        })
    }

    pub fn generate_refresh_token(&self, user_id: Uuid) -> AppResult<IssuedToken> {
        let now = now_secs();
        let jti = Uuid::new_v4().to_string();
        let claims = RefreshClaims {
            sub: user_id,
            exp: now + self.config.refresh_token_expires_in,
            iat: now,
            jti: jti.clone(),
            typ: REFRESH_TOKEN_TYPE.to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(IssuedToken {
            token,
            jti,
            expires_in: self.config.refresh_token_expires_in,
        })
    }

    /// Expired tokens map to `TokenExpired` (410) so clients know to refresh.
    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::auth("Unauthorized! (Token invalid)"),
        })
        .and_then(|data| {
            if data.claims.typ == ACCESS_TOKEN_TYPE {
                Ok(data.claims)
            } else {
                Err(AppError::auth("Unauthorized! (Token invalid)"))
            }
        })
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<RefreshClaims> {
        decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
        .filter(|claims| claims.typ == REFRESH_TOKEN_TYPE)
        .ok_or_else(|| AppError::forbidden("Please sign in! (Error from refresh token)"))
    }
}

/// Authenticated identity inserted by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUserInfo {
    pub user: AuthUser,
    pub jti: String,
    pub expires_at: u64,
}

impl AuthUserInfo {
    pub fn remaining_ttl(&self) -> u64 {
        self.expires_at.saturating_sub(now_secs())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUserInfo
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUserInfo>()
            .cloned()
            .ok_or_else(|| AppError::auth("Unauthorized! (Token not found)"))
    }
}

/// `Authorization: Bearer` first, then the `accessToken` cookie.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    from_header.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

pub fn refresh_token_from_cookies(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

fn session_cookie(name: &str, value: &str, max_age_secs: u64) -> Option<Cookie<'static>> {
    Cookie::parse(format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=None",
        name, value, max_age_secs
    ))
    .ok()
}

/// Both cookies live for the refresh token lifetime; the JWT expiry is what matters.
pub fn with_auth_cookies(
    jar: CookieJar,
    access_token: &str,
    refresh_token: Option<&str>,
    max_age_secs: u64,
) -> CookieJar {
    let mut jar = jar;
    if let Some(cookie) = session_cookie(ACCESS_TOKEN_COOKIE, access_token, max_age_secs) {
        jar = jar.add(cookie);
    }
    if let Some(refresh) = refresh_token {
        if let Some(cookie) = session_cookie(REFRESH_TOKEN_COOKIE, refresh, max_age_secs) {
            jar = jar.add(cookie);
        }
    }
    jar
}

pub fn without_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE, "").path("/").finish())
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE, "").path("/").finish())
}

/// Resolves a token's user through the redis cache, falling back to the database.
pub async fn resolve_user(state: &AppState, user_id: Uuid) -> AppResult<AuthUser> {
    match state.user_cache.get_user(user_id).await {
        Ok(Some(user)) => return Ok(user),
        Ok(None) => {}
        Err(e) => tracing::warn!(user_id = %user_id, "User cache unavailable: {}", e),
    }

    let pool = state.db.clone();
    let user = tokio::task::spawn_blocking(move || -> AppResult<Option<AuthUser>> {
        let mut conn = pool.get()?;
        Ok(UserRepo::find_by_id(&mut conn, user_id)?.map(|u| AuthUser::from(&u)))
    })
    .await
    .map_err(|e| AppError::internal(format!("User lookup task failed: {}", e)))??
    .ok_or_else(|| AppError::auth("Unauthorized! (User not found)"))?;

    if let Err(e) = state.user_cache.cache_user(&user).await {
        tracing::warn!(user_id = %user_id, "Failed to cache user: {}", e);
    }
    Ok(user)
}

pub async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUserInfo> {
    let claims = state.token_service.verify_access_token(token)?;

    match cache::is_token_revoked(&state.redis, &claims.jti).await {
        Ok(true) => return Err(AppError::auth("Unauthorized! (Token revoked)")),
        Ok(false) => {}
        Err(e) => tracing::warn!("Revoked-token check skipped: {}", e),
    }

    let user = resolve_user(state, claims.sub).await?;
    if !user.is_active {
        return Err(AppError::not_acceptable(
            "Your account is not active! Please verify your email",
        ));
    }

    Ok(AuthUserInfo {
        user,
        jti: claims.jti,
        expires_at: claims.exp,
    })
}

/// Refresh tokens are revoked at logout alongside the access token.
pub async fn authenticate_refresh(state: &AppState, token: &str) -> AppResult<RefreshClaims> {
    let claims = state.token_service.verify_refresh_token(token)?;

    match cache::is_token_revoked(&state.redis, &claims.jti).await {
        Ok(true) => return Err(AppError::forbidden("Please sign in! (Refresh token revoked)")),
        Ok(false) => {}
        Err(e) => tracing::warn!("Revoked-token check skipped: {}", e),
    }

    Ok(claims)
}

pub async fn auth_middleware<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Response {
    let token = match extract_access_token(request.headers()) {
        Some(token) => token,
        None => return AppError::auth("Unauthorized! (Token not found)").into_response(),
    };

    match authenticate(&state, &token).await {
        Ok(info) => {
            // 将用户信息添加到请求扩展中
            request.extensions_mut().insert(info);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service(access_ttl: u64) -> TokenService {
        TokenService::new(AuthConfig {
            jwt_secret: "test-secret".to_string(),
            access_token_expires_in: access_ttl,
            refresh_token_expires_in: 60,
            bcrypt_cost: 4,
        })
    }

    #[test]
    fn access_token_round_trip() {
        let svc = service(60);
        let user_id = Uuid::new_v4();
        let issued = svc.generate_access_token(user_id, "a@example.com").unwrap();
        let claims = svc.verify_access_token(&issued.token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn expired_access_token_maps_to_gone() {
        let svc = service(60);
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            exp: 1_000,
            iat: 900,
            jti: "old".to_string(),
            typ: ACCESS_TOKEN_TYPE.to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(svc.verify_access_token(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let svc = service(60);
        let refresh = svc.generate_refresh_token(Uuid::new_v4()).unwrap();
        assert!(svc.verify_access_token(&refresh.token).is_err());
        assert!(svc.verify_refresh_token(&refresh.token).is_ok());
        assert!(matches!(
            svc.verify_refresh_token("garbage"),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        let svc = service(60);
        let access = svc.generate_access_token(Uuid::new_v4(), "a@example.com").unwrap();
        assert!(matches!(
            svc.verify_refresh_token(&access.token),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn refresh_claims_report_remaining_ttl() {
        let svc = service(60);
        let refresh = svc.generate_refresh_token(Uuid::new_v4()).unwrap();
        let claims = svc.verify_refresh_token(&refresh.token).unwrap();
        assert_eq!(claims.jti, refresh.jti);
        let ttl = claims.remaining_ttl();
        assert!(ttl > 0 && ttl <= 60);
    }

    #[test]
    fn tokens_without_a_type_are_rejected() {
        #[derive(Serialize)]
        struct Untyped {
            sub: Uuid,
            email: String,
            exp: u64,
            iat: u64,
            jti: String,
        }
        let svc = service(60);
        let now = now_secs();
        let token = encode(
            &Header::default(),
            &Untyped {
                sub: Uuid::new_v4(),
                email: "a@example.com".to_string(),
                exp: now + 60,
                iat: now,
                jti: "legacy".to_string(),
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(svc.verify_access_token(&token).is_err());
        assert!(svc.verify_refresh_token(&token).is_err());
    }

    #[test]
    fn token_is_read_from_header_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("accessToken=from-cookie"));
        assert_eq!(extract_access_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_access_token(&headers).as_deref(), Some("from-header"));

        let empty = HeaderMap::new();
        assert!(extract_access_token(&empty).is_none());
    }

    #[test]
    fn auth_cookies_are_http_only() {
        let jar = with_auth_cookies(CookieJar::new(), "a", Some("r"), 100);
        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.value(), "a");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(jar.get(REFRESH_TOKEN_COOKIE).unwrap().value(), "r");
    }
}
