use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::AppState;
use crate::cache;
use crate::db::models::api::ApiResponse;
use crate::db::models::user::{
    LoginRequest, RefreshTokenRequest, RegisterRequest, UpdateUserRequest, VerifyAccountRequest,
};
use crate::error::AppError;
use crate::mail;
use crate::middleware::auth::{
    AuthUserInfo, authenticate_refresh, refresh_token_from_cookies, with_auth_cookies,
    without_auth_cookies,
};
use crate::routes::{db_conn, multipart::read_file_field};
use crate::services::auth_service::AuthService;
use crate::services::context::RequestContext;
use crate::storage::ResourceType;
use crate::validation::{ValidatedJson, upload::validate_image_upload};

const AVATAR_FOLDER: &str = "users";

// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> impl IntoResponse {
    let user = {
        let mut conn = match db_conn(&state) {
            Ok(conn) => conn,
            Err(response) => return response,
        };
        match AuthService::register(&mut conn, &payload, state.config.bcrypt_cost) {
            Ok(user) => user,
            Err(err) => return err.into_response(),
        }
    };

    if let Some(token) = user.verify_token.as_deref() {
        let email = mail::verification_email(&state.config.website_domain, &user.email, token);
        if let Err(e) = state.mailer.send(email).await {
            tracing::warn!(user_id = %user.id, "Failed to send verification email: {}", e);
        }
    }

    let response = ApiResponse::created(user, "Account created. Please check your email to verify it");
    (StatusCode::CREATED, Json(response)).into_response()
}

// 验证账户
pub async fn verify_account(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<VerifyAccountRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match AuthService::verify_account(&mut conn, &payload) {
        Ok(user) => {
            let response = ApiResponse::success(user, "Account verified successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match AuthService::login(&mut conn, &state.token_service, &payload) {
        Ok((login, refresh)) => {
            let jar = with_auth_cookies(
                jar,
                &login.access_token,
                Some(&refresh.token),
                refresh.expires_in,
            );
            let response = ApiResponse::success(login, "Login successful");
            (jar, (StatusCode::OK, Json(response))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 登出
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Err(e) =
        cache::revoke_token(&state.redis, &auth_info.jti, auth_info.remaining_ttl()).await
    {
        tracing::error!(user_id = %auth_info.user.id, "Failed to revoke token on logout: {}", e);
    }
    if let Some(refresh) = refresh_token_from_cookies(&jar) {
        if let Ok(claims) = state.token_service.verify_refresh_token(&refresh) {
            if let Err(e) = cache::revoke_token(&state.redis, &claims.jti, claims.remaining_ttl()).await
            {
                tracing::error!(user_id = %auth_info.user.id, "Failed to revoke refresh token on logout: {}", e);
            }
        }
    }
    if let Err(e) = state.user_cache.invalidate_user(auth_info.user.id).await {
        tracing::warn!(user_id = %auth_info.user.id, "Failed to invalidate user cache: {}", e);
    }

    let jar = without_auth_cookies(jar);
    let response = ApiResponse::<()>::ok("Logout successful");
    (jar, (StatusCode::OK, Json(response))).into_response()
}

// 刷新token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> impl IntoResponse {
    let token = refresh_token_from_cookies(&jar)
        .or_else(|| body.and_then(|Json(req)| req.refresh_token))
        .filter(|t| !t.is_empty());
    let Some(token) = token else {
        return AppError::forbidden("Please sign in! (Refresh token not found)").into_response();
    };

    let claims = match authenticate_refresh(&state, &token).await {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match AuthService::refresh(&mut conn, &state.token_service, &claims) {
        Ok(refreshed) => {
            let jar = with_auth_cookies(
                jar,
                &refreshed.access_token,
                None,
                state.token_service.refresh_ttl(),
            );
            let response = ApiResponse::success(refreshed, "Token refreshed successfully");
            (jar, (StatusCode::OK, Json(response))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取当前用户信息
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match AuthService::profile(&mut conn, &ctx) {
        Ok(user) => {
            let response = ApiResponse::success(user, "Profile retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 更新用户信息
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);
    let result = match db_conn(&state) {
        Ok(mut conn) => AuthService::update(&mut conn, &ctx, &payload, state.config.bcrypt_cost),
        Err(response) => return response,
    };

    match result {
        Ok(user) => {
            if let Err(e) = state.user_cache.invalidate_user(user.id).await {
                tracing::warn!(user_id = %user.id, "Failed to invalidate user cache: {}", e);
            }
            let response = ApiResponse::success(user, "Profile updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 更新头像
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    let file = match read_file_field(&mut multipart, "avatar").await {
        Ok(file) => file,
        Err(err) => return err.into_response(),
    };
    if let Err(err) = validate_image_upload(&file.content_type, file.bytes.len(), state.config.max_upload_bytes) {
        return err.into_response();
    }

    let media = match state
        .media
        .upload(file.into_request(AVATAR_FOLDER, ResourceType::Image))
        .await
    {
        Ok(media) => media,
        Err(err) => return err.into_response(),
    };

    let result = match db_conn(&state) {
        Ok(mut conn) => AuthService::set_avatar(&mut conn, &ctx, &media.url, &media.public_id),
        Err(response) => return response,
    };

    match result {
        Ok((user, previous)) => {
            if let Some(previous) = previous {
                if let Err(e) = state.media.destroy(&previous, ResourceType::Image).await {
                    tracing::warn!(user_id = %user.id, public_id = %previous, "Failed to remove old avatar: {}", e);
                }
            }
            if let Err(e) = state.user_cache.invalidate_user(user.id).await {
                tracing::warn!(user_id = %user.id, "Failed to invalidate user cache: {}", e);
            }
            let response = ApiResponse::success(user, "Avatar updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
