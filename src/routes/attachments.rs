use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;
use crate::db::models::api::ApiResponse;
use crate::middleware::auth::AuthUserInfo;
use crate::routes::{db_conn, multipart::read_file_field};
use crate::services::attachments_service::AttachmentsService;
use crate::services::context::RequestContext;

// 上传附件
pub async fn upload_attachment(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    let file = match read_file_field(&mut multipart, "file").await {
        Ok(file) => file,
        Err(err) => return err.into_response(),
    };

    match AttachmentsService::upload(
        &state.db,
        state.media.as_ref(),
        &ctx,
        card_id,
        file,
        state.config.max_upload_bytes,
    )
    .await
    {
        Ok(attachment) => {
            let response = ApiResponse::created(attachment, "Attachment uploaded successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn get_attachments(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match AttachmentsService::list(&mut conn, &ctx, card_id) {
        Ok(attachments) => {
            let response = ApiResponse::success(attachments, "Attachments retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    Path(attachment_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    match AttachmentsService::delete(&state.db, state.media.as_ref(), &ctx, attachment_id).await {
        Ok(()) => {
            let response = ApiResponse::<()>::ok("Attachment deleted successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
