use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;
use crate::db::models::api::ApiResponse;
use crate::db::models::column::{CreateColumnRequest, DeleteColumnResult, UpdateColumnRequest};
use crate::middleware::auth::AuthUserInfo;
use crate::routes::db_conn;
use crate::services::attachments_service::AttachmentsService;
use crate::services::columns_service::ColumnsService;
use crate::services::context::RequestContext;
use crate::validation::ValidatedJson;

pub async fn create_column(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<CreateColumnRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ColumnsService::create(&mut conn, &ctx, &payload) {
        Ok(column) => {
            let response = ApiResponse::created(column, "Column created successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn update_column(
    State(state): State<Arc<AppState>>,
    Path(column_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateColumnRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ColumnsService::update(&mut conn, &ctx, column_id, &payload) {
        Ok(column) => {
            let response = ApiResponse::success(column, "Column updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 删除列及其卡片，附件在提交后清理
pub async fn delete_column(
    State(state): State<Arc<AppState>>,
    Path(column_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    let result = match db_conn(&state) {
        Ok(mut conn) => ColumnsService::delete(&mut conn, &ctx, column_id),
        Err(response) => return response,
    };

    match result {
        Ok((deleted_cards, attachments)) => {
            let failed_attachments =
                AttachmentsService::cleanup(&state.db, state.media.as_ref(), attachments).await;
            let response = ApiResponse::success(
                DeleteColumnResult {
                    deleted_cards,
                    failed_attachments,
                },
                "Column deleted successfully",
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
