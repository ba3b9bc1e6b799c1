use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;
use crate::db::models::api::ApiResponse;
use crate::db::models::card::{
    ChecklistTitleRequest, CreateCardRequest, CreateChecklistItemRequest, DeleteCardResult,
    UpdateCardRequest, UpdateChecklistItemRequest,
};
use crate::middleware::auth::AuthUserInfo;
use crate::routes::{db_conn, multipart::read_file_field};
use crate::services::attachments_service::AttachmentsService;
use crate::services::cards_service::CardsService;
use crate::services::checklists_service::ChecklistsService;
use crate::services::context::RequestContext;
use crate::storage::ResourceType;
use crate::validation::{ValidatedJson, upload::validate_image_upload};

const COVER_FOLDER: &str = "card-covers";

pub async fn create_card(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<CreateCardRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match CardsService::create(&mut conn, &ctx, &payload) {
        Ok(card) => {
            let response = ApiResponse::created(card, "Card created successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn get_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match CardsService::get(&mut conn, &ctx, card_id) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Card retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 更新卡片：标题、描述、截止日期、评论、成员、标签
pub async fn update_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateCardRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match CardsService::update(&mut conn, &ctx, card_id, &payload) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Card updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn delete_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    let result = match db_conn(&state) {
        Ok(mut conn) => CardsService::delete(&mut conn, &ctx, card_id),
        Err(response) => return response,
    };

    match result {
        Ok(attachments) => {
            let failed_attachments =
                AttachmentsService::cleanup(&state.db, state.media.as_ref(), attachments).await;
            let response = ApiResponse::success(
                DeleteCardResult {
                    card_id,
                    failed_attachments,
                },
                "Card deleted successfully",
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 上传封面
pub async fn update_cover(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    // 上传前先检查权限
    let access = match db_conn(&state) {
        Ok(mut conn) => CardsService::require_member(&mut conn, ctx.user_id, card_id),
        Err(response) => return response,
    };
    if let Err(err) = access {
        return err.into_response();
    }

    let file = match read_file_field(&mut multipart, "cover").await {
        Ok(file) => file,
        Err(err) => return err.into_response(),
    };
    if let Err(err) =
        validate_image_upload(&file.content_type, file.bytes.len(), state.config.max_upload_bytes)
    {
        return err.into_response();
    }

    let media = match state
        .media
        .upload(file.into_request(COVER_FOLDER, ResourceType::Image))
        .await
    {
        Ok(media) => media,
        Err(err) => return err.into_response(),
    };

    let result = match db_conn(&state) {
        Ok(mut conn) => CardsService::set_cover(&mut conn, &ctx, card_id, &media.url, &media.public_id),
        Err(response) => return response,
    };

    match result {
        Ok((card, previous)) => {
            if let Some(previous) = previous {
                if let Err(e) = state.media.destroy(&previous, ResourceType::Image).await {
                    tracing::warn!(card_id = %card.id, public_id = %previous, "Failed to remove old cover: {}", e);
                }
            }
            let response = ApiResponse::success(card, "Cover updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            if let Err(e) = state.media.destroy(&media.public_id, ResourceType::Image).await {
                tracing::warn!(public_id = %media.public_id, "Failed to roll back cover upload: {}", e);
            }
            err.into_response()
        }
    }
}

pub async fn remove_cover(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    let result = match db_conn(&state) {
        Ok(mut conn) => CardsService::remove_cover(&mut conn, &ctx, card_id),
        Err(response) => return response,
    };

    match result {
        Ok((card, previous)) => {
            if let Some(previous) = previous {
                if let Err(e) = state.media.destroy(&previous, ResourceType::Image).await {
                    tracing::warn!(card_id = %card.id, public_id = %previous, "Failed to remove cover: {}", e);
                }
            }
            let response = ApiResponse::success(card, "Cover removed successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((card_id, comment_id)): Path<(Uuid, Uuid)>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match CardsService::delete_comment(&mut conn, &ctx, card_id, comment_id) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Comment deleted successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 检查清单
pub async fn create_checklist(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<ChecklistTitleRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ChecklistsService::create_checklist(&mut conn, &ctx, card_id, &payload.title) {
        Ok(card) => {
            let response = ApiResponse::created(card, "Checklist created successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn update_checklist(
    State(state): State<Arc<AppState>>,
    Path((card_id, checklist_id)): Path<(Uuid, Uuid)>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<ChecklistTitleRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ChecklistsService::update_checklist(&mut conn, &ctx, card_id, checklist_id, &payload.title) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Checklist updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn delete_checklist(
    State(state): State<Arc<AppState>>,
    Path((card_id, checklist_id)): Path<(Uuid, Uuid)>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ChecklistsService::delete_checklist(&mut conn, &ctx, card_id, checklist_id) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Checklist deleted successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn create_checklist_item(
    State(state): State<Arc<AppState>>,
    Path((card_id, checklist_id)): Path<(Uuid, Uuid)>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<CreateChecklistItemRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ChecklistsService::create_item(&mut conn, &ctx, card_id, checklist_id, &payload.text) {
        Ok(card) => {
            let response = ApiResponse::created(card, "Checklist item created successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn update_checklist_item(
    State(state): State<Arc<AppState>>,
    Path((card_id, checklist_id, item_id)): Path<(Uuid, Uuid, Uuid)>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateChecklistItemRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ChecklistsService::update_item(&mut conn, &ctx, card_id, checklist_id, item_id, &payload) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Checklist item updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn delete_checklist_item(
    State(state): State<Arc<AppState>>,
    Path((card_id, checklist_id, item_id)): Path<(Uuid, Uuid, Uuid)>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match ChecklistsService::delete_item(&mut conn, &ctx, card_id, checklist_id, item_id) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Checklist item deleted successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
