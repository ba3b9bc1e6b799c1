use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;
use crate::db::models::api::{ApiResponse, ResponseMeta};
use crate::db::models::board::{
    BoardListQuery, CreateBoardRequest, CreateLabelRequest, MoveCardRequest, UpdateBoardRequest,
    UpdateLabelRequest,
};
use crate::middleware::auth::AuthUserInfo;
use crate::routes::db_conn;
use crate::services::boards_service::BoardsService;
use crate::services::context::RequestContext;
use crate::validation::ValidatedJson;

#[derive(Serialize)]
pub struct OnlineUsersResponse {
    pub board_id: Uuid,
    pub user_ids: Vec<Uuid>,
}

// 创建看板
pub async fn create_board(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<CreateBoardRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::create(&mut conn, &ctx, &payload) {
        Ok(board) => {
            let response = ApiResponse::created(board, "Board created successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取看板列表
pub async fn get_boards(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    Query(params): Query<BoardListQuery>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::list(&mut conn, &ctx, &params) {
        Ok((boards, pagination, total)) => {
            let meta = ResponseMeta {
                pagination: Some(pagination),
                total_count: Some(total),
                ..Default::default()
            };
            let response =
                ApiResponse::success_with_meta(boards, "Boards retrieved successfully", meta);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 获取看板详情
pub async fn get_board_details(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::details(&mut conn, &ctx, board_id) {
        Ok(details) => {
            let response = ApiResponse::success(details, "Board retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 更新看板
pub async fn update_board(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateBoardRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::update(&mut conn, &ctx, board_id, &payload) {
        Ok(board) => {
            let response = ApiResponse::success(board, "Board updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 删除看板
pub async fn delete_board(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::delete(&mut conn, &ctx, board_id) {
        Ok(()) => {
            let response = ApiResponse::<()>::ok("Board deleted successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 跨列移动卡片
pub async fn move_card(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<MoveCardRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::move_card(&mut conn, &ctx, &payload) {
        Ok(card) => {
            let response = ApiResponse::success(card, "Card moved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 在线用户
pub async fn get_online_users(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<Uuid>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let membership = match db_conn(&state) {
        Ok(mut conn) => BoardsService::require_member(&mut conn, auth_info.user.id, board_id),
        Err(response) => return response,
    };
    if let Err(err) = membership {
        return err.into_response();
    }

    let user_ids = state.rooms.room_user_ids(board_id).await;
    let response = ApiResponse::success(
        OnlineUsersResponse { board_id, user_ids },
        "Online users retrieved successfully",
    );
    (StatusCode::OK, Json(response)).into_response()
}

// 创建标签
pub async fn create_label(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<CreateLabelRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::create_label(&mut conn, &ctx, board_id, &payload) {
        Ok(label) => {
            let response = ApiResponse::created(label, "Label created successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 更新标签
pub async fn update_label(
    State(state): State<Arc<AppState>>,
    Path((board_id, label_id)): Path<(Uuid, Uuid)>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateLabelRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::update_label(&mut conn, &ctx, board_id, label_id, &payload) {
        Ok(label) => {
            let response = ApiResponse::success(label, "Label updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 删除标签
pub async fn delete_label(
    State(state): State<Arc<AppState>>,
    Path((board_id, label_id)): Path<(Uuid, Uuid)>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match BoardsService::delete_label(&mut conn, &ctx, board_id, label_id) {
        Ok(()) => {
            let response = ApiResponse::<()>::ok("Label deleted successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
