pub mod attachments;
pub mod boards;
pub mod cards;
pub mod columns;
pub mod invitations;
pub mod multipart;
pub mod users;

use crate::AppState;
use crate::db::DbConn;
use crate::error::AppError;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use std::sync::Arc;

/// Multipart framing on top of the raw file size.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// 获取数据库连接，失败时直接返回错误响应
pub(crate) fn db_conn(state: &AppState) -> Result<DbConn, Response> {
    state
        .db
        .get()
        .map_err(|e| AppError::from(e).into_response())
}

/// Routes reachable without a session.
pub fn create_public_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/verify", put(users::verify_account))
        .route("/users/login", post(users::login))
        .route("/users/refresh_token", get(users::refresh_token))
        .with_state(state)
}

/// Routes behind the auth middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit =
        DefaultBodyLimit::max(state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/users/logout", delete(users::logout))
        .route("/users/profile", get(users::get_profile))
        .route("/users/update", put(users::update_profile))
        .route("/users/avatar", put(users::update_avatar).layer(upload_limit.clone()))
        .route("/boards", post(boards::create_board))
        .route("/boards", get(boards::get_boards))
        .route("/boards/supports/moving_card", put(boards::move_card))
        .route("/boards/:board_id", get(boards::get_board_details))
        .route("/boards/:board_id", put(boards::update_board))
        .route("/boards/:board_id", delete(boards::delete_board))
        .route("/boards/:board_id/online", get(boards::get_online_users))
        .route("/boards/:board_id/labels", post(boards::create_label))
        .route("/boards/:board_id/labels/:label_id", put(boards::update_label))
        .route("/boards/:board_id/labels/:label_id", delete(boards::delete_label))
        .route("/columns", post(columns::create_column))
        .route("/columns/:column_id", put(columns::update_column))
        .route("/columns/:column_id", delete(columns::delete_column))
        .route("/cards", post(cards::create_card))
        .route("/cards/:card_id", get(cards::get_card))
        .route("/cards/:card_id", put(cards::update_card))
        .route("/cards/:card_id", delete(cards::delete_card))
        .route(
            "/cards/:card_id/cover",
            put(cards::update_cover)
                .layer(upload_limit.clone())
                .delete(cards::remove_cover),
        )
        .route(
            "/cards/:card_id/comments/:comment_id",
            delete(cards::delete_comment),
        )
        .route("/cards/:card_id/checklists", post(cards::create_checklist))
        .route(
            "/cards/:card_id/checklists/:checklist_id",
            put(cards::update_checklist),
        )
        .route(
            "/cards/:card_id/checklists/:checklist_id",
            delete(cards::delete_checklist),
        )
        .route(
            "/cards/:card_id/checklists/:checklist_id/items",
            post(cards::create_checklist_item),
        )
        .route(
            "/cards/:card_id/checklists/:checklist_id/items/:item_id",
            put(cards::update_checklist_item),
        )
        .route(
            "/cards/:card_id/checklists/:checklist_id/items/:item_id",
            delete(cards::delete_checklist_item),
        )
        .route(
            "/cards/:card_id/attachments",
            post(attachments::upload_attachment)
                .layer(upload_limit.clone())
                .get(attachments::get_attachments),
        )
        .route("/attachments/:attachment_id", delete(attachments::delete_attachment))
        .route("/invitations", get(invitations::get_invitations))
        .route("/invitations/board", post(invitations::create_board_invitation))
        .route("/invitations/board/:invitation_id", put(invitations::update_board_invitation))
        .with_state(state)
}
