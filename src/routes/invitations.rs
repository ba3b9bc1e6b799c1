use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;
use crate::db::models::api::ApiResponse;
use crate::db::models::invitation::{CreateBoardInvitationRequest, UpdateInvitationRequest};
use crate::middleware::auth::AuthUserInfo;
use crate::routes::db_conn;
use crate::services::context::RequestContext;
use crate::services::invitations_service::InvitationsService;
use crate::validation::ValidatedJson;
use crate::websocket::events::{BE_USER_INVITED_TO_BOARD, ServerEvent};

pub async fn get_invitations(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match InvitationsService::list_for_user(&mut conn, &ctx) {
        Ok(invitations) => {
            let response = ApiResponse::success(invitations, "Invitations retrieved successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// 邀请用户加入看板，并实时通知被邀请人
pub async fn create_board_invitation(
    State(state): State<Arc<AppState>>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<CreateBoardInvitationRequest>,
) -> impl IntoResponse {
    let ctx = RequestContext::from(&auth_info);

    let result = match db_conn(&state) {
        Ok(mut conn) => InvitationsService::create_board_invitation(&mut conn, &ctx, &payload),
        Err(response) => return response,
    };

    match result {
        Ok(details) => {
            match serde_json::to_value(&details) {
                Ok(data) => {
                    let event = ServerEvent::new(
                        BE_USER_INVITED_TO_BOARD,
                        Some(details.invitation.board_id),
                        data,
                    )
                    .from_user(ctx.user_id);
                    let delivered = state
                        .rooms
                        .send_to_user(details.invitation.invitee_id, event)
                        .await;
                    tracing::debug!(
                        invitation_id = %details.invitation.id,
                        delivered,
                        "Invitation notification sent"
                    );
                }
                Err(e) => tracing::warn!("Failed to encode invitation event: {}", e),
            }

            let response = ApiResponse::created(details, "Invitation sent successfully");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub async fn update_board_invitation(
    State(state): State<Arc<AppState>>,
    Path(invitation_id): Path<Uuid>,
    auth_info: AuthUserInfo,
    ValidatedJson(payload): ValidatedJson<UpdateInvitationRequest>,
) -> impl IntoResponse {
    let mut conn = match db_conn(&state) {
        Ok(conn) => conn,
        Err(response) => return response,
    };
    let ctx = RequestContext::from(&auth_info);

    match InvitationsService::respond(&mut conn, &ctx, invitation_id, payload.status) {
        Ok(details) => {
            let response = ApiResponse::success(details, "Invitation updated successfully");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
