use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::enums::InvitationStatus;
use crate::db::models::user::UserInfo;
use crate::validation::rules::validate_invitation_answer;

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Invitation {
    pub id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub board_id: Uuid,
    pub status: InvitationStatus,
    #[serde(skip_serializing)]
    pub is_destroyed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::invitations)]
pub struct NewInvitation {
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub board_id: Uuid,
    pub status: InvitationStatus,
}

#[derive(Serialize, Clone, Debug)]
pub struct BoardSummary {
    pub id: Uuid,
    pub title: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct InvitationDetails {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub inviter: Option<UserInfo>,
    pub invitee: Option<UserInfo>,
    pub board: Option<BoardSummary>,
}

#[derive(Deserialize, Validate)]
pub struct CreateBoardInvitationRequest {
    #[validate(email(message = "Email is invalid"))]
    pub invitee_email: String,

    pub board_id: Uuid,
}

#[derive(Deserialize, Validate)]
pub struct UpdateInvitationRequest {
    #[validate(custom(function = "validate_invitation_answer"))]
    pub status: InvitationStatus,
}
