use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::enums::MemberAction;
use crate::validation::rules::{
    validate_card_description, validate_checklist_item_text, validate_checklist_title,
    validate_comment, validate_title,
};

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::cards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Card {
    pub id: Uuid,
    pub board_id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cover: Option<String>,
    #[serde(skip_serializing)]
    pub cover_public_id: Option<String>,
    pub member_ids: Vec<Uuid>,
    pub comments: serde_json::Value,
    pub checklists: serde_json::Value,
    pub label_ids: Vec<Uuid>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub is_completed: bool,
    pub attachment_ids: Vec<Uuid>,
    #[serde(skip_serializing)]
    pub is_destroyed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Card {
    pub fn card_comments(&self) -> Vec<CardComment> {
        serde_json::from_value(self.comments.clone()).unwrap_or_default()
    }

    pub fn card_checklists(&self) -> Vec<Checklist> {
        serde_json::from_value(self.checklists.clone()).unwrap_or_default()
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::cards)]
pub struct NewCard {
    pub board_id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Field updates for a card row. `due_date: Some(None)` clears the due date.
#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::cards)]
pub struct CardChangeset {
    pub column_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover: Option<Option<String>>,
    pub cover_public_id: Option<Option<String>>,
    pub member_ids: Option<Vec<Uuid>>,
    pub comments: Option<serde_json::Value>,
    pub checklists: Option<serde_json::Value>,
    pub label_ids: Option<Vec<Uuid>>,
    pub due_date: Option<Option<chrono::DateTime<chrono::Utc>>>,
    pub is_completed: Option<bool>,
    pub attachment_ids: Option<Vec<Uuid>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CardComment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_display_name: String,
    pub user_avatar: Option<String>,
    pub content: String,
    pub commented_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Checklist {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub is_checked: bool,
}

#[derive(Deserialize, Validate)]
pub struct CreateCardRequest {
    pub board_id: Uuid,
    pub column_id: Uuid,

    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[validate(custom(function = "validate_card_description"))]
    pub description: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct CommentToAdd {
    #[validate(custom(function = "validate_comment"))]
    pub content: String,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct IncomingMemberInfo {
    pub user_id: Uuid,
    pub action: MemberAction,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct IncomingLabelInfo {
    pub label_id: Uuid,
    pub action: MemberAction,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateCardRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_card_description"))]
    pub description: Option<String>,

    pub due_date: Option<chrono::DateTime<chrono::Utc>>,

    pub clear_due_date: Option<bool>,

    pub is_completed: Option<bool>,

    #[validate(nested)]
    pub comment_to_add: Option<CommentToAdd>,

    pub incoming_member_info: Option<IncomingMemberInfo>,

    pub incoming_label_info: Option<IncomingLabelInfo>,
}

impl UpdateCardRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && !self.clear_due_date.unwrap_or(false)
            && self.is_completed.is_none()
            && self.comment_to_add.is_none()
            && self.incoming_member_info.is_none()
            && self.incoming_label_info.is_none()
    }
}

#[derive(Deserialize, Validate)]
pub struct ChecklistTitleRequest {
    #[validate(custom(function = "validate_checklist_title"))]
    pub title: String,
}

#[derive(Deserialize, Validate)]
pub struct CreateChecklistItemRequest {
    #[validate(custom(function = "validate_checklist_item_text"))]
    pub text: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateChecklistItemRequest {
    #[validate(custom(function = "validate_checklist_item_text"))]
    pub text: Option<String>,

    pub is_checked: Option<bool>,
}

#[derive(Serialize)]
pub struct DeleteCardResult {
    pub card_id: Uuid,
    pub failed_attachments: Vec<crate::db::models::attachment::AttachmentCleanupFailure>,
}
