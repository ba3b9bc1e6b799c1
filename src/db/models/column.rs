use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::models::card::Card;
use crate::validation::rules::{validate_hex_color, validate_title};

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::board_columns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Column {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub color: Option<String>,
    pub card_order_ids: Vec<Uuid>,
    #[serde(skip_serializing)]
    pub is_destroyed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::board_columns)]
pub struct NewColumn {
    pub board_id: Uuid,
    pub title: String,
    pub color: Option<String>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::board_columns)]
pub struct ColumnChangeset {
    pub title: Option<String>,
    pub color: Option<String>,
    pub card_order_ids: Option<Vec<Uuid>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Serialize)]
pub struct ColumnWithCards {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<Card>,
}

#[derive(Deserialize, Validate)]
pub struct CreateColumnRequest {
    pub board_id: Uuid,

    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateColumnRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,

    pub card_order_ids: Option<Vec<Uuid>>,
}

#[derive(Serialize)]
pub struct DeleteColumnResult {
    pub deleted_cards: usize,
    pub failed_attachments: Vec<crate::db::models::attachment::AttachmentCleanupFailure>,
}
