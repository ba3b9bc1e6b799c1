use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::enums::BoardType;
use crate::db::models::column::ColumnWithCards;
use crate::db::models::user::UserInfo;
use crate::validation::rules::{
    validate_board_description, validate_hex_color, validate_label_title, validate_title,
};

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::boards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(rename = "type")]
    pub board_type: BoardType,
    pub background: Option<String>,
    pub labels: serde_json::Value,
    pub owner_ids: Vec<Uuid>,
    pub member_ids: Vec<Uuid>,
    pub column_order_ids: Vec<Uuid>,
    #[serde(skip_serializing)]
    pub is_destroyed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Board {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_ids.contains(&user_id)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.member_ids.contains(&user_id)
    }

    /// Board labels decoded from the JSONB column; malformed entries are dropped.
    pub fn board_labels(&self) -> Vec<BoardLabel> {
        serde_json::from_value(self.labels.clone()).unwrap_or_default()
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::boards)]
pub struct NewBoard {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub board_type: BoardType,
    pub owner_ids: Vec<Uuid>,
    pub member_ids: Vec<Uuid>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::boards)]
pub struct BoardChangeset {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub board_type: Option<BoardType>,
    pub background: Option<String>,
    pub column_order_ids: Option<Vec<Uuid>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BoardLabel {
    pub id: Uuid,
    pub title: String,
    pub color: String,
}

#[derive(Serialize)]
pub struct BoardDetails {
    #[serde(flatten)]
    pub board: Board,
    pub owners: Vec<UserInfo>,
    pub members: Vec<UserInfo>,
    pub columns: Vec<ColumnWithCards>,
}

#[derive(Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: String,

    #[validate(custom(function = "validate_board_description"))]
    pub description: String,

    #[serde(rename = "type")]
    pub board_type: BoardType,
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateBoardRequest {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_board_description"))]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub board_type: Option<BoardType>,

    #[validate(length(max = 1024, message = "Background is too long"))]
    pub background: Option<String>,

    pub column_order_ids: Option<Vec<Uuid>>,
}

#[derive(Deserialize, Validate)]
pub struct MoveCardRequest {
    pub current_card_id: Uuid,
    pub prev_column_id: Uuid,
    pub prev_card_order_ids: Vec<Uuid>,
    pub next_column_id: Uuid,
    pub next_card_order_ids: Vec<Uuid>,
}

#[derive(Deserialize, Validate)]
pub struct CreateLabelRequest {
    #[validate(custom(function = "validate_label_title"))]
    pub title: String,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateLabelRequest {
    #[validate(custom(function = "validate_label_title"))]
    pub title: Option<String>,

    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

#[derive(Deserialize)]
pub struct BoardListQuery {
    pub page: Option<i64>,
    pub items_per_page: Option<i64>,
    pub q: Option<String>,
}
