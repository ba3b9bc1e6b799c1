use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug)]
#[diesel(table_name = crate::schema::attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Attachment {
    pub id: Uuid,
    pub card_id: Uuid,
    pub board_id: Uuid,
    pub uploader_id: Uuid,
    pub name: String,
    pub url: String,
    pub public_id: String,
    pub resource_type: String,
    pub size: i64,
    pub file_type: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::attachments)]
pub struct NewAttachment {
    pub card_id: Uuid,
    pub board_id: Uuid,
    pub uploader_id: Uuid,
    pub name: String,
    pub url: String,
    pub public_id: String,
    pub resource_type: String,
    pub size: i64,
    pub file_type: String,
}

/// One attachment that could not be removed during a best-effort cleanup.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AttachmentCleanupFailure {
    pub attachment_id: Uuid,
    pub reason: String,
}
