use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::attachment::{Attachment, NewAttachment};

pub struct AttachmentRepo;

impl AttachmentRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_attachment: &NewAttachment,
    ) -> Result<Attachment, diesel::result::Error> {
        diesel::insert_into(crate::schema::attachments::table)
            .values(new_attachment)
            .returning(Attachment::as_returning())
            .get_result(conn)
    }

    pub fn find_by_id(
        conn: &mut PgConnection,
        attachment_id: Uuid,
    ) -> Result<Option<Attachment>, diesel::result::Error> {
        use crate::schema::attachments::dsl::*;
        attachments
            .filter(id.eq(attachment_id))
            .select(Attachment::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_card(
        conn: &mut PgConnection,
        target_card_id: Uuid,
    ) -> Result<Vec<Attachment>, diesel::result::Error> {
        use crate::schema::attachments::dsl::*;
        attachments
            .filter(card_id.eq(target_card_id))
            .order(created_at.desc())
            .select(Attachment::as_select())
            .load(conn)
    }

    pub fn count_by_card(
        conn: &mut PgConnection,
        target_card_id: Uuid,
    ) -> Result<i64, diesel::result::Error> {
        use crate::schema::attachments::dsl::*;
        attachments
            .filter(card_id.eq(target_card_id))
            .count()
            .get_result(conn)
    }

    pub fn delete_by_id(
        conn: &mut PgConnection,
        attachment_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::attachments::dsl::*;
        diesel::delete(attachments.filter(id.eq(attachment_id))).execute(conn)
    }
}
