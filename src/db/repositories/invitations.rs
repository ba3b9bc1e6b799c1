use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::enums::InvitationStatus;
use crate::db::models::invitation::{Invitation, NewInvitation};

pub struct InvitationRepo;

impl InvitationRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_invitation: &NewInvitation,
    ) -> Result<Invitation, diesel::result::Error> {
        diesel::insert_into(crate::schema::invitations::table)
            .values(new_invitation)
            .returning(Invitation::as_returning())
            .get_result(conn)
    }

    pub fn find_live_by_id(
        conn: &mut PgConnection,
        invitation_id: Uuid,
    ) -> Result<Option<Invitation>, diesel::result::Error> {
        use crate::schema::invitations::dsl::*;
        invitations
            .filter(id.eq(invitation_id))
            .filter(is_destroyed.eq(false))
            .select(Invitation::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_invitee(
        conn: &mut PgConnection,
        target_invitee_id: Uuid,
    ) -> Result<Vec<Invitation>, diesel::result::Error> {
        use crate::schema::invitations::dsl::*;
        invitations
            .filter(invitee_id.eq(target_invitee_id))
            .filter(is_destroyed.eq(false))
            .order(created_at.desc())
            .select(Invitation::as_select())
            .load(conn)
    }

    pub fn exists_pending(
        conn: &mut PgConnection,
        target_board_id: Uuid,
        target_invitee_id: Uuid,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::invitations::dsl::*;
        diesel::select(diesel::dsl::exists(
            invitations
                .filter(board_id.eq(target_board_id))
                .filter(invitee_id.eq(target_invitee_id))
                .filter(status.eq(InvitationStatus::Pending))
                .filter(is_destroyed.eq(false)),
        ))
        .get_result(conn)
    }

    pub fn update_status(
        conn: &mut PgConnection,
        invitation_id: Uuid,
        new_status: InvitationStatus,
    ) -> Result<Invitation, diesel::result::Error> {
        use crate::schema::invitations::dsl::*;
        diesel::update(invitations.filter(id.eq(invitation_id)))
            .set((status.eq(new_status), updated_at.eq(Utc::now())))
            .returning(Invitation::as_returning())
            .get_result(conn)
    }
}
