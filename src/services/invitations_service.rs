use diesel::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    db::enums::InvitationStatus,
    db::models::api::error_codes,
    db::models::board::Board,
    db::models::invitation::{
        BoardSummary, CreateBoardInvitationRequest, Invitation, InvitationDetails, NewInvitation,
    },
    db::models::user::{User, UserInfo},
    db::repositories::{BoardRepo, InvitationRepo, UserRepo},
    error::{AppError, AppResult},
    services::{boards_service::BoardsService, context::RequestContext},
    utils::order,
};

pub struct InvitationsService;

fn pending_answer() -> AppError {
    AppError::validation("status must be accepted or rejected")
}

/// Only the invitee may answer, and only once.
pub fn check_answer(
    invitation: &Invitation,
    user_id: Uuid,
    status: InvitationStatus,
) -> AppResult<()> {
    if status == InvitationStatus::Pending {
        return Err(pending_answer());
    }
    if invitation.invitee_id != user_id {
        return Err(AppError::forbidden("This invitation is not addressed to you"));
    }
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::not_acceptable("Invitation has already been answered"));
    }
    Ok(())
}

/// New member list for an accepted invitation, `None` when the user is already in.
pub fn members_after_accept(
    board: Option<Board>,
    user_id: Uuid,
) -> AppResult<Option<(Uuid, Vec<Uuid>)>> {
    let board = board.ok_or_else(|| AppError::not_acceptable("Board no longer exists"))?;
    if board.is_member(user_id) {
        return Ok(None);
    }
    Ok(Some((board.id, order::push_unique(&board.member_ids, user_id))))
}

fn details(
    invitation: Invitation,
    users: &HashMap<Uuid, User>,
    boards: &HashMap<Uuid, Board>,
) -> InvitationDetails {
    InvitationDetails {
        inviter: users.get(&invitation.inviter_id).map(UserInfo::from),
        invitee: users.get(&invitation.invitee_id).map(UserInfo::from),
        board: boards
            .get(&invitation.board_id)
            .filter(|b| !b.is_destroyed)
            .map(|b| BoardSummary {
                id: b.id,
                title: b.title.clone(),
            }),
        invitation,
    }
}

impl InvitationsService {
    fn with_details(
        conn: &mut PgConnection,
        invitations: Vec<Invitation>,
    ) -> AppResult<Vec<InvitationDetails>> {
        let user_ids: Vec<Uuid> = invitations
            .iter()
            .flat_map(|i| [i.inviter_id, i.invitee_id])
            .collect();
        let board_ids: Vec<Uuid> = invitations.iter().map(|i| i.board_id).collect();

        let users: HashMap<Uuid, User> = UserRepo::find_by_ids(conn, &user_ids)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let boards: HashMap<Uuid, Board> = BoardRepo::find_by_ids(conn, &board_ids)?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(invitations
            .into_iter()
            .map(|i| details(i, &users, &boards))
            .collect())
    }

    fn one_with_details(conn: &mut PgConnection, invitation: Invitation) -> AppResult<InvitationDetails> {
        Self::with_details(conn, vec![invitation])?
            .pop()
            .ok_or_else(|| AppError::internal("Invitation details missing"))
    }

    pub fn create_board_invitation(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateBoardInvitationRequest,
    ) -> AppResult<InvitationDetails> {
        let board = BoardsService::require_member(conn, ctx.user_id, req.board_id)?;

        let email = req.invitee_email.trim().to_lowercase();
        let invitee = UserRepo::find_by_email(conn, &email)?
            .ok_or_else(|| AppError::not_found("Invitee"))?;

        if invitee.id == ctx.user_id {
            return Err(AppError::validation("You cannot invite yourself"));
        }
        if board.is_member(invitee.id) {
            return Err(AppError::conflict_with_code(
                "User is already a member of this board",
                Some("invitee_email".to_string()),
                error_codes::BOARD_ALREADY_MEMBER,
            ));
        }
        if InvitationRepo::exists_pending(conn, board.id, invitee.id)? {
            return Err(AppError::conflict_with_code(
                "User already has a pending invitation to this board",
                Some("invitee_email".to_string()),
                error_codes::INVITATION_PENDING,
            ));
        }

        let invitation = InvitationRepo::insert(
            conn,
            &NewInvitation {
                inviter_id: ctx.user_id,
                invitee_id: invitee.id,
                board_id: board.id,
                status: InvitationStatus::Pending,
            },
        )?;
        tracing::info!(
            invitation_id = %invitation.id,
            board_id = %board.id,
            invitee_id = %invitee.id,
            "Board invitation created"
        );
        Self::one_with_details(conn, invitation)
    }

    pub fn list_for_user(
        conn: &mut PgConnection,
        ctx: &RequestContext,
    ) -> AppResult<Vec<InvitationDetails>> {
        let invitations = InvitationRepo::list_by_invitee(conn, ctx.user_id)?;
        Self::with_details(conn, invitations)
    }

    pub fn respond(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        invitation_id: Uuid,
        status: InvitationStatus,
    ) -> AppResult<InvitationDetails> {
        if status == InvitationStatus::Pending {
            return Err(pending_answer());
        }

        let invitation = InvitationRepo::find_live_by_id(conn, invitation_id)?
            .ok_or_else(|| AppError::not_found("Invitation"))?;
        check_answer(&invitation, ctx.user_id, status)?;

        let updated = conn.transaction::<Invitation, AppError, _>(|conn| {
            if status == InvitationStatus::Accepted {
                let board = BoardRepo::find_live_by_id(conn, invitation.board_id)?;
                if let Some((board_id, members)) = members_after_accept(board, ctx.user_id)? {
                    BoardRepo::set_members(conn, board_id, members)?;
                }
            }
            Ok(InvitationRepo::update_status(conn, invitation.id, status)?)
        })?;

        tracing::info!(
            invitation_id = %updated.id,
            status = updated.status.as_str(),
            "Board invitation answered"
        );
        Self::one_with_details(conn, updated)
    }
}
