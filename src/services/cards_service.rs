use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::enums::MemberAction,
    db::models::attachment::Attachment,
    db::models::board::Board,
    db::models::card::{
        Card, CardChangeset, CardComment, CreateCardRequest, IncomingLabelInfo,
        IncomingMemberInfo, NewCard, UpdateCardRequest,
    },
    db::repositories::{AttachmentRepo, CardRepo, ColumnRepo},
    error::{AppError, AppResult},
    services::{boards_service::BoardsService, context::RequestContext},
    utils::order,
};

pub struct CardsService;

/// Newest comment first.
pub fn prepend_comment(comments: Vec<CardComment>, comment: CardComment) -> Vec<CardComment> {
    let mut next = Vec::with_capacity(comments.len() + 1);
    next.push(comment);
    next.extend(comments);
    next
}

pub fn apply_member_change(
    board: &Board,
    member_ids: &[Uuid],
    info: &IncomingMemberInfo,
) -> AppResult<Vec<Uuid>> {
    match info.action {
        MemberAction::Add => {
            if !board.is_member(info.user_id) {
                return Err(AppError::validation("User is not a member of this board"));
            }
            Ok(order::push_unique(member_ids, info.user_id))
        }
        MemberAction::Remove => Ok(order::pull(member_ids, info.user_id)),
    }
}

pub fn apply_label_change(
    board: &Board,
    label_ids: &[Uuid],
    info: &IncomingLabelInfo,
) -> AppResult<Vec<Uuid>> {
    match info.action {
        MemberAction::Add => {
            if !board.board_labels().iter().any(|l| l.id == info.label_id) {
                return Err(AppError::not_found("Label"));
            }
            Ok(order::push_unique(label_ids, info.label_id))
        }
        MemberAction::Remove => Ok(order::pull(label_ids, info.label_id)),
    }
}

fn encode<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::internal(format!("Failed to encode card data: {}", e)))
}

impl CardsService {
    /// Live card plus its board, checking the user's access.
    pub fn require_member(
        conn: &mut PgConnection,
        user_id: Uuid,
        card_id: Uuid,
    ) -> AppResult<(Card, Board)> {
        let card = CardRepo::find_live_by_id(conn, card_id)?
            .ok_or_else(|| AppError::not_found("Card"))?;
        let board = BoardsService::require_member(conn, user_id, card.board_id)?;
        Ok((card, board))
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateCardRequest,
    ) -> AppResult<Card> {
        let board = BoardsService::require_member(conn, ctx.user_id, req.board_id)?;
        let column = ColumnRepo::find_live_by_id(conn, req.column_id)?
            .ok_or_else(|| AppError::not_found("Column"))?;
        if column.board_id != board.id {
            return Err(AppError::validation("Column does not belong to this board"));
        }

        let new_card = NewCard {
            board_id: board.id,
            column_id: column.id,
            title: req.title.trim().to_string(),
            description: req.description.clone(),
        };

        let card = conn.transaction::<Card, diesel::result::Error, _>(|conn| {
            let card = CardRepo::insert(conn, &new_card)?;
            let current = ColumnRepo::find_live_by_id_for_update(conn, column.id)?
                .map(|c| c.card_order_ids)
                .unwrap_or_default();
            ColumnRepo::set_card_order(conn, column.id, order::push_unique(&current, card.id))?;
            Ok(card)
        })?;

        tracing::info!(card_id = %card.id, column_id = %column.id, "Card created");
        Ok(card)
    }

    pub fn get(conn: &mut PgConnection, ctx: &RequestContext, card_id: Uuid) -> AppResult<Card> {
        Self::require_member(conn, ctx.user_id, card_id).map(|(card, _)| card)
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        req: &UpdateCardRequest,
    ) -> AppResult<Card> {
        if req.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }
        let clear_due_date = req.clear_due_date.unwrap_or(false);
        if clear_due_date && req.due_date.is_some() {
            return Err(AppError::validation(
                "due_date and clear_due_date cannot be used together",
            ));
        }

        let (card, board) = Self::require_member(conn, ctx.user_id, card_id)?;

        let mut changes = CardChangeset {
            title: req.title.as_ref().map(|t| t.trim().to_string()),
            description: req.description.clone(),
            is_completed: req.is_completed,
            ..Default::default()
        };

        if clear_due_date {
            changes.due_date = Some(None);
        } else if let Some(due) = req.due_date {
            changes.due_date = Some(Some(due));
        }

        if let Some(comment) = &req.comment_to_add {
            let comment = CardComment {
                id: Uuid::new_v4(),
                user_id: ctx.user_id,
                user_email: ctx.email.clone(),
                user_display_name: ctx.display_name.clone(),
                user_avatar: ctx.avatar.clone(),
                content: comment.content.clone(),
                commented_at: Utc::now(),
            };
            changes.comments = Some(encode(&prepend_comment(card.card_comments(), comment))?);
        }

        if let Some(info) = &req.incoming_member_info {
            changes.member_ids = Some(apply_member_change(&board, &card.member_ids, info)?);
        }

        if let Some(info) = &req.incoming_label_info {
            changes.label_ids = Some(apply_label_change(&board, &card.label_ids, info)?);
        }

        let card = CardRepo::update(conn, card.id, changes)?;
        tracing::info!(card_id = %card.id, user_id = %ctx.user_id, "Card updated");
        Ok(card)
    }

    /// Sets the cover and returns the provider id of the cover it replaced.
    pub fn set_cover(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        url: &str,
        public_id: &str,
    ) -> AppResult<(Card, Option<String>)> {
        let (card, _) = Self::require_member(conn, ctx.user_id, card_id)?;
        let previous = card.cover_public_id.clone();
        let card = CardRepo::update(
            conn,
            card.id,
            CardChangeset {
                cover: Some(Some(url.to_string())),
                cover_public_id: Some(Some(public_id.to_string())),
                ..Default::default()
            },
        )?;
        Ok((card, previous))
    }

    pub fn remove_cover(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
    ) -> AppResult<(Card, Option<String>)> {
        let (card, _) = Self::require_member(conn, ctx.user_id, card_id)?;
        let previous = card.cover_public_id.clone();
        let card = CardRepo::update(
            conn,
            card.id,
            CardChangeset {
                cover: Some(None),
                cover_public_id: Some(None),
                ..Default::default()
            },
        )?;
        Ok((card, previous))
    }

    /// Authors may delete only their own comments.
    pub fn delete_comment(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        comment_id: Uuid,
    ) -> AppResult<Card> {
        let (card, _) = Self::require_member(conn, ctx.user_id, card_id)?;
        let comments = card.card_comments();
        let comment = comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;
        if comment.user_id != ctx.user_id {
            return Err(AppError::forbidden("You can only delete your own comments"));
        }

        let remaining: Vec<CardComment> =
            comments.into_iter().filter(|c| c.id != comment_id).collect();
        let card = CardRepo::update(
            conn,
            card.id,
            CardChangeset {
                comments: Some(encode(&remaining)?),
                ..Default::default()
            },
        )?;
        Ok(card)
    }

    /// Soft-destroys the card and drops it from its column's order. Returns the card's
    /// attachments for provider cleanup.
    pub fn delete(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
    ) -> AppResult<Vec<Attachment>> {
        let (card, _) = Self::require_member(conn, ctx.user_id, card_id)?;

        let attachments = conn.transaction::<Vec<Attachment>, diesel::result::Error, _>(|conn| {
            let attachments = AttachmentRepo::list_by_card(conn, card.id)?;
            CardRepo::soft_delete(conn, card.id)?;
            if let Some(column) = ColumnRepo::find_live_by_id(conn, card.column_id)? {
                ColumnRepo::set_card_order(conn, column.id, order::pull(&column.card_order_ids, card.id))?;
            }
            Ok(attachments)
        })?;

        tracing::info!(card_id = %card.id, attachments = attachments.len(), "Card deleted");
        Ok(attachments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::BoardType;
    use crate::db::models::board::BoardLabel;

    fn board(owner: Uuid, members: Vec<Uuid>, labels: Vec<BoardLabel>) -> Board {
        Board {
            id: Uuid::new_v4(),
            title: "Board".to_string(),
            slug: "board".to_string(),
            description: "desc".to_string(),
            board_type: BoardType::Private,
            background: None,
            labels: serde_json::to_value(labels).unwrap(),
            owner_ids: vec![owner],
            member_ids: members,
            column_order_ids: Vec::new(),
            is_destroyed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn comment(content: &str) -> CardComment {
        CardComment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_email: "a@example.com".to_string(),
            user_display_name: "a".to_string(),
            user_avatar: None,
            content: content.to_string(),
            commented_at: Utc::now(),
        }
    }

    #[test]
    fn comments_are_prepended() {
        let first = comment("first");
        let second = comment("second");
        let comments = prepend_comment(vec![first.clone()], second.clone());
        assert_eq!(comments, vec![second, first]);
    }

    #[test]
    fn only_board_members_can_be_assigned() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let b = board(owner, vec![member], Vec::new());

        let add = IncomingMemberInfo { user_id: member, action: MemberAction::Add };
        assert_eq!(apply_member_change(&b, &[], &add).unwrap(), vec![member]);
        assert_eq!(apply_member_change(&b, &[member], &add).unwrap(), vec![member]);

        let owner_add = IncomingMemberInfo { user_id: owner, action: MemberAction::Add };
        assert!(apply_member_change(&b, &[], &owner_add).is_ok());

        let stranger = IncomingMemberInfo { user_id: Uuid::new_v4(), action: MemberAction::Add };
        assert!(matches!(
            apply_member_change(&b, &[], &stranger),
            Err(AppError::Validation { .. })
        ));

        let remove = IncomingMemberInfo { user_id: member, action: MemberAction::Remove };
        assert!(apply_member_change(&b, &[member], &remove).unwrap().is_empty());
    }

    #[test]
    fn labels_must_exist_on_the_board() {
        let label = BoardLabel {
            id: Uuid::new_v4(),
            title: "bug".to_string(),
            color: "#ff0000".to_string(),
        };
        let b = board(Uuid::new_v4(), Vec::new(), vec![label.clone()]);

        let add = IncomingLabelInfo { label_id: label.id, action: MemberAction::Add };
        assert_eq!(apply_label_change(&b, &[], &add).unwrap(), vec![label.id]);

        let unknown = IncomingLabelInfo { label_id: Uuid::new_v4(), action: MemberAction::Add };
        assert!(matches!(
            apply_label_change(&b, &[], &unknown),
            Err(AppError::NotFound { .. })
        ));

        let remove = IncomingLabelInfo { label_id: label.id, action: MemberAction::Remove };
        assert!(apply_label_change(&b, &[label.id], &remove).unwrap().is_empty());
    }
}
