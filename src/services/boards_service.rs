use diesel::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    db::models::api::Pagination,
    db::models::board::{
        Board, BoardChangeset, BoardDetails, BoardLabel, BoardListQuery, CreateBoardRequest,
        CreateLabelRequest, MoveCardRequest, NewBoard, UpdateBoardRequest, UpdateLabelRequest,
    },
    db::models::card::{Card, CardChangeset},
    db::models::column::{Column, ColumnWithCards},
    db::models::user::UserInfo,
    db::repositories::{BoardRepo, CardRepo, ColumnRepo, UserRepo},
    error::{AppError, AppResult},
    services::context::RequestContext,
    utils::{order, slug::slugify},
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_ITEMS_PER_PAGE: i64 = 12;
const MAX_ITEMS_PER_PAGE: i64 = 100;

pub struct BoardsService;

fn same_column_move() -> AppError {
    AppError::validation("Use the column update to reorder cards inside one column")
}

/// A move must take the card out of its current column into another column of
/// the same board, and both submitted orders must be permutations of what the
/// columns will hold afterwards.
pub fn check_card_move(
    card: &Card,
    prev: &Column,
    next: &Column,
    req: &MoveCardRequest,
) -> AppResult<()> {
    if prev.id == next.id {
        return Err(same_column_move());
    }
    if prev.board_id != card.board_id || next.board_id != card.board_id {
        return Err(AppError::validation("Both columns must belong to the card's board"));
    }
    if card.column_id != prev.id {
        return Err(AppError::validation("Card is not in prev_column_id"));
    }

    let expected_prev = order::pull(&prev.card_order_ids, card.id);
    let expected_next = order::push_unique(&next.card_order_ids, card.id);
    if !order::is_permutation(&expected_prev, &req.prev_card_order_ids)
        || !order::is_permutation(&expected_next, &req.next_card_order_ids)
    {
        return Err(AppError::validation(
            "Card orders do not match the columns' current cards",
        ));
    }
    Ok(())
}

/// Normalizes `page` / `items_per_page` query values.
pub fn page_params(query: &BoardListQuery) -> (i64, i64) {
    let page = query.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
    let per_page = query
        .items_per_page
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_ITEMS_PER_PAGE)
        .min(MAX_ITEMS_PER_PAGE);
    (page, per_page)
}

fn labels_to_value(labels: &[BoardLabel]) -> AppResult<serde_json::Value> {
    serde_json::to_value(labels)
        .map_err(|e| AppError::internal(format!("Failed to encode labels: {}", e)))
}

impl BoardsService {
    /// Live board the user owns or belongs to. 404 when missing, 403 when not a member.
    pub fn require_member(
        conn: &mut PgConnection,
        user_id: Uuid,
        board_id: Uuid,
    ) -> AppResult<Board> {
        let board = BoardRepo::find_live_by_id(conn, board_id)?
            .ok_or_else(|| AppError::not_found("Board"))?;
        if !board.is_member(user_id) {
            return Err(AppError::forbidden("You are not a member of this board"));
        }
        Ok(board)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateBoardRequest,
    ) -> AppResult<Board> {
        let title = req.title.trim().to_string();
        let new_board = NewBoard {
            slug: slugify(&title),
            title,
            description: req.description.trim().to_string(),
            board_type: req.board_type,
            owner_ids: vec![ctx.user_id],
            member_ids: Vec::new(),
        };
        let board = BoardRepo::insert(conn, &new_board)?;
        tracing::info!(board_id = %board.id, user_id = %ctx.user_id, "Board created");
        Ok(board)
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        query: &BoardListQuery,
    ) -> AppResult<(Vec<Board>, Pagination, i64)> {
        let (page, per_page) = page_params(query);
        let (boards, total) =
            BoardRepo::list_for_user(conn, ctx.user_id, page, per_page, query.q.as_deref())?;
        Ok((boards, Pagination::new(page, per_page, total), total))
    }

    pub fn details(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        board_id: Uuid,
    ) -> AppResult<BoardDetails> {
        let board = Self::require_member(conn, ctx.user_id, board_id)?;

        let columns = ColumnRepo::list_by_board(conn, board.id)?;
        let mut cards_by_column: HashMap<Uuid, Vec<Card>> = HashMap::new();
        for card in CardRepo::list_by_board(conn, board.id)? {
            cards_by_column.entry(card.column_id).or_default().push(card);
        }

        let columns = order::sort_by_order(columns, &board.column_order_ids, |c| c.id)
            .into_iter()
            .map(|column| {
                let cards = cards_by_column.remove(&column.id).unwrap_or_default();
                let cards = order::sort_by_order(cards, &column.card_order_ids, |c| c.id);
                ColumnWithCards { column, cards }
            })
            .collect();

        let user_ids: Vec<Uuid> = board
            .owner_ids
            .iter()
            .chain(board.member_ids.iter())
            .copied()
            .collect();
        let users = UserRepo::find_by_ids(conn, &user_ids)?;
        let pick = |ids: &[Uuid]| -> Vec<UserInfo> {
            ids.iter()
                .filter_map(|id| users.iter().find(|u| u.id == *id))
                .map(UserInfo::from)
                .collect()
        };
        let owners = pick(&board.owner_ids);
        let members = pick(&board.member_ids);

        Ok(BoardDetails {
            board,
            owners,
            members,
            columns,
        })
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        board_id: Uuid,
        req: &UpdateBoardRequest,
    ) -> AppResult<Board> {
        let board = Self::require_member(conn, ctx.user_id, board_id)?;

        if let Some(proposed) = &req.column_order_ids {
            if !order::is_permutation(&board.column_order_ids, proposed) {
                return Err(AppError::validation(
                    "column_order_ids must contain exactly the board's columns",
                ));
            }
        }

        let title = req.title.as_ref().map(|t| t.trim().to_string());
        let changes = BoardChangeset {
            slug: title.as_deref().map(slugify),
            title,
            description: req.description.as_ref().map(|d| d.trim().to_string()),
            board_type: req.board_type,
            background: req.background.clone(),
            column_order_ids: req.column_order_ids.clone(),
            updated_at: None,
        };

        let board = BoardRepo::update(conn, board.id, changes)?;
        tracing::info!(board_id = %board.id, user_id = %ctx.user_id, "Board updated");
        Ok(board)
    }

    /// Owners only. Columns and cards stay in place and become unreachable with the board.
    pub fn delete(conn: &mut PgConnection, ctx: &RequestContext, board_id: Uuid) -> AppResult<()> {
        let board = Self::require_member(conn, ctx.user_id, board_id)?;
        if !board.is_owner(ctx.user_id) {
            return Err(AppError::forbidden("Only board owners can delete the board"));
        }
        BoardRepo::soft_delete(conn, board.id)?;
        tracing::info!(board_id = %board.id, user_id = %ctx.user_id, "Board deleted");
        Ok(())
    }

    /// Moves a card between two columns of the same board in one transaction.
    pub fn move_card(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &MoveCardRequest,
    ) -> AppResult<Card> {
        if req.prev_column_id == req.next_column_id {
            return Err(same_column_move());
        }

        conn.transaction::<Card, AppError, _>(|conn| {
            let card = CardRepo::find_live_by_id(conn, req.current_card_id)?
                .ok_or_else(|| AppError::not_found("Card"))?;
            Self::require_member(conn, ctx.user_id, card.board_id)?;

            let prev = ColumnRepo::find_live_by_id_for_update(conn, req.prev_column_id)?
                .ok_or_else(|| AppError::not_found("Column"))?;
            let next = ColumnRepo::find_live_by_id_for_update(conn, req.next_column_id)?
                .ok_or_else(|| AppError::not_found("Column"))?;

            check_card_move(&card, &prev, &next, req)?;

            ColumnRepo::set_card_order(conn, prev.id, req.prev_card_order_ids.clone())?;
            ColumnRepo::set_card_order(conn, next.id, req.next_card_order_ids.clone())?;
            let card = CardRepo::update(
                conn,
                card.id,
                CardChangeset {
                    column_id: Some(next.id),
                    ..Default::default()
                },
            )?;

            tracing::info!(
                card_id = %card.id,
                from_column = %prev.id,
                to_column = %next.id,
                "Card moved"
            );
            Ok(card)
        })
    }

    pub fn create_label(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        board_id: Uuid,
        req: &CreateLabelRequest,
    ) -> AppResult<BoardLabel> {
        let board = Self::require_member(conn, ctx.user_id, board_id)?;
        let label = BoardLabel {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            color: req.color.to_lowercase(),
        };
        let mut labels = board.board_labels();
        labels.push(label.clone());
        BoardRepo::set_labels(conn, board.id, labels_to_value(&labels)?)?;
        tracing::info!(board_id = %board.id, label_id = %label.id, "Board label created");
        Ok(label)
    }

    pub fn update_label(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        board_id: Uuid,
        label_id: Uuid,
        req: &UpdateLabelRequest,
    ) -> AppResult<BoardLabel> {
        let board = Self::require_member(conn, ctx.user_id, board_id)?;
        let mut labels = board.board_labels();
        let label = labels
            .iter_mut()
            .find(|l| l.id == label_id)
            .ok_or_else(|| AppError::not_found("Label"))?;

        if let Some(title) = &req.title {
            label.title = title.trim().to_string();
        }
        if let Some(color) = &req.color {
            label.color = color.to_lowercase();
        }
        let updated = label.clone();

        BoardRepo::set_labels(conn, board.id, labels_to_value(&labels)?)?;
        Ok(updated)
    }

    /// Removes the label from the board and from every card that carries it.
    pub fn delete_label(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        board_id: Uuid,
        label_id: Uuid,
    ) -> AppResult<()> {
        let board = Self::require_member(conn, ctx.user_id, board_id)?;
        let labels = board.board_labels();
        if !labels.iter().any(|l| l.id == label_id) {
            return Err(AppError::not_found("Label"));
        }
        let remaining: Vec<BoardLabel> = labels.into_iter().filter(|l| l.id != label_id).collect();
        let value = labels_to_value(&remaining)?;

        let touched = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            BoardRepo::set_labels(conn, board.id, value)?;
            CardRepo::remove_label_from_board(conn, board.id, label_id)
        })?;
        tracing::info!(board_id = %board.id, label_id = %label_id, cards = touched, "Board label deleted");
        Ok(())
    }
}
