use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::models::attachment::Attachment,
    db::models::column::{
        Column, ColumnChangeset, ColumnWithCards, CreateColumnRequest, NewColumn,
        UpdateColumnRequest,
    },
    db::repositories::{AttachmentRepo, BoardRepo, CardRepo, ColumnRepo},
    error::{AppError, AppResult},
    services::{boards_service::BoardsService, context::RequestContext},
    utils::order,
};

pub struct ColumnsService;

impl ColumnsService {
    /// Live column whose board the user can access.
    pub fn require_member(
        conn: &mut PgConnection,
        user_id: Uuid,
        column_id: Uuid,
    ) -> AppResult<Column> {
        let column = ColumnRepo::find_live_by_id(conn, column_id)?
            .ok_or_else(|| AppError::not_found("Column"))?;
        BoardsService::require_member(conn, user_id, column.board_id)?;
        Ok(column)
    }

    pub fn create(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        req: &CreateColumnRequest,
    ) -> AppResult<ColumnWithCards> {
        let board = BoardsService::require_member(conn, ctx.user_id, req.board_id)?;
        let new_column = NewColumn {
            board_id: board.id,
            title: req.title.trim().to_string(),
            color: req.color.as_ref().map(|c| c.to_lowercase()),
        };

        let column = conn.transaction::<Column, diesel::result::Error, _>(|conn| {
            let column = ColumnRepo::insert(conn, &new_column)?;
            // 行锁: 并发创建会在这里排队
            let current = BoardRepo::lock_column_order(conn, board.id)?.unwrap_or_default();
            BoardRepo::set_column_order(conn, board.id, order::push_unique(&current, column.id))?;
            Ok(column)
        })?;

        tracing::info!(board_id = %board.id, column_id = %column.id, "Column created");
        Ok(ColumnWithCards {
            column,
            cards: Vec::new(),
        })
    }

    pub fn update(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        column_id: Uuid,
        req: &UpdateColumnRequest,
    ) -> AppResult<Column> {
        let column = Self::require_member(conn, ctx.user_id, column_id)?;

        if let Some(proposed) = &req.card_order_ids {
            if !order::is_permutation(&column.card_order_ids, proposed) {
                return Err(AppError::validation(
                    "card_order_ids must contain exactly the column's cards",
                ));
            }
        }

        let changes = ColumnChangeset {
            title: req.title.as_ref().map(|t| t.trim().to_string()),
            color: req.color.as_ref().map(|c| c.to_lowercase()),
            card_order_ids: req.card_order_ids.clone(),
            updated_at: None,
        };
        let column = ColumnRepo::update(conn, column.id, changes)?;
        tracing::info!(column_id = %column.id, "Column updated");
        Ok(column)
    }

    /// Destroys the column and its cards. Returns the number of cards destroyed and
    /// the attachments left for provider cleanup.
    pub fn delete(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        column_id: Uuid,
    ) -> AppResult<(usize, Vec<Attachment>)> {
        let column = Self::require_member(conn, ctx.user_id, column_id)?;

        let (deleted_cards, attachments) =
            conn.transaction::<(usize, Vec<Attachment>), diesel::result::Error, _>(|conn| {
                let cards = CardRepo::list_by_column(conn, column.id)?;
                let mut attachments = Vec::new();
                for card in &cards {
                    attachments.extend(AttachmentRepo::list_by_card(conn, card.id)?);
                }

                let deleted = CardRepo::soft_delete_by_column(conn, column.id)?;
                ColumnRepo::soft_delete(conn, column.id)?;

                if let Some(board) = BoardRepo::find_live_by_id(conn, column.board_id)? {
                    BoardRepo::set_column_order(
                        conn,
                        board.id,
                        order::pull(&board.column_order_ids, column.id),
                    )?;
                }
                Ok((deleted, attachments))
            })?;

        tracing::info!(
            column_id = %column.id,
            board_id = %column.board_id,
            deleted_cards,
            attachments = attachments.len(),
            "Column deleted"
        );
        Ok((deleted_cards, attachments))
    }
}
