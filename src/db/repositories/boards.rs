use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::board::{Board, BoardChangeset, NewBoard};
use crate::schema::boards;

pub struct BoardRepo;

type BoxedBoardQuery<'a> = boards::BoxedQuery<'a, Pg>;

fn visible_to(user_id: Uuid, title_filter: Option<&str>) -> BoxedBoardQuery<'static> {
    use crate::schema::boards::dsl::*;
    let mut query = boards
        .filter(is_destroyed.eq(false))
        .filter(
            owner_ids
                .contains(vec![user_id])
                .or(member_ids.contains(vec![user_id])),
        )
        .into_boxed();

    if let Some(q) = title_filter.map(str::trim).filter(|q| !q.is_empty()) {
        let escaped = q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        query = query.filter(title.ilike(format!("%{}%", escaped)));
    }
    query
}

impl BoardRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_board: &NewBoard,
    ) -> Result<Board, diesel::result::Error> {
        diesel::insert_into(boards::table)
            .values(new_board)
            .returning(Board::as_returning())
            .get_result(conn)
    }

    pub fn find_live_by_id(
        conn: &mut PgConnection,
        board_id: Uuid,
    ) -> Result<Option<Board>, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        boards
            .filter(id.eq(board_id))
            .filter(is_destroyed.eq(false))
            .select(Board::as_select())
            .first(conn)
            .optional()
    }

    /// Row-locks the board until the surrounding transaction ends.
    pub fn lock_column_order(
        conn: &mut PgConnection,
        board_id: Uuid,
    ) -> Result<Option<Vec<Uuid>>, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        boards
            .filter(id.eq(board_id))
            .filter(is_destroyed.eq(false))
            .select(column_order_ids)
            .for_update()
            .first(conn)
            .optional()
    }

    pub fn find_by_ids(
        conn: &mut PgConnection,
        board_ids: &[Uuid],
    ) -> Result<Vec<Board>, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        if board_ids.is_empty() {
            return Ok(Vec::new());
        }
        boards
            .filter(id.eq_any(board_ids))
            .select(Board::as_select())
            .load(conn)
    }

    /// Returns one page of the boards the user owns or belongs to, and the total count.
    pub fn list_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
        page: i64,
        per_page: i64,
        title_filter: Option<&str>,
    ) -> Result<(Vec<Board>, i64), diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        let total: i64 = visible_to(user_id, title_filter).count().get_result(conn)?;
        let rows = visible_to(user_id, title_filter)
            .order((title.asc(), created_at.asc()))
            .limit(per_page)
            .offset((page - 1) * per_page)
            .select(Board::as_select())
            .load(conn)?;
        Ok((rows, total))
    }

    pub fn update(
        conn: &mut PgConnection,
        board_id: Uuid,
        mut changes: BoardChangeset,
    ) -> Result<Board, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        changes.updated_at = Some(Utc::now());
        diesel::update(boards.filter(id.eq(board_id)))
            .set(&changes)
            .returning(Board::as_returning())
            .get_result(conn)
    }

    pub fn set_column_order(
        conn: &mut PgConnection,
        board_id: Uuid,
        order: Vec<Uuid>,
    ) -> Result<Board, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        diesel::update(boards.filter(id.eq(board_id)))
            .set((column_order_ids.eq(order), updated_at.eq(Utc::now())))
            .returning(Board::as_returning())
            .get_result(conn)
    }

    pub fn set_labels(
        conn: &mut PgConnection,
        board_id: Uuid,
        new_labels: serde_json::Value,
    ) -> Result<Board, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        diesel::update(boards.filter(id.eq(board_id)))
            .set((labels.eq(new_labels), updated_at.eq(Utc::now())))
            .returning(Board::as_returning())
            .get_result(conn)
    }

    pub fn set_members(
        conn: &mut PgConnection,
        board_id: Uuid,
        new_member_ids: Vec<Uuid>,
    ) -> Result<Board, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        diesel::update(boards.filter(id.eq(board_id)))
            .set((member_ids.eq(new_member_ids), updated_at.eq(Utc::now())))
            .returning(Board::as_returning())
            .get_result(conn)
    }

    pub fn soft_delete(
        conn: &mut PgConnection,
        board_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::boards::dsl::*;
        diesel::update(boards.filter(id.eq(board_id)))
            .set((is_destroyed.eq(true), updated_at.eq(Utc::now())))
            .execute(conn)
    }
}
