use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::column::{Column, ColumnChangeset, NewColumn};

pub struct ColumnRepo;

impl ColumnRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_column: &NewColumn,
    ) -> Result<Column, diesel::result::Error> {
        diesel::insert_into(crate::schema::board_columns::table)
            .values(new_column)
            .returning(Column::as_returning())
            .get_result(conn)
    }

    pub fn find_live_by_id(
        conn: &mut PgConnection,
        column_id: Uuid,
    ) -> Result<Option<Column>, diesel::result::Error> {
        use crate::schema::board_columns::dsl::*;
        board_columns
            .filter(id.eq(column_id))
            .filter(is_destroyed.eq(false))
            .select(Column::as_select())
            .first(conn)
            .optional()
    }

    /// Same as `find_live_by_id` but holds a row lock until the transaction ends.
    pub fn find_live_by_id_for_update(
        conn: &mut PgConnection,
        column_id: Uuid,
    ) -> Result<Option<Column>, diesel::result::Error> {
        use crate::schema::board_columns::dsl::*;
        board_columns
            .filter(id.eq(column_id))
            .filter(is_destroyed.eq(false))
            .select(Column::as_select())
            .for_update()
            .first(conn)
            .optional()
    }

    pub fn list_by_board(
        conn: &mut PgConnection,
        target_board_id: Uuid,
    ) -> Result<Vec<Column>, diesel::result::Error> {
        use crate::schema::board_columns::dsl::*;
        board_columns
            .filter(board_id.eq(target_board_id))
            .filter(is_destroyed.eq(false))
            .order(created_at.asc())
            .select(Column::as_select())
            .load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        column_id: Uuid,
        mut changes: ColumnChangeset,
    ) -> Result<Column, diesel::result::Error> {
        use crate::schema::board_columns::dsl::*;
        changes.updated_at = Some(Utc::now());
        diesel::update(board_columns.filter(id.eq(column_id)))
            .set(&changes)
            .returning(Column::as_returning())
            .get_result(conn)
    }

    pub fn set_card_order(
        conn: &mut PgConnection,
        column_id: Uuid,
        order: Vec<Uuid>,
    ) -> Result<Column, diesel::result::Error> {
        use crate::schema::board_columns::dsl::*;
        diesel::update(board_columns.filter(id.eq(column_id)))
            .set((card_order_ids.eq(order), updated_at.eq(Utc::now())))
            .returning(Column::as_returning())
            .get_result(conn)
    }

    pub fn soft_delete(
        conn: &mut PgConnection,
        column_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::board_columns::dsl::*;
        diesel::update(board_columns.filter(id.eq(column_id)))
            .set((is_destroyed.eq(true), updated_at.eq(Utc::now())))
            .execute(conn)
    }
}
