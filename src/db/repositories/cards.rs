use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{Array, Uuid as SqlUuid};
use uuid::Uuid;

use crate::db::models::card::{Card, CardChangeset, NewCard};

diesel::sql_function! {
    fn array_remove(array: Array<SqlUuid>, element: SqlUuid) -> Array<SqlUuid>;
}

pub struct CardRepo;

impl CardRepo {
    pub fn insert(
        conn: &mut PgConnection,
        new_card: &NewCard,
    ) -> Result<Card, diesel::result::Error> {
        diesel::insert_into(crate::schema::cards::table)
            .values(new_card)
            .returning(Card::as_returning())
            .get_result(conn)
    }

    pub fn find_live_by_id(
        conn: &mut PgConnection,
        card_id: Uuid,
    ) -> Result<Option<Card>, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        cards
            .filter(id.eq(card_id))
            .filter(is_destroyed.eq(false))
            .select(Card::as_select())
            .first(conn)
            .optional()
    }

    /// Attachment ids of a card, destroyed or not, row-locked until the transaction ends.
    pub fn find_attachment_ids_any(
        conn: &mut PgConnection,
        card_id: Uuid,
    ) -> Result<Option<Vec<Uuid>>, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        cards
            .filter(id.eq(card_id))
            .select(attachment_ids)
            .for_update()
            .first(conn)
            .optional()
    }

    pub fn list_by_board(
        conn: &mut PgConnection,
        target_board_id: Uuid,
    ) -> Result<Vec<Card>, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        cards
            .filter(board_id.eq(target_board_id))
            .filter(is_destroyed.eq(false))
            .order(created_at.asc())
            .select(Card::as_select())
            .load(conn)
    }

    pub fn list_by_column(
        conn: &mut PgConnection,
        target_column_id: Uuid,
    ) -> Result<Vec<Card>, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        cards
            .filter(column_id.eq(target_column_id))
            .filter(is_destroyed.eq(false))
            .order(created_at.asc())
            .select(Card::as_select())
            .load(conn)
    }

    pub fn update(
        conn: &mut PgConnection,
        card_id: Uuid,
        mut changes: CardChangeset,
    ) -> Result<Card, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        changes.updated_at = Some(Utc::now());
        diesel::update(cards.filter(id.eq(card_id)))
            .set(&changes)
            .returning(Card::as_returning())
            .get_result(conn)
    }

    pub fn soft_delete(
        conn: &mut PgConnection,
        card_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        diesel::update(cards.filter(id.eq(card_id)))
            .set((is_destroyed.eq(true), updated_at.eq(Utc::now())))
            .execute(conn)
    }

    pub fn soft_delete_by_column(
        conn: &mut PgConnection,
        target_column_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        diesel::update(
            cards
                .filter(column_id.eq(target_column_id))
                .filter(is_destroyed.eq(false)),
        )
        .set((is_destroyed.eq(true), updated_at.eq(Utc::now())))
        .execute(conn)
    }

    /// Drops a deleted board label from every card of that board.
    pub fn remove_label_from_board(
        conn: &mut PgConnection,
        target_board_id: Uuid,
        label_id: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::cards::dsl::*;
        diesel::update(
            cards
                .filter(board_id.eq(target_board_id))
                .filter(label_ids.contains(vec![label_id])),
        )
        .set((
            label_ids.eq(array_remove(label_ids, label_id)),
            updated_at.eq(Utc::now()),
        ))
        .execute(conn)
    }
}
