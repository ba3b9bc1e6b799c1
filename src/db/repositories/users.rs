use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::models::user::{NewUser, User};

pub struct UserRepo;

impl UserRepo {
    pub fn find_by_id(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<User>, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        users
            .filter(id.eq(user_id))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_email(
        conn: &mut PgConnection,
        target_email: &str,
    ) -> Result<Option<User>, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        users
            .filter(email.eq(target_email))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_ids(
        conn: &mut PgConnection,
        user_ids: &[Uuid],
    ) -> Result<Vec<User>, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        users
            .filter(id.eq_any(user_ids))
            .select(User::as_select())
            .load(conn)
    }

    pub fn exists_by_email(
        conn: &mut PgConnection,
        target_email: &str,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        diesel::select(diesel::dsl::exists(users.filter(email.eq(target_email))))
            .get_result(conn)
    }

    pub fn exists_by_username(
        conn: &mut PgConnection,
        target_username: &str,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        diesel::select(diesel::dsl::exists(
            users.filter(username.eq(target_username)),
        ))
        .get_result(conn)
    }

    pub fn insert(
        conn: &mut PgConnection,
        new_user: &NewUser,
    ) -> Result<User, diesel::result::Error> {
        diesel::insert_into(crate::schema::users::table)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(conn)
    }

    pub fn activate(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<User, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        diesel::update(users.filter(id.eq(user_id)))
            .set((
                is_active.eq(true),
                verify_token.eq(None::<String>),
                updated_at.eq(Utc::now()),
            ))
            .returning(User::as_returning())
            .get_result(conn)
    }

    pub fn update_profile(
        conn: &mut PgConnection,
        user_id: Uuid,
        new_display_name: Option<String>,
        new_password_hash: Option<String>,
    ) -> Result<User, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        conn.transaction(|conn| {
            if let Some(name) = new_display_name {
                diesel::update(users.filter(id.eq(user_id)))
                    .set(display_name.eq(name))
                    .execute(conn)?;
            }
            if let Some(hash) = new_password_hash {
                diesel::update(users.filter(id.eq(user_id)))
                    .set(password_hash.eq(hash))
                    .execute(conn)?;
            }
            diesel::update(users.filter(id.eq(user_id)))
                .set(updated_at.eq(Utc::now()))
                .returning(User::as_returning())
                .get_result(conn)
        })
    }

    pub fn update_avatar(
        conn: &mut PgConnection,
        user_id: Uuid,
        new_avatar: &str,
        new_public_id: &str,
    ) -> Result<User, diesel::result::Error> {
        use crate::schema::users::dsl::*;
        diesel::update(users.filter(id.eq(user_id)))
            .set((
                avatar.eq(Some(new_avatar)),
                avatar_public_id.eq(Some(new_public_id)),
                updated_at.eq(Utc::now()),
            ))
            .returning(User::as_returning())
            .get_result(conn)
    }
}
