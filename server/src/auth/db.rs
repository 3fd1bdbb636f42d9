use chrono::{Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::NewAdminSession;
use crate::schema::admin_sessions;

use super::crypto::{generate_token, hash_token};

/// Lifetime of an admin session and of its cookie.
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Store a new admin session and return the raw token for the cookie.
pub fn create_session(conn: &mut PgConnection) -> Result<String, diesel::result::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::seconds(SESSION_TTL_SECS);

    diesel::insert_into(admin_sessions::table)
        .values(&NewAdminSession {
            id: Uuid::new_v4(),
            token_hash: &token_hash,
            expires_at,
        })
        .execute(conn)?;

    // Expired rows are cleared whenever someone logs in.
    diesel::delete(admin_sessions::table.filter(admin_sessions::expires_at.lt(Utc::now())))
        .execute(conn)?;

    Ok(token)
}

pub fn session_is_valid(pool: &DbPool, token: &str) -> bool {
    let Ok(mut conn) = pool.get() else {
        return false;
    };
    let token_hash = hash_token(token);

    diesel::select(diesel::dsl::exists(
        admin_sessions::table
            .filter(admin_sessions::token_hash.eq(&token_hash))
            .filter(admin_sessions::expires_at.gt(Utc::now())),
    ))
    .get_result(&mut conn)
    .unwrap_or(false)
}
