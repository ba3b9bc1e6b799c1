pub mod user_cache;

pub use user_cache::UserCache;

use ::redis::{AsyncCommands, Client};

use crate::error::AppResult;

const REVOKED_TOKEN_PREFIX: &str = "revoked_token:";

fn revoked_key(jti: &str) -> String {
    format!("{}{}", REVOKED_TOKEN_PREFIX, jti)
}

async fn connection(redis_client: &Client) -> AppResult<::redis::aio::MultiplexedConnection> {
    Ok(redis_client.get_multiplexed_async_connection().await?)
}

/// Marks an access token id as revoked until the token would have expired anyway.
pub async fn revoke_token(redis_client: &Client, jti: &str, ttl_seconds: u64) -> AppResult<()> {
    if ttl_seconds == 0 {
        return Ok(());
    }
    let mut conn = connection(redis_client).await?;
    let _: () = conn.set_ex(revoked_key(jti), 1, ttl_seconds).await?;
    Ok(())
}

pub async fn is_token_revoked(redis_client: &Client, jti: &str) -> AppResult<bool> {
    let mut conn = connection(redis_client).await?;
    let exists: bool = conn.exists(revoked_key(jti)).await?;
    Ok(exists)
}
