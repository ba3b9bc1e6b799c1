use redis::AsyncCommands;
use uuid::Uuid;

use crate::db::models::user::AuthUser;
use crate::error::AppError;

/// 用户缓存键前缀
const USER_CACHE_PREFIX: &str = "user:";

/// 缓存过期时间（秒）
const USER_CACHE_TTL: u64 = 3600; // 1小时

/// 用户缓存管理器
#[derive(Clone)]
pub struct UserCache {
    redis_client: redis::Client,
}

impl UserCache {
    pub fn new(redis_client: redis::Client) -> Self {
        Self { redis_client }
    }

    fn key(user_id: Uuid) -> String {
        format!("{}{}", USER_CACHE_PREFIX, user_id)
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        Ok(self.redis_client.get_multiplexed_async_connection().await?)
    }

    pub async fn cache_user(&self, user: &AuthUser) -> Result<(), AppError> {
        let mut conn = self.get_connection().await?;
        let user_json = serde_json::to_string(user)
            .map_err(|e| AppError::Internal(format!("Failed to serialize user: {}", e)))?;

        let _: () = conn
            .set_ex(Self::key(user.id), user_json, USER_CACHE_TTL)
            .await?;

        Ok(())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<AuthUser>, AppError> {
        let mut conn = self.get_connection().await?;
        let user_json: Option<String> = conn.get(Self::key(user_id)).await?;

        match user_json {
            Some(json) => {
                let user = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Failed to deserialize user: {}", e))
                })?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Called after any change to the user row (profile, avatar, activation).
    pub async fn invalidate_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut conn = self.get_connection().await?;
        let _: i64 = conn.del(Self::key(user_id)).await?;
        Ok(())
    }
}
