pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;
pub mod websocket;

use crate::cache::UserCache;
use crate::config::Config;
use crate::db::DbPool;
use crate::mail::SharedMailer;
use crate::middleware::auth::TokenService;
use crate::storage::SharedMediaStorage;
use crate::websocket::RoomManager;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub redis: redis::Client,
    pub config: Arc<Config>,
    pub token_service: TokenService,
    pub user_cache: UserCache,
    pub media: SharedMediaStorage,
    pub mailer: SharedMailer,
    pub rooms: RoomManager,
}

impl AppState {
    pub fn new(db: DbPool, redis: redis::Client, config: Config) -> Self {
        let token_service = TokenService::new(config.auth());
        let user_cache = UserCache::new(redis.clone());
        let media = storage::create_media_storage(&config.media());
        let mailer = mail::create_mailer(&config.mail());
        Self {
            db,
            redis,
            config: Arc::new(config),
            token_service,
            user_cache,
            media,
            mailer,
            rooms: RoomManager::new(),
        }
    }
}

/// `RUST_LOG` wins over `LOG_LEVEL` when both are set.
pub fn init_tracing(config: &Config) {
    let logging = config.logging();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));

    if logging.is_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .init();
    }
}
