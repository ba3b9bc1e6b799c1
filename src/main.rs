use axum::{
    Router, Server,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
};
use std::net::SocketAddr;
use std::sync::Arc;
use task_board::{
    AppState,
    config::{Config, ServerConfig},
    db, error, init_tracing,
    middleware::{auth::auth_middleware, logger},
    routes, websocket,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // 携带 cookie 时不能使用通配符
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    error::expose_error_stack(config.is_development());

    let db = db::create_pool(&config.database())?;
    let redis = redis::Client::open(config.redis_url.as_str())?;
    let addr: SocketAddr = config.server_address().parse()?;
    let cors = cors_layer(&config.server());

    let state = Arc::new(AppState::new(db, redis, config));

    let rooms = state.rooms.clone();
    tokio::spawn(async move {
        websocket::start_connection_cleanup_task(rooms).await;
    });

    let protected_routes = routes::create_router(state.clone())
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let api = Router::new()
        .merge(routes::create_public_router(state.clone()))
        .merge(protected_routes);

    let app = Router::new()
        .nest("/v1", api)
        .merge(websocket::create_websocket_routes().with_state(state))
        .layer(cors)
        .layer(from_fn(logger));

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("WebSocket endpoint available at ws://{}/ws", addr);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
