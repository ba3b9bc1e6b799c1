use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::{
    AppState,
    db::models::{api::ApiResponse, user::AuthUser},
    error::{AppError, AppResult},
    services::boards_service::BoardsService,
    websocket::{
        auth::{WebSocketAuthQuery, authenticate_socket},
        events::{
            BE_CONNECTED, BE_JOINED_BOARD, BE_LEFT_BOARD, ClientCommand, PONG, ServerEvent,
            parse_client_frame,
        },
        manager::RoomConnection,
    },
};

/// 处理WebSocket升级请求
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WebSocketAuthQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let auth_info = match authenticate_socket(&state, &query, &headers).await {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!("WebSocket authentication failed: {}", err);
            return err.into_response();
        }
    };

    tracing::info!(user_id = %auth_info.user.id, "WebSocket upgrade request");
    ws.on_upgrade(move |socket| handle_connection(socket, state, auth_info.user))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, user: AuthUser) {
    let connection_id = Uuid::new_v4().to_string();
    // subscribe before registering so nothing addressed to us is missed
    let mut rx = state.rooms.subscribe();
    let kick = state
        .rooms
        .add_connection(
            connection_id.clone(),
            RoomConnection::new(user.id, user.username.clone()),
        )
        .await;

    let (mut sender, mut receiver) = socket.split();

    let welcome = ServerEvent::new(
        BE_CONNECTED,
        None,
        serde_json::json!({ "connection_id": connection_id, "user_id": user.id }),
    );
    if let Ok(text) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(text)).await.is_err() {
            state.rooms.remove_connection(&connection_id).await;
            return;
        }
    }

    let mut send_task = {
        let connection_id = connection_id.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(delivery) => {
                        if !delivery.is_for(&connection_id) {
                            continue;
                        }
                        let text = match serde_json::to_string(delivery.event.as_ref()) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!("Failed to serialize event: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(connection_id = %connection_id, skipped, "Socket lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let mut recv_task = {
        let state = state.clone();
        let connection_id = connection_id.clone();
        tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        handle_text(&state, &connection_id, &user, &text).await;
                    }
                    Message::Ping(_) | Message::Pong(_) => {
                        state.rooms.update_ping(&connection_id).await;
                    }
                    Message::Close(_) => break,
                    Message::Binary(_) => {
                        state.rooms.send_to_connection(
                            &connection_id,
                            ServerEvent::error("Binary frames are not supported", None),
                        );
                    }
                }
            }
        })
    };

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
        _ = kick.notified() => {
            send_task.abort();
            recv_task.abort();
        }
    }

    state.rooms.remove_connection(&connection_id).await;
}

async fn handle_text(state: &Arc<AppState>, connection_id: &str, user: &AuthUser, text: &str) {
    let rooms = &state.rooms;
    rooms.update_ping(connection_id).await;

    let command = match parse_client_frame(text) {
        Ok(command) => command,
        Err(message) => {
            rooms.send_to_connection(connection_id, ServerEvent::error(message, None));
            return;
        }
    };

    match command {
        ClientCommand::Ping => {
            rooms.send_to_connection(connection_id, ServerEvent::new(PONG, None, serde_json::json!({})));
        }
        ClientCommand::Join(board_id) => match check_membership(state, user.id, board_id).await {
            Ok(()) => {
                rooms.join_room(connection_id, board_id).await;
                let online = rooms.room_user_ids(board_id).await;
                rooms.send_to_connection(
                    connection_id,
                    ServerEvent::new(
                        BE_JOINED_BOARD,
                        Some(board_id),
                        serde_json::json!({ "board_id": board_id, "online_user_ids": online }),
                    ),
                );
            }
            Err(err) => {
                tracing::debug!(board_id = %board_id, user_id = %user.id, "Join refused: {}", err);
                rooms.send_to_connection(connection_id, ServerEvent::error(err.to_string(), Some(board_id)));
            }
        },
        ClientCommand::Leave(board_id) => {
            rooms.leave_room(connection_id, board_id).await;
            rooms.send_to_connection(
                connection_id,
                ServerEvent::new(BE_LEFT_BOARD, Some(board_id), serde_json::json!({ "board_id": board_id })),
            );
        }
        ClientCommand::Relay {
            event,
            board_id,
            data,
        } => {
            if !rooms.is_in_room(connection_id, board_id).await {
                rooms.send_to_connection(
                    connection_id,
                    ServerEvent::error("Join the board before sending events to it", Some(board_id)),
                );
                return;
            }
            let delivered = rooms
                .broadcast_to_room(
                    board_id,
                    ServerEvent::new(event.as_str(), Some(board_id), data).from_user(user.id),
                    Some(connection_id),
                )
                .await;
            tracing::debug!(board_id = %board_id, event = %event, delivered, "Relayed board event");
        }
    }
}

async fn check_membership(state: &Arc<AppState>, user_id: Uuid, board_id: Uuid) -> AppResult<()> {
    let pool = state.db.clone();
    tokio::task::spawn_blocking(move || -> AppResult<()> {
        let mut conn = pool.get()?;
        BoardsService::require_member(&mut conn, user_id, board_id).map(|_| ())
    })
    .await
    .map_err(|e| AppError::internal(format!("Membership check failed: {}", e)))?
}

/// 获取WebSocket连接统计信息
pub async fn websocket_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.rooms.stats().await;
    Json(ApiResponse::success(stats, "WebSocket stats retrieved successfully"))
}
