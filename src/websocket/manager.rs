use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::websocket::events::ServerEvent;

/// 广播通道容量
const BROADCAST_CAPACITY: usize = 1000;

/// One event plus the connection ids that should receive it.
/// Recipients are resolved when the event is published.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub recipients: Arc<HashSet<String>>,
    pub event: Arc<ServerEvent>,
}

impl Delivery {
    pub fn is_for(&self, connection_id: &str) -> bool {
        self.recipients.contains(connection_id)
    }
}

/// 连接信息
#[derive(Debug, Clone)]
pub struct RoomConnection {
    pub user_id: Uuid,
    pub username: String,
    pub connected_at: chrono::DateTime<chrono::Utc>,
    pub last_ping: chrono::DateTime<chrono::Utc>,
    pub rooms: HashSet<Uuid>,
    pub kick: Arc<Notify>,
}

impl RoomConnection {
    pub fn new(user_id: Uuid, username: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            user_id,
            username,
            connected_at: now,
            last_ping: now,
            rooms: HashSet::new(),
            kick: Arc::new(Notify::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomStats {
    pub total_connections: usize,
    pub unique_users: usize,
    pub active_rooms: usize,
}

/// Board rooms over a single broadcast channel.
#[derive(Clone)]
pub struct RoomManager {
    // connection_id -> connection
    connections: Arc<RwLock<HashMap<String, RoomConnection>>>,
    // board_id -> connection_ids
    rooms: Arc<RwLock<HashMap<Uuid, HashSet<String>>>>,
    broadcast_tx: broadcast::Sender<Delivery>,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomManager {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            rooms: Arc::new(RwLock::new(HashMap::new())),
            broadcast_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Delivery> {
        self.broadcast_tx.subscribe()
    }

    /// Returns the notifier that fires when the connection is evicted.
    pub async fn add_connection(&self, connection_id: String, connection: RoomConnection) -> Arc<Notify> {
        let kick = connection.kick.clone();
        info!(
            user_id = %connection.user_id,
            connection_id = %connection_id,
            "User {} connected", connection.username
        );
        self.connections.write().await.insert(connection_id, connection);
        kick
    }

    pub async fn remove_connection(&self, connection_id: &str) -> Option<RoomConnection> {
        let removed = self.connections.write().await.remove(connection_id)?;
        let mut rooms = self.rooms.write().await;
        for board_id in &removed.rooms {
            Self::detach(&mut rooms, *board_id, connection_id);
        }
        info!(
            user_id = %removed.user_id,
            connection_id = %connection_id,
            "User {} disconnected", removed.username
        );
        Some(removed)
    }

    fn detach(rooms: &mut HashMap<Uuid, HashSet<String>>, board_id: Uuid, connection_id: &str) {
        if let Some(members) = rooms.get_mut(&board_id) {
            members.remove(connection_id);
            if members.is_empty() {
                rooms.remove(&board_id);
            }
        }
    }

    /// Returns false when the connection is unknown.
    /// Both maps change under the connections lock, so a concurrent
    /// `remove_connection` sees either none or all of the join.
    pub async fn join_room(&self, connection_id: &str, board_id: Uuid) -> bool {
        let mut connections = self.connections.write().await;
        let Some(connection) = connections.get_mut(connection_id) else {
            return false;
        };
        connection.rooms.insert(board_id);
        self.rooms
            .write()
            .await
            .entry(board_id)
            .or_default()
            .insert(connection_id.to_string());
        drop(connections);
        debug!(board_id = %board_id, connection_id = %connection_id, "Joined board room");
        true
    }

    pub async fn leave_room(&self, connection_id: &str, board_id: Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(connection_id) {
            connection.rooms.remove(&board_id);
        }
        Self::detach(&mut *self.rooms.write().await, board_id, connection_id);
        drop(connections);
        debug!(board_id = %board_id, connection_id = %connection_id, "Left board room");
    }

    pub async fn is_in_room(&self, connection_id: &str, board_id: Uuid) -> bool {
        self.rooms
            .read()
            .await
            .get(&board_id)
            .is_some_and(|members| members.contains(connection_id))
    }

    /// Distinct users with at least one connection in the room.
    pub async fn room_user_ids(&self, board_id: Uuid) -> Vec<Uuid> {
        let Some(members) = self.rooms.read().await.get(&board_id).cloned() else {
            return Vec::new();
        };
        let connections = self.connections.read().await;
        let mut seen = HashSet::new();
        members
            .iter()
            .filter_map(|id| connections.get(id).map(|c| c.user_id))
            .filter(|user_id| seen.insert(*user_id))
            .collect()
    }

    pub async fn update_ping(&self, connection_id: &str) {
        if let Some(connection) = self.connections.write().await.get_mut(connection_id) {
            connection.last_ping = chrono::Utc::now();
        }
    }

    fn publish(&self, recipients: HashSet<String>, event: ServerEvent) -> usize {
        if recipients.is_empty() {
            return 0;
        }
        let count = recipients.len();
        let delivery = Delivery {
            recipients: Arc::new(recipients),
            event: Arc::new(event),
        };
        // no receivers means nobody is connected
        if self.broadcast_tx.send(delivery).is_err() {
            debug!("No active receivers for event");
            return 0;
        }
        count
    }

    /// Sends to every connection in the room except `exclude`. Returns the recipient count.
    pub async fn broadcast_to_room(
        &self,
        board_id: Uuid,
        event: ServerEvent,
        exclude: Option<&str>,
    ) -> usize {
        let recipients: HashSet<String> = self
            .rooms
            .read()
            .await
            .get(&board_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| Some(id.as_str()) != exclude)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        self.publish(recipients, event)
    }

    /// Sends to every live socket of the user.
    pub async fn send_to_user(&self, user_id: Uuid, event: ServerEvent) -> usize {
        let recipients: HashSet<String> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(_, c)| c.user_id == user_id)
            .map(|(id, _)| id.clone())
            .collect();
        if recipients.is_empty() {
            debug!(user_id = %user_id, "User is not connected");
        }
        self.publish(recipients, event)
    }

    pub fn send_to_connection(&self, connection_id: &str, event: ServerEvent) {
        let mut recipients = HashSet::new();
        recipients.insert(connection_id.to_string());
        self.publish(recipients, event);
    }

    pub async fn stats(&self) -> RoomStats {
        let (total_connections, unique_users) = {
            let connections = self.connections.read().await;
            let users: HashSet<Uuid> = connections.values().map(|c| c.user_id).collect();
            (connections.len(), users.len())
        };
        RoomStats {
            total_connections,
            unique_users,
            active_rooms: self.rooms.read().await.len(),
        }
    }

    // 清理超时连接
    pub async fn cleanup_stale_connections(&self, timeout_minutes: i64) -> usize {
        let cutoff_time = chrono::Utc::now() - chrono::Duration::minutes(timeout_minutes);
        let stale: Vec<String> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(_, c)| c.last_ping < cutoff_time)
            .map(|(id, _)| id.clone())
            .collect();

        for connection_id in &stale {
            if let Some(connection) = self.remove_connection(connection_id).await {
                warn!(user_id = %connection.user_id, "Removed stale connection");
                connection.kick.notify_one();
            }
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::events::PONG;
    use serde_json::json;

    async fn connect(manager: &RoomManager, user_id: Uuid) -> String {
        let id = Uuid::new_v4().to_string();
        manager
            .add_connection(id.clone(), RoomConnection::new(user_id, "tester".to_string()))
            .await;
        id
    }

    #[tokio::test]
    async fn room_broadcast_skips_sender() {
        let manager = RoomManager::new();
        let mut rx = manager.subscribe();
        let board = Uuid::new_v4();
        let a = connect(&manager, Uuid::new_v4()).await;
        let b = connect(&manager, Uuid::new_v4()).await;
        let outsider = connect(&manager, Uuid::new_v4()).await;
        assert!(manager.join_room(&a, board).await);
        assert!(manager.join_room(&b, board).await);

        let sent = manager
            .broadcast_to_room(board, ServerEvent::new("BE_CARD_UPDATED", Some(board), json!({})), Some(&a))
            .await;
        assert_eq!(sent, 1);

        let delivery = rx.recv().await.unwrap();
        assert!(delivery.is_for(&b));
        assert!(!delivery.is_for(&a));
        assert!(!delivery.is_for(&outsider));
    }

    #[tokio::test]
    async fn leaving_and_disconnecting_empty_rooms() {
        let manager = RoomManager::new();
        let board = Uuid::new_v4();
        let user = Uuid::new_v4();
        let a = connect(&manager, user).await;
        let b = connect(&manager, user).await;
        manager.join_room(&a, board).await;
        manager.join_room(&b, board).await;
        assert_eq!(manager.room_user_ids(board).await, vec![user]);

        manager.leave_room(&a, board).await;
        assert!(!manager.is_in_room(&a, board).await);
        assert_eq!(manager.stats().await.active_rooms, 1);

        manager.remove_connection(&b).await;
        assert_eq!(manager.stats().await.active_rooms, 0);
        assert!(manager.room_user_ids(board).await.is_empty());
    }

    #[tokio::test]
    async fn user_targeted_events_reach_all_sockets() {
        let manager = RoomManager::new();
        let _rx = manager.subscribe();
        let user = Uuid::new_v4();
        connect(&manager, user).await;
        connect(&manager, user).await;
        connect(&manager, Uuid::new_v4()).await;

        let sent = manager
            .send_to_user(user, ServerEvent::new(PONG, None, json!({})))
            .await;
        assert_eq!(sent, 2);
        assert_eq!(
            manager.send_to_user(Uuid::new_v4(), ServerEvent::new(PONG, None, json!({}))).await,
            0
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn join_racing_disconnect_leaves_no_ghost_member() {
        let manager = RoomManager::new();
        let board = Uuid::new_v4();
        for _ in 0..200 {
            let id = connect(&manager, Uuid::new_v4()).await;
            let joiner = {
                let manager = manager.clone();
                let id = id.clone();
                tokio::spawn(async move { manager.join_room(&id, board).await })
            };
            let remover = {
                let manager = manager.clone();
                let id = id.clone();
                tokio::spawn(async move { manager.remove_connection(&id).await })
            };
            joiner.await.unwrap();
            remover.await.unwrap();
            assert!(!manager.is_in_room(&id, board).await);
        }
        assert_eq!(manager.stats().await.active_rooms, 0);
    }

    #[tokio::test]
    async fn unknown_connection_cannot_join() {
        let manager = RoomManager::new();
        assert!(!manager.join_room("missing", Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn stale_connections_are_evicted() {
        let manager = RoomManager::new();
        let board = Uuid::new_v4();
        let id = connect(&manager, Uuid::new_v4()).await;
        manager.join_room(&id, board).await;
        {
            let mut connections = manager.connections.write().await;
            if let Some(c) = connections.get_mut(&id) {
                c.last_ping = chrono::Utc::now() - chrono::Duration::minutes(30);
            }
        }
        assert_eq!(manager.cleanup_stale_connections(10).await, 1);
        let stats = manager.stats().await;
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.active_rooms, 0);
    }
}
