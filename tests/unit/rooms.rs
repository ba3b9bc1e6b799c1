use serde_json::json;
use task_board::websocket::events::{
    BE_JOINED_BOARD, ClientCommand, ServerEvent, parse_client_frame, relay_event_name,
};
use task_board::websocket::manager::{RoomConnection, RoomManager};
use uuid::Uuid;

#[tokio::test]
async fn room_broadcast_skips_sender_and_outsiders() {
    let rooms = RoomManager::new();
    let board = Uuid::new_v4();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    rooms
        .add_connection("a".to_string(), RoomConnection::new(alice, "alice".to_string()))
        .await;
    rooms
        .add_connection("b".to_string(), RoomConnection::new(bob, "bob".to_string()))
        .await;
    rooms
        .add_connection("c".to_string(), RoomConnection::new(Uuid::new_v4(), "carol".to_string()))
        .await;
    assert!(rooms.join_room("a", board).await);
    assert!(rooms.join_room("b", board).await);

    let mut rx = rooms.subscribe();
    let sent = rooms
        .broadcast_to_room(
            board,
            ServerEvent::new("BE_UPDATE_CARD", Some(board), json!({ "title": "x" })),
            Some("a"),
        )
        .await;
    assert_eq!(sent, 1);

    let delivery = rx.recv().await.unwrap();
    assert!(delivery.is_for("b"));
    assert!(!delivery.is_for("a"));
    assert!(!delivery.is_for("c"));
    assert_eq!(delivery.event.event, "BE_UPDATE_CARD");
}

#[tokio::test]
async fn online_users_follow_connections() {
    let rooms = RoomManager::new();
    let board = Uuid::new_v4();
    let user = Uuid::new_v4();

    // two tabs for the same user
    rooms
        .add_connection("tab-1".to_string(), RoomConnection::new(user, "u".to_string()))
        .await;
    rooms
        .add_connection("tab-2".to_string(), RoomConnection::new(user, "u".to_string()))
        .await;
    rooms.join_room("tab-1", board).await;
    rooms.join_room("tab-2", board).await;
    assert_eq!(rooms.room_user_ids(board).await, vec![user]);

    rooms.remove_connection("tab-1").await;
    assert_eq!(rooms.room_user_ids(board).await, vec![user]);

    rooms.remove_connection("tab-2").await;
    assert!(rooms.room_user_ids(board).await.is_empty());
    assert_eq!(rooms.stats().await.active_rooms, 0);
}

#[tokio::test]
async fn unknown_connection_cannot_join() {
    let rooms = RoomManager::new();
    assert!(!rooms.join_room("ghost", Uuid::new_v4()).await);
}

#[tokio::test]
async fn invitations_reach_every_socket_of_the_invitee() {
    let rooms = RoomManager::new();
    let invitee = Uuid::new_v4();
    rooms
        .add_connection("phone".to_string(), RoomConnection::new(invitee, "i".to_string()))
        .await;
    rooms
        .add_connection("laptop".to_string(), RoomConnection::new(invitee, "i".to_string()))
        .await;

    let mut rx = rooms.subscribe();
    let sent = rooms
        .send_to_user(invitee, ServerEvent::new("BE_USER_INVITED_TO_BOARD", None, json!({})))
        .await;
    assert_eq!(sent, 2);
    let delivery = rx.recv().await.unwrap();
    assert!(delivery.is_for("phone") && delivery.is_for("laptop"));
}

#[test]
fn frames_map_to_commands() {
    let board = Uuid::new_v4();
    let join = parse_client_frame(&json!({ "event": "FE_JOIN_BOARD", "board_id": board }).to_string());
    assert_eq!(join, Ok(ClientCommand::Join(board)));

    let relay = parse_client_frame(
        &json!({ "event": "FE_UPDATE_COLUMN", "data": { "board_id": board, "title": "Done" } })
            .to_string(),
    )
    .unwrap();
    match relay {
        ClientCommand::Relay { event, board_id, .. } => {
            assert_eq!(event, "BE_UPDATE_COLUMN");
            assert_eq!(board_id, board);
        }
        other => panic!("unexpected command {:?}", other),
    }

    assert!(parse_client_frame(&json!({ "event": "BE_JOINED_BOARD" }).to_string()).is_err());
    assert!(parse_client_frame("not json").is_err());
    assert_eq!(relay_event_name(BE_JOINED_BOARD), None);
}
