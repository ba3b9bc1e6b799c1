use super::*;
use task_board::websocket::events::{
    BE_CONNECTED, BE_ERROR, BE_JOINED_BOARD, BE_LEFT_BOARD, FE_JOIN_BOARD, FE_LEAVE_BOARD, PING, PONG,
};

#[tokio::test]
#[ignore = "requires running server"]
async fn test_connect_receives_welcome() {
    let config = TestConfig::from_env();
    let mut socket = connect(&config).await;
    let welcome = wait_for_event(&mut socket, BE_CONNECTED, config.timeout_duration).await;
    assert!(welcome.is_some(), "expected {}", BE_CONNECTED);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_invalid_token_is_rejected() {
    let config = TestConfig::from_env();
    let result = connect_async(config.url_with_token("invalid.jwt.token")).await;
    assert!(result.is_err(), "connection should fail with an invalid token");
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_ping_pong() {
    let config = TestConfig::from_env();
    let mut socket = connect(&config).await;
    send_frame(&mut socket, PING, None, json!({})).await;
    let pong = wait_for_event(&mut socket, PONG, config.timeout_duration).await;
    assert!(pong.is_some());
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_join_and_leave_board() {
    let config = TestConfig::from_env();
    let board_id = config.board_id.expect("TEST_BOARD_ID is required");
    let mut socket = connect(&config).await;

    send_frame(&mut socket, FE_JOIN_BOARD, Some(board_id), json!({})).await;
    let joined = wait_for_event(&mut socket, BE_JOINED_BOARD, config.timeout_duration)
        .await
        .expect("no join acknowledgement");
    assert_eq!(joined["board_id"], board_id.to_string());
    assert!(joined["data"]["online_user_ids"].is_array());

    send_frame(&mut socket, FE_LEAVE_BOARD, Some(board_id), json!({})).await;
    assert!(wait_for_event(&mut socket, BE_LEFT_BOARD, config.timeout_duration).await.is_some());
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_relay_reaches_other_members_only() {
    let config = TestConfig::from_env();
    let board_id = config.board_id.expect("TEST_BOARD_ID is required");
    let mut sender = connect(&config).await;
    let mut watcher = connect(&config).await;

    for socket in [&mut sender, &mut watcher] {
        send_frame(socket, FE_JOIN_BOARD, Some(board_id), json!({})).await;
        wait_for_event(socket, BE_JOINED_BOARD, config.timeout_duration)
            .await
            .expect("no join acknowledgement");
    }

    send_frame(&mut sender, "FE_UPDATE_CARD", Some(board_id), json!({ "title": "moved" })).await;

    let relayed = wait_for_event(&mut watcher, "BE_UPDATE_CARD", config.timeout_duration)
        .await
        .expect("watcher did not receive relay");
    assert_eq!(relayed["data"]["title"], "moved");

    let echoed = wait_for_event(&mut sender, "BE_UPDATE_CARD", Duration::from_millis(500)).await;
    assert!(echoed.is_none(), "sender should not receive its own relay");
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_relay_outside_room_is_refused() {
    let config = TestConfig::from_env();
    let mut socket = connect(&config).await;
    send_frame(&mut socket, "FE_UPDATE_CARD", Some(Uuid::new_v4()), json!({})).await;
    assert!(wait_for_event(&mut socket, BE_ERROR, config.timeout_duration).await.is_some());
}
