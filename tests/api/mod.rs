use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

fn base_url() -> String {
    std::env::var("TEST_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8017/v1".to_string())
}

/// Access-token-shaped JWT signed with a secret the server does not know.
fn forged_token() -> String {
    #[derive(serde::Serialize)]
    struct TestClaims {
        sub: Uuid,
        email: String,
        exp: u64,
        iat: u64,
        jti: String,
        typ: String,
    }

    let now = chrono::Utc::now().timestamp() as u64;
    let claims = TestClaims {
        sub: Uuid::new_v4(),
        email: "forged@example.com".to_string(),
        exp: now + 3600,
        iat: now,
        jti: Uuid::new_v4().to_string(),
        typ: "access".to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"not-the-server-secret"),
    )
    .unwrap()
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_protected_route_requires_token() {
    let response = reqwest::get(format!("{}/boards", base_url())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_forged_token_is_rejected() {
    let response = reqwest::Client::new()
        .get(format!("{}/users/profile", base_url()))
        .bearer_auth(forged_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_register_validates_password_rule() {
    let response = reqwest::Client::new()
        .post(format!("{}/users/register", base_url()))
        .json(&json!({ "email": "weak@example.com", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json().await.unwrap();
    assert!(body["errors"].as_array().is_some_and(|errors| !errors.is_empty()));
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_login_unknown_user_is_not_found() {
    let response = reqwest::Client::new()
        .post(format!("{}/users/login", base_url()))
        .json(&json!({
            "email": format!("{}@example.com", Uuid::new_v4().simple()),
            "password": "Passw0rd!"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires running server"]
async fn test_refresh_without_cookie_is_forbidden() {
    let response = reqwest::get(format!("{}/users/refresh_token", base_url()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires running server and TEST_ACCESS_TOKEN"]
async fn test_access_token_cannot_refresh() {
    let access_token = std::env::var("TEST_ACCESS_TOKEN").unwrap();
    let response = reqwest::Client::new()
        .get(format!("{}/users/refresh_token", base_url()))
        .json(&json!({ "refresh_token": access_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

fn access_token() -> String {
    std::env::var("TEST_ACCESS_TOKEN").unwrap()
}

async fn post_data(client: &reqwest::Client, path: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}{}", base_url(), path))
        .bearer_auth(access_token())
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED, "POST {}", path);
    let body: Value = response.json().await.unwrap();
    body["data"].clone()
}

/// Fresh private board with one column, returns `(board_id, column_id)`.
async fn board_with_column(client: &reqwest::Client) -> (String, String) {
    let board = post_data(
        client,
        "/boards",
        json!({ "title": "Release plan", "description": "Ship it", "type": "private" }),
    )
    .await;
    let board_id = board["id"].as_str().unwrap().to_string();
    let column = post_data(client, "/columns", json!({ "board_id": board_id, "title": "Todo" })).await;
    (board_id, column["id"].as_str().unwrap().to_string())
}

async fn board_details(client: &reqwest::Client, board_id: &str) -> Value {
    let response = client
        .get(format!("{}/boards/{}", base_url(), board_id))
        .bearer_auth(access_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["data"].clone()
}

#[tokio::test]
#[ignore = "requires running server and TEST_ACCESS_TOKEN"]
async fn test_padded_title_is_rejected() {
    let response = reqwest::Client::new()
        .post(format!("{}/boards", base_url()))
        .bearer_auth(access_token())
        .json(&json!({ "title": "  a  ", "description": "Ship it", "type": "public" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "requires running server and TEST_ACCESS_TOKEN"]
async fn test_concurrent_card_creates_all_land_in_the_order() {
    let client = reqwest::Client::new();
    let (board_id, column_id) = board_with_column(&client).await;

    let mut handles = Vec::new();
    for n in 0..8 {
        let client = client.clone();
        let body = json!({ "board_id": board_id, "column_id": column_id, "title": format!("Card {}", n) });
        handles.push(tokio::spawn(async move {
            post_data(&client, "/cards", body).await["id"]
                .as_str()
                .unwrap()
                .to_string()
        }));
    }
    let mut created = Vec::new();
    for handle in handles {
        created.push(handle.await.unwrap());
    }

    let details = board_details(&client, &board_id).await;
    let order: Vec<String> = details["columns"][0]["card_order_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|id| id.as_str().unwrap().to_string())
        .collect();
    assert_eq!(order.len(), created.len());
    for id in &created {
        assert!(order.contains(id));
    }
}

#[tokio::test]
#[ignore = "requires running server and TEST_ACCESS_TOKEN"]
async fn test_move_card_validates_orders_then_moves() {
    let client = reqwest::Client::new();
    let (board_id, todo) = board_with_column(&client).await;
    let done = post_data(&client, "/columns", json!({ "board_id": board_id, "title": "Done" })).await;
    let done = done["id"].as_str().unwrap().to_string();
    let card = post_data(
        &client,
        "/cards",
        json!({ "board_id": board_id, "column_id": todo, "title": "Move me" }),
    )
    .await;
    let card_id = card["id"].as_str().unwrap().to_string();

    let move_to = |next_order: Value| {
        client
            .put(format!("{}/boards/supports/moving_card", base_url()))
            .bearer_auth(access_token())
            .json(&json!({
                "current_card_id": card_id,
                "prev_column_id": todo,
                "prev_card_order_ids": [],
                "next_column_id": done,
                "next_card_order_ids": next_order,
            }))
            .send()
    };

    // forgetting the moved card in the target order is rejected and changes nothing
    let response = move_to(json!([])).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = move_to(json!([card_id])).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["column_id"], done);
}

#[tokio::test]
#[ignore = "requires running server and TEST_ACCESS_TOKEN"]
async fn test_invitation_answer_rejects_pending_and_unknown() {
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/invitations/board/{}", base_url(), Uuid::new_v4()))
        .bearer_auth(access_token())
        .json(&json!({ "status": "pending" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = client
        .put(format!("{}/invitations/board/{}", base_url(), Uuid::new_v4()))
        .bearer_auth(access_token())
        .json(&json!({ "status": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // malformed status never reaches the service
    let response = client
        .put(format!("{}/invitations/board/{}", base_url(), Uuid::new_v4()))
        .bearer_auth(access_token())
        .json(&json!({ "status": "maybe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "requires running server and TEST_ACCESS_TOKEN"]
async fn test_invite_self_is_rejected() {
    let client = reqwest::Client::new();
    let (board_id, _) = board_with_column(&client).await;

    let profile: Value = client
        .get(format!("{}/users/profile", base_url()))
        .bearer_auth(access_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let email = profile["data"]["email"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/invitations/board", base_url()))
        .bearer_auth(access_token())
        .json(&json!({ "board_id": board_id, "invitee_email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
