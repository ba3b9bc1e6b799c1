use axum::http::StatusCode;
use chrono::Utc;
use task_board::db::enums::{BoardType, InvitationStatus};
use task_board::db::models::board::{Board, MoveCardRequest};
use task_board::db::models::card::Card;
use task_board::db::models::column::Column;
use task_board::db::models::invitation::{Invitation, UpdateInvitationRequest};
use task_board::services::boards_service::check_card_move;
use task_board::services::invitations_service::{check_answer, members_after_accept};
use uuid::Uuid;
use validator::Validate;

fn column(board_id: Uuid, card_order_ids: Vec<Uuid>) -> Column {
    Column {
        id: Uuid::new_v4(),
        board_id,
        title: "Todo".to_string(),
        color: None,
        card_order_ids,
        is_destroyed: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn card(board_id: Uuid, column_id: Uuid) -> Card {
    Card {
        id: Uuid::new_v4(),
        board_id,
        column_id,
        title: "Write docs".to_string(),
        description: None,
        cover: None,
        cover_public_id: None,
        member_ids: Vec::new(),
        comments: serde_json::json!([]),
        checklists: serde_json::json!([]),
        label_ids: Vec::new(),
        due_date: None,
        is_completed: false,
        attachment_ids: Vec::new(),
        is_destroyed: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn board(owner: Uuid, members: Vec<Uuid>) -> Board {
    Board {
        id: Uuid::new_v4(),
        title: "Sprint".to_string(),
        slug: "sprint".to_string(),
        description: "Sprint board".to_string(),
        board_type: BoardType::Private,
        background: None,
        labels: serde_json::json!([]),
        owner_ids: vec![owner],
        member_ids: members,
        column_order_ids: Vec::new(),
        is_destroyed: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn invitation(invitee_id: Uuid, status: InvitationStatus) -> Invitation {
    Invitation {
        id: Uuid::new_v4(),
        inviter_id: Uuid::new_v4(),
        invitee_id,
        board_id: Uuid::new_v4(),
        status,
        is_destroyed: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Card `moving` sits at the front of `prev`, `next` already holds `other`.
struct MoveFixture {
    moving: Card,
    prev: Column,
    next: Column,
    stays: Uuid,
    other: Uuid,
}

fn fixture() -> MoveFixture {
    let board_id = Uuid::new_v4();
    let stays = Uuid::new_v4();
    let other = Uuid::new_v4();
    let mut prev = column(board_id, Vec::new());
    let next = column(board_id, vec![other]);
    let moving = card(board_id, prev.id);
    prev.card_order_ids = vec![moving.id, stays];
    MoveFixture {
        moving,
        prev,
        next,
        stays,
        other,
    }
}

fn request(f: &MoveFixture, prev_order: Vec<Uuid>, next_order: Vec<Uuid>) -> MoveCardRequest {
    MoveCardRequest {
        current_card_id: f.moving.id,
        prev_column_id: f.prev.id,
        prev_card_order_ids: prev_order,
        next_column_id: f.next.id,
        next_card_order_ids: next_order,
    }
}

#[test]
fn valid_move_passes_in_any_target_position() {
    let f = fixture();
    let at_end = request(&f, vec![f.stays], vec![f.other, f.moving.id]);
    assert!(check_card_move(&f.moving, &f.prev, &f.next, &at_end).is_ok());

    let at_front = request(&f, vec![f.stays], vec![f.moving.id, f.other]);
    assert!(check_card_move(&f.moving, &f.prev, &f.next, &at_front).is_ok());
}

#[test]
fn move_into_the_same_column_is_rejected() {
    let f = fixture();
    let req = request(&f, vec![f.stays], vec![f.stays, f.moving.id]);
    let err = check_card_move(&f.moving, &f.prev, &f.prev, &req).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn move_across_boards_is_rejected() {
    let f = fixture();
    let foreign = column(Uuid::new_v4(), vec![f.other]);
    let req = request(&f, vec![f.stays], vec![f.other, f.moving.id]);
    assert!(check_card_move(&f.moving, &f.prev, &foreign, &req).is_err());
}

#[test]
fn card_must_start_in_prev_column() {
    let f = fixture();
    let req = request(&f, vec![f.stays], vec![f.other, f.moving.id]);
    // swapped columns: the card is not in the claimed source
    assert!(check_card_move(&f.moving, &f.next, &f.prev, &req).is_err());
}

#[test]
fn submitted_orders_must_match_stored_cards() {
    let f = fixture();
    // card left behind in the source column
    let stale_prev = request(&f, vec![f.moving.id, f.stays], vec![f.other, f.moving.id]);
    assert!(check_card_move(&f.moving, &f.prev, &f.next, &stale_prev).is_err());

    // target order drops a card that is already there
    let lossy_next = request(&f, vec![f.stays], vec![f.moving.id]);
    assert!(check_card_move(&f.moving, &f.prev, &f.next, &lossy_next).is_err());

    // unknown id smuggled into the target
    let padded = request(&f, vec![f.stays], vec![f.other, f.moving.id, Uuid::new_v4()]);
    assert!(check_card_move(&f.moving, &f.prev, &f.next, &padded).is_err());
}

#[test]
fn only_the_invitee_answers_once() {
    let invitee = Uuid::new_v4();
    let pending = invitation(invitee, InvitationStatus::Pending);

    assert!(check_answer(&pending, invitee, InvitationStatus::Accepted).is_ok());
    assert!(check_answer(&pending, invitee, InvitationStatus::Rejected).is_ok());

    let err = check_answer(&pending, invitee, InvitationStatus::Pending).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let err = check_answer(&pending, Uuid::new_v4(), InvitationStatus::Accepted).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

    let answered = invitation(invitee, InvitationStatus::Rejected);
    let err = check_answer(&answered, invitee, InvitationStatus::Accepted).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
}

#[test]
fn pending_answer_fails_request_validation() {
    let request: UpdateInvitationRequest =
        serde_json::from_value(serde_json::json!({ "status": "pending" })).unwrap();
    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("status"));

    let request: UpdateInvitationRequest =
        serde_json::from_value(serde_json::json!({ "status": "accepted" })).unwrap();
    assert!(request.validate().is_ok());
}

#[test]
fn accepting_adds_the_member_once() {
    let owner = Uuid::new_v4();
    let invitee = Uuid::new_v4();
    let existing = Uuid::new_v4();

    let target = board(owner, vec![existing]);
    let board_id = target.id;
    let (id, members) = members_after_accept(Some(target), invitee).unwrap().unwrap();
    assert_eq!(id, board_id);
    assert_eq!(members, vec![existing, invitee]);

    assert!(members_after_accept(Some(board(owner, vec![invitee])), invitee)
        .unwrap()
        .is_none());
    // owners are already members
    assert!(members_after_accept(Some(board(owner, Vec::new())), owner)
        .unwrap()
        .is_none());
}

#[test]
fn accepting_for_a_destroyed_board_is_not_acceptable() {
    let err = members_after_accept(None, Uuid::new_v4()).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
}
