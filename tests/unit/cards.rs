use chrono::Utc;
use task_board::db::enums::{BoardType, MemberAction};
use task_board::db::models::board::{Board, BoardLabel, CreateBoardRequest};
use task_board::db::models::card::{
    CreateCardRequest, IncomingLabelInfo, IncomingMemberInfo, UpdateCardRequest,
};
use task_board::db::models::column::CreateColumnRequest;
use task_board::services::cards_service::{apply_label_change, apply_member_change};
use uuid::Uuid;
use validator::Validate;

fn board_with(owner: Uuid, label: BoardLabel) -> Board {
    Board {
        id: Uuid::new_v4(),
        title: "Sprint".to_string(),
        slug: "sprint".to_string(),
        description: "Sprint board".to_string(),
        board_type: BoardType::Public,
        background: None,
        labels: serde_json::to_value(vec![label]).unwrap(),
        owner_ids: vec![owner],
        member_ids: Vec::new(),
        column_order_ids: Vec::new(),
        is_destroyed: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn card_title_length_is_validated() {
    let request = CreateCardRequest {
        board_id: Uuid::new_v4(),
        column_id: Uuid::new_v4(),
        title: "ab".to_string(),
        description: None,
    };
    assert!(request.validate().is_err());

    let request = CreateCardRequest {
        title: "Write release notes".to_string(),
        ..request
    };
    assert!(request.validate().is_ok());
}

#[test]
fn padded_short_titles_are_rejected() {
    let request = CreateCardRequest {
        board_id: Uuid::new_v4(),
        column_id: Uuid::new_v4(),
        title: "  a  ".to_string(),
        description: None,
    };
    let errors = request.validate().unwrap_err();
    assert!(errors.field_errors().contains_key("title"));

    let update = UpdateCardRequest {
        title: Some("     ".to_string()),
        ..Default::default()
    };
    assert!(update.validate().is_err());

    let column = CreateColumnRequest {
        board_id: Uuid::new_v4(),
        title: " ab ".to_string(),
        color: None,
    };
    assert!(column.validate().is_err());

    let board = CreateBoardRequest {
        title: "   x   ".to_string(),
        description: "      ".to_string(),
        board_type: BoardType::Private,
    };
    let errors = board.validate().unwrap_err();
    let fields = errors.field_errors();
    assert!(fields.contains_key("title"));
    assert!(fields.contains_key("description"));
}

#[test]
fn empty_update_is_detected() {
    assert!(UpdateCardRequest::default().is_empty());

    let update = UpdateCardRequest {
        is_completed: Some(true),
        ..Default::default()
    };
    assert!(!update.is_empty());

    // clearing the due date counts as a change
    let update = UpdateCardRequest {
        clear_due_date: Some(true),
        ..Default::default()
    };
    assert!(!update.is_empty());
}

#[test]
fn only_board_members_can_be_assigned() {
    let owner = Uuid::new_v4();
    let label = BoardLabel {
        id: Uuid::new_v4(),
        title: "bug".to_string(),
        color: "#ff0000".to_string(),
    };
    let board = board_with(owner, label);

    let assigned = apply_member_change(
        &board,
        &[],
        &IncomingMemberInfo {
            user_id: owner,
            action: MemberAction::Add,
        },
    )
    .unwrap();
    assert_eq!(assigned, vec![owner]);

    let stranger = IncomingMemberInfo {
        user_id: Uuid::new_v4(),
        action: MemberAction::Add,
    };
    assert!(apply_member_change(&board, &assigned, &stranger).is_err());
}

#[test]
fn labels_must_exist_on_the_board() {
    let label = BoardLabel {
        id: Uuid::new_v4(),
        title: "feature".to_string(),
        color: "#00ff00".to_string(),
    };
    let label_id = label.id;
    let board = board_with(Uuid::new_v4(), label);

    let added = apply_label_change(
        &board,
        &[],
        &IncomingLabelInfo {
            label_id,
            action: MemberAction::Add,
        },
    )
    .unwrap();
    assert_eq!(added, vec![label_id]);

    let removed = apply_label_change(
        &board,
        &added,
        &IncomingLabelInfo {
            label_id,
            action: MemberAction::Remove,
        },
    )
    .unwrap();
    assert!(removed.is_empty());

    let unknown = IncomingLabelInfo {
        label_id: Uuid::new_v4(),
        action: MemberAction::Add,
    };
    assert!(apply_label_change(&board, &[], &unknown).is_err());
}
