use task_board::db::models::card::UpdateChecklistItemRequest;
use task_board::services::checklists_service::{
    add_checklist, add_item, remove_checklist, remove_item, rename_checklist, update_item,
};
use uuid::Uuid;

#[test]
fn items_keep_insertion_order() {
    let lists = add_checklist(Vec::new(), "Launch");
    let id = lists[0].id;
    let lists = add_item(lists, id, "write notes").unwrap();
    let lists = add_item(lists, id, " ship ").unwrap();

    let texts: Vec<&str> = lists[0].items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["write notes", "ship"]);
    assert!(lists[0].items.iter().all(|i| !i.is_checked));
}

#[test]
fn check_then_remove_item() {
    let lists = add_checklist(Vec::new(), "QA");
    let id = lists[0].id;
    let lists = add_item(lists, id, "smoke test").unwrap();
    let item_id = lists[0].items[0].id;

    let lists = update_item(
        lists,
        id,
        item_id,
        &UpdateChecklistItemRequest {
            text: None,
            is_checked: Some(true),
        },
    )
    .unwrap();
    assert!(lists[0].items[0].is_checked);
    assert_eq!(lists[0].items[0].text, "smoke test");

    let lists = remove_item(lists, id, item_id).unwrap();
    assert!(lists[0].items.is_empty());
}

#[test]
fn unknown_ids_are_not_found() {
    let lists = add_checklist(Vec::new(), "Docs");
    let missing = Uuid::new_v4();
    assert!(rename_checklist(lists.clone(), missing, "x").is_err());
    assert!(remove_checklist(lists.clone(), missing).is_err());
    assert!(add_item(lists.clone(), missing, "x").is_err());
    assert!(remove_item(lists.clone(), lists[0].id, missing).is_err());
}
