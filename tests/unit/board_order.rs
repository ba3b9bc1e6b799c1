use task_board::db::models::api::Pagination;
use task_board::utils::order::{is_permutation, pull, push_unique, sort_by_order};
use task_board::utils::slug::slugify;
use uuid::Uuid;

#[test]
fn moving_a_card_between_columns() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let source = vec![a, b];
    let target = vec![c];

    let source = pull(&source, a);
    let target = push_unique(&target, a);

    assert_eq!(source, vec![b]);
    assert_eq!(target, vec![c, a]);
    // pushing twice does not duplicate
    assert_eq!(push_unique(&target, a), vec![c, a]);
}

#[test]
fn reorder_must_be_a_permutation() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    assert!(is_permutation(&[a, b, c], &[c, a, b]));
    assert!(!is_permutation(&[a, b, c], &[a, b]));
    assert!(!is_permutation(&[a, b], &[a, b, c]));
    assert!(!is_permutation(&[a, b], &[a, a]));
}

#[test]
fn unordered_items_go_last() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let sorted = sort_by_order(vec![c, a, b], &[b, a], |id| *id);
    assert_eq!(sorted, vec![b, a, c]);
}

#[test]
fn pagination_meta() {
    let page = Pagination::new(2, 12, 30);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next);
    assert!(page.has_prev);

    let empty = Pagination::new(1, 12, 0);
    assert_eq!(empty.total_pages, 0);
    assert!(!empty.has_next);
}

#[test]
fn board_slugs() {
    assert_eq!(slugify("Product Roadmap 2025"), "product-roadmap-2025");
    assert_eq!(slugify("!!!"), "board");
}
