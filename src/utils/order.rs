//! Helpers for the order-preserving id arrays (`column_order_ids`, `card_order_ids`).
//! The database does not enforce these; every mutation goes through here.

use std::collections::HashSet;
use uuid::Uuid;

/// Appends `id` unless it is already present.
pub fn push_unique(order: &[Uuid], id: Uuid) -> Vec<Uuid> {
    let mut next = order.to_vec();
    if !next.contains(&id) {
        next.push(id);
    }
    next
}

/// Removes every occurrence of `id`.
pub fn pull(order: &[Uuid], id: Uuid) -> Vec<Uuid> {
    order.iter().copied().filter(|x| *x != id).collect()
}

/// True when `proposed` holds exactly the ids of `current`, each once, in any order.
pub fn is_permutation(current: &[Uuid], proposed: &[Uuid]) -> bool {
    if current.len() != proposed.len() {
        return false;
    }
    let proposed_set: HashSet<&Uuid> = proposed.iter().collect();
    if proposed_set.len() != proposed.len() {
        return false;
    }
    current.iter().all(|id| proposed_set.contains(id))
}

/// Sorts `items` by the position of their id in `order`. Items missing from
/// the order keep their relative order and go last.
pub fn sort_by_order<T, F>(mut items: Vec<T>, order: &[Uuid], id_of: F) -> Vec<T>
where
    F: Fn(&T) -> Uuid,
{
    items.sort_by_key(|item| {
        let id = id_of(item);
        order.iter().position(|x| *x == id).unwrap_or(usize::MAX)
    });
    items
}
