use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::models::card::{
        Card, CardChangeset, Checklist, ChecklistItem, UpdateChecklistItemRequest,
    },
    db::repositories::CardRepo,
    error::{AppError, AppResult},
    services::{cards_service::CardsService, context::RequestContext},
};

pub struct ChecklistsService;

// Pure operations over a card's checklist array. Order is preserved.

pub fn add_checklist(mut lists: Vec<Checklist>, title: &str) -> Vec<Checklist> {
    lists.push(Checklist {
        id: Uuid::new_v4(),
        title: title.trim().to_string(),
        items: Vec::new(),
    });
    lists
}

fn find_list(lists: &mut [Checklist], checklist_id: Uuid) -> AppResult<&mut Checklist> {
    lists
        .iter_mut()
        .find(|c| c.id == checklist_id)
        .ok_or_else(|| AppError::not_found("Checklist"))
}

pub fn rename_checklist(
    mut lists: Vec<Checklist>,
    checklist_id: Uuid,
    title: &str,
) -> AppResult<Vec<Checklist>> {
    find_list(&mut lists, checklist_id)?.title = title.trim().to_string();
    Ok(lists)
}

pub fn remove_checklist(lists: Vec<Checklist>, checklist_id: Uuid) -> AppResult<Vec<Checklist>> {
    if !lists.iter().any(|c| c.id == checklist_id) {
        return Err(AppError::not_found("Checklist"));
    }
    Ok(lists.into_iter().filter(|c| c.id != checklist_id).collect())
}

pub fn add_item(
    mut lists: Vec<Checklist>,
    checklist_id: Uuid,
    text: &str,
) -> AppResult<Vec<Checklist>> {
    find_list(&mut lists, checklist_id)?.items.push(ChecklistItem {
        id: Uuid::new_v4(),
        text: text.trim().to_string(),
        is_checked: false,
    });
    Ok(lists)
}

pub fn update_item(
    mut lists: Vec<Checklist>,
    checklist_id: Uuid,
    item_id: Uuid,
    changes: &UpdateChecklistItemRequest,
) -> AppResult<Vec<Checklist>> {
    let item = find_list(&mut lists, checklist_id)?
        .items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| AppError::not_found("Checklist item"))?;
    if let Some(text) = &changes.text {
        item.text = text.trim().to_string();
    }
    if let Some(checked) = changes.is_checked {
        item.is_checked = checked;
    }
    Ok(lists)
}

pub fn remove_item(
    mut lists: Vec<Checklist>,
    checklist_id: Uuid,
    item_id: Uuid,
) -> AppResult<Vec<Checklist>> {
    let list = find_list(&mut lists, checklist_id)?;
    let before = list.items.len();
    list.items.retain(|i| i.id != item_id);
    if list.items.len() == before {
        return Err(AppError::not_found("Checklist item"));
    }
    Ok(lists)
}

impl ChecklistsService {
    fn mutate<F>(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        op: F,
    ) -> AppResult<Card>
    where
        F: FnOnce(Vec<Checklist>) -> AppResult<Vec<Checklist>>,
    {
        let (card, _) = CardsService::require_member(conn, ctx.user_id, card_id)?;
        let lists = op(card.card_checklists())?;
        let value = serde_json::to_value(&lists)
            .map_err(|e| AppError::internal(format!("Failed to encode checklists: {}", e)))?;
        let card = CardRepo::update(
            conn,
            card.id,
            CardChangeset {
                checklists: Some(value),
                ..Default::default()
            },
        )?;
        tracing::debug!(card_id = %card.id, "Checklists updated");
        Ok(card)
    }

    pub fn create_checklist(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        title: &str,
    ) -> AppResult<Card> {
        Self::mutate(conn, ctx, card_id, |lists| Ok(add_checklist(lists, title)))
    }

    pub fn update_checklist(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        checklist_id: Uuid,
        title: &str,
    ) -> AppResult<Card> {
        Self::mutate(conn, ctx, card_id, |lists| {
            rename_checklist(lists, checklist_id, title)
        })
    }

    pub fn delete_checklist(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        checklist_id: Uuid,
    ) -> AppResult<Card> {
        Self::mutate(conn, ctx, card_id, |lists| remove_checklist(lists, checklist_id))
    }

    pub fn create_item(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        checklist_id: Uuid,
        text: &str,
    ) -> AppResult<Card> {
        Self::mutate(conn, ctx, card_id, |lists| add_item(lists, checklist_id, text))
    }

    pub fn update_item(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        checklist_id: Uuid,
        item_id: Uuid,
        changes: &UpdateChecklistItemRequest,
    ) -> AppResult<Card> {
        if changes.text.is_none() && changes.is_checked.is_none() {
            return Err(AppError::validation("Nothing to update"));
        }
        Self::mutate(conn, ctx, card_id, |lists| {
            update_item(lists, checklist_id, item_id, changes)
        })
    }

    pub fn delete_item(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
        checklist_id: Uuid,
        item_id: Uuid,
    ) -> AppResult<Card> {
        Self::mutate(conn, ctx, card_id, |lists| {
            remove_item(lists, checklist_id, item_id)
        })
    }
}
