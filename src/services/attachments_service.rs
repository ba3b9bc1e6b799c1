use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    db::DbPool,
    db::models::attachment::{Attachment, AttachmentCleanupFailure, NewAttachment},
    db::models::card::{Card, CardChangeset},
    db::repositories::{AttachmentRepo, CardRepo},
    error::{AppError, AppResult},
    services::{boards_service::BoardsService, cards_service::CardsService, context::RequestContext},
    storage::{MediaStorage, ResourceType, UploadedFile, UploadedMedia},
    utils::order,
    validation::upload::{MAX_ATTACHMENTS_PER_CARD, sanitize_file_name, validate_upload_size},
};

pub const ATTACHMENTS_FOLDER: &str = "attachments";

pub struct AttachmentsService;

pub fn check_attachment_capacity(current: i64) -> AppResult<()> {
    if current >= MAX_ATTACHMENTS_PER_CARD {
        return Err(AppError::validation(format!(
            "A card can hold at most {} attachments",
            MAX_ATTACHMENTS_PER_CARD
        )));
    }
    Ok(())
}

impl AttachmentsService {
    /// Checks access and the per-card attachment limit before anything is uploaded.
    pub fn prepare_upload(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
    ) -> AppResult<Card> {
        let (card, _) = CardsService::require_member(conn, ctx.user_id, card_id)?;
        check_attachment_capacity(AttachmentRepo::count_by_card(conn, card.id)?)?;
        Ok(card)
    }

    pub fn record_upload(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card: &Card,
        name: String,
        file_type: String,
        media: UploadedMedia,
    ) -> AppResult<Attachment> {
        let new_attachment = NewAttachment {
            card_id: card.id,
            board_id: card.board_id,
            uploader_id: ctx.user_id,
            name,
            url: media.url,
            public_id: media.public_id,
            resource_type: media.resource_type,
            size: media.bytes,
            file_type,
        };

        let attachment = conn.transaction::<Attachment, diesel::result::Error, _>(|conn| {
            let attachment = AttachmentRepo::insert(conn, &new_attachment)?;
            let current = CardRepo::find_attachment_ids_any(conn, card.id)?.unwrap_or_default();
            CardRepo::update(
                conn,
                card.id,
                CardChangeset {
                    attachment_ids: Some(order::push_unique(&current, attachment.id)),
                    ..Default::default()
                },
            )?;
            Ok(attachment)
        })?;
        Ok(attachment)
    }

    pub fn list(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        card_id: Uuid,
    ) -> AppResult<Vec<Attachment>> {
        let (card, _) = CardsService::require_member(conn, ctx.user_id, card_id)?;
        Ok(AttachmentRepo::list_by_card(conn, card.id)?)
    }

    pub fn find_for_member(
        conn: &mut PgConnection,
        ctx: &RequestContext,
        attachment_id: Uuid,
    ) -> AppResult<Attachment> {
        let attachment = AttachmentRepo::find_by_id(conn, attachment_id)?
            .ok_or_else(|| AppError::not_found("Attachment"))?;
        BoardsService::require_member(conn, ctx.user_id, attachment.board_id)?;
        Ok(attachment)
    }

    /// Deletes the row and pulls its id from the card, destroyed cards included.
    pub fn remove_record(conn: &mut PgConnection, attachment: &Attachment) -> AppResult<()> {
        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            AttachmentRepo::delete_by_id(conn, attachment.id)?;
            if let Some(current) = CardRepo::find_attachment_ids_any(conn, attachment.card_id)? {
                CardRepo::update(
                    conn,
                    attachment.card_id,
                    CardChangeset {
                        attachment_ids: Some(order::pull(&current, attachment.id)),
                        ..Default::default()
                    },
                )?;
            }
            Ok(())
        })?;
        Ok(())
    }

    pub async fn upload(
        pool: &DbPool,
        storage: &dyn MediaStorage,
        ctx: &RequestContext,
        card_id: Uuid,
        file: UploadedFile,
        max_bytes: usize,
    ) -> AppResult<Attachment> {
        validate_upload_size(file.bytes.len(), max_bytes)?;
        let card = {
            let mut conn = pool.get()?;
            Self::prepare_upload(&mut conn, ctx, card_id)?
        };

        let name = sanitize_file_name(&file.file_name);
        let file_type = file.content_type.clone();
        let media = storage
            .upload(file.into_request(ATTACHMENTS_FOLDER, ResourceType::Auto))
            .await?;

        let mut conn = pool.get()?;
        match Self::record_upload(&mut conn, ctx, &card, name, file_type, media.clone()) {
            Ok(attachment) => {
                tracing::info!(attachment_id = %attachment.id, card_id = %card.id, "Attachment uploaded");
                Ok(attachment)
            }
            Err(err) => {
                // the row never landed, so the provider object would be orphaned
                let resource_type = ResourceType::parse(&media.resource_type);
                if let Err(e) = storage.destroy(&media.public_id, resource_type).await {
                    tracing::warn!(public_id = %media.public_id, "Failed to roll back upload: {}", e);
                }
                Err(err)
            }
        }
    }

    /// Provider object first, then the row. A provider failure keeps the row and surfaces as 502.
    pub async fn delete(
        pool: &DbPool,
        storage: &dyn MediaStorage,
        ctx: &RequestContext,
        attachment_id: Uuid,
    ) -> AppResult<()> {
        let attachment = {
            let mut conn = pool.get()?;
            Self::find_for_member(&mut conn, ctx, attachment_id)?
        };
        Self::destroy_then_remove(pool, storage, &attachment).await
    }

    /// No connection is taken until the provider confirms the destroy.
    pub async fn destroy_then_remove(
        pool: &DbPool,
        storage: &dyn MediaStorage,
        attachment: &Attachment,
    ) -> AppResult<()> {
        storage
            .destroy(&attachment.public_id, ResourceType::parse(&attachment.resource_type))
            .await?;

        let mut conn = pool.get()?;
        Self::remove_record(&mut conn, attachment)?;
        tracing::info!(attachment_id = %attachment.id, card_id = %attachment.card_id, "Attachment deleted");
        Ok(())
    }

    /// Best-effort removal used when cards or columns are destroyed. Nothing is rolled
    /// back; each failure is reported.
    pub async fn cleanup(
        pool: &DbPool,
        storage: &dyn MediaStorage,
        attachments: Vec<Attachment>,
    ) -> Vec<AttachmentCleanupFailure> {
        let mut failures = Vec::new();
        for attachment in attachments {
            let resource_type = ResourceType::parse(&attachment.resource_type);
            if let Err(e) = storage.destroy(&attachment.public_id, resource_type).await {
                tracing::warn!(attachment_id = %attachment.id, "Attachment cleanup failed: {}", e);
                failures.push(AttachmentCleanupFailure {
                    attachment_id: attachment.id,
                    reason: e.to_string(),
                });
                continue;
            }

            let removed = pool
                .get()
                .map_err(AppError::from)
                .and_then(|mut conn| Self::remove_record(&mut conn, &attachment));
            if let Err(e) = removed {
                tracing::warn!(attachment_id = %attachment.id, "Attachment row cleanup failed: {}", e);
                failures.push(AttachmentCleanupFailure {
                    attachment_id: attachment.id,
                    reason: e.to_string(),
                });
            }
        }
        failures
    }
}
