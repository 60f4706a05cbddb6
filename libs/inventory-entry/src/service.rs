use chrono::Utc;
use futures::future::try_join_all;

use tender_api::{
    BackendClient, BackendError, ErrorKind, InventoryRecord, RecordId, Session, now_ms,
};

use crate::attachment::{Attachment, AttachmentRole, random_suffix, storage_path};
use crate::form::{EditForm, InventoryForm};
use crate::EntryError;

/// Writes movements on behalf of the signed-in user.
///
/// Holds an explicit backend handle; the session is looked up on every
/// call so a sign-out takes effect immediately.
#[derive(Clone)]
pub struct EntryService {
    client: BackendClient,
    table: String,
    bucket: String,
}

impl EntryService {
    pub fn new(client: BackendClient, table: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
            bucket: bucket.into(),
        }
    }

    async fn session(&self) -> Result<Session, EntryError> {
        match self.client.auth.current_session().await {
            Ok(Some(session)) => Ok(session),
            Ok(None) => Err(EntryError::Unauthenticated),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                Err(EntryError::Unauthenticated)
            }
        }
    }

    async fn upload(&self, attachment: &Attachment) -> Result<String, EntryError> {
        let suffix = random_suffix(&mut rand::rng());
        let path = storage_path(&attachment.file_name, now_ms(), &suffix);
        self.client
            .storage
            .upload(&self.bucket, &path, attachment.bytes.clone(), &attachment.content_type)
            .await
            .map_err(|e| EntryError::Upload(e.message().to_string()))?;
        let url = self
            .client
            .storage
            .public_url(&self.bucket, &path)
            .map_err(|e| EntryError::Upload(format!("Failed to get public URL: {}", e.message())))?;
        tracing::debug!(bucket = %self.bucket, %path, "attachment uploaded");
        Ok(url)
    }

    fn map_write_error(&self, e: BackendError) -> EntryError {
        if e.kind() == ErrorKind::NotFound && e.message().contains("relation") {
            EntryError::TableMissing { table: self.table.clone() }
        } else {
            EntryError::Backend(e)
        }
    }

    /// Validate the form, upload attachments and insert the movement.
    ///
    /// Nothing is uploaded unless the form, the session and every
    /// attachment check out. Uploads run concurrently; any failure aborts
    /// the insert.
    pub async fn submit(
        &self,
        form: &InventoryForm,
        receipt: Option<&Attachment>,
        photos: &[Attachment],
    ) -> Result<InventoryRecord, EntryError> {
        let mut movement = form.validate(Utc::now())?;
        let session = self.session().await?;

        if let Some(r) = receipt {
            r.check(AttachmentRole::Receipt)?;
        }
        for p in photos {
            p.check(AttachmentRole::Photo)?;
        }

        let (receipt_url, photo_urls) = futures::try_join!(
            async {
                match receipt {
                    Some(r) => self.upload(r).await.map(Some),
                    None => Ok(None),
                }
            },
            try_join_all(photos.iter().map(|p| self.upload(p))),
        )?;

        movement.created_by = session.user.id.clone();
        movement.receipt_url = receipt_url;
        movement.photo_urls = if photo_urls.is_empty() { None } else { Some(photo_urls) };

        let record = self
            .client
            .writer
            .insert(&self.table, &session, movement)
            .await
            .map_err(|e| self.map_write_error(e))?;
        tracing::info!(table = %self.table, id = %record.id, user = %session.user.id, "movement recorded");
        Ok(record)
    }

    /// Overwrite the editable columns of a row.
    pub async fn edit(&self, id: RecordId, form: &EditForm) -> Result<InventoryRecord, EntryError> {
        let patch = form.to_patch()?;
        let session = self.session().await?;
        let record = self
            .client
            .writer
            .update(&self.table, &session, id, patch)
            .await
            .map_err(|e| self.map_write_error(e))?;
        tracing::info!(table = %self.table, %id, "movement edited");
        Ok(record)
    }

    /// Delete a row permanently.
    pub async fn delete(&self, id: RecordId) -> Result<(), EntryError> {
        let session = self.session().await?;
        self.client
            .writer
            .delete(&self.table, &session, id)
            .await
            .map_err(|e| self.map_write_error(e))?;
        tracing::info!(table = %self.table, %id, "movement deleted");
        Ok(())
    }
}
