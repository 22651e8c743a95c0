use std::sync::Arc;

use async_trait::async_trait;
use shared::{error::ApiError, record::Record};

/// A locally selected file, ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Body of a create or update request: the full draft plus an optional file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPayload<R: Record> {
    pub fields: R::Draft,
    pub attachment: Option<AttachmentUpload>,
}

impl<R: Record> RecordPayload<R> {
    pub fn fields_only(fields: R::Draft) -> Self {
        Self {
            fields,
            attachment: None,
        }
    }
}

/// Remote collection operations the controller depends on.
#[async_trait]
pub trait RecordApi<R: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, ApiError>;
    async fn create(&self, payload: RecordPayload<R>) -> Result<Option<R>, ApiError>;
    async fn update(&self, id: R::Id, payload: RecordPayload<R>) -> Result<Option<R>, ApiError>;
    async fn delete(&self, id: R::Id) -> Result<(), ApiError>;
}

#[async_trait]
impl<R, T> RecordApi<R> for Arc<T>
where
    R: Record,
    T: RecordApi<R> + ?Sized,
{
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        (**self).list().await
    }

    async fn create(&self, payload: RecordPayload<R>) -> Result<Option<R>, ApiError> {
        (**self).create(payload).await
    }

    async fn update(&self, id: R::Id, payload: RecordPayload<R>) -> Result<Option<R>, ApiError> {
        (**self).update(id, payload).await
    }

    async fn delete(&self, id: R::Id) -> Result<(), ApiError> {
        (**self).delete(id).await
    }
}
