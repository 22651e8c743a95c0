use std::path::PathBuf;

use shared::error::ApiError;
use thiserror::Error;

use crate::controller::DialogKind;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("no record with id {0} in the current collection")]
    UnknownRecord(String),
    #[error("expected an open {expected} dialog, found {found}")]
    DialogNotOpen {
        expected: DialogKind,
        found: DialogKind,
    },
    #[error("another create, update or delete is still in flight")]
    MutationInFlight,
    #[error("{resource} records do not carry attachments")]
    AttachmentsUnsupported { resource: &'static str },
    #[error("failed to read attachment {}: {source}", path.display())]
    AttachmentRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("dialog was closed before the attachment finished loading")]
    DialogClosed,
}

impl ControllerError {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ControllerError::Api(err) => Some(err),
            _ => None,
        }
    }
}
