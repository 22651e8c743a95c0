//! Headless CRUD client: a generic list/detail/edit controller over remote
//! `{ success, data }` collections, plus the reqwest transport it talks through.

pub mod api;
pub mod attachment;
pub mod controller;
pub mod error;
pub mod notification;
pub mod transport;

pub use api::{AttachmentUpload, RecordApi, RecordPayload};
pub use attachment::AttachmentDraft;
pub use controller::{
    ConfirmPrompt, ControllerEvent, ControllerOptions, CrudController, DialogKind, DialogState,
    EditSession, EditTarget,
};
pub use error::ControllerError;
pub use notification::{NotificationKind, StatusNotification, DEFAULT_NOTIFICATION_TTL};
pub use transport::HttpRecordApi;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod transport_tests;
