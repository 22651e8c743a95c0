//! Generic list/detail/edit controller driving one remote collection.

pub mod dialog;
pub mod events;

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    error::{ApiError, ErrorKind, Operation},
    record::Record,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use url::Url;

pub use dialog::{DialogKind, DialogState, EditSession, EditTarget};
pub use events::ControllerEvent;

use crate::{
    api::{AttachmentUpload, RecordApi, RecordPayload},
    attachment::{read_attachment, AttachmentDraft},
    error::ControllerError,
    notification::{NotificationCenter, StatusNotification, DEFAULT_NOTIFICATION_TTL},
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Origin that attachment refs are resolved against.
    pub asset_origin: Url,
    /// Whether mutations and failed loads raise status notifications.
    pub notifications: bool,
    pub notification_ttl: Duration,
}

impl ControllerOptions {
    pub fn new(asset_origin: Url) -> Self {
        Self {
            asset_origin,
            notifications: true,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
        }
    }

    pub fn without_notifications(mut self) -> Self {
        self.notifications = false;
        self
    }

    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }
}

/// Yes/no question asked right before a delete without a confirm dialog.
/// Implementations that block on user input must do so off the runtime threads.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, question: &str) -> bool;
}

struct ViewState<R: Record> {
    collection: Vec<R>,
    list_loading: bool,
    dialog: DialogState<R>,
    // Bumped on every dialog transition so late async results can tell the
    // dialog they belonged to is gone.
    dialog_generation: u64,
}

struct MutationGuard<'a>(&'a AtomicBool);

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CrudController<R: Record> {
    api: Arc<dyn RecordApi<R>>,
    options: ControllerOptions,
    inner: Mutex<ViewState<R>>,
    mutation_in_flight: AtomicBool,
    notifications: Option<NotificationCenter>,
    events: broadcast::Sender<ControllerEvent>,
}

impl<R: Record> CrudController<R> {
    pub fn new(api: impl RecordApi<R> + 'static, options: ControllerOptions) -> Self {
        Self::with_shared_api(Arc::new(api), options)
    }

    pub fn with_shared_api(api: Arc<dyn RecordApi<R>>, options: ControllerOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let notifications = options
            .notifications
            .then(|| NotificationCenter::new(options.notification_ttl));
        Self {
            api,
            options,
            inner: Mutex::new(ViewState {
                collection: Vec::new(),
                list_loading: false,
                dialog: DialogState::Closed,
                dialog_generation: 0,
            }),
            mutation_in_flight: AtomicBool::new(false),
            notifications,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn collection(&self) -> Vec<R> {
        self.inner.lock().await.collection.clone()
    }

    pub async fn is_list_loading(&self) -> bool {
        self.inner.lock().await.list_loading
    }

    pub async fn dialog(&self) -> DialogState<R> {
        self.inner.lock().await.dialog.clone()
    }

    pub async fn dialog_kind(&self) -> DialogKind {
        self.inner.lock().await.dialog.kind()
    }

    pub async fn notification(&self) -> Option<StatusNotification> {
        match &self.notifications {
            Some(center) => center.current().await,
            None => None,
        }
    }

    pub fn is_mutation_in_flight(&self) -> bool {
        self.mutation_in_flight.load(Ordering::Acquire)
    }

    /// Fetches the whole collection and replaces the local copy.
    ///
    /// Used on activation and as the only refresh after a mutation. Concurrent
    /// loads are not ordered; whichever response lands last wins.
    pub async fn load(&self) -> Result<(), ControllerError> {
        self.inner.lock().await.list_loading = true;
        let result = self.api.list().await;

        let outcome = {
            let mut state = self.inner.lock().await;
            state.list_loading = false;
            result.map(|records| {
                let count = records.len();
                state.collection = records;
                count
            })
        };

        match outcome {
            Ok(count) => {
                debug!(resource = R::ENDPOINT.collection, count, "collection replaced");
                self.emit(ControllerEvent::ListLoaded {
                    resource: R::ENDPOINT.collection,
                    count,
                });
                Ok(())
            }
            Err(err) => {
                warn!(resource = R::ENDPOINT.collection, error = %err, "list load failed");
                self.emit(ControllerEvent::ListLoadFailed {
                    resource: R::ENDPOINT.collection,
                    error: err.clone(),
                });
                self.notify(StatusNotification::error(failure_text::<R>(&err)))
                    .await;
                Err(err.into())
            }
        }
    }

    pub async fn open_create(&self) {
        let attachment = R::ENDPOINT
            .has_attachment()
            .then(|| AttachmentDraft::existing(&self.options.asset_origin, None));
        let session = EditSession {
            target: EditTarget::Create,
            draft: R::Draft::default(),
            attachment,
        };
        let mut state = self.inner.lock().await;
        self.transition(&mut state, DialogState::CreateOrEdit(session));
    }

    pub async fn open_edit(&self, id: R::Id) -> Result<(), ControllerError> {
        let mut state = self.inner.lock().await;
        let record = find(&state.collection, id)?;
        let attachment = R::ENDPOINT.has_attachment().then(|| {
            AttachmentDraft::existing(&self.options.asset_origin, record.attachment_ref())
        });
        let session = EditSession {
            target: EditTarget::Edit(id),
            draft: record.to_draft(),
            attachment,
        };
        self.transition(&mut state, DialogState::CreateOrEdit(session));
        Ok(())
    }

    pub async fn open_delete(&self, id: R::Id) -> Result<(), ControllerError> {
        let mut state = self.inner.lock().await;
        let name = find(&state.collection, id)?.display_name().to_string();
        self.transition(&mut state, DialogState::ConfirmDelete { id, name });
        Ok(())
    }

    /// Shows a record already present in the collection; nothing is fetched.
    pub async fn open_detail(&self, id: R::Id) -> Result<(), ControllerError> {
        let mut state = self.inner.lock().await;
        let record = find(&state.collection, id)?.clone();
        self.transition(&mut state, DialogState::Detail(record));
        Ok(())
    }

    pub async fn close_dialog(&self) {
        let mut state = self.inner.lock().await;
        if state.dialog.is_open() {
            self.transition(&mut state, DialogState::Closed);
        }
    }

    pub async fn edit_draft<F>(&self, edit: F) -> Result<(), ControllerError>
    where
        F: FnOnce(&mut R::Draft),
    {
        let mut state = self.inner.lock().await;
        match &mut state.dialog {
            DialogState::CreateOrEdit(session) => {
                edit(&mut session.draft);
                Ok(())
            }
            other => Err(ControllerError::DialogNotOpen {
                expected: DialogKind::CreateOrEdit,
                found: other.kind(),
            }),
        }
    }

    /// Reads a local file and makes it the pending attachment with a local preview.
    pub async fn select_attachment(&self, path: &Path) -> Result<(), ControllerError> {
        let generation = self.attachment_generation().await?;
        let upload = read_attachment(path).await?;
        self.install_attachment(generation, upload).await
    }

    /// Same as [`Self::select_attachment`] for callers that already hold the bytes.
    pub async fn select_attachment_bytes(
        &self,
        upload: AttachmentUpload,
    ) -> Result<(), ControllerError> {
        let generation = self.attachment_generation().await?;
        self.install_attachment(generation, upload).await
    }

    /// Sends the open create/edit draft. On failure the dialog and draft stay as they were.
    pub async fn submit(&self) -> Result<(), ControllerError> {
        let guard = self.begin_mutation()?;
        let (target, payload, generation) = {
            let state = self.inner.lock().await;
            let DialogState::CreateOrEdit(session) = &state.dialog else {
                return Err(ControllerError::DialogNotOpen {
                    expected: DialogKind::CreateOrEdit,
                    found: state.dialog.kind(),
                });
            };
            let payload = RecordPayload::<R> {
                fields: session.draft.clone(),
                attachment: session
                    .attachment
                    .as_ref()
                    .and_then(|attachment| attachment.pending.clone()),
            };
            (session.target, payload, state.dialog_generation)
        };

        let name = R::draft_name(&payload.fields).to_string();
        let (operation, result) = match target {
            EditTarget::Create => (Operation::Create, self.api.create(payload).await),
            EditTarget::Edit(id) => (Operation::Update, self.api.update(id, payload).await),
        };
        drop(guard);

        self.settle_mutation(operation, &name, Some(generation), result.map(|_| ()))
            .await
    }

    /// Deletes the record named by the open delete confirmation dialog.
    pub async fn confirm_delete(&self) -> Result<(), ControllerError> {
        let guard = self.begin_mutation()?;
        let (id, name, generation) = {
            let state = self.inner.lock().await;
            let DialogState::ConfirmDelete { id, name } = &state.dialog else {
                return Err(ControllerError::DialogNotOpen {
                    expected: DialogKind::ConfirmDelete,
                    found: state.dialog.kind(),
                });
            };
            (*id, name.clone(), state.dialog_generation)
        };

        let result = self.api.delete(id).await;
        drop(guard);

        self.settle_mutation(Operation::Delete, &name, Some(generation), result)
            .await
    }

    /// Delete without a confirmation dialog: asks `prompt` and, if accepted,
    /// sends the request straight away. Returns whether a delete was sent.
    pub async fn delete_with_prompt(
        &self,
        id: R::Id,
        prompt: &dyn ConfirmPrompt,
    ) -> Result<bool, ControllerError> {
        let name = {
            let state = self.inner.lock().await;
            find(&state.collection, id)?.display_name().to_string()
        };

        let question = format!("Are you sure you want to delete this {}?", R::ENDPOINT.label);
        if !prompt.confirm(&question).await {
            debug!(resource = R::ENDPOINT.collection, %id, "delete declined");
            return Ok(false);
        }

        let guard = self.begin_mutation()?;
        let result = self.api.delete(id).await;
        drop(guard);

        self.settle_mutation(Operation::Delete, &name, None, result)
            .await
            .map(|()| true)
    }

    fn begin_mutation(&self) -> Result<MutationGuard<'_>, ControllerError> {
        self.mutation_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ControllerError::MutationInFlight)?;
        Ok(MutationGuard(&self.mutation_in_flight))
    }

    async fn settle_mutation(
        &self,
        operation: Operation,
        name: &str,
        close_generation: Option<u64>,
        result: Result<(), ApiError>,
    ) -> Result<(), ControllerError> {
        match result {
            Ok(()) => {
                info!(resource = R::ENDPOINT.collection, %operation, name, "mutation succeeded");
                self.emit(ControllerEvent::MutationSucceeded {
                    resource: R::ENDPOINT.collection,
                    operation,
                });
                self.notify(StatusNotification::success(success_text::<R>(
                    operation, name,
                )))
                .await;
                if let Some(generation) = close_generation {
                    self.close_dialog_from(generation).await;
                }
                if let Err(err) = self.load().await {
                    debug!(error = %err, "refresh after mutation failed");
                }
                Ok(())
            }
            Err(err) => {
                warn!(resource = R::ENDPOINT.collection, error = %err, "mutation failed");
                self.emit(ControllerEvent::MutationFailed {
                    resource: R::ENDPOINT.collection,
                    error: err.clone(),
                });
                self.notify(StatusNotification::error(failure_text::<R>(&err)))
                    .await;
                Err(err.into())
            }
        }
    }

    async fn attachment_generation(&self) -> Result<u64, ControllerError> {
        if !R::ENDPOINT.has_attachment() {
            return Err(ControllerError::AttachmentsUnsupported {
                resource: R::ENDPOINT.collection,
            });
        }
        let state = self.inner.lock().await;
        match &state.dialog {
            DialogState::CreateOrEdit(_) => Ok(state.dialog_generation),
            other => Err(ControllerError::DialogNotOpen {
                expected: DialogKind::CreateOrEdit,
                found: other.kind(),
            }),
        }
    }

    async fn install_attachment(
        &self,
        generation: u64,
        upload: AttachmentUpload,
    ) -> Result<(), ControllerError> {
        let mut state = self.inner.lock().await;
        if state.dialog_generation != generation {
            return Err(ControllerError::DialogClosed);
        }
        let DialogState::CreateOrEdit(session) = &mut state.dialog else {
            return Err(ControllerError::DialogClosed);
        };
        debug!(filename = %upload.filename, size = upload.bytes.len(), "attachment selected");
        session.attachment = Some(AttachmentDraft::selected(upload));
        Ok(())
    }

    async fn close_dialog_from(&self, generation: u64) {
        let mut state = self.inner.lock().await;
        if state.dialog_generation == generation {
            self.transition(&mut state, DialogState::Closed);
        }
    }

    fn transition(&self, state: &mut ViewState<R>, next: DialogState<R>) {
        let kind = next.kind();
        state.dialog = next;
        state.dialog_generation += 1;
        self.emit(ControllerEvent::DialogChanged {
            resource: R::ENDPOINT.collection,
            kind,
        });
    }

    async fn notify(&self, notification: StatusNotification) {
        let Some(center) = &self.notifications else {
            return;
        };
        center.show(notification.clone()).await;
        self.emit(ControllerEvent::Notified(notification));
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

fn find<R: Record>(collection: &[R], id: R::Id) -> Result<&R, ControllerError> {
    collection
        .iter()
        .find(|record| record.id() == id)
        .ok_or_else(|| ControllerError::UnknownRecord(id.to_string()))
}

fn success_text<R: Record>(operation: Operation, name: &str) -> String {
    let verb = match operation {
        Operation::Create => "created",
        Operation::Update => "updated",
        Operation::Delete => "deleted",
        Operation::List => "loaded",
    };
    format!("{} {verb}: \"{name}\"", R::ENDPOINT.title())
}

fn failure_text<R: Record>(err: &ApiError) -> String {
    let label = R::ENDPOINT.label;
    match (err.kind(), err.operation()) {
        (ErrorKind::NetworkFailure, Operation::List) => {
            "Error fetching data from server.".to_string()
        }
        (ErrorKind::NetworkFailure, _) => "Error connecting to the server.".to_string(),
        (ErrorKind::ServerRejected, Operation::List) => format!("Failed to fetch {label}s."),
        (ErrorKind::ServerRejected, operation) => format!("Failed to {operation} {label}."),
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{Teacher, TeacherId};

    use super::*;

    struct EmptyTeachers;

    #[async_trait]
    impl RecordApi<Teacher> for EmptyTeachers {
        async fn list(&self) -> Result<Vec<Teacher>, ApiError> {
            Ok(Vec::new())
        }

        async fn create(&self, _: RecordPayload<Teacher>) -> Result<Option<Teacher>, ApiError> {
            Ok(None)
        }

        async fn update(
            &self,
            _: TeacherId,
            _: RecordPayload<Teacher>,
        ) -> Result<Option<Teacher>, ApiError> {
            Ok(None)
        }

        async fn delete(&self, _: TeacherId) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn upload() -> AttachmentUpload {
        AttachmentUpload {
            filename: "late.png".into(),
            mime_type: Some("image/png".into()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn file_finishing_after_dialog_was_reopened_is_discarded() {
        let origin = Url::parse("http://localhost:5000").expect("origin");
        let controller = CrudController::<Teacher>::new(EmptyTeachers, ControllerOptions::new(origin));

        controller.open_create().await;
        let generation = controller.attachment_generation().await.expect("generation");
        controller.close_dialog().await;
        controller.open_create().await;

        let err = controller
            .install_attachment(generation, upload())
            .await
            .expect_err("stale read");
        assert!(matches!(err, ControllerError::DialogClosed));

        let DialogState::CreateOrEdit(session) = controller.dialog().await else {
            panic!("create dialog expected");
        };
        let attachment = session.attachment.expect("attachment draft");
        assert_eq!(attachment.pending, None);
        assert_eq!(attachment.preview, "http://localhost:5000/uploads/default.svg");

        let current = controller.attachment_generation().await.expect("generation");
        controller
            .install_attachment(current, upload())
            .await
            .expect("fresh read installs");
    }
}
