//! Controller events for presentation layers.

use shared::error::{ApiError, Operation};

use crate::{controller::DialogKind, notification::StatusNotification};

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    ListLoaded {
        resource: &'static str,
        count: usize,
    },
    ListLoadFailed {
        resource: &'static str,
        error: ApiError,
    },
    DialogChanged {
        resource: &'static str,
        kind: DialogKind,
    },
    Notified(StatusNotification),
    MutationSucceeded {
        resource: &'static str,
        operation: Operation,
    },
    MutationFailed {
        resource: &'static str,
        error: ApiError,
    },
}
