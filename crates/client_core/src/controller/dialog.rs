//! Dialog state: exactly one of closed, create/edit, delete confirmation or detail.

use std::fmt;

use shared::record::Record;

use crate::attachment::AttachmentDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    None,
    CreateOrEdit,
    ConfirmDelete,
    Detail,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DialogKind::None => "no",
            DialogKind::CreateOrEdit => "create/edit",
            DialogKind::ConfirmDelete => "delete confirmation",
            DialogKind::Detail => "detail",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget<Id> {
    Create,
    Edit(Id),
}

/// Everything a create/edit dialog owns. Dropped as a whole when the dialog closes.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession<R: Record> {
    pub target: EditTarget<R::Id>,
    pub draft: R::Draft,
    /// Present only for record types with an attachment field.
    pub attachment: Option<AttachmentDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState<R: Record> {
    Closed,
    CreateOrEdit(EditSession<R>),
    ConfirmDelete { id: R::Id, name: String },
    Detail(R),
}

impl<R: Record> Default for DialogState<R> {
    fn default() -> Self {
        DialogState::Closed
    }
}

impl<R: Record> DialogState<R> {
    pub fn kind(&self) -> DialogKind {
        match self {
            DialogState::Closed => DialogKind::None,
            DialogState::CreateOrEdit(_) => DialogKind::CreateOrEdit,
            DialogState::ConfirmDelete { .. } => DialogKind::ConfirmDelete,
            DialogState::Detail(_) => DialogKind::Detail,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, DialogState::Closed)
    }

    pub fn edit_session(&self) -> Option<&EditSession<R>> {
        match self {
            DialogState::CreateOrEdit(session) => Some(session),
            _ => None,
        }
    }

    /// Id of the record the open dialog is about, if any.
    pub fn selected_id(&self) -> Option<R::Id> {
        match self {
            DialogState::Closed => None,
            DialogState::CreateOrEdit(session) => match session.target {
                EditTarget::Create => None,
                EditTarget::Edit(id) => Some(id),
            },
            DialogState::ConfirmDelete { id, .. } => Some(*id),
            DialogState::Detail(record) => Some(record.id()),
        }
    }
}
