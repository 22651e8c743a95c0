use std::{fmt, hash::Hash};

use serde::{de::DeserializeOwned, Serialize};

/// Where a record type lives on the remote API and how its mutations are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Collection path segment, e.g. `positions`.
    pub collection: &'static str,
    /// Lowercase singular noun used in user-facing messages.
    pub label: &'static str,
    /// Multipart field carrying the file for records with an attachment.
    pub attachment_field: Option<&'static str>,
}

impl Endpoint {
    pub const fn json(collection: &'static str, label: &'static str) -> Self {
        Self {
            collection,
            label,
            attachment_field: None,
        }
    }

    pub const fn multipart(
        collection: &'static str,
        label: &'static str,
        attachment_field: &'static str,
    ) -> Self {
        Self {
            collection,
            label,
            attachment_field: Some(attachment_field),
        }
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment_field.is_some()
    }

    pub fn collection_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.collection)
    }

    pub fn item_url(&self, base_url: &str, id: impl fmt::Display) -> String {
        format!("{}/{id}", self.collection_url(base_url))
    }

    /// Label with its first letter uppercased, for the start of a sentence.
    pub fn title(&self) -> String {
        let mut chars = self.label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// An entity served by a remote collection endpoint.
pub trait Record: Clone + fmt::Debug + PartialEq + DeserializeOwned + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;
    /// Editable fields, sent in full on create and update.
    type Draft: Clone + fmt::Debug + Default + PartialEq + Serialize + Send + Sync + 'static;

    const ENDPOINT: Endpoint;

    fn id(&self) -> Self::Id;

    fn display_name(&self) -> &str;

    fn to_draft(&self) -> Self::Draft;

    fn draft_name(draft: &Self::Draft) -> &str;

    /// Server-relative path of the stored attachment, if the record has one.
    fn attachment_ref(&self) -> Option<&str> {
        None
    }
}
