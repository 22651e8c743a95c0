use serde::{Deserialize, Serialize};

/// Placeholder image served by the API when a record has no attachment.
pub const DEFAULT_ATTACHMENT_PATH: &str = "/uploads/default.svg";

/// Body shape of every collection endpoint response.
///
/// `data` is absent on delete responses and on most rejections; a missing
/// field reads as `None` without `#[serde(default)]`, which would require
/// `T: Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            success: false,
            data: None,
        }
    }
}
