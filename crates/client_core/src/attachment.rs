use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::protocol::DEFAULT_ATTACHMENT_PATH;
use url::Url;

use crate::{api::AttachmentUpload, error::ControllerError};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Pending file and the preview shown for it while a create/edit dialog is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDraft {
    pub pending: Option<AttachmentUpload>,
    pub preview: String,
}

impl AttachmentDraft {
    /// Preview of whatever the server already stores, or the placeholder.
    pub fn existing(asset_origin: &Url, attachment_ref: Option<&str>) -> Self {
        Self {
            pending: None,
            preview: resolve_attachment_url(asset_origin, attachment_ref),
        }
    }

    pub fn selected(upload: AttachmentUpload) -> Self {
        let preview = preview_data_url(upload.mime_type.as_deref(), &upload.bytes);
        Self {
            pending: Some(upload),
            preview,
        }
    }
}

pub fn resolve_attachment_url(asset_origin: &Url, attachment_ref: Option<&str>) -> String {
    let path = attachment_ref
        .filter(|path| !path.is_empty())
        .unwrap_or(DEFAULT_ATTACHMENT_PATH);
    match asset_origin.join(path) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{path}", asset_origin.as_str().trim_end_matches('/')),
    }
}

pub fn preview_data_url(mime_type: Option<&str>, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type.unwrap_or(FALLBACK_MIME_TYPE),
        STANDARD.encode(bytes)
    )
}

pub async fn read_attachment(path: &Path) -> Result<AttachmentUpload, ControllerError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ControllerError::AttachmentRead {
            path: path.to_path_buf(),
            source,
        })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());

    Ok(AttachmentUpload {
        filename,
        mime_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:5000").expect("origin")
    }

    #[test]
    fn resolves_relative_ref_against_origin() {
        assert_eq!(
            resolve_attachment_url(&origin(), Some("/uploads/17-me.png")),
            "http://localhost:5000/uploads/17-me.png"
        );
    }

    #[test]
    fn falls_back_to_placeholder_when_ref_missing_or_empty() {
        let expected = "http://localhost:5000/uploads/default.svg";
        assert_eq!(resolve_attachment_url(&origin(), None), expected);
        assert_eq!(resolve_attachment_url(&origin(), Some("")), expected);
    }

    #[test]
    fn absolute_ref_resolves_against_origin_root_even_with_api_prefix() {
        let api = Url::parse("http://example.test/api/").expect("api");
        assert_eq!(
            resolve_attachment_url(&api, Some("/uploads/a.jpg")),
            "http://example.test/uploads/a.jpg"
        );
    }

    #[test]
    fn builds_data_url_preview() {
        assert_eq!(
            preview_data_url(Some("image/png"), b"png"),
            "data:image/png;base64,cG5n"
        );
        assert!(preview_data_url(None, b"").starts_with("data:application/octet-stream;base64,"));
    }

    #[tokio::test]
    async fn reads_file_and_guesses_mime_type() {
        let dir = std::env::temp_dir().join(format!("staffdesk_attachment_{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("dir");
        let path = dir.join("portrait.png");
        tokio::fs::write(&path, b"\x89PNG").await.expect("write");

        let upload = read_attachment(&path).await.expect("read");
        assert_eq!(upload.filename, "portrait.png");
        assert_eq!(upload.mime_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes, b"\x89PNG");

        tokio::fs::remove_dir_all(&dir).await.expect("cleanup");
    }

    #[tokio::test]
    async fn missing_file_is_reported_with_path() {
        let path = std::env::temp_dir().join("staffdesk_definitely_missing.png");
        let err = read_attachment(&path).await.expect_err("must fail");
        assert!(matches!(err, ControllerError::AttachmentRead { .. }));
        assert!(err.to_string().contains("staffdesk_definitely_missing.png"));
    }
}
