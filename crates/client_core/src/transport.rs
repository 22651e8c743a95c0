//! reqwest implementation of [`RecordApi`] against `{ success, data }` endpoints.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    error::{ApiError, Operation},
    protocol::ApiEnvelope,
    record::Record,
};
use tracing::{debug, warn};

use crate::api::{RecordApi, RecordPayload};

pub struct HttpRecordApi<R> {
    http: Client,
    base_url: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> HttpRecordApi<R> {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Shares one connection pool between the record types of a session.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            _record: PhantomData,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn encode_body(
        &self,
        request: RequestBuilder,
        payload: RecordPayload<R>,
        operation: Operation,
    ) -> Result<RequestBuilder, ApiError> {
        let Some(file_field) = R::ENDPOINT.attachment_field else {
            return Ok(request.json(&payload.fields));
        };

        let mut form = Form::new();
        for (name, value) in form_fields(&payload.fields, operation)? {
            form = form.text(name, value);
        }
        if let Some(upload) = payload.attachment {
            let mut part = Part::bytes(upload.bytes).file_name(upload.filename);
            if let Some(mime_type) = upload.mime_type {
                part = part.mime_str(&mime_type).map_err(|err| {
                    ApiError::invalid_request(
                        operation,
                        format!("invalid attachment mime type: {err}"),
                    )
                })?;
            }
            form = form.part(file_field, part);
        }
        Ok(request.multipart(form))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: Operation,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let response = request.send().await.map_err(|err| {
            warn!(
                resource = R::ENDPOINT.collection,
                %operation,
                error = %err,
                "request could not complete"
            );
            ApiError::network(operation, err.to_string())
        })?;
        read_envelope(response, operation).await.inspect_err(|err| {
            warn!(resource = R::ENDPOINT.collection, error = %err, "request rejected");
        })
    }
}

#[async_trait]
impl<R: Record> RecordApi<R> for HttpRecordApi<R> {
    async fn list(&self) -> Result<Vec<R>, ApiError> {
        let url = R::ENDPOINT.collection_url(&self.base_url);
        debug!(%url, "listing records");
        let envelope: ApiEnvelope<Vec<R>> = self.send(self.http.get(url), Operation::List).await?;
        envelope
            .data
            .ok_or_else(|| ApiError::rejected(Operation::List, 200, "response carried no data"))
    }

    async fn create(&self, payload: RecordPayload<R>) -> Result<Option<R>, ApiError> {
        let url = R::ENDPOINT.collection_url(&self.base_url);
        debug!(%url, with_attachment = payload.attachment.is_some(), "creating record");
        let request = self.encode_body(self.http.post(url), payload, Operation::Create)?;
        let envelope: ApiEnvelope<R> = self.send(request, Operation::Create).await?;
        Ok(envelope.data)
    }

    async fn update(&self, id: R::Id, payload: RecordPayload<R>) -> Result<Option<R>, ApiError> {
        let url = R::ENDPOINT.item_url(&self.base_url, id);
        debug!(%url, with_attachment = payload.attachment.is_some(), "updating record");
        let request = self.encode_body(self.http.put(url), payload, Operation::Update)?;
        let envelope: ApiEnvelope<R> = self.send(request, Operation::Update).await?;
        Ok(envelope.data)
    }

    async fn delete(&self, id: R::Id) -> Result<(), ApiError> {
        let url = R::ENDPOINT.item_url(&self.base_url, id);
        debug!(%url, "deleting record");
        let _: ApiEnvelope<serde::de::IgnoredAny> =
            self.send(self.http.delete(url), Operation::Delete).await?;
        Ok(())
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: Response,
    operation: Operation,
) -> Result<ApiEnvelope<T>, ApiError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| ApiError::network(operation, err.to_string()))?;

    let envelope: ApiEnvelope<T> = serde_json::from_slice(&body).map_err(|err| {
        ApiError::rejected(
            operation,
            status.as_u16(),
            format!("malformed response body: {err}"),
        )
    })?;

    if !status.is_success() {
        return Err(ApiError::rejected(
            operation,
            status.as_u16(),
            "non-success status",
        ));
    }
    if !envelope.success {
        return Err(ApiError::rejected(
            operation,
            status.as_u16(),
            "success flag was false",
        ));
    }
    Ok(envelope)
}

/// Flattens a draft into multipart text fields. Absent values are omitted so
/// the server keeps what it has.
pub(crate) fn form_fields<D: serde::Serialize>(
    draft: &D,
    operation: Operation,
) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(draft)
        .map_err(|err| ApiError::invalid_request(operation, format!("failed to encode draft: {err}")))?;
    let serde_json::Value::Object(map) = value else {
        return Err(ApiError::invalid_request(
            operation,
            "draft must serialize to an object",
        ));
    };

    Ok(map
        .into_iter()
        .filter_map(|(name, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some((name, text)),
            other => Some((name, other.to_string())),
        })
        .collect())
}
