//! HTTP API client.
//!
//! [`ChatApi`] wraps a `reqwest` client with the three chat endpoints. Error
//! bodies are normalized through [`extract_error_message`] so callers only
//! ever see a string message.
//!
//! # Errors
//!
//! - Non-2xx responses become [`ApiError::Rejected`] with the extracted
//!   message.
//! - A 2xx send or delete whose body reports `status != "success"` is also a
//!   rejection.
//! - A history envelope that is not a success is
//!   [`ApiError::UnexpectedStatus`]. Individual records that fail to decode
//!   are skipped with a warning.

use deskchat_proto::{
    DeleteRequest, HistoryResponse, ProtocolError, RawMessage, SendRequest, StatusBody,
    endpoints, extract_error_message,
};
use reqwest::{Client, Response};
use url::Url;

use crate::{ApiError, ClientConfig};

/// Client for the chat HTTP endpoints.
#[derive(Debug, Clone)]
pub struct ChatApi {
    http: Client,
    messages: Url,
    send: Url,
    delete: Url,
}

impl ChatApi {
    /// Build a client for `config.base_url` with `config.request_timeout`.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let base = config.directory();

        Ok(Self {
            http,
            messages: base.join(endpoints::MESSAGES)?,
            send: base.join(endpoints::SEND)?,
            delete: base.join(endpoints::DELETE)?,
        })
    }

    /// `GET /api/chat/messages`.
    pub async fn fetch_history(&self) -> Result<Vec<RawMessage>, ApiError> {
        let response = self.http.get(self.messages.clone()).send().await?;
        let (_, body) = Self::success_body(response).await?;

        let decoded = HistoryResponse::parse(&body)?.into_messages().map_err(|e| match e {
            ProtocolError::UnexpectedStatus(status) => ApiError::UnexpectedStatus(status),
            other => ApiError::Decode(other),
        })?;

        for e in &decoded.rejected {
            tracing::warn!("Skipping malformed history record: {:?}", e);
        }
        Ok(decoded.messages)
    }

    /// `POST /api/chat/send`.
    pub async fn send(&self, request: &SendRequest) -> Result<(), ApiError> {
        let response = self.http.post(self.send.clone()).json(request).send().await?;
        Self::expect_success(response).await
    }

    /// `POST /api/chat/delete`.
    pub async fn delete(&self, request: &DeleteRequest) -> Result<(), ApiError> {
        let response = self.http.post(self.delete.clone()).json(request).send().await?;
        Self::expect_success(response).await
    }

    async fn expect_success(response: Response) -> Result<(), ApiError> {
        let (status, body) = Self::success_body(response).await?;
        if StatusBody::reports_failure(&body) {
            return Err(ApiError::Rejected { status, message: extract_error_message(&body) });
        }
        Ok(())
    }

    /// Status and body of a 2xx response; anything else is a rejection.
    async fn success_body(response: Response) -> Result<(u16, String), ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok((status.as_u16(), response.text().await?));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Rejected { status: status.as_u16(), message: extract_error_message(&body) })
    }
}
