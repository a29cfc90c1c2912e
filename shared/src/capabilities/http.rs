//! Remote data gateway: endpoint URLs, request bodies and the conversion of
//! `crux_http` outcomes into [`GatewayError`].
//!
//! All crux_http specifics stay in this file. The rest of the crate sees
//! `Result<T, GatewayError>` values carried on events, which keeps the app
//! testable by feeding those events directly.

use crux_http::Http;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::event::Event;
use crate::{ApiErrorResponse, AppError, ErrorKind};

pub type HttpCapability = Http<Event>;
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GatewayError {
    /// The request never produced an HTTP response (DNS, CORS, offline, timeout).
    #[error("network error: {message}")]
    Transport { message: String },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("could not decode response: {message}")]
    Decode { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl GatewayError {
    /// Builds the error for a non-2xx response, using the `{message}` field of
    /// a JSON error body when there is one.
    #[must_use]
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ApiErrorResponse>(body)
            .ok()
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {status}"));
        Self::Http { status, message }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Message suitable for showing inline: the server's own text for HTTP errors.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Http { message, .. }
            | Self::Decode { message }
            | Self::InvalidRequest { message } => message,
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(e: ConfigError) -> Self {
        Self::InvalidRequest {
            message: e.to_string(),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Transport { message } => AppError::new(ErrorKind::Network, message),
            GatewayError::Http { status, message } => {
                let kind = match status {
                    404 => ErrorKind::NotFound,
                    400 | 422 => ErrorKind::Validation,
                    408 => ErrorKind::Timeout,
                    _ => ErrorKind::Http,
                };
                AppError::new(kind, message)
                    .with_status(status)
                    .with_context("http_status", status.to_string())
            }
            GatewayError::Decode { message } => AppError::new(ErrorKind::Decode, message),
            GatewayError::InvalidRequest { message } => AppError::new(ErrorKind::Config, message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Events,
    Sports,
    Categories,
    Comments,
    EventComments(String),
    Upload,
}

impl Endpoint {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Sports => "sports",
            Self::Categories => "sport_categories",
            Self::Comments | Self::EventComments(_) => "comments",
            Self::Upload => "upload",
        }
    }

    /// Resolves the endpoint against the API base. Path parameters are
    /// percent-encoded as single segments.
    pub fn url(&self, base: &Url) -> GatewayResult<Url> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                GatewayError::InvalidRequest {
                    message: format!("{base} cannot be used as an API base"),
                }
            })?;
            segments.pop_if_empty();
            match self {
                Self::EventComments(uuid) => {
                    segments.push("comments").push("events").push(uuid);
                }
                other => {
                    segments.push(other.name());
                }
            }
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentRequest {
    pub event_uuid: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEventRequest {
    pub name: String,
    pub description: String,
    pub date: String,
    pub location_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category_name: String,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub uri: Option<String>,
}

/// Last-request-wins fencing for one resource.
///
/// Each fetch takes a ticket; only the response carrying the newest ticket
/// may update state, so a slow stale response can no longer overwrite a
/// fresher one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFence {
    latest: u64,
}

impl RequestFence {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    #[must_use]
    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest
    }

    #[must_use]
    pub fn latest(&self) -> u64 {
        self.latest
    }
}

/// Interprets an HTTP status and body the way every endpoint expects.
pub fn interpret(status: u16, body: Vec<u8>) -> GatewayResult<Vec<u8>> {
    if (200..300).contains(&status) {
        Ok(body)
    } else {
        Err(GatewayError::from_status(status, &body))
    }
}

/// Converts a crux_http outcome into raw body bytes or a [`GatewayError`].
pub fn settle(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> GatewayResult<Vec<u8>> {
    match result {
        Ok(mut response) => {
            let status = u16::from(response.status());
            let body = response.take_body().unwrap_or_default();
            interpret(status, body)
        }
        Err(crux_http::HttpError::Http { code, body, .. }) => Err(GatewayError::from_status(
            u16::from(code),
            body.as_deref().unwrap_or_default(),
        )),
        Err(crux_http::HttpError::Timeout) => Err(GatewayError::Transport {
            message: "request timed out".to_string(),
        }),
        Err(other) => Err(GatewayError::Transport {
            message: other.to_string(),
        }),
    }
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> GatewayResult<T> {
    serde_json::from_slice(bytes).map_err(|e| GatewayError::Decode {
        message: e.to_string(),
    })
}

pub fn settle_json<T: DeserializeOwned>(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> GatewayResult<T> {
    settle(result).and_then(|bytes| decode(&bytes))
}

/// Like [`settle`], for endpoints whose success body is irrelevant.
pub fn settle_unit(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> GatewayResult<()> {
    settle(result).map(|_| ())
}

/// Encoded `multipart/form-data` body carrying a single `file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    #[must_use]
    pub fn single_file(file_name: &str, mime_type: &str, data: &[u8]) -> Self {
        let boundary = format!("----sporthub-{}", Uuid::new_v4().simple());
        let file_name = file_name.replace(['"', '\r', '\n'], "_");

        let mut bytes = Vec::with_capacity(data.len() + 256);
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
                .as_bytes(),
        );
        bytes.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Self {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            bytes,
        }
    }
}

pub fn json_body<B: Serialize>(body: &B) -> GatewayResult<Vec<u8>> {
    serde_json::to_vec(body).map_err(|e| GatewayError::InvalidRequest {
        message: e.to_string(),
    })
}

pub fn get_json<T, F>(http: &HttpCapability, url: &Url, make_event: F)
where
    T: DeserializeOwned + 'static,
    F: FnOnce(GatewayResult<T>) -> Event + Send + 'static,
{
    debug!(url = %url, "GET");
    http.get(url.as_str())
        .header("Accept", "application/json")
        .send(move |result| make_event(settle_json(result)));
}

pub fn post_json<F>(http: &HttpCapability, url: &Url, body: Vec<u8>, make_event: F)
where
    F: FnOnce(GatewayResult<Vec<u8>>) -> Event + Send + 'static,
{
    debug!(url = %url, bytes = body.len(), "POST");
    http.post(url.as_str())
        .body_bytes(body)
        .header("Content-Type", "application/json")
        .header("Accept", "application/json")
        .send(move |result| make_event(settle(result)));
}

pub fn post_multipart<F>(http: &HttpCapability, url: &Url, body: MultipartBody, make_event: F)
where
    F: FnOnce(GatewayResult<Vec<u8>>) -> Event + Send + 'static,
{
    debug!(url = %url, bytes = body.bytes.len(), "POST multipart");
    http.post(url.as_str())
        .body_bytes(body.bytes)
        .header("Content-Type", body.content_type.as_str())
        .send(move |result| make_event(settle(result)));
}
