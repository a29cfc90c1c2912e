// lib.rs - SportHub shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod carousel;
pub mod comments;
pub mod composer;
pub mod config;
pub mod detail;
pub mod event;
pub mod favorites;
pub mod feed;
pub mod mapper;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::AppConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

pub const DEFAULT_API_BASE_URL: &str = "https://sport-hub.eunglyzhia.social/api/v1";
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://placehold.co/800x400/3b82f6/ffffff?text=Event+Image";
pub const DEFAULT_EVENT_TITLE: &str = "Untitled Event";
pub const DEFAULT_EVENT_DESCRIPTION: &str = "No description available";
pub const DEFAULT_LOCATION: &str = "Location not specified";
pub const DEFAULT_MAP_LOCATION: &str = "Phnom Penh, Cambodia";
pub const UNCATEGORIZED: &str = "uncategorized";
pub const UNCATEGORIZED_DISPLAY: &str = "Uncategorized";
pub const DATE_UNAVAILABLE: &str = "Date not available";
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";
pub const EMPTY_COMMENT_CONTENT: &str = "No content";
pub const NO_COMMENTS_MESSAGE: &str = "Be the first to comment!";
pub const NO_EVENTS_MESSAGE: &str = "No events found";
pub const NO_RELATED_MESSAGE: &str = "No related events available";
pub const MISSING_EVENT_ID_MESSAGE: &str = "Event ID missing";
pub const DETAIL_LOAD_FAILED_MESSAGE: &str = "Could not load event details";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Http,
    Validation,
    NotFound,
    Decode,
    Storage,
    ImageTooLarge,
    ImageFormatUnsupported,
    Config,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Http => "HTTP_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Decode => "DECODE_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
            Self::Config => "CONFIG_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Http | Self::Storage => {
                ErrorSeverity::Transient
            }
            Self::Validation
            | Self::NotFound
            | Self::Decode
            | Self::ImageTooLarge
            | Self::ImageFormatUnsupported
            | Self::Config => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Http)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub status: Option<u16>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            status: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Http => match self.status {
                Some(status) => format!("The server returned an error ({status}). Please try again."),
                None => "The server returned an error. Please try again.".into(),
            },
            ErrorKind::Validation | ErrorKind::Config => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Decode => "The server sent data we could not read.".into(),
            ErrorKind::Storage => "Unable to save data locally.".into(),
            ErrorKind::ImageTooLarge => format!(
                "The image is too large. Please use an image smaller than {} MB.",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            ),
            ErrorKind::ImageFormatUnsupported => {
                "This image format is not supported. Please use JPEG, PNG, or WebP.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {status})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub(crate) message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please write a comment before posting")]
    EmptyComment,
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be a number")]
    NotANumber { field: &'static str },
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(String),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(String),
    #[error("Image size {size} bytes exceeds maximum of {max} bytes")]
    ImageTooLarge { size: usize, max: usize },
    #[error("Unsupported image format")]
    UnsupportedImage,
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        let kind = match &e {
            ValidationError::ImageTooLarge { .. } => ErrorKind::ImageTooLarge,
            ValidationError::UnsupportedImage => ErrorKind::ImageFormatUnsupported,
            _ => ErrorKind::Validation,
        };
        AppError::new(kind, e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}
