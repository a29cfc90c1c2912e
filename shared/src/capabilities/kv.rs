use crux_kv::KeyValue;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::event::Event;
use crate::{AppError, ErrorKind};

pub type KvCapability = KeyValue<Event>;

/// Keys of the two values persisted between page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    /// JSON array of favorite event uuids.
    Favorites,
    /// The event handed from a list page to the detail page.
    SelectedEvent,
}

impl StorageKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favorites => "favoriteEventUUIDs",
            Self::SelectedEvent => "selectedEvent",
        }
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("failed to read {key}: {message}")]
    Read { key: String, message: String },

    #[error("failed to write {key}: {message}")]
    Write { key: String, message: String },
}

impl From<KvError> for AppError {
    fn from(e: KvError) -> Self {
        AppError::new(ErrorKind::Storage, e.to_string())
    }
}

pub type StoredValue = Result<Option<Vec<u8>>, KvError>;

pub fn read<F>(kv: &KvCapability, key: StorageKey, make_event: F)
where
    F: FnOnce(StoredValue) -> Event + Send + Sync + 'static,
{
    debug!(key = key.as_str(), "reading from storage");
    kv.get(key.as_str().to_string(), move |result| {
        make_event(result.map_err(|e| KvError::Read {
            key: key.as_str().to_string(),
            message: e.to_string(),
        }))
    });
}

pub fn write<F>(kv: &KvCapability, key: StorageKey, value: Vec<u8>, make_event: F)
where
    F: FnOnce(Result<(), KvError>) -> Event + Send + Sync + 'static,
{
    debug!(key = key.as_str(), bytes = value.len(), "writing to storage");
    kv.set(key.as_str().to_string(), value, move |result| {
        make_event(result.map(|_| ()).map_err(|e| KvError::Write {
            key: key.as_str().to_string(),
            message: e.to_string(),
        }))
    });
}

/// Decodes a stored JSON value. Absent, unreadable or corrupt data yields
/// `None`, with a warning for the latter two.
pub fn decode_stored<T: DeserializeOwned>(key: StorageKey, stored: StoredValue) -> Option<T> {
    match stored {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "stored value is corrupt, ignoring");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!(key = key.as_str(), error = %e, "storage read failed");
            None
        }
    }
}

pub fn encode<T: Serialize>(key: StorageKey, value: &T) -> Option<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| warn!(key = key.as_str(), error = %e, "could not encode value for storage"))
        .ok()
}
