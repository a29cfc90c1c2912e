pub mod http;
pub mod kv;
pub mod timer;

pub use self::http::{
    Endpoint, GatewayError, GatewayResult, MultipartBody, NewCommentRequest, NewEventRequest,
    RequestFence, UploadResponse,
};
pub use self::kv::{KvError, StorageKey, StoredValue};
pub use self::timer::{Timer, TimerCommand, TimerId, TimerOperation, TimerOutput, TimerOwner};

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

use crate::event::Event;

/// Effect variants are named after the field types: `Http`, `KeyValue`,
/// `Render` and `Timer`.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub key_value: KeyValue<Event>,
    pub render: Render<Event>,
    pub timer: Timer<Event>,
}
