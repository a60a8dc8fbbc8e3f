//! Native surface of a loaded map SDK.
//!
//! Every native object (map, marker, polyline) lives on the JS side and is
//! addressed by an opaque [`ObjectId`]. Option objects and event payloads
//! cross the boundary as JSON.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    Marker,
    Polyline,
}

/// Listener invoked with the event payload as JSON.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// Exception message thrown by the native SDK.
    #[error("{0}")]
    Native(String),

    #[error("unknown native object {0}")]
    UnknownObject(ObjectId),
}

pub trait Sdk: Send + Sync {
    /// Finish SDK start-up for scripts loaded with deferred initialisation
    /// (Kakao's `autoload=false` followed by `kakao.maps.load`).
    fn boot(&self) -> BoxFuture<'static, Result<(), SdkError>>;

    fn create_map(&self, container_id: &str, options: &Value) -> Result<ObjectId, SdkError>;

    /// Construct an overlay and attach it to `map`.
    fn create_overlay(
        &self,
        map: ObjectId,
        kind: OverlayKind,
        options: &Value,
    ) -> Result<ObjectId, SdkError>;

    fn call(&self, target: ObjectId, method: &str, args: &[Value]) -> Result<Value, SdkError>;

    fn listen(&self, target: ObjectId, event: &str, handler: EventHandler)
        -> Result<(), SdkError>;

    /// Remove an overlay from its map.
    fn detach(&self, overlay: ObjectId);

    /// Drop the native reference and every listener registered on it.
    fn release(&self, object: ObjectId);

    /// Run the SDK's geocoder (where one exists) and return its raw response.
    fn geocode(&self, query: &str) -> BoxFuture<'static, Result<Value, SdkError>>;
}
