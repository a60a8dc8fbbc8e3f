//! Owning wrappers around native SDK objects.
//!
//! A [`MapHandle`] releases its map when dropped; an [`OverlayHandle`] detaches
//! and releases its overlay. Clearing a `Vec<OverlayHandle>` is therefore
//! enough to remove every rendered marker or polyline.

use std::sync::Arc;

use serde_json::Value;

use crate::sdk::{EventHandler, ObjectId, OverlayKind, Sdk, SdkError};

pub struct MapHandle {
    sdk: Arc<dyn Sdk>,
    id: ObjectId,
}

impl MapHandle {
    pub(crate) fn new(sdk: Arc<dyn Sdk>, id: ObjectId) -> Self {
        Self { sdk, id }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn call(&self, method: &str, args: &[Value]) -> Result<Value, SdkError> {
        self.sdk.call(self.id, method, args)
    }

    pub(crate) fn listen(&self, event: &str, handler: EventHandler) -> Result<(), SdkError> {
        self.sdk.listen(self.id, event, handler)
    }

    pub(crate) fn add_overlay(
        &self,
        kind: OverlayKind,
        options: &Value,
    ) -> Result<OverlayHandle, SdkError> {
        let id = self.sdk.create_overlay(self.id, kind, options)?;
        Ok(OverlayHandle {
            sdk: Arc::clone(&self.sdk),
            id,
            kind,
        })
    }
}

impl Drop for MapHandle {
    fn drop(&mut self) {
        tracing::trace!(map = %self.id, "releasing native map");
        self.sdk.release(self.id);
    }
}

impl std::fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapHandle").field("id", &self.id).finish()
    }
}

pub struct OverlayHandle {
    sdk: Arc<dyn Sdk>,
    id: ObjectId,
    kind: OverlayKind,
}

impl OverlayHandle {
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    pub(crate) fn listen(&self, event: &str, handler: EventHandler) -> Result<(), SdkError> {
        self.sdk.listen(self.id, event, handler)
    }
}

impl Drop for OverlayHandle {
    fn drop(&mut self) {
        self.sdk.detach(self.id);
        self.sdk.release(self.id);
    }
}

impl std::fmt::Debug for OverlayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
