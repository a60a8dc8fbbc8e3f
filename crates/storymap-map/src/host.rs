//! Page-level operations the loader needs from the embedding browser.
//!
//! A wasm bridge implements [`ScriptHost`] over `document`/`window`; tests use
//! an in-memory fake.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::sdk::Sdk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Script,
    Stylesheet,
}

/// A `<script>` or `<link rel="stylesheet">` to append to the document head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    pub kind: TagKind,
    pub url: String,
}

impl ScriptTag {
    #[must_use]
    pub fn script(url: impl Into<String>) -> Self {
        Self {
            kind: TagKind::Script,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn stylesheet(url: impl Into<String>) -> Self {
        Self {
            kind: TagKind::Stylesheet,
            url: url.into(),
        }
    }
}

/// Which of `onload` / `onerror` fired on an injected tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEvent {
    Loaded,
    Failed,
}

pub trait ScriptHost: Send + Sync {
    /// `true` when `window[name]` is already defined.
    fn has_global(&self, name: &str) -> bool;

    /// Append the tag and resolve when it fires `onload` or `onerror`.
    ///
    /// The returned future may never resolve; callers bound it with a timeout.
    fn inject(&self, tag: &ScriptTag) -> BoxFuture<'static, ScriptEvent>;

    /// `true` when an element with this id is attached to the document.
    fn container_exists(&self, container_id: &str) -> bool;

    /// Native surface of the SDK rooted at `window[global]`, if defined.
    fn sdk(&self, global: &str) -> Option<Arc<dyn Sdk>>;
}
