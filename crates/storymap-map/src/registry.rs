//! Process-wide record of in-flight and finished SDK script loads.
//!
//! One entry per provider. Concurrent mounts of the same provider await the
//! same shared future, so a script tag is injected at most once per attempt.
//! A finished failure is replaced by the next [`ScriptRegistry::acquire_load`];
//! a success sticks until [`ScriptRegistry::reset`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use storymap_core::ProviderKind;

use crate::error::LoadError;

pub type SharedLoad = Shared<BoxFuture<'static, Result<(), LoadError>>>;

#[derive(Default)]
pub struct ScriptRegistry {
    loads: Mutex<HashMap<ProviderKind, SharedLoad>>,
}

impl ScriptRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by every adapter in the process.
    #[must_use]
    pub fn global() -> Arc<ScriptRegistry> {
        static GLOBAL: OnceLock<Arc<ScriptRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ScriptRegistry::new())))
    }

    /// Join the provider's current load, or start one with `start`.
    ///
    /// `start` is only called when no load is in flight and no previous load
    /// succeeded.
    pub fn acquire_load<F>(&self, provider: ProviderKind, start: F) -> SharedLoad
    where
        F: FnOnce() -> BoxFuture<'static, Result<(), LoadError>>,
    {
        let mut loads = self.loads.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = loads.get(&provider) {
            if !matches!(existing.peek(), Some(Err(_))) {
                tracing::debug!(%provider, "joining existing script load");
                return existing.clone();
            }
            tracing::debug!(%provider, "previous script load failed, starting over");
        }
        let load = start().shared();
        loads.insert(provider, load.clone());
        load
    }

    /// Forget the provider's load so the next mount injects its script again.
    pub fn reset(&self, provider: ProviderKind) {
        let mut loads = self.loads.lock().unwrap_or_else(PoisonError::into_inner);
        if loads.remove(&provider).is_some() {
            tracing::debug!(%provider, "script load reset");
        }
    }

    #[must_use]
    pub fn is_loaded(&self, provider: ProviderKind) -> bool {
        let loads = self.loads.lock().unwrap_or_else(PoisonError::into_inner);
        loads
            .get(&provider)
            .is_some_and(|load| matches!(load.peek(), Some(Ok(()))))
    }
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loads = self.loads.lock().unwrap_or_else(PoisonError::into_inner);
        let mut providers: Vec<String> = loads.keys().map(ToString::to_string).collect();
        providers.sort();
        f.debug_struct("ScriptRegistry")
            .field("providers", &providers)
            .finish()
    }
}
