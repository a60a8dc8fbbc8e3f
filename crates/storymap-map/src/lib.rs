//! Map abstraction over the Kakao, Google and Leaflet JavaScript SDKs.
//!
//! The browser side is reached through two traits: [`ScriptHost`] injects
//! script tags and looks up globals, [`Sdk`] drives one provider's native
//! objects. Everything above them (loading, retry, lifecycle, projection of
//! markers and routes) is shared by all providers.

pub mod adapter;
pub mod error;
pub mod geocode;
pub mod geolocation;
pub mod handle;
pub mod host;
pub mod loader;
pub mod markers;
pub mod providers;
pub mod registry;
mod retry;
pub mod routes;
pub mod sdk;
pub mod selector;
pub mod stamps;
pub mod store;

pub use adapter::{AdapterOptions, AdapterView, MapAdapter, MapCallbacks, MapProps};
pub use error::{LoadError, MapError};
pub use geocode::{GeocodeResult, KakaoLocalClient};
pub use geolocation::{
    Geolocator, GeolocationError, Position, PositionOptions, PositionSource,
};
pub use handle::{MapHandle, OverlayHandle};
pub use host::{ScriptEvent, ScriptHost, ScriptTag, TagKind};
pub use loader::{ensure_loaded, LoadState, RetryConfig, ScriptSpec, TimeoutPolicy};
pub use markers::{MarkerManager, MarkerPatch, MarkerStats};
pub use providers::{GoogleProvider, KakaoProvider, LeafletProvider, Provider};
pub use registry::ScriptRegistry;
pub use routes::{RouteManager, RoutePatch, RouteStats};
pub use sdk::{EventHandler, ObjectId, OverlayKind, Sdk, SdkError};
pub use selector::{provider_for, resolve_provider, MapSelector};
pub use stamps::{StampError, StampVerifier};
pub use store::{reduce, MapAction, MapStore};
