//! In-memory browser for adapter tests: a script host that plays back scripted
//! load outcomes and an SDK that keeps native objects in a map.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{json, Value};
use storymap_core::{Category, Coordinate, Location, Marker, MarkerType, Route};
use storymap_map::{
    EventHandler, ObjectId, OverlayKind, ScriptEvent, ScriptHost, ScriptTag, Sdk, SdkError,
    TagKind,
};

/// What the next injected `<script>` does.
#[derive(Debug, Clone, Copy)]
pub enum ScriptBehaviour {
    /// Defines the global and fires `onload`.
    Load,
    /// Fires `onerror`.
    Fail,
    /// Never answers and defines nothing.
    Hang,
    /// Defines the global but never fires `onload`.
    Silent,
    /// Defines the global and fires `onload` after the delay.
    Delayed(Duration),
}

pub struct FakeHost {
    global: String,
    globals: Arc<Mutex<HashSet<String>>>,
    containers: Mutex<HashSet<String>>,
    behaviours: Mutex<VecDeque<ScriptBehaviour>>,
    injected: Mutex<Vec<ScriptTag>>,
    sdk: Arc<FakeSdk>,
}

impl FakeHost {
    /// Host whose scripts define `global`, with a `map` container attached.
    pub fn new(global: &str) -> Arc<Self> {
        Arc::new(Self {
            global: global.to_string(),
            globals: Arc::new(Mutex::new(HashSet::new())),
            containers: Mutex::new(HashSet::from(["map".to_string()])),
            behaviours: Mutex::new(VecDeque::new()),
            injected: Mutex::new(Vec::new()),
            sdk: Arc::new(FakeSdk::default()),
        })
    }

    pub fn as_host(self: &Arc<Self>) -> Arc<dyn ScriptHost> {
        Arc::clone(self) as Arc<dyn ScriptHost>
    }

    pub fn script_behaviours(&self, behaviours: impl IntoIterator<Item = ScriptBehaviour>) {
        self.behaviours.lock().unwrap().extend(behaviours);
    }

    pub fn define_global(&self) {
        self.globals.lock().unwrap().insert(self.global.clone());
    }

    pub fn remove_container(&self, id: &str) {
        self.containers.lock().unwrap().remove(id);
    }

    /// URLs of every injected `<script>`, in order. Stylesheets excluded.
    pub fn injected_scripts(&self) -> Vec<String> {
        self.injected
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.kind == TagKind::Script)
            .map(|t| t.url.clone())
            .collect()
    }

    pub fn injected_stylesheets(&self) -> Vec<String> {
        self.injected
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.kind == TagKind::Stylesheet)
            .map(|t| t.url.clone())
            .collect()
    }

    pub fn fake_sdk(&self) -> Arc<FakeSdk> {
        Arc::clone(&self.sdk)
    }
}

impl ScriptHost for FakeHost {
    fn has_global(&self, name: &str) -> bool {
        self.globals.lock().unwrap().contains(name)
    }

    fn inject(&self, tag: &ScriptTag) -> BoxFuture<'static, ScriptEvent> {
        self.injected.lock().unwrap().push(tag.clone());
        if tag.kind == TagKind::Stylesheet {
            return future::ready(ScriptEvent::Loaded).boxed();
        }

        let behaviour = self
            .behaviours
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptBehaviour::Load);
        match behaviour {
            ScriptBehaviour::Load => {
                self.define_global();
                future::ready(ScriptEvent::Loaded).boxed()
            }
            ScriptBehaviour::Fail => future::ready(ScriptEvent::Failed).boxed(),
            ScriptBehaviour::Hang => future::pending().boxed(),
            ScriptBehaviour::Silent => {
                self.define_global();
                future::pending().boxed()
            }
            ScriptBehaviour::Delayed(delay) => {
                let globals = Arc::clone(&self.globals);
                let global = self.global.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    globals.lock().unwrap().insert(global);
                    ScriptEvent::Loaded
                }
                .boxed()
            }
        }
    }

    fn container_exists(&self, container_id: &str) -> bool {
        self.containers.lock().unwrap().contains(container_id)
    }

    fn sdk(&self, global: &str) -> Option<Arc<dyn Sdk>> {
        if self.has_global(global) {
            Some(Arc::clone(&self.sdk) as Arc<dyn Sdk>)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeObjectKind {
    Map,
    Overlay(OverlayKind),
}

#[derive(Debug, Clone)]
pub struct FakeObject {
    pub kind: FakeObjectKind,
    pub options: Value,
    pub attached: bool,
}

pub struct FakeSdk {
    next_id: AtomicU64,
    objects: Mutex<HashMap<ObjectId, FakeObject>>,
    listeners: Mutex<Vec<(ObjectId, String, EventHandler)>>,
    calls: Mutex<Vec<(ObjectId, String, Vec<Value>)>>,
    auto_events: Mutex<HashSet<String>>,
    create_map_error: Mutex<Option<String>>,
    geocode_response: Mutex<Value>,
    boots: AtomicU32,
}

impl Default for FakeSdk {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            objects: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            // First-render events fire as soon as someone listens.
            auto_events: Mutex::new(HashSet::from(["tilesloaded".to_string(), "load".to_string()])),
            create_map_error: Mutex::new(None),
            geocode_response: Mutex::new(json!({ "status": "ZERO_RESULT", "result": [] })),
            boots: AtomicU32::new(0),
        }
    }
}

impl FakeSdk {
    pub fn fail_create_map(&self, message: &str) {
        *self.create_map_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn suppress_auto_events(&self) {
        self.auto_events.lock().unwrap().clear();
    }

    pub fn respond_to_geocode(&self, response: Value) {
        *self.geocode_response.lock().unwrap() = response;
    }

    pub fn boots(&self) -> u32 {
        self.boots.load(Ordering::SeqCst)
    }

    /// Overlays of this kind still attached to a map.
    pub fn live_overlays(&self, kind: OverlayKind) -> usize {
        self.objects
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.kind == FakeObjectKind::Overlay(kind) && o.attached)
            .count()
    }

    pub fn live_maps(&self) -> usize {
        self.objects
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.kind == FakeObjectKind::Map)
            .count()
    }

    pub fn live_objects(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Ids of attached overlays of this kind, oldest first.
    pub fn overlay_ids(&self, kind: OverlayKind) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, o)| o.kind == FakeObjectKind::Overlay(kind) && o.attached)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn overlay_options(&self, kind: OverlayKind) -> Vec<Value> {
        let ids = self.overlay_ids(kind);
        let objects = self.objects.lock().unwrap();
        ids.into_iter()
            .filter_map(|id| objects.get(&id).map(|o| o.options.clone()))
            .collect()
    }

    pub fn map_id(&self) -> Option<ObjectId> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(_, o)| o.kind == FakeObjectKind::Map)
            .map(|(id, _)| *id)
    }

    /// Options the (first) map was created with.
    pub fn map_options(&self) -> Option<Value> {
        let id = self.map_id()?;
        self.objects.lock().unwrap().get(&id).map(|o| o.options.clone())
    }

    /// Arguments of every call to `method`, in order.
    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m, _)| m == method)
            .map(|(_, _, args)| args.clone())
            .collect()
    }

    /// Fire `event` on `target` as the SDK would.
    pub fn emit(&self, target: ObjectId, event: &str, payload: &Value) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, name, _)| *id == target && name == event)
            .map(|(_, _, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(payload.clone());
        }
    }

    fn allocate(&self, kind: FakeObjectKind, options: &Value) -> ObjectId {
        let id = ObjectId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.objects.lock().unwrap().insert(
            id,
            FakeObject {
                kind,
                options: options.clone(),
                attached: true,
            },
        );
        id
    }
}

impl Sdk for FakeSdk {
    fn boot(&self) -> BoxFuture<'static, Result<(), SdkError>> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        future::ready(Ok(())).boxed()
    }

    fn create_map(&self, _container_id: &str, options: &Value) -> Result<ObjectId, SdkError> {
        if let Some(message) = self.create_map_error.lock().unwrap().clone() {
            return Err(SdkError::Native(message));
        }
        Ok(self.allocate(FakeObjectKind::Map, options))
    }

    fn create_overlay(
        &self,
        map: ObjectId,
        kind: OverlayKind,
        options: &Value,
    ) -> Result<ObjectId, SdkError> {
        if !self.objects.lock().unwrap().contains_key(&map) {
            return Err(SdkError::UnknownObject(map));
        }
        Ok(self.allocate(FakeObjectKind::Overlay(kind), options))
    }

    fn call(&self, target: ObjectId, method: &str, args: &[Value]) -> Result<Value, SdkError> {
        if !self.objects.lock().unwrap().contains_key(&target) {
            return Err(SdkError::UnknownObject(target));
        }
        self.calls
            .lock()
            .unwrap()
            .push((target, method.to_string(), args.to_vec()));
        Ok(Value::Null)
    }

    fn listen(&self, target: ObjectId, event: &str, handler: EventHandler) -> Result<(), SdkError> {
        if !self.objects.lock().unwrap().contains_key(&target) {
            return Err(SdkError::UnknownObject(target));
        }
        self.listeners
            .lock()
            .unwrap()
            .push((target, event.to_string(), Arc::clone(&handler)));
        if self.auto_events.lock().unwrap().contains(event) {
            handler(json!({}));
        }
        Ok(())
    }

    fn detach(&self, overlay: ObjectId) {
        if let Some(object) = self.objects.lock().unwrap().get_mut(&overlay) {
            object.attached = false;
        }
    }

    fn release(&self, object: ObjectId) {
        self.objects.lock().unwrap().remove(&object);
        self.listeners.lock().unwrap().retain(|(id, _, _)| *id != object);
    }

    fn geocode(&self, _query: &str) -> BoxFuture<'static, Result<Value, SdkError>> {
        future::ready(Ok(self.geocode_response.lock().unwrap().clone())).boxed()
    }
}

pub fn location(id: &str, lat: f64, lng: f64) -> Location {
    Location {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        coordinates: Coordinate::new(lat, lng),
        category: Category::Nature,
        qr_code: None,
        stamp_id: None,
        media: vec![],
        estimated_time: None,
        difficulty: None,
    }
}

pub fn sample_markers() -> Vec<Marker> {
    vec![
        Marker::from_location(location("yeongildae", 36.0563, 129.3781), MarkerType::Start),
        Marker::from_location(location("spacewalk", 36.0650, 129.3895), MarkerType::Waypoint),
        Marker::from_location(location("canal", 36.0404, 129.3640), MarkerType::End),
    ]
}

pub fn sample_route() -> Route {
    Route::new(
        "seaside",
        "해변 산책",
        sample_markers().iter().map(|m| m.position).collect(),
    )
}
