//! Test doubles for the transport and the runtime.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::api::{ApiError, HttpRequest, HttpResponse, ImageUpload, Method, Transport};
use crate::cache::{CacheConfig, QueryCache};
use crate::runtime::Runtime;

pub use futures::executor::block_on;

pub const HORSE_JSON: &str = r#"{
    "id": 7,
    "name": "Kenny",
    "description": "Bay gelding",
    "reference_image_path": "horses/kenny.jpg",
    "created_at": "2025-05-30T10:00:00"
}"#;

pub const DAISY_JSON: &str = r#"{
    "id": 9,
    "name": "Daisy",
    "description": null,
    "reference_image_path": "/srv/app/uploads/horses/daisy.jpg",
    "created_at": "2025-05-31T10:00:00"
}"#;

pub const LOCATION_JSON: &str = r#"{"id": 3, "name": "North paddock", "description": "Gate camera"}"#;

pub const DETECTION_JSON: &str = r#"{
    "id": 101,
    "horse_id": 7,
    "location_id": 3,
    "image_path": "detections/101.jpg",
    "timestamp": "2025-06-01T08:30:00",
    "action": "grazing",
    "confidence": 0.82,
    "raw_vlm_response": null,
    "created_at": "2025-06-01T08:30:01",
    "horse_scores": [
        {"horse_id": 7, "horse_name": "Kenny", "probability": 0.82},
        {"horse_id": 9, "horse_name": "Daisy", "probability": 0.11}
    ]
}"#;

pub const ANALYZE_JSON: &str = r#"{
    "detection_id": 101,
    "horse_id": 7,
    "horse_name": "Kenny",
    "location_id": 3,
    "action": "grazing",
    "confidence": 0.82,
    "kept": true,
    "timestamp": "2025-06-01T08:30:00",
    "image_path": "detections/101.jpg",
    "raw_vlm_response": "{\"horse\": \"Kenny\"}",
    "horse_scores": [
        {"horse_id": 7, "horse_name": "Kenny", "probability": 0.82},
        {"horse_id": 9, "horse_name": "Daisy", "probability": 0.11}
    ]
}"#;

pub fn jpeg() -> ImageUpload {
    ImageUpload::new("capture.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0])
}

impl HttpResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            status_text: String::new(),
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::json(status, body)
    }

    pub fn no_content() -> Self {
        Self::json(204, "")
    }

    pub fn with_status_text(mut self, status_text: &str) -> Self {
        self.status_text = status_text.to_string();
        self
    }
}

type Reply = Result<HttpResponse, ApiError>;

/// Scripted [`Transport`]. Each route replays its queued replies in order and
/// keeps repeating the last one.
#[derive(Default)]
pub struct MockTransport {
    routes: RefCell<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: RefCell<Vec<HttpRequest>>,
    holds: RefCell<VecDeque<oneshot::Receiver<()>>>,
}

impl MockTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn reply(&self, method: Method, path: &str, response: HttpResponse) {
        self.push(method, path, Ok(response));
    }

    pub fn fail(&self, method: Method, path: &str, error: ApiError) {
        self.push(method, path, Err(error));
    }

    /// The next request sent is held until the returned sender fires.
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.borrow_mut().push_back(rx);
        tx
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.method == method && path_of(&request.url) == path)
            .count()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.routes
            .borrow_mut()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, request: &HttpRequest) -> Reply {
        let mut routes = self.routes.borrow_mut();
        let key = (request.method, path_of(&request.url).to_string());
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ApiError::Transport(format!(
                "no route for {} {}",
                request.method, request.url
            ))),
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, ApiError>> {
        let reply = self.next_reply(&request);
        let hold = self.holds.borrow_mut().pop_front();
        self.requests.borrow_mut().push(request);

        Box::pin(async move {
            if let Some(hold) = hold {
                let _ = hold.await;
            }
            reply
        })
    }
}

fn path_of(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |index| &rest[index..]),
        None => url,
    }
}

/// Single-threaded executor with a hand-driven clock.
pub struct TestRuntime {
    spawner: LocalSpawner,
    now: Cell<f64>,
}

impl TestRuntime {
    pub fn new(pool: &LocalPool) -> Rc<Self> {
        Rc::new(Self {
            spawner: pool.spawner(),
            now: Cell::new(1_000_000.0),
        })
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Runtime for TestRuntime {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawner
            .spawn_local(task)
            .expect("test executor is gone");
    }
}

pub fn test_cache(pool: &LocalPool) -> (QueryCache, Rc<TestRuntime>) {
    let runtime = TestRuntime::new(pool);
    let cache = QueryCache::new(runtime.clone(), CacheConfig::default());
    (cache, runtime)
}
