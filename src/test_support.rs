//! In-process fake of the SWAPI endpoints used by the unit tests.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

// SQLite stand-ins for the MySQL tables; `edited` is TEXT because the Any
// driver cannot decode SQLite DATETIME columns.
pub const PEOPLE_DDL: &str = "CREATE TABLE people (
    name VARCHAR(45), height FLOAT, mass FLOAT, hair_color VARCHAR(45),
    skin_color VARCHAR(45), eye_color VARCHAR(45), birth_year VARCHAR(45),
    gender VARCHAR(45), homeworld VARCHAR(45), url VARCHAR(45), edited TEXT)";

pub const PLANETS_DDL: &str = "CREATE TABLE planets (
    name VARCHAR(45), rotation_period FLOAT, orbital_period FLOAT, diameter FLOAT,
    climate VARCHAR(45), gravity VARCHAR(45), terrain VARCHAR(45), surface_water FLOAT,
    population FLOAT, url VARCHAR(45), edited TEXT)";

#[derive(Default)]
struct Inner {
    base_url: String,
    collections: Vec<(String, u32)>,
    failures: HashMap<(String, u32), u16>,
    garbled: HashSet<(String, u32)>,
    countless: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

#[derive(Default)]
pub struct FakeSwapi {
    collections: Vec<(String, u32)>,
    failures: HashMap<(String, u32), u16>,
    garbled: HashSet<(String, u32)>,
    countless: HashSet<String>,
}

pub struct RunningSwapi {
    inner: Arc<Inner>,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeSwapi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, name: &str, count: u32) -> Self {
        self.collections.push((name.to_string(), count));
        self
    }

    pub fn fail_item(mut self, name: &str, index: u32, status: u16) -> Self {
        self.failures.insert((name.to_string(), index), status);
        self
    }

    pub fn garble_item(mut self, name: &str, index: u32) -> Self {
        self.garbled.insert((name.to_string(), index));
        self
    }

    /// Serve the collection's metadata without a `count` field.
    pub fn omit_count(mut self, name: &str) -> Self {
        self.countless.insert(name.to_string());
        self
    }

    pub async fn start(self) -> RunningSwapi {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let inner = Arc::new(Inner {
            base_url: format!("http://{addr}/api/"),
            collections: self.collections,
            failures: self.failures,
            garbled: self.garbled,
            countless: self.countless,
            requested: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(handle).with_state(inner.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        RunningSwapi {
            inner,
            _handle: handle,
        }
    }
}

impl RunningSwapi {
    pub fn base_url(&self) -> String {
        self.inner.base_url.clone()
    }

    /// Whether any request path ended with `suffix`.
    pub fn requested(&self, suffix: &str) -> bool {
        self.inner
            .requested
            .lock()
            .unwrap()
            .iter()
            .any(|p| p.ends_with(suffix))
    }
}

async fn handle(State(inner): State<Arc<Inner>>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    inner.requested.lock().unwrap().push(path.clone());

    let parts: Vec<&str> = path
        .trim_start_matches("/api")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    match parts.as_slice() {
        [] => {
            let mut root = serde_json::Map::new();
            for (name, _) in &inner.collections {
                root.insert(
                    name.clone(),
                    Value::String(format!("{}{}/", inner.base_url, name)),
                );
            }
            Json(Value::Object(root)).into_response()
        }
        [name] => match count_of(&inner, name) {
            Some(_) if inner.countless.contains(*name) => {
                Json(json!({ "next": null, "results": [] })).into_response()
            }
            Some(count) => Json(json!({ "count": count, "next": null, "results": [] })).into_response(),
            None => not_found(),
        },
        [name, idx] => {
            let (Some(count), Ok(i)) = (count_of(&inner, name), idx.parse::<u32>()) else {
                return not_found();
            };
            let key = (name.to_string(), i);
            if let Some(status) = inner.failures.get(&key) {
                let code = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return (code, "upstream failure").into_response();
            }
            if inner.garbled.contains(&key) {
                return (StatusCode::OK, "{\"name\": ").into_response();
            }
            // SWAPI has no person #17
            if i == 0 || i > count || (*name == "people" && i == 17) {
                return not_found();
            }
            Json(item(&inner.base_url, name, i)).into_response()
        }
        _ => not_found(),
    }
}

fn count_of(inner: &Inner, name: &str) -> Option<u32> {
    inner
        .collections
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, c)| *c)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found" }))).into_response()
}

fn item(base: &str, name: &str, i: u32) -> Value {
    let url = format!("{base}{name}/{i}/");
    match name {
        "people" => json!({
            "name": format!("people {i}"),
            "height": if i % 2 == 0 { "unknown".to_string() } else { format!("{}", 150 + i) },
            "mass": "1,5",
            "hair_color": "blond",
            "skin_color": "fair",
            "eye_color": "blue",
            "birth_year": "19BBY",
            "gender": "male",
            "homeworld": format!("{base}planets/1/"),
            "films": [format!("{base}films/1/")],
            "species": [],
            "vehicles": [],
            "starships": [],
            "created": "2014-12-09T13:50:51.644000Z",
            "edited": "2014-12-20T21:17:56.891000Z",
            "url": url,
        }),
        "planets" => json!({
            "name": format!("planets {i}"),
            "rotation_period": "unknown",
            "orbital_period": "304",
            "diameter": "10465",
            "climate": "arid",
            "gravity": "1 standard",
            "terrain": "desert",
            "surface_water": "1",
            "population": "1,000",
            "residents": [],
            "films": [],
            "created": "2014-12-09T13:50:49.641000Z",
            "edited": "2014-12-20T20:58:18.411000Z",
            "url": url,
        }),
        _ => json!({ "name": format!("{name} {i}"), "url": url }),
    }
}
