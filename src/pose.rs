//! Pose persistence endpoint.
//!
//! A single create-record HTTP operation: `POST /save-pose` appends a named 3D coordinate to the
//! pose collection. Wholly independent of the capture pipeline.

use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Port the server listens on unless `HANDWAVE_POSE_PORT` overrides it.
pub const DEFAULT_PORT: u16 = 3000;

/// A named 3D coordinate. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The pose collection. One table, identity key only.
pub struct PoseStore {
    conn: Mutex<Connection>,
}

impl PoseStore {
    /// Opens (and creates if needed) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a store that lives only as long as the process. Used by tests.
    pub fn in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS poses (
                id INTEGER PRIMARY KEY,
                name TEXT,
                x REAL,
                y REAL,
                z REAL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // A poisoned mutex must not take the endpoint down with it; every statement is
    // self-contained, so the connection stays usable.
    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends a record verbatim. The write is all-or-nothing.
    pub fn insert(&self, pose: &PoseRecord) -> anyhow::Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO poses (name, x, y, z) VALUES (?1, ?2, ?3, ?4)",
            params![pose.name, pose.x, pose.y, pose.z],
        )?;
        Ok(())
    }

    pub fn count(&self) -> anyhow::Result<u64> {
        let conn = self.conn();
        let count = conn.query_row("SELECT COUNT(*) FROM poses", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All records, in insertion order.
    pub fn fetch_all(&self) -> anyhow::Result<Vec<PoseRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT name, x, y, z FROM poses ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(PoseRecord {
                name: row.get(0)?,
                x: row.get(1)?,
                y: row.get(2)?,
                z: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

/// Builds the HTTP surface around a store.
pub fn router(store: Arc<PoseStore>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/save-pose", post(save_pose))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

async fn index() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\n<html>\n<head><title>Pose capture</title></head>\n<body>\n\
         <h1>Pose capture</h1>\n<p>POST /save-pose to store a named 3D coordinate.</p>\n\
         </body>\n</html>\n",
    )
}

async fn save_pose(
    State(store): State<Arc<PoseStore>>,
    Json(pose): Json<PoseRecord>,
) -> (StatusCode, Json<serde_json::Value>) {
    match store.insert(&pose) {
        Ok(()) => {
            log::info!("saved pose '{}'", pose.name);
            (StatusCode::OK, Json(json!({ "message": "Success!" })))
        }
        Err(e) => {
            log::error!("failed to save pose: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to save" })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(name: &str, x: f64, y: f64, z: f64) -> PoseRecord {
        PoseRecord {
            name: name.to_string(),
            x,
            y,
            z,
        }
    }

    #[test]
    fn insert_and_fetch_roundtrip() {
        let store = PoseStore::in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);

        store.insert(&pose("rest", 0.0, 0.0, 0.0)).unwrap();
        store.insert(&pose("wave", 0.25, -1.5, 3.0)).unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(
            store.fetch_all().unwrap(),
            vec![pose("rest", 0.0, 0.0, 0.0), pose("wave", 0.25, -1.5, 3.0)]
        );
    }

    #[test]
    fn store_survives_poisoned_lock() {
        let store = std::sync::Arc::new(PoseStore::in_memory().unwrap());

        // Poison the connection mutex by panicking while holding it.
        let poisoner = store.clone();
        std::thread::spawn(move || {
            let _guard = poisoner.conn.lock().unwrap();
            panic!("holder panics");
        })
        .join()
        .unwrap_err();
        assert!(store.conn.is_poisoned());

        store.insert(&pose("wave", 1.0, 2.0, 3.0)).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.fetch_all().unwrap(), vec![pose("wave", 1.0, 2.0, 3.0)]);
    }

    #[test]
    fn duplicate_names_are_allowed() {
        let store = PoseStore::in_memory().unwrap();
        store.insert(&pose("wave", 1.0, 2.0, 3.0)).unwrap();
        store.insert(&pose("wave", 1.0, 2.0, 3.0)).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }
}
