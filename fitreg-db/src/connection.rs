use std::sync::Arc;

use log::debug;
use sqlx::{Connection as SqlxConnection, Executor, SqliteConnection};
use tokio::sync::{Mutex, MutexGuard};

use crate::Result;

const SETUP_QUERY: &str = "PRAGMA mmap_size = 30000000000;
PRAGMA cache_size = -1000;
PRAGMA page_size = 4096;
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;";

const SCHEMA_QUERY: &str = "CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    username TEXT NOT NULL,
    password_hash TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL REFERENCES accounts (id),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    weight_kg REAL NOT NULL,
    height_cm REAL NOT NULL,
    birth_date TEXT NOT NULL,
    sex INTEGER NOT NULL,
    activity_level TEXT NOT NULL,
    goal TEXT NOT NULL,
    exercise_frequency TEXT NOT NULL,
    body_mass_index REAL NOT NULL,
    lean_body_mass REAL NOT NULL,
    lean_body_mass_percentage REAL NOT NULL,
    photo TEXT,
    registered_at BIGINT NOT NULL
);
CREATE INDEX IF NOT EXISTS profiles_account_registered
    ON profiles (account_id, registered_at);
CREATE TABLE IF NOT EXISTS photos (
    key TEXT PRIMARY KEY,
    file_name TEXT,
    content_type TEXT NOT NULL,
    data BLOB NOT NULL
);";

#[derive(Clone)]
pub struct Connection {
    inner: Arc<Mutex<SqliteConnection>>,
}

impl Connection {
    pub async fn establish(database_url: &str) -> Result<Self> {
        let mut connection = SqliteConnection::connect(database_url).await?;

        connection.execute(SETUP_QUERY).await?;
        debug!("Ensuring database schema");
        connection.execute(SCHEMA_QUERY).await?;

        Ok(Self {
            inner: Arc::new(Mutex::new(connection)),
        })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::establish("sqlite::memory:").await
    }

    pub async fn lock(&self) -> MutexGuard<'_, SqliteConnection> {
        self.inner.lock().await
    }
}
