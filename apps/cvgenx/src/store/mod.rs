//! Local persistence: the configuration record, generation history, saved
//! profiles and uploaded reference resumes.
//!
//! `Store` is a cheap, cloneable handle around the SQLite pool. It is
//! constructed once at startup and passed to every command and handler.

mod config;
mod generations;
mod profiles;
mod resumes;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::create_pool;

pub const DEFAULT_HISTORY_LIMIT: i64 = 25;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(database_url: &str, reset: bool) -> Result<Self> {
        Ok(Self::new(create_pool(database_url, reset).await?))
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::open("sqlite::memory:", false)
            .await
            .expect("in-memory database")
    }
}
