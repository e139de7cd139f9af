use crate::config::Config;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::ops::Deref;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Ordered set of `CREATE ... IF NOT EXISTS` scripts, one per table.
///
/// Applying a schema is idempotent: existing tables and their rows are left untouched.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    tables: &'static [(&'static str, &'static str)],
}

const FINSIGHT_TABLES: &[(&str, &str)] = &[
    ("users", include_str!("schema/users.sql")),
    ("materials", include_str!("schema/materials.sql")),
    ("summaries", include_str!("schema/summaries.sql")),
    ("folders", include_str!("schema/folders.sql")),
    ("tags", include_str!("schema/tags.sql")),
    ("material_tags", include_str!("schema/material_tags.sql")),
    ("schedules", include_str!("schema/schedules.sql")),
];

impl Schema {
    pub fn finsight() -> Self {
        Schema {
            tables: FINSIGHT_TABLES,
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.iter().map(|(name, _)| *name)
    }

    async fn apply(&self, conn: &Connection) -> Result<()> {
        for (table, sql) in self.tables {
            tracing::debug!(table, "ensuring table exists");
            conn.execute_batch(sql)
                .await
                .map_err(|e| anyhow::anyhow!("failed to create table {table}: {e}"))?;
        }
        Ok(())
    }
}

/// Handle to the relational store.
///
/// Every request obtains its own [`Connection`] through [`Database::session`]; the
/// connection is released when the request drops it, whatever the outcome. Requests
/// that write go through [`Database::writer`], which serializes them in-process.
pub struct Database {
    db: LibsqlDatabase,
    tx_lock: Mutex<()>,
}

/// A session holding the write lock until it is dropped.
pub struct Writer<'a> {
    conn: Connection,
    _guard: MutexGuard<'a, ()>,
}

impl Deref for Writer<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Database {
    pub async fn new(cfg: &Config, schema: &Schema) -> Result<Self> {
        if cfg.app.is_remote() {
            tracing::info!("[db] connecting to remote database");
            let token = cfg.app.get_auth_token().unwrap_or_default().to_string();
            let db = Builder::new_remote(cfg.app.get_db().to_string(), token)
                .build()
                .await?;
            Self::init(db, schema, false).await
        } else {
            tracing::info!(path = cfg.app.get_db(), "[db] opening local database");
            let db = Builder::new_local(cfg.app.get_db()).build().await?;
            Self::init(db, schema, true).await
        }
    }

    pub async fn open_local(path: &Path, schema: &Schema) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::init(db, schema, true).await
    }

    async fn init(db: LibsqlDatabase, schema: &Schema, local: bool) -> Result<Self> {
        let conn = db.connect()?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.query("SELECT 1", ()).await?;

        if local {
            // readers keep going while a writer holds the lock
            let mut rows = conn.query("PRAGMA journal_mode = WAL", ()).await?;
            if let Some(row) = rows.next().await? {
                let mode: String = row.get(0)?;
                tracing::debug!(mode = %mode, "[db] journal mode");
            }
        }

        schema.apply(&conn).await?;
        tracing::info!(tables = schema.tables().count(), "[db] schema ready");

        Ok(Database {
            db,
            tx_lock: Mutex::new(()),
        })
    }

    pub fn session(&self) -> Result<Connection> {
        let conn = self.db.connect()?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// A session for requests that modify rows. Waits for any other writer to finish.
    pub async fn writer(&self) -> Result<Writer<'_>> {
        let guard = self.tx_lock.lock().await;
        Ok(Writer {
            conn: self.session()?,
            _guard: guard,
        })
    }
}
