use crate::config::Config;
use crate::model::*;
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

const MIGRATIONS: &[(&str, &str)] = &[("001_schema.sql", include_str!("migrations/001_schema.sql"))];

const SEED_WORDS: &str = r#"
INSERT INTO word (term, definition, phonetic, audio_url)
VALUES
    ('application', 'A formal request to an authority for something.', '/ˌapləˈkāSH(ə)n/', 'https://example.com/application.mp3'),
    ('work', 'Activity involving mental or physical effort done in order to achieve a purpose or result.', '/wərk/', 'https://example.com/work.mp3'),
    ('employee', 'A person employed for wages or salary, especially at non-executive level.', '/əmˈploiē/', 'https://example.com/employee.mp3'),
    ('hours', 'A period of time equal to sixty minutes.', '/ˈou(ə)rz/', 'https://example.com/hours.mp3'),
    ('shift', 'One of two or more recurring periods in which different groups of workers do the same jobs in relay.', '/SHift/', 'https://example.com/shift.mp3'),
    ('matey', 'A familiar and sometimes hostile form of address, especially to a stranger.', '/ˈmādē/', 'https://example.com/matey.mp3')
"#;

const SEED_PASSAGES: &str = r#"
INSERT INTO passage (title, body_text, reading_level, audio_url)
VALUES
    ('Treasure Island Excerpt', 'Well, then, said he, this is the berth for me. Here you, matey, he cried to the man who trundled the barrow; bring up alongside and help up my chest. I''ll stay here a bit, he continued.', 2, 'https://example.com/treasure_island.mp3')
"#;

pub struct Database {
    db: LibsqlDatabase,
    conn: Connection,
    tx_lock: Mutex<()>,
    synced: bool,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Serialises multi-statement writes on the shared connection.
    pub async fn tx_guard(&self) -> MutexGuard<'_, ()> {
        self.tx_lock.lock().await
    }

    pub fn is_replica(turso_url: &Option<String>, turso_auth_token: &Option<String>) -> bool {
        turso_url.is_some() && turso_auth_token.is_some()
    }

    pub async fn sync(&self) -> Result<()> {
        if self.synced {
            self.db
                .sync()
                .await
                .map_err(|e| anyhow::anyhow!("sync failed: {}", e))?;
        }
        Ok(())
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(cfg.app.get_db());
        let turso_url = cfg.app.turso_url.clone();
        let turso_auth_token = cfg.app.turso_auth_token.clone();

        let db = match (&turso_url, &turso_auth_token) {
            (Some(url), Some(token)) => {
                tracing::info!("[db] running in synced database mode (offline writes)");
                let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                Builder::new_synced_database(&path, url.clone(), token.clone())
                    .sync_interval(sync_interval)
                    .build()
                    .await?
            }
            _ => Builder::new_local(&path).build().await?,
        };

        Self::from_libsql(db, Self::is_replica(&turso_url, &turso_auth_token)).await
    }

    /// Opens a plain local database; `":memory:"` gives a throwaway one.
    pub async fn open_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path).build().await?;
        Self::from_libsql(db, false).await
    }

    async fn from_libsql(db: LibsqlDatabase, synced: bool) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in crate::adventure::migrations() {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database {
            db,
            conn,
            tx_lock: Mutex::new(()),
            synced,
        })
    }

    async fn count(&self, table: &str) -> Result<i64> {
        let mut rows = self.conn.query(&format!("SELECT COUNT(*) FROM {table}"), ()).await?;
        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(0),
        }
    }

    /// Loads the demo vocabulary, the demo user, a `new` progress row per word for
    /// that user and the sample passage. Each table is only seeded while empty.
    pub async fn seed_data(&self, demo_user_id: i64) -> Result<()> {
        let _guard = self.tx_lock.lock().await;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        match self.seed_data_internal(demo_user_id).await {
            Ok(_) => {
                self.conn.execute("COMMIT", ()).await?;
                Ok(())
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                Err(e)
            }
        }
    }

    async fn seed_data_internal(&self, demo_user_id: i64) -> Result<()> {
        if self.count("word").await? == 0 {
            tracing::info!("seeding words");
            self.conn.execute(SEED_WORDS, ()).await?;
        }

        if self.count("user").await? == 0 {
            tracing::info!(user_id = demo_user_id, "seeding demo user");
            self.conn
                .execute(
                    "INSERT INTO user (user_id, email, display_name) VALUES (?, 'demo@example.com', 'Demo User')",
                    libsql::params![demo_user_id],
                )
                .await?;
        }

        if self.count("user_word_progress").await? == 0 {
            tracing::info!("seeding word progress");
            self.conn
                .execute(
                    r#"
                    INSERT INTO user_word_progress (user_id, word_id, status, times_seen, last_seen_at)
                    SELECT ?, word_id, 'new', 0, NULL FROM word
                    "#,
                    libsql::params![demo_user_id],
                )
                .await?;
        }

        if self.count("passage").await? == 0 {
            tracing::info!("seeding passages");
            self.conn.execute(SEED_PASSAGES, ()).await?;
        }

        Ok(())
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let query = "SELECT user_id, email, display_name, created_at FROM user WHERE user_id = ?";
        let mut rows = self.conn.query(query, libsql::params![user_id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Inserts a user. Returns `None` when the email (case-insensitive) is already taken.
    pub async fn create_user(&self, input: &CreateUser) -> Result<Option<User>> {
        let query = r#"
            INSERT INTO user (email, display_name)
            VALUES (?, ?)
            ON CONFLICT(email) DO NOTHING
            RETURNING user_id, email, display_name, created_at
        "#;

        let _guard = self.tx_guard().await;
        let mut rows = self
            .conn
            .query(query, libsql::params![input.email.trim(), input.display_name.trim()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    fn row_to_user(row: &libsql::Row) -> Result<User> {
        let created_at: String = row.get(3)?;
        Ok(User {
            user_id: row.get(0)?,
            email: row.get(1)?,
            display_name: row.get(2)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}
