use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Thread-safe handle on the chat registry used by /broadcast.
///
/// The `chats` table is owned and populated externally (the bot only ever
/// reads it), but the migration is idempotent so a fresh deployment starts
/// with a valid empty table.
#[derive(Clone)]
pub struct ChatStore {
    conn: Arc<Mutex<Connection>>,
}

impl ChatStore {
    /// Open or create the SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // WAL so external writers don't block our reads
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        Self::run_migrations(&conn)?;

        info!("Chat store opened at: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS chats (
                chat_id INTEGER PRIMARY KEY
            );
            ",
        )
        .context("Failed to run chat store migrations")?;
        Ok(())
    }

    /// Shared connection handle, used by tests to seed the table.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// All chat ids known to the registry, in stable ascending order.
    pub async fn all_chat_ids(&self) -> Result<Vec<i64>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT chat_id FROM chats ORDER BY chat_id")
            .context("Failed to prepare chat query")?;

        let ids = stmt
            .query_map([], |row| row.get(0))
            .context("Failed to query chats")?
            .collect::<rusqlite::Result<Vec<i64>>>()
            .context("Failed to collect chat ids")?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_has_no_chats() {
        let store = ChatStore::open_in_memory().unwrap();
        assert!(store.all_chat_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn returns_all_seeded_ids_in_order() {
        let store = ChatStore::open_in_memory().unwrap();
        {
            let conn = store.connection();
            let conn = conn.lock().await;
            conn.execute("INSERT INTO chats (chat_id) VALUES (?1)", [300i64])
                .unwrap();
            conn.execute("INSERT INTO chats (chat_id) VALUES (?1)", [100i64])
                .unwrap();
            conn.execute("INSERT INTO chats (chat_id) VALUES (?1)", [200i64])
                .unwrap();
        }

        let ids = store.all_chat_ids().await.unwrap();
        assert_eq!(ids, vec![100, 200, 300]);
    }
}
