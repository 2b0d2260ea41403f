use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use hb_core::{
    domain::{Cursor, StatusId},
    errors::Error,
    ports::CursorStore,
    Result,
};

use crate::{storage, SqliteStore};

impl SqliteStore {
    fn read_cursor(&self) -> Result<Cursor> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row("SELECT last_id FROM cursor WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(storage)?;

        let last_id = raw
            .map(|s| {
                s.parse::<StatusId>()
                    .map_err(|e| Error::Storage(format!("corrupt cursor value '{s}': {e}")))
            })
            .transpose()?;
        Ok(Cursor { last_id })
    }

    fn write_cursor(&self, cursor: &Cursor) -> Result<()> {
        let conn = self.conn()?;
        match cursor.last_id {
            Some(id) => {
                let now = chrono::Utc::now().to_rfc3339();
                conn.execute(
                    "INSERT INTO cursor (id, last_id, updated_at) VALUES (1, ?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET last_id = excluded.last_id,
                                                   updated_at = excluded.updated_at",
                    params![id.to_string(), now],
                )
                .map_err(storage)?;
            }
            None => {
                conn.execute("DELETE FROM cursor", []).map_err(storage)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CursorStore for SqliteStore {
    async fn read(&self) -> Result<Cursor> {
        self.read_cursor()
    }

    async fn write(&self, cursor: &Cursor) -> Result<()> {
        self.write_cursor(cursor)?;
        tracing::debug!(last_id = ?cursor.last_id, "cursor saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_has_no_cursor() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.read().await.unwrap(), Cursor::default());
    }

    #[tokio::test]
    async fn write_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();

        store.write(&Cursor::at(StatusId(100))).await.unwrap();
        store.write(&Cursor::at(StatusId(18_446_744_073_709_551_000))).await.unwrap();

        assert_eq!(
            store.read().await.unwrap(),
            Cursor::at(StatusId(18_446_744_073_709_551_000))
        );
        let rows: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM cursor", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn writing_empty_cursor_clears_it() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write(&Cursor::at(StatusId(5))).await.unwrap();

        store.write(&Cursor::default()).await.unwrap();

        assert_eq!(store.read().await.unwrap().last_id, None);
    }

    #[tokio::test]
    async fn corrupt_value_is_a_storage_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO cursor (id, last_id, updated_at) VALUES (1, 'abc', 'now')",
                [],
            )
            .unwrap();

        assert!(matches!(store.read().await, Err(Error::Storage(_))));
    }
}
