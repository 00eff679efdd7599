//! Room persistence. Handlers only see the [`RoomStore`] capability; concurrency
//! control across saves is the store's business.

use async_trait::async_trait;
use chatrelay_core::{now_local_timestamp, Message, Room};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::{Row, SqlitePool};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn find_by_room_id(&self, room_id: &str) -> Result<Option<Room>, StoreError>;

    /// Upserts the room and its history. Messages already stored are kept as they are.
    async fn save(&self, room: Room) -> Result<Room, StoreError>;

    /// Inserts an empty room unless one with this id exists. `None` means it was
    /// already there; its history is left untouched.
    async fn create(&self, room_id: &str) -> Result<Option<Room>, StoreError>;

    /// Reachability check behind `/health`.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// SQLite-backed store; history lives in `messages`, ordered by `position`.
#[derive(Clone)]
pub struct SqliteRoomStore {
    pool: SqlitePool,
}

impl SqliteRoomStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for SqliteRoomStore {
    async fn find_by_room_id(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        let exists = sqlx::query("SELECT room_id FROM rooms WHERE room_id = ?")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query(
            "SELECT content, sender, timestamp FROM messages WHERE room_id = ? ORDER BY position ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        let mut room = Room::new(room_id);
        for row in rows {
            room.push(Message {
                content: row.try_get("content")?,
                sender: row.try_get("sender")?,
                timestamp: row.try_get("timestamp")?,
            });
        }
        Ok(Some(room))
    }

    async fn save(&self, room: Room) -> Result<Room, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO rooms (room_id, created_at) VALUES (?, ?) ON CONFLICT(room_id) DO NOTHING")
            .bind(&room.room_id)
            .bind(now_local_timestamp())
            .execute(&mut *tx)
            .await?;

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE room_id = ?")
            .bind(&room.room_id)
            .fetch_one(&mut *tx)
            .await?;

        // history is append-only: only positions past what is stored are new
        let first_new = usize::try_from(stored).unwrap_or(0).min(room.messages.len());
        for (position, message) in room.messages.iter().enumerate().skip(first_new) {
            sqlx::query(
                "INSERT OR IGNORE INTO messages (room_id, position, content, sender, timestamp) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&room.room_id)
            .bind(position as i64)
            .bind(&message.content)
            .bind(&message.sender)
            .bind(&message.timestamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(room)
    }

    async fn create(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        let inserted = sqlx::query("INSERT INTO rooms (room_id, created_at) VALUES (?, ?) ON CONFLICT(room_id) DO NOTHING")
            .bind(room_id)
            .bind(now_local_timestamp())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok((inserted == 1).then(|| Room::new(room_id)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pool.acquire().await?;
        Ok(())
    }
}

/// Process-local store. A save replaces the whole room, so concurrent appends
/// to one room resolve as last-save-wins.
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: DashMap<String, Room>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rooms<I, S>(room_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for id in room_ids {
            let room = Room::new(id);
            store.rooms.insert(room.room_id.clone(), room);
        }
        store
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn find_by_room_id(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.get(room_id).map(|room| room.clone()))
    }

    async fn save(&self, room: Room) -> Result<Room, StoreError> {
        self.rooms.insert(room.room_id.clone(), room.clone());
        Ok(room)
    }

    async fn create(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        match self.rooms.entry(room_id.to_string()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let room = Room::new(room_id);
                slot.insert(room.clone());
                Ok(Some(room))
            }
        }
    }
}
