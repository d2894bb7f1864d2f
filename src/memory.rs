use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::model::*;
use crate::repo::{BookingRepository, Directory, StoreError, TxScope};

/// In-memory reference implementation of both repository seams.
///
/// Per-room space lists keep creation order — the batch allocator's
/// first-space selection observes it. The transaction scope is a process-wide
/// mutex, which is enough to serialize racing check-then-insert sequences
/// within one process.
pub struct MemoryStore {
    rooms: DashMap<RoomId, Room>,
    spaces: DashMap<SpaceId, Space>,
    room_spaces: DashMap<RoomId, Vec<SpaceId>>,
    bookings: DashMap<BookingId, Booking>,
    next_room_id: AtomicI64,
    next_space_id: AtomicI64,
    next_booking_id: AtomicI64,
    tx: Arc<Mutex<()>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            spaces: DashMap::new(),
            room_spaces: DashMap::new(),
            bookings: DashMap::new(),
            next_room_id: AtomicI64::new(1),
            next_space_id: AtomicI64::new(1),
            next_booking_id: AtomicI64::new(1),
            tx: Arc::new(Mutex::new(())),
        }
    }

    // ── Directory administration (external to the allocators) ────

    pub fn add_room(&self, name: impl Into<String>) -> Room {
        let room = Room {
            id: self.next_room_id.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        };
        self.rooms.insert(room.id, room.clone());
        self.room_spaces.entry(room.id).or_default();
        room
    }

    /// `None` if the room does not exist.
    pub fn add_space(&self, room_id: RoomId, name: impl Into<String>) -> Option<Space> {
        if !self.rooms.contains_key(&room_id) {
            return None;
        }
        let space = Space {
            id: self.next_space_id.fetch_add(1, Ordering::Relaxed),
            room_id,
            name: name.into(),
        };
        self.spaces.insert(space.id, space.clone());
        self.room_spaces.entry(room_id).or_default().push(space.id);
        Some(space)
    }

    pub fn load_seed(&self, seed: DirectorySeed) {
        for entry in seed.rooms {
            let room = self.add_room(entry.name);
            for space_name in entry.spaces {
                let _ = self.add_space(room.id, space_name);
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    fn spaces_of(&self, room_id: RoomId) -> Vec<Space> {
        let ids = self
            .room_spaces
            .get(&room_id)
            .map(|e| e.value().clone())
            .unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.spaces.get(id).map(|e| e.value().clone()))
            .collect()
    }

    fn assign_booking(&self, record: NewBooking) -> Booking {
        let booking = Booking {
            id: self.next_booking_id.fetch_add(1, Ordering::Relaxed),
            space_id: record.space_id,
            window: record.window,
        };
        self.bookings.insert(booking.id, booking.clone());
        booking
    }
}

/// Startup seed for rooms and spaces; bookings only ever come through the
/// allocators.
#[derive(Debug, Deserialize)]
pub struct DirectorySeed {
    pub rooms: Vec<RoomSeed>,
}

#[derive(Debug, Deserialize)]
pub struct RoomSeed {
    pub name: String,
    #[serde(default)]
    pub spaces: Vec<String>,
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_space_with_siblings(
        &self,
        space_id: SpaceId,
    ) -> Result<Option<SpaceWithSiblings>, StoreError> {
        let Some(space) = self.spaces.get(&space_id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        let room = self
            .rooms
            .get(&space.room_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| StoreError(format!("space {} references missing room", space.id)))?;
        let siblings = self.spaces_of(room.id);
        Ok(Some(SpaceWithSiblings {
            space,
            room,
            siblings,
        }))
    }

    async fn find_room_with_spaces(
        &self,
        room_id: RoomId,
    ) -> Result<Option<RoomWithSpaces>, StoreError> {
        let Some(room) = self.rooms.get(&room_id).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        let spaces = self.spaces_of(room.id);
        Ok(Some(RoomWithSpaces { room, spaces }))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn bookings_by_space_ids(
        &self,
        space_ids: &[SpaceId],
    ) -> Result<Vec<Booking>, StoreError> {
        let wanted: HashSet<SpaceId> = space_ids.iter().copied().collect();
        let mut found: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|e| wanted.contains(&e.value().space_id))
            .map(|e| e.value().clone())
            .collect();
        // ids are monotonic, so this is insertion order
        found.sort_by_key(|b| b.id);
        Ok(found)
    }

    async fn insert_booking(&self, record: NewBooking) -> Result<Booking, StoreError> {
        Ok(self.assign_booking(record))
    }

    async fn insert_bookings_bulk(
        &self,
        records: Vec<NewBooking>,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(records
            .into_iter()
            .map(|record| self.assign_booking(record))
            .collect())
    }

    async fn begin(&self) -> Result<TxScope, StoreError> {
        let guard = self.tx.clone().lock_owned().await;
        Ok(TxScope::new(guard))
    }
}
