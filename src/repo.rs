use std::any::Any;
use std::fmt;

use async_trait::async_trait;

use crate::model::{Booking, NewBooking, RoomId, RoomWithSpaces, SpaceId, SpaceWithSiblings};

/// Storage failure surfaced by a repository implementation. Anything the
/// allocators cannot classify as a domain outcome ends up here and is
/// reported as a generic failure, never swallowed.
#[derive(Debug)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// RAII transaction scope. Holding the value keeps the scope open; dropping
/// it releases the scope on any exit path, early returns included.
///
/// The boxed payload is whatever the backend needs to keep alive for the
/// duration of the scope (a lock guard, a connection-bound transaction).
pub struct TxScope {
    _inner: Box<dyn Any + Send>,
}

impl TxScope {
    pub fn new(inner: impl Any + Send) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

impl fmt::Debug for TxScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TxScope")
    }
}

/// Read-only room/space membership lookups. Keeps the allocators free of
/// storage-shape knowledge: relation traversal happens behind these methods.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a space together with its owning room and the room's full
    /// member set (the target space included). `None` if the space does not
    /// exist.
    async fn find_space_with_siblings(
        &self,
        space_id: SpaceId,
    ) -> Result<Option<SpaceWithSiblings>, StoreError>;

    /// Resolve a room together with its member spaces, in creation order.
    /// `None` if the room does not exist.
    async fn find_room_with_spaces(
        &self,
        room_id: RoomId,
    ) -> Result<Option<RoomWithSpaces>, StoreError>;

    /// IDs of every space sharing a room with `space_id` (itself included).
    async fn sibling_space_ids(
        &self,
        space_id: SpaceId,
    ) -> Result<Option<Vec<SpaceId>>, StoreError> {
        Ok(self
            .find_space_with_siblings(space_id)
            .await?
            .map(|resolved| resolved.sibling_ids()))
    }
}

/// Booking persistence. Lookup is always by space-set; the conflict scope
/// (which spaces matter) is the caller's concern.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// All persisted bookings whose space reference is in `space_ids`.
    async fn bookings_by_space_ids(
        &self,
        space_ids: &[SpaceId],
    ) -> Result<Vec<Booking>, StoreError>;

    /// Persist one booking; the repository assigns the id.
    async fn insert_booking(&self, record: NewBooking) -> Result<Booking, StoreError>;

    /// Persist a batch in one operation, preserving input order in the
    /// returned records.
    async fn insert_bookings_bulk(
        &self,
        records: Vec<NewBooking>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Open a transaction scope around a check-then-insert sequence. The
    /// returned guard must be held until the sequence completes.
    async fn begin(&self) -> Result<TxScope, StoreError>;
}
