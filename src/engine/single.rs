use tracing::debug;

use crate::model::{Booking, NewBooking, SpaceId, Window};
use crate::observability;
use crate::repo::{BookingRepository, Directory};

use super::{Allocator, EngineError, conflict};

impl<S> Allocator<S>
where
    S: Directory + BookingRepository,
{
    /// Book `window` on a specific space.
    ///
    /// Conflict scope is the whole owning room: the requested window is
    /// checked against every booking on every sibling space, the target
    /// included. Either exactly one booking is created, or an error is
    /// reported and nothing is persisted.
    pub async fn create_booking(
        &self,
        space_id: SpaceId,
        window: Window,
    ) -> Result<Booking, EngineError> {
        // Scope held across check + insert; released on every exit path.
        let _tx = self.store.begin().await?;

        let resolved = self
            .store
            .find_space_with_siblings(space_id)
            .await?
            .ok_or(EngineError::SpaceNotFound)?;

        let sibling_ids = resolved.sibling_ids();
        let existing = self.store.bookings_by_space_ids(&sibling_ids).await?;

        if let Some(hit) = conflict::first_overlap(&existing, &window) {
            debug!(
                space_id,
                room_id = resolved.room.id,
                conflicting = hit.id,
                "booking rejected: window taken in room"
            );
            metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(EngineError::Conflict);
        }

        let booking = self
            .store
            .insert_booking(NewBooking { space_id, window })
            .await?;
        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        debug!(booking_id = booking.id, space_id, "booking created");
        Ok(booking)
    }
}
