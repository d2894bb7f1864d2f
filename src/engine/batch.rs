use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Booking, NewBooking, RoomId, RoomWithSpaces, SpaceId, Window};
use crate::observability;
use crate::repo::{BookingRepository, Directory};

use super::{Allocator, EngineError, conflict};

/// One room-scoped request in a batch call. The caller does not pick a
/// space; the allocator does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRequest {
    pub room_id: RoomId,
    pub window: Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    RoomNotFound,
    Conflict,
    NoCapacity,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::RoomNotFound => "Room not found",
            RejectReason::Conflict => "The selected time slot is already booked.",
            RejectReason::NoCapacity => "No available spaces in the room.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRequest {
    pub request: RoomRequest,
    pub reason: RejectReason,
}

/// Partitioned batch result. Both collections preserve the submission
/// order of the requests they came from.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<Booking>,
    pub rejected: Vec<RejectedRequest>,
}

impl<S> Allocator<S>
where
    S: Directory + BookingRepository,
{
    /// Process an ordered sequence of room-scoped requests.
    ///
    /// Requests are classified strictly in submission order; acceptances
    /// earlier in the call are visible to conflict checks for later
    /// requests, even though nothing is persisted until the single bulk
    /// write at the end. A per-request rejection never aborts the batch —
    /// only a storage failure does, and then nothing has been persisted.
    pub async fn create_bookings(
        &self,
        requests: Vec<RoomRequest>,
    ) -> Result<BatchOutcome, EngineError> {
        let mut outcome = BatchOutcome::default();
        if requests.is_empty() {
            return Ok(outcome);
        }

        let _tx = self.store.begin().await?;

        // Resolve each referenced room exactly once.
        let mut rooms: HashMap<RoomId, Option<RoomWithSpaces>> = HashMap::new();
        for request in &requests {
            if !rooms.contains_key(&request.room_id) {
                let resolved = self.store.find_room_with_spaces(request.room_id).await?;
                rooms.insert(request.room_id, resolved);
            }
        }

        // Baseline conflict set: one bulk fetch covering every space of
        // every referenced room.
        let mut all_space_ids: Vec<SpaceId> = rooms
            .values()
            .flatten()
            .flat_map(|room| room.space_ids())
            .collect();
        all_space_ids.sort_unstable();
        all_space_ids.dedup();
        let baseline = self.store.bookings_by_space_ids(&all_space_ids).await?;

        let mut provisional: Vec<NewBooking> = Vec::new();
        for request in requests {
            let Some(room) = rooms.get(&request.room_id).and_then(|r| r.as_ref()) else {
                outcome.rejected.push(RejectedRequest {
                    request,
                    reason: RejectReason::RoomNotFound,
                });
                continue;
            };

            // Room-wide: any overlap on any sibling space blocks the
            // request, whether persisted or accepted earlier in this batch.
            let sibling_ids: HashSet<SpaceId> = room.spaces.iter().map(|s| s.id).collect();
            if conflict::scoped_overlap(&baseline, &sibling_ids, &request.window).is_some()
                || conflict::provisional_overlap(&provisional, &sibling_ids, &request.window)
                    .is_some()
            {
                outcome.rejected.push(RejectedRequest {
                    request,
                    reason: RejectReason::Conflict,
                });
                continue;
            }

            // First space by existence; step above already cleared the
            // whole room, so no per-space recheck.
            let Some(space) = room.spaces.first() else {
                outcome.rejected.push(RejectedRequest {
                    request,
                    reason: RejectReason::NoCapacity,
                });
                continue;
            };

            provisional.push(NewBooking {
                space_id: space.id,
                window: request.window,
            });
        }

        // All requests classified, nothing persisted yet — the one bulk
        // write below is the only mutation of the whole call.
        outcome.created = self.store.insert_bookings_bulk(provisional).await?;

        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL)
            .increment(outcome.created.len() as u64);
        metrics::counter!(observability::BATCH_ITEMS_REJECTED_TOTAL)
            .increment(outcome.rejected.len() as u64);
        debug!(
            created = outcome.created.len(),
            rejected = outcome.rejected.len(),
            "batch processed"
        );
        Ok(outcome)
    }
}
