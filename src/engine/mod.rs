mod batch;
mod conflict;
mod error;
mod single;

pub use batch::{BatchOutcome, RejectReason, RejectedRequest, RoomRequest};
pub use error::EngineError;

use std::sync::Arc;

use crate::repo::{BookingRepository, Directory};

/// The allocation engine. Owns no state of its own — everything goes
/// through the directory and repository seams, so any backend that
/// implements them can sit underneath.
pub struct Allocator<S> {
    store: Arc<S>,
}

impl<S> Allocator<S>
where
    S: Directory + BookingRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}
