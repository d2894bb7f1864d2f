use std::collections::HashSet;

use crate::model::{Booking, NewBooking, SpaceId, Window};

/// First persisted booking whose window overlaps the candidate.
pub(crate) fn first_overlap<'a>(
    bookings: &'a [Booking],
    window: &Window,
) -> Option<&'a Booking> {
    bookings.iter().find(|b| b.window.overlaps(window))
}

/// Like `first_overlap`, restricted to bookings on the given space set.
pub(crate) fn scoped_overlap<'a>(
    bookings: &'a [Booking],
    space_ids: &HashSet<SpaceId>,
    window: &Window,
) -> Option<&'a Booking> {
    bookings
        .iter()
        .find(|b| space_ids.contains(&b.space_id) && b.window.overlaps(window))
}

/// First provisional (not yet persisted) record on the space set whose
/// window overlaps the candidate.
pub(crate) fn provisional_overlap<'a>(
    records: &'a [NewBooking],
    space_ids: &HashSet<SpaceId>,
    window: &Window,
) -> Option<&'a NewBooking> {
    records
        .iter()
        .find(|r| space_ids.contains(&r.space_id) && r.window.overlaps(window))
}
