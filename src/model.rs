use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type RoomId = i64;
pub type SpaceId = i64;
pub type BookingId = i64;

/// Canonical timestamp format: `Y-m-d H:i:s`, fixed width.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A calendar instant in canonical `YYYY-MM-DD HH:MM:SS` form.
///
/// The fixed-width rendering makes lexicographic order and chronological
/// order agree, so the engine compares timestamps as plain strings and never
/// does timezone math. `parse` rejects non-canonical renderings (unpadded
/// fields would break the ordering equivalence).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

impl Timestamp {
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        let parsed = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map_err(|_| TimestampError)?;
        if parsed.format(TIMESTAMP_FORMAT).to_string() != s {
            return Err(TimestampError);
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TimestampError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampError;

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timestamp must match the format Y-m-d H:i:s")
    }
}

impl std::error::Error for TimestampError {}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Window {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        debug_assert!(start < end, "Window start must be before end");
        Self { start, end }
    }

    /// Strict inequality on both sides: windows that touch back-to-back
    /// do not overlap.
    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Administrative container grouping interchangeable spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
}

/// The bookable unit. Belongs to exactly one room; the room is the
/// authority for membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub room_id: RoomId,
    pub name: String,
}

/// A reserved window on one space. Created only through the allocators,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub space_id: SpaceId,
    pub window: Window,
}

/// A booking record before the repository has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub space_id: SpaceId,
    pub window: Window,
}

// ── Directory resolution results ─────────────────────────────────

/// A room together with its member spaces, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomWithSpaces {
    pub room: Room,
    pub spaces: Vec<Space>,
}

impl RoomWithSpaces {
    pub fn space_ids(&self) -> Vec<SpaceId> {
        self.spaces.iter().map(|s| s.id).collect()
    }
}

/// A space resolved together with its owning room and the room's full
/// member set. `siblings` includes the target space itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceWithSiblings {
    pub space: Space,
    pub room: Room,
    pub siblings: Vec<Space>,
}

impl SpaceWithSiblings {
    pub fn sibling_ids(&self) -> Vec<SpaceId> {
        self.siblings.iter().map(|s| s.id).collect()
    }
}
