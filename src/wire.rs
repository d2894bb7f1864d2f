//! Payload contracts for the transport layer: raw request shapes, the
//! per-field validation pass, and the response bodies. Protocol-agnostic —
//! the HTTP binding only converts these to responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::engine::{BatchOutcome, EngineError, RejectReason, RejectedRequest, RoomRequest};
use crate::model::{Booking, BookingId, RoomId, SpaceId, Timestamp, Window};

// ── Raw request shapes ───────────────────────────────────────────

/// Raw single-booking payload. Every field deserializes as an optional JSON
/// value so that presence, type, format and ordering failures all surface as
/// per-field messages instead of a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct RawBooking {
    #[serde(default)]
    pub space_id: Option<Value>,
    #[serde(default)]
    pub start_time: Option<Value>,
    #[serde(default)]
    pub end_time: Option<Value>,
}

/// Raw batch element.
#[derive(Debug, Default, Deserialize)]
pub struct RawRoomBooking {
    #[serde(default)]
    pub room_id: Option<Value>,
    #[serde(default)]
    pub start_time: Option<Value>,
    #[serde(default)]
    pub end_time: Option<Value>,
}

// ── Field errors ─────────────────────────────────────────────────

/// Accumulated validation messages, keyed by field (`<index>.<field>` for
/// batch elements). BTreeMap keeps the rendering deterministic.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    fn push(&mut self, field: &str, message: String) {
        self.0.entry(field.to_owned()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Validation pass ──────────────────────────────────────────────

/// `null` and the empty string count as absent, like a form field left blank.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn take_integer(errors: &mut FieldErrors, key: &str, value: Option<&Value>) -> Option<i64> {
    let Some(value) = value.filter(|v| !is_absent(v)) else {
        errors.push(key, format!("The {key} field is required."));
        return None;
    };
    match value.as_i64() {
        Some(n) => Some(n),
        None => {
            errors.push(key, format!("The {key} field must be an integer."));
            None
        }
    }
}

/// A timestamp field after the presence/format checks. `present` is false
/// only when the `required` rule already fired; such a field collects no
/// further messages.
struct TimeField {
    present: bool,
    parsed: Option<Timestamp>,
}

fn take_timestamp(errors: &mut FieldErrors, key: &str, value: Option<&Value>) -> TimeField {
    let Some(value) = value.filter(|v| !is_absent(v)) else {
        errors.push(key, format!("The {key} field is required."));
        return TimeField {
            present: false,
            parsed: None,
        };
    };
    let parsed = value.as_str().and_then(|s| Timestamp::parse(s).ok());
    if parsed.is_none() {
        errors.push(
            key,
            format!("The {key} field must match the format Y-m-d H:i:s."),
        );
    }
    TimeField {
        present: true,
        parsed,
    }
}

/// The before/after pair fires on both present fields unless `start < end`
/// is positively established.
fn check_ordering(
    errors: &mut FieldErrors,
    start_key: &str,
    end_key: &str,
    start: &TimeField,
    end: &TimeField,
) {
    if matches!((&start.parsed, &end.parsed), (Some(s), Some(e)) if s < e) {
        return;
    }
    if start.present {
        errors.push(
            start_key,
            format!("The {start_key} field must be a date before {end_key}."),
        );
    }
    if end.present {
        errors.push(
            end_key,
            format!("The {end_key} field must be a date after {start_key}."),
        );
    }
}

/// Validate a single-booking payload into an allocator-ready target.
pub fn validate_booking(raw: &RawBooking) -> Result<(SpaceId, Window), FieldErrors> {
    let mut errors = FieldErrors::default();
    let space_id = take_integer(&mut errors, "space_id", raw.space_id.as_ref());
    let start = take_timestamp(&mut errors, "start_time", raw.start_time.as_ref());
    let end = take_timestamp(&mut errors, "end_time", raw.end_time.as_ref());
    check_ordering(&mut errors, "start_time", "end_time", &start, &end);

    match (space_id, start.parsed, end.parsed) {
        (Some(space_id), Some(start), Some(end)) if errors.is_empty() => {
            Ok((space_id, Window::new(start, end)))
        }
        _ => Err(errors),
    }
}

/// Validate an ordered batch payload. All elements are checked; any failure
/// anywhere fails the whole call with `<index>.<field>`-keyed messages.
pub fn validate_room_bookings(items: &[Value]) -> Result<Vec<RoomRequest>, FieldErrors> {
    let mut errors = FieldErrors::default();
    let mut requests = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Ok(raw) = serde_json::from_value::<RawRoomBooking>(item.clone()) else {
            errors.push(
                &index.to_string(),
                format!("The {index} element must be an object."),
            );
            continue;
        };

        let room_key = format!("{index}.room_id");
        let start_key = format!("{index}.start_time");
        let end_key = format!("{index}.end_time");

        let room_id = take_integer(&mut errors, &room_key, raw.room_id.as_ref());
        let start = take_timestamp(&mut errors, &start_key, raw.start_time.as_ref());
        let end = take_timestamp(&mut errors, &end_key, raw.end_time.as_ref());
        check_ordering(&mut errors, &start_key, &end_key, &start, &end);

        if let (Some(room_id), Some(start), Some(end)) = (room_id, start.parsed, end.parsed)
            && start < end
        {
            requests.push(RoomRequest {
                room_id,
                window: Window::new(start, end),
            });
        }
    }

    if errors.is_empty() {
        Ok(requests)
    } else {
        Err(errors)
    }
}

// ── Response bodies ──────────────────────────────────────────────

/// `{errors: {field: [message, ...]}}`
#[derive(Debug, Serialize)]
pub struct ValidationBody {
    pub errors: FieldErrors,
}

/// Echo of a created booking on the single path.
#[derive(Debug, Serialize)]
pub struct BookingBody {
    pub id: BookingId,
    pub space_id: SpaceId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl From<Booking> for BookingBody {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            space_id: b.space_id,
            start_time: b.window.start,
            end_time: b.window.end,
        }
    }
}

/// One created record in the batch `data` collection.
#[derive(Debug, Serialize)]
pub struct CreatedSlot {
    pub space_id: SpaceId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl From<&Booking> for CreatedSlot {
    fn from(b: &Booking) -> Self {
        Self {
            space_id: b.space_id,
            start_time: b.window.start.clone(),
            end_time: b.window.end.clone(),
        }
    }
}

/// The rejected input, echoed back as it was understood.
#[derive(Debug, Serialize)]
pub struct EchoedRequest {
    pub room_id: RoomId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl From<&RoomRequest> for EchoedRequest {
    fn from(r: &RoomRequest) -> Self {
        Self {
            room_id: r.room_id,
            start_time: r.window.start.clone(),
            end_time: r.window.end.clone(),
        }
    }
}

/// One rejected batch item. Conflicts report under `message`; directory
/// failures (unknown room, empty room) under `error`.
#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub booking: EchoedRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<&RejectedRequest> for BatchFailure {
    fn from(r: &RejectedRequest) -> Self {
        let (error, message) = match r.reason {
            RejectReason::Conflict => (None, Some(r.reason.message())),
            RejectReason::RoomNotFound | RejectReason::NoCapacity => {
                (Some(r.reason.message()), None)
            }
        };
        Self {
            booking: EchoedRequest::from(&r.request),
            error,
            message,
        }
    }
}

/// Batch response: 200 even with per-item failures.
#[derive(Debug, Serialize)]
pub struct BatchBody {
    pub message: &'static str,
    pub error: Vec<BatchFailure>,
    pub data: Vec<CreatedSlot>,
}

impl From<&BatchOutcome> for BatchBody {
    fn from(outcome: &BatchOutcome) -> Self {
        Self {
            message: "Bookings created successfully.",
            error: outcome.rejected.iter().map(BatchFailure::from).collect(),
            data: outcome.created.iter().map(CreatedSlot::from).collect(),
        }
    }
}

/// Status code + body for a failed allocator call. Domain outcomes are 422;
/// anything unclassified is the generic 500.
pub fn failure_body(e: &EngineError) -> (u16, Value) {
    match e {
        EngineError::Conflict => (422, json!({ "message": e.to_string() })),
        EngineError::SpaceNotFound => (422, json!({ "error": e.to_string() })),
        EngineError::Store(msg) => (500, json!({ "error": msg })),
    }
}
