//! Black-box tests: spawn the HTTP binding on an ephemeral port and drive
//! both booking operations through a real client.

use std::sync::Arc;

use serde_json::{Value, json};

use bookd::engine::Allocator;
use bookd::http::{self, AppState};
use bookd::memory::MemoryStore;
use bookd::model::{NewBooking, Timestamp, Window};
use bookd::repo::BookingRepository;

async fn spawn_server(store: Arc<MemoryStore>) -> String {
    let state = AppState {
        allocator: Arc::new(Allocator::new(store)),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, http::router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn win(start: &str, end: &str) -> Window {
    Window::new(
        Timestamp::parse(start).unwrap(),
        Timestamp::parse(end).unwrap(),
    )
}

async fn post(base: &str, path: &str, body: &Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}

// ── Single booking ───────────────────────────────────────────────

#[tokio::test]
async fn can_create_a_booking() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room121");
    let space = store.add_space(room.id, "Space 12").unwrap();
    let base = spawn_server(store.clone()).await;

    let (status, body) = post(
        &base,
        "/api/bookings",
        &json!({
            "space_id": space.id,
            "start_time": "2024-07-25 10:00:00",
            "end_time": "2024-07-25 12:00:00",
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "id": 1,
            "space_id": space.id,
            "start_time": "2024-07-25 10:00:00",
            "end_time": "2024-07-25 12:00:00",
        })
    );
    assert_eq!(store.booking_count(), 1);
}

#[tokio::test]
async fn detects_conflict_with_existing_bookings() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room2");
    let space = store.add_space(room.id, "Space 2").unwrap();
    store
        .insert_booking(NewBooking {
            space_id: space.id,
            window: win("2024-07-25 09:00:00", "2024-07-25 11:00:00"),
        })
        .await
        .unwrap();
    let base = spawn_server(store.clone()).await;

    let (status, body) = post(
        &base,
        "/api/bookings",
        &json!({
            "space_id": space.id,
            "start_time": "2024-07-25 10:00:00",
            "end_time": "2024-07-25 12:00:00",
        }),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(
        body,
        json!({ "message": "The selected time slot is already booked." })
    );
    assert_eq!(store.booking_count(), 1);
}

#[tokio::test]
async fn conflict_applies_across_sibling_spaces() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room1");
    let s1 = store.add_space(room.id, "Space 1").unwrap();
    let s2 = store.add_space(room.id, "Space 2").unwrap();
    store
        .insert_booking(NewBooking {
            space_id: s1.id,
            window: win("2024-07-25 10:00:00", "2024-07-25 12:00:00"),
        })
        .await
        .unwrap();
    let base = spawn_server(store.clone()).await;

    let (status, body) = post(
        &base,
        "/api/bookings",
        &json!({
            "space_id": s2.id,
            "start_time": "2024-07-25 11:00:00",
            "end_time": "2024-07-25 13:00:00",
        }),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(
        body,
        json!({ "message": "The selected time slot is already booked." })
    );
}

#[tokio::test]
async fn back_to_back_booking_is_accepted() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room1");
    let space = store.add_space(room.id, "Space 1").unwrap();
    store
        .insert_booking(NewBooking {
            space_id: space.id,
            window: win("2024-07-25 10:00:00", "2024-07-25 12:00:00"),
        })
        .await
        .unwrap();
    let base = spawn_server(store.clone()).await;

    let (status, body) = post(
        &base,
        "/api/bookings",
        &json!({
            "space_id": space.id,
            "start_time": "2024-07-25 12:00:00",
            "end_time": "2024-07-25 13:00:00",
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["start_time"], json!("2024-07-25 12:00:00"));
    assert_eq!(store.booking_count(), 2);
}

#[tokio::test]
async fn returns_error_if_space_not_found() {
    let store = Arc::new(MemoryStore::new());
    let base = spawn_server(store).await;

    let (status, body) = post(
        &base,
        "/api/bookings",
        &json!({
            "space_id": 123456,
            "start_time": "2024-07-25 10:00:00",
            "end_time": "2024-07-25 12:00:00",
        }),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(body, json!({ "error": "Space not found" }));
}

#[tokio::test]
async fn returns_errors_for_invalid_data() {
    let store = Arc::new(MemoryStore::new());
    let base = spawn_server(store).await;

    let (status, body) = post(
        &base,
        "/api/bookings",
        &json!({
            "space_id": "",
            "start_time": "abc",
            "end_time": "test",
        }),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(
        body,
        json!({
            "errors": {
                "space_id": ["The space_id field is required."],
                "start_time": [
                    "The start_time field must match the format Y-m-d H:i:s.",
                    "The start_time field must be a date before end_time.",
                ],
                "end_time": [
                    "The end_time field must match the format Y-m-d H:i:s.",
                    "The end_time field must be a date after start_time.",
                ],
            }
        })
    );
}

// ── Multiple bookings ────────────────────────────────────────────

#[tokio::test]
async fn store_multiple_bookings_success() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room1");
    let space = store.add_space(room.id, "Space 1").unwrap();
    let base = spawn_server(store.clone()).await;

    let (status, body) = post(
        &base,
        "/api/bookings/multiple",
        &json!([{
            "room_id": room.id,
            "start_time": "2024-07-25 09:00:00",
            "end_time": "2024-07-26 12:00:00",
        }]),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "message": "Bookings created successfully.",
            "error": [],
            "data": [{
                "space_id": space.id,
                "start_time": "2024-07-25 09:00:00",
                "end_time": "2024-07-26 12:00:00",
            }],
        })
    );
    assert_eq!(store.booking_count(), 1);
}

#[tokio::test]
async fn store_multiple_bookings_with_time_conflict() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room1");
    let space = store.add_space(room.id, "Space 1").unwrap();
    store
        .insert_booking(NewBooking {
            space_id: space.id,
            window: win("2024-07-26 09:00:00", "2024-07-27 12:00:00"),
        })
        .await
        .unwrap();
    let base = spawn_server(store.clone()).await;

    let (status, body) = post(
        &base,
        "/api/bookings/multiple",
        &json!([
            {
                "room_id": room.id,
                "start_time": "2024-07-26 10:00:00",
                "end_time": "2024-07-27 11:00:00",
            },
            {
                "room_id": room.id,
                "start_time": "2024-07-22 09:00:00",
                "end_time": "2024-07-22 12:00:00",
            },
        ]),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "message": "Bookings created successfully.",
            "error": [{
                "booking": {
                    "room_id": room.id,
                    "start_time": "2024-07-26 10:00:00",
                    "end_time": "2024-07-27 11:00:00",
                },
                "message": "The selected time slot is already booked.",
            }],
            "data": [{
                "space_id": space.id,
                "start_time": "2024-07-22 09:00:00",
                "end_time": "2024-07-22 12:00:00",
            }],
        })
    );
    assert_eq!(store.booking_count(), 2);
}

#[tokio::test]
async fn store_multiple_bookings_no_available_space() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room1");
    let base = spawn_server(store.clone()).await;

    let (status, body) = post(
        &base,
        "/api/bookings/multiple",
        &json!([{
            "room_id": room.id,
            "start_time": "2024-07-22 09:00:00",
            "end_time": "2024-07-22 12:00:00",
        }]),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "message": "Bookings created successfully.",
            "error": [{
                "booking": {
                    "room_id": room.id,
                    "start_time": "2024-07-22 09:00:00",
                    "end_time": "2024-07-22 12:00:00",
                },
                "error": "No available spaces in the room.",
            }],
            "data": [],
        })
    );
    assert_eq!(store.booking_count(), 0);
}

#[tokio::test]
async fn store_multiple_bookings_unknown_room() {
    let store = Arc::new(MemoryStore::new());
    let base = spawn_server(store).await;

    let (status, body) = post(
        &base,
        "/api/bookings/multiple",
        &json!([{
            "room_id": 99,
            "start_time": "2024-07-22 09:00:00",
            "end_time": "2024-07-22 12:00:00",
        }]),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["error"][0]["error"], json!("Room not found"));
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn store_multiple_bookings_invalid_data() {
    let store = Arc::new(MemoryStore::new());
    let base = spawn_server(store).await;

    let (status, body) = post(
        &base,
        "/api/bookings/multiple",
        &json!([{
            "room_id": "",
            "start_time": "bbb",
            "end_time": "ddd",
        }]),
    )
    .await;

    assert_eq!(status, 422);
    assert_eq!(
        body,
        json!({
            "errors": {
                "0.room_id": ["The 0.room_id field is required."],
                "0.start_time": [
                    "The 0.start_time field must match the format Y-m-d H:i:s.",
                    "The 0.start_time field must be a date before 0.end_time.",
                ],
                "0.end_time": [
                    "The 0.end_time field must match the format Y-m-d H:i:s.",
                    "The 0.end_time field must be a date after 0.start_time.",
                ],
            }
        })
    );
}

#[tokio::test]
async fn batch_conflicts_within_the_same_call() {
    let store = Arc::new(MemoryStore::new());
    let room = store.add_room("Room1");
    store.add_space(room.id, "Space 1").unwrap();
    store.add_space(room.id, "Space 2").unwrap();
    let base = spawn_server(store.clone()).await;

    // Neither request is persisted when the call starts; the second must
    // still lose to the first.
    let (status, body) = post(
        &base,
        "/api/bookings/multiple",
        &json!([
            {
                "room_id": room.id,
                "start_time": "2024-07-25 10:00:00",
                "end_time": "2024-07-25 12:00:00",
            },
            {
                "room_id": room.id,
                "start_time": "2024-07-25 11:00:00",
                "end_time": "2024-07-25 13:00:00",
            },
        ]),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["error"][0]["message"],
        json!("The selected time slot is already booked.")
    );
    assert_eq!(store.booking_count(), 1);
}
