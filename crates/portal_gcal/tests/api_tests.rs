
use axum::http::{Method, StatusCode};
use fixtures::*;
use portal_gcal::mock::CalendarCall;
use portal_gcal::InMemoryCalendarService;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn reserving_the_same_slot_twice_conflicts() {
    let app = test_app();
    let body = reservation_body("2025-06-10T09:00:00+02:00", "2025-06-10T10:00:00+02:00");

    let (status, first) = send(
        &app.router,
        request(Method::POST, "/booking/reserve", None, Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["success"], true);
    assert_eq!(first["eventId"], "evt-1");

    let (status, second) = send(
        &app.router,
        request(Method::POST, "/booking/reserve", None, Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["error"]["code"], 409);

    let bookings = app.bookings.all();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].google_event_id, "evt-1");
    assert_eq!(bookings[0].client_name, "Ana Ruiz");
    assert_eq!(app.calendar.events().len(), 1);
}

#[tokio::test]
async fn invalid_reservations_never_reach_the_calendar() {
    let app = test_app();

    let reversed = reservation_body("2025-06-10T10:00:00+02:00", "2025-06-10T09:00:00+02:00");
    let (status, body) = send(
        &app.router,
        request(Method::POST, "/booking/reserve", None, Some(reversed)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);

    let mut missing = reservation_body("2025-06-10T09:00:00+02:00", "2025-06-10T10:00:00+02:00");
    missing["email"] = json!("");
    let (status, _) = send(
        &app.router,
        request(Method::POST, "/booking/reserve", None, Some(missing)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let garbled = reservation_body("10 June, 9am", "2025-06-10T10:00:00+02:00");
    let (status, _) = send(
        &app.router,
        request(Method::POST, "/booking/reserve", None, Some(garbled)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.calendar.calls().is_empty());
}

#[tokio::test]
async fn off_grid_and_out_of_hours_requests_conflict() {
    let app = test_app();
    for (start, end) in [
        ("2025-06-10T09:30:00+02:00", "2025-06-10T10:30:00+02:00"),
        ("2025-06-10T07:00:00+02:00", "2025-06-10T08:00:00+02:00"),
    ] {
        let (status, _) = send(
            &app.router,
            request(Method::POST, "/booking/reserve", None, Some(reservation_body(start, end))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
    assert!(app
        .calendar
        .calls()
        .iter()
        .all(|call| matches!(call, CalendarCall::List { .. })));
}

#[tokio::test]
async fn idempotency_key_replays_the_first_result() {
    let app = test_app();
    let body = reservation_body("2025-06-10T11:00:00+02:00", "2025-06-10T12:00:00+02:00");
    let keyed = || {
        let mut req = request(Method::POST, "/booking/reserve", None, Some(body.clone()));
        req.headers_mut()
            .insert("idempotency-key", "attempt-42".parse().unwrap());
        req
    };

    let (status, first) = send(&app.router, keyed()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, replay) = send(&app.router, keyed()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first, replay);

    let creates = app
        .calendar
        .calls()
        .into_iter()
        .filter(|call| matches!(call, CalendarCall::Create(_)))
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn idempotency_key_reused_for_another_slot_conflicts() {
    let app = test_app();
    let keyed = |start: &str, end: &str| {
        let body = reservation_body(start, end);
        let mut req = request(Method::POST, "/booking/reserve", None, Some(body));
        req.headers_mut()
            .insert("idempotency-key", "attempt-7".parse().unwrap());
        req
    };

    let (status, _) = send(
        &app.router,
        keyed("2025-06-10T11:00:00+02:00", "2025-06-10T12:00:00+02:00"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app.router,
        keyed("2025-06-10T12:00:00+02:00", "2025-06-10T13:00:00+02:00"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], 409);
    assert_eq!(app.bookings.all().len(), 1);
}

#[tokio::test]
async fn concurrent_reservations_for_one_slot_book_it_once() {
    let app = test_app_with(
        InMemoryCalendarService::new().with_write_delay(Duration::from_millis(50)),
    );
    let body = reservation_body("2025-06-10T15:00:00+02:00", "2025-06-10T16:00:00+02:00");

    let (a, b) = tokio::join!(
        send(
            &app.router,
            request(Method::POST, "/booking/reserve", None, Some(body.clone()))
        ),
        send(
            &app.router,
            request(Method::POST, "/booking/reserve", None, Some(body.clone()))
        ),
    );
    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(app.calendar.events().len(), 1);
}

#[tokio::test]
async fn failed_booking_record_is_recovered_by_reconciliation() {
    let app = test_app();
    let (start, end) = slot_from_now(&app.settings, 7);
    app.bookings.fail_writes(true);

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/booking/reserve",
            None,
            Some(reservation_body(&start.to_rfc3339(), &end.to_rfc3339())),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], 500);
    assert_eq!(app.calendar.events().len(), 1);
    assert!(app.bookings.all().is_empty());

    app.bookings.fail_writes(false);
    let (status, _) = send(
        &app.router,
        request(Method::POST, "/booking/reconcile", Some(USER), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = send(
        &app.router,
        request(Method::POST, "/booking/reconcile", Some(ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report, json!({"scanned": 1, "created": 1}));

    let restored = app.bookings.all();
    assert_eq!(restored[0].client_email, "ana@example.com");
    assert_eq!(restored[0].description, "Thermostat offline");
    assert_eq!(restored[0].start_date_time, start);

    let (_, report) = send(
        &app.router,
        request(Method::POST, "/booking/reconcile", Some(ADMIN), None),
    )
    .await;
    assert_eq!(report, json!({"scanned": 1, "created": 0}));
}

#[tokio::test]
async fn availability_reports_the_day_grid() {
    let app = test_app();
    let at = |s: &str| chrono::DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&chrono::Utc);
    let (start, end) = (at("2025-06-10T07:00:00Z"), at("2025-06-10T08:00:00Z"));
    app.calendar.insert(timed_event("busy", start, end));

    let (status, body) = send(
        &app.router,
        request(Method::GET, "/booking/availability?date=2025-06-10", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2025-06-10");
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 9);
    assert_eq!(slots[0]["start"], "2025-06-10T07:00:00Z");
    assert_eq!(slots[0]["available"], false);
    assert_eq!(slots[1]["available"], true);

    for uri in ["/booking/availability", "/booking/availability?date=10-06-2025"] {
        let (status, _) = send(&app.router, request(Method::GET, uri, None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn events_listing_and_assignment() {
    let app = test_app();
    let (start, end) = slot_from_now(&app.settings, 3);
    app.calendar.insert(timed_event("evt-a", start, end));

    let (status, _) = send(&app.router, request(Method::GET, "/booking/events", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app.router,
        request(Method::GET, "/booking/events?filter=upcoming", Some(USER), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"][0]["googleEventId"], "evt-a");
    assert_eq!(body["events"][0]["clientName"], "Unnamed");

    let assignment = json!({"technicianId": "tech-1", "technicianName": "Luis"});
    let (status, _) = send(
        &app.router,
        request(Method::PUT, "/booking/events/evt-a", Some(USER), Some(assignment.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        request(Method::PUT, "/booking/events/evt-a", Some(ADMIN), Some(assignment.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["event"]["technicianName"], "Luis");

    let (status, _) = send(
        &app.router,
        request(Method::PUT, "/booking/events/evt-zzz", Some(ADMIN), Some(assignment)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        request(
            Method::PUT,
            "/booking/events/evt-a",
            Some(ADMIN),
            Some(json!({"technicianId": "tech-1"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
