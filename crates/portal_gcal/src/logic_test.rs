#[cfg(test)]
mod tests {
    use crate::logic::{
        assign_technician, build_slots, compute_slots, select_events, AssignTechnicianRequest,
        BookingSettings, EventFilter,
    };
    use crate::mock::{CalendarCall, InMemoryCalendarService};
    use chrono::{DateTime, Duration, NaiveDate, Utc};
    use portal_common::error::PortalError;
    use portal_common::models::{BookingStatus, NewBooking};
    use portal_common::services::{CalendarEvent, EventTime, PROP_TECHNICIAN_ID};
    use portal_config::{GcalConfig, DEFAULT_CALENDAR_ID};
    use portal_db::{BookingRepository, InMemoryBookingRepository};

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("Failed to parse RFC3339 datetime")
            .with_timezone(&Utc)
    }

    fn timed(id: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.into(),
            start: Some(EventTime::At(at(start))),
            end: Some(EventTime::At(at(end))),
            ..Default::default()
        }
    }

    fn settings() -> BookingSettings {
        BookingSettings::from_config(&GcalConfig::default()).unwrap()
    }

    #[test]
    fn test_day_window_uses_configured_zone() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let (start, end) = settings().day_window(date).unwrap();
        // Madrid is UTC+2 in June
        assert_eq!(start, at("2025-06-10T07:00:00Z"));
        assert_eq!(end, at("2025-06-10T16:00:00Z"));

        let winter = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(settings().day_window(winter).unwrap().0, at("2025-01-15T08:00:00Z"));
    }

    #[test]
    fn test_invalid_settings_are_config_errors() {
        let reversed = GcalConfig {
            work_start_hour: 18,
            work_end_hour: 9,
            ..Default::default()
        };
        assert!(matches!(
            BookingSettings::from_config(&reversed),
            Err(PortalError::ConfigError(_))
        ));
        let zero = GcalConfig {
            slot_duration_minutes: 0,
            ..Default::default()
        };
        assert!(BookingSettings::from_config(&zero).is_err());
        let tz = GcalConfig {
            time_zone: "Mars/Olympus".into(),
            ..Default::default()
        };
        assert!(BookingSettings::from_config(&tz).is_err());
        assert_eq!(settings().calendar_id, DEFAULT_CALENDAR_ID);
    }

    #[test]
    fn test_empty_day_has_nine_free_hourly_slots() {
        let slots = build_slots(
            at("2025-06-10T09:00:00Z"),
            at("2025-06-10T18:00:00Z"),
            Duration::minutes(60),
            &[],
        );
        assert_eq!(slots.len(), 9);
        assert!(slots.iter().all(|s| s.available));
        assert_eq!(slots[0].start, at("2025-06-10T09:00:00Z"));
        assert_eq!(slots[8].end, at("2025-06-10T18:00:00Z"));
    }

    #[test]
    fn test_trailing_partial_slot_is_emitted() {
        let slots = build_slots(
            at("2025-06-10T09:00:00Z"),
            at("2025-06-10T10:00:00Z"),
            Duration::minutes(45),
            &[],
        );
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].start, at("2025-06-10T09:45:00Z"));
        assert_eq!(slots[1].end, at("2025-06-10T10:30:00Z"));
    }

    #[test]
    fn test_overlap_conditions() {
        let events = vec![
            // slot end inside event
            timed("a", "2025-06-10T09:30:00Z", "2025-06-10T10:30:00Z"),
            // slot fully containing event
            timed("b", "2025-06-10T12:15:00Z", "2025-06-10T12:45:00Z"),
            // event ending exactly at a slot start
            timed("c", "2025-06-10T13:00:00Z", "2025-06-10T14:00:00Z"),
        ];
        let slots = build_slots(
            at("2025-06-10T09:00:00Z"),
            at("2025-06-10T15:00:00Z"),
            Duration::minutes(60),
            &events,
        );
        let availability: Vec<bool> = slots.iter().map(|s| s.available).collect();
        // 09 10 11 12 13 14
        assert_eq!(availability, [false, false, true, false, false, true]);
    }

    #[test]
    fn test_zero_length_event_on_a_boundary_blocks_both_slots() {
        let events = vec![timed("z", "2025-06-10T10:00:00Z", "2025-06-10T10:00:00Z")];
        let slots = build_slots(
            at("2025-06-10T09:00:00Z"),
            at("2025-06-10T12:00:00Z"),
            Duration::minutes(60),
            &events,
        );
        let availability: Vec<bool> = slots.iter().map(|s| s.available).collect();
        assert_eq!(availability, [false, false, true]);
    }

    #[test]
    fn test_zero_length_event_inside_a_slot_blocks_that_slot() {
        let events = vec![timed("z", "2025-06-10T10:20:00Z", "2025-06-10T10:20:00Z")];
        let slots = build_slots(
            at("2025-06-10T09:00:00Z"),
            at("2025-06-10T12:00:00Z"),
            Duration::minutes(60),
            &events,
        );
        let availability: Vec<bool> = slots.iter().map(|s| s.available).collect();
        assert_eq!(availability, [true, false, true]);
    }

    #[test]
    fn test_day_window_at_the_end_of_the_calendar_is_an_error() {
        let late = BookingSettings::from_config(&GcalConfig {
            work_end_hour: 24,
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            late.day_window(NaiveDate::MAX),
            Err(PortalError::ValidationError(_))
        ));
    }

    #[test]
    fn test_all_day_events_do_not_block_slots() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let holiday = CalendarEvent {
            id: "holiday".into(),
            start: Some(EventTime::AllDay(date)),
            end: Some(EventTime::AllDay(date + Duration::days(1))),
            ..Default::default()
        };
        let slots = build_slots(
            at("2025-06-10T09:00:00Z"),
            at("2025-06-10T11:00:00Z"),
            Duration::minutes(60),
            &[holiday],
        );
        assert!(slots.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_compute_slots_queries_the_working_window() {
        let calendar = InMemoryCalendarService::new();
        calendar.insert(timed("busy", "2025-06-10T07:00:00Z", "2025-06-10T08:00:00Z"));
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        let slots = compute_slots(&calendar, &settings(), date).await.unwrap();
        assert_eq!(slots.len(), 9);
        assert!(!slots[0].available);
        assert!(slots[1].available);
        assert_eq!(
            calendar.calls(),
            vec![CalendarCall::List {
                start: at("2025-06-10T07:00:00Z"),
                end: at("2025-06-10T16:00:00Z"),
            }]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let calendar = InMemoryCalendarService::new();
        calendar.fail_with(Some("token expired"));
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let err = compute_slots(&calendar, &settings(), date).await.unwrap_err();
        assert!(matches!(err, PortalError::UpstreamFailure { .. }));
    }

    #[test]
    fn test_event_filters_order_and_window() {
        let now = at("2025-06-10T12:00:00Z");
        let events = vec![
            timed("past-1", "2025-06-01T09:00:00Z", "2025-06-01T10:00:00Z"),
            timed("future-2", "2025-06-20T09:00:00Z", "2025-06-20T10:00:00Z"),
            timed("past-2", "2025-06-05T09:00:00Z", "2025-06-05T10:00:00Z"),
            timed("future-1", "2025-06-11T09:00:00Z", "2025-06-11T10:00:00Z"),
        ];
        let ids = |filter| -> Vec<String> {
            select_events(events.clone(), filter, now)
                .into_iter()
                .map(|e| e.id)
                .collect()
        };
        assert_eq!(ids(EventFilter::Upcoming), ["future-1", "future-2"]);
        assert_eq!(ids(EventFilter::Past), ["past-2", "past-1"]);
        assert_eq!(
            ids(EventFilter::All),
            ["future-2", "future-1", "past-2", "past-1"]
        );

        assert_eq!(EventFilter::parse(None), EventFilter::Upcoming);
        assert_eq!(EventFilter::parse(Some("past")), EventFilter::Past);
        assert_eq!(EventFilter::parse(Some("whatever")), EventFilter::All);
        let (from, to) = EventFilter::Upcoming.window(now);
        assert_eq!((from, to - from), (now, Duration::days(365)));
    }

    #[test]
    fn test_listing_defaults() {
        let event = select_events(
            vec![timed("bare", "2025-07-01T09:00:00Z", "2025-07-01T10:00:00Z")],
            EventFilter::All,
            Utc::now(),
        )
        .remove(0);
        assert_eq!(event.summary, "Untitled");
        assert_eq!(event.status, "confirmed");
        assert_eq!(event.google_event_id, "bare");
        assert_eq!(event.technician_id, None);
    }

    #[tokio::test]
    async fn test_assignment_updates_event_and_booking() {
        let calendar = InMemoryCalendarService::new();
        calendar.insert(timed("evt-7", "2025-06-10T07:00:00Z", "2025-06-10T08:00:00Z"));
        let bookings = InMemoryBookingRepository::new();
        bookings
            .create(NewBooking {
                google_event_id: "evt-7".into(),
                client_name: "Ana".into(),
                client_email: "ana@example.com".into(),
                client_phone: "600".into(),
                description: String::new(),
                start_date_time: at("2025-06-10T07:00:00Z"),
                end_date_time: at("2025-06-10T08:00:00Z"),
                status: BookingStatus::Confirmed,
            })
            .await
            .unwrap();
        let now = at("2025-06-09T10:00:00Z");

        let event = assign_technician(
            &calendar,
            &bookings,
            &settings(),
            "evt-7",
            AssignTechnicianRequest {
                technician_id: "tech-1".into(),
                technician_name: "Luis".into(),
            },
            now,
        )
        .await
        .unwrap();
        assert_eq!(event.technician_name.as_deref(), Some("Luis"));
        assert_eq!(calendar.events()[0].private_properties[PROP_TECHNICIAN_ID], "tech-1");

        let booking = bookings.find_by_event_id("evt-7").await.unwrap().unwrap();
        assert_eq!(booking.technician_id.as_deref(), Some("tech-1"));
        assert_eq!(booking.assigned_at, Some(now));
    }

    #[tokio::test]
    async fn test_assignment_survives_booking_store_failure() {
        let calendar = InMemoryCalendarService::new();
        calendar.insert(timed("evt-8", "2025-06-10T07:00:00Z", "2025-06-10T08:00:00Z"));
        let bookings = InMemoryBookingRepository::new();
        bookings.fail_writes(true);

        let result = assign_technician(
            &calendar,
            &bookings,
            &settings(),
            "evt-8",
            AssignTechnicianRequest {
                technician_id: "tech-1".into(),
                technician_name: "Luis".into(),
            },
            Utc::now(),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_assignment_validation_and_unknown_event() {
        let calendar = InMemoryCalendarService::new();
        let bookings = InMemoryBookingRepository::new();

        let err = assign_technician(
            &calendar,
            &bookings,
            &settings(),
            "evt-1",
            AssignTechnicianRequest {
                technician_id: "tech-1".into(),
                technician_name: " ".into(),
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PortalError::ValidationError(_)));
        assert!(calendar.calls().is_empty());

        let err = assign_technician(
            &calendar,
            &bookings,
            &settings(),
            "missing",
            AssignTechnicianRequest {
                technician_id: "tech-1".into(),
                technician_name: "Luis".into(),
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PortalError::NotFound(_)));
    }
}
