#[cfg(test)]
mod tests {
    use crate::logic::build_slots;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use portal_common::services::{CalendarEvent, EventTime};
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap()
    }

    // Events given as (start offset, length) in minutes from midnight
    fn events_from(spans: &[(i64, i64)]) -> Vec<CalendarEvent> {
        spans
            .iter()
            .enumerate()
            .map(|(i, (offset, length))| {
                let start = base() + Duration::minutes(*offset);
                CalendarEvent {
                    id: format!("evt-{}", i),
                    start: Some(EventTime::At(start)),
                    end: Some(EventTime::At(start + Duration::minutes(*length))),
                    ..Default::default()
                }
            })
            .collect()
    }

    proptest! {
        // Slots cover the window without gaps or overlaps
        #[test]
        fn test_slots_partition_the_window(
            start_minute in 0..720i64,
            window_minutes in 1..720i64,
            duration_minutes in 1..180i64,
        ) {
            let day_start = base() + Duration::minutes(start_minute);
            let day_end = day_start + Duration::minutes(window_minutes);
            let duration = Duration::minutes(duration_minutes);
            let slots = build_slots(day_start, day_end, duration, &[]);

            prop_assert!(!slots.is_empty());
            prop_assert_eq!(slots[0].start, day_start);
            for pair in slots.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            for slot in &slots {
                prop_assert_eq!(slot.end - slot.start, duration);
                prop_assert!(slot.start < day_end);
            }
            let last = slots[slots.len() - 1];
            prop_assert!(last.end >= day_end);
        }

        // A slot is unavailable iff it intersects some event's [start, end),
        // or contains the instant of a zero-length event
        #[test]
        fn test_availability_matches_interval_intersection(
            spans in prop::collection::vec((0..1440i64, 0..240i64), 0..8),
            duration_minutes in 15..120i64,
        ) {
            let events = events_from(&spans);
            let day_start = base() + Duration::hours(9);
            let day_end = base() + Duration::hours(18);
            let slots = build_slots(day_start, day_end, Duration::minutes(duration_minutes), &events);

            for slot in &slots {
                let intersects = events.iter().any(|event| {
                    let (start, end) = event.timed_interval().unwrap();
                    (slot.start < end && start < slot.end)
                        || (start == end && slot.start <= start && start <= slot.end)
                });
                prop_assert_eq!(slot.available, !intersects);
            }
        }

        // Same input, same output
        #[test]
        fn test_slots_are_deterministic(
            spans in prop::collection::vec((0..1440i64, 1..240i64), 0..8),
            duration_minutes in 15..120i64,
        ) {
            let events = events_from(&spans);
            let day_start = base() + Duration::hours(9);
            let day_end = base() + Duration::hours(18);
            let duration = Duration::minutes(duration_minutes);
            prop_assert_eq!(
                build_slots(day_start, day_end, duration, &events),
                build_slots(day_start, day_end, duration, &events)
            );
        }

        // An event exactly covering one slot blocks only that slot
        #[test]
        fn test_touching_boundaries_do_not_overlap(
            slot_index in 0..8i64,
        ) {
            let start_offset = 9 * 60 + slot_index * 60;
            let events = events_from(&[(start_offset, 60)]);
            let slots = build_slots(
                base() + Duration::hours(9),
                base() + Duration::hours(18),
                Duration::minutes(60),
                &events,
            );
            for (i, slot) in slots.iter().enumerate() {
                prop_assert_eq!(slot.available, i as i64 != slot_index);
            }
        }
    }

    #[test]
    fn test_booked_nine_to_ten_leaves_ten_to_eleven_free() {
        let events = events_from(&[(9 * 60, 60)]);
        let slots = build_slots(
            base() + Duration::hours(9),
            base() + Duration::hours(18),
            Duration::minutes(60),
            &events,
        );
        assert!(!slots[0].available);
        assert!(slots[1].available);
    }
}
