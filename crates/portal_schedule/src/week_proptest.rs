#[cfg(test)]
mod tests {
    use crate::week::{merge_week, WeekEntry};
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;
    use portal_common::models::Task;
    use portal_common::time::local_date;
    use proptest::prelude::*;

    const TZ: Tz = chrono_tz::Europe::Madrid;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 24).unwrap()
    }

    fn task(start: DateTime<Utc>, end: DateTime<Utc>) -> Task {
        Task {
            id: "t".into(),
            technician_id: "tech-1".into(),
            technician_name: "Luis".into(),
            start_date: start,
            end_date: end,
            description: "Install thermostat".into(),
            address: String::new(),
            links: vec![],
            created_at: start,
            updated_at: None,
        }
    }

    proptest! {
        // A task appears on a day iff the day lies within its local date span.
        // The generated range crosses the end-of-March DST change in Madrid.
        #[test]
        fn test_task_is_bucketed_exactly_on_the_days_it_spans(
            start_minutes in -2 * 24 * 60..9 * 24 * 60i64,
            length_minutes in 0..5 * 24 * 60i64,
        ) {
            let origin = TZ.with_ymd_and_hms(2025, 3, 24, 0, 0, 0).unwrap().with_timezone(&Utc);
            let start = origin + Duration::minutes(start_minutes);
            let end = start + Duration::minutes(length_minutes);
            let view = merge_week(&[task(start, end)], &[], monday(), TZ).unwrap();

            let (first, last) = (local_date(&start, TZ), local_date(&end, TZ));
            prop_assert_eq!(view.days.len(), 7);
            for day in &view.days {
                let present = day.items.iter().any(|item| matches!(item, WeekEntry::Task(_)));
                prop_assert_eq!(present, first <= day.date && day.date <= last);
            }
        }
    }
}
