use crate::domain::models::booking::Booking;
use chrono::{Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};

pub const DEMO_DURATION_MINUTES: i64 = 30;

pub fn parse_slot_time(label: &str) -> Option<NaiveTime> {
    let label = label.trim().to_uppercase();
    ["%I:%M %p", "%I:%M%p", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&label, fmt).ok())
}

pub fn generate_demo_invite(booking: &Booking, timezone: &str, site_url: &str) -> Option<String> {
    let tz: Tz = timezone.parse().ok()?;
    let time = parse_slot_time(&booking.time)?;
    let start = tz.from_local_datetime(&booking.date.and_time(time)).earliest()?;
    let end = start + Duration::minutes(DEMO_DURATION_MINUTES);

    let mut calendar = Calendar::new();

    let ical_event = IcalEvent::new()
        .summary("Practice management software demo")
        .description(&format!(
            "Product walkthrough for {}. Booking reference {}.",
            booking.firm_name.as_deref().unwrap_or(&booking.name),
            booking.id
        ))
        .location(site_url)
        .starts(start.with_timezone(&Utc))
        .ends(end.with_timezone(&Utc))
        .uid(&booking.id)
        .done();

    calendar.push(ical_event);
    Some(calendar.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::booking::NewBookingParams;
    use chrono::NaiveDate;

    fn booking(time: &str) -> Booking {
        Booking::new(NewBookingParams {
            name: "Asha Rao".into(),
            email: "asha@x.com".into(),
            phone: "9999999999".into(),
            firm_name: Some("Rao & Co".into()),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: time.into(),
            message: None,
        })
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(parse_slot_time("10:00 AM"), NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(parse_slot_time("2:30 pm"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_slot_time("16:15"), NaiveTime::from_hms_opt(16, 15, 0));
        assert_eq!(parse_slot_time("morning"), None);
    }

    #[test]
    fn test_invite_is_in_business_timezone() {
        let ics = generate_demo_invite(&booking("10:00 AM"), "Asia/Kolkata", "https://example.in").unwrap();
        // 10:00 IST is 04:30 UTC
        assert!(ics.contains("DTSTART:20250310T043000Z"));
        assert!(ics.contains("DTEND:20250310T050000Z"));
        assert!(ics.contains("Rao & Co"));
    }

    #[test]
    fn test_no_invite_for_free_text_slots() {
        assert!(generate_demo_invite(&booking("after lunch"), "Asia/Kolkata", "https://example.in").is_none());
        assert!(generate_demo_invite(&booking("10:00 AM"), "Mars/Olympus", "https://example.in").is_none());
    }
}
