use chrono::{DateTime, Duration, NaiveDate, Utc};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};
use uuid::Uuid;

use crate::constants::{
    CALENDAR_NAME, EPISODE_URL_BASE, LOOKAHEAD_DAYS, PRODUCT_ID, PUBLISHED_TTL,
};
use crate::episode::ParsedEpisode;
use crate::subject::SlimSubject;

/// Namespace for event UIDs. Changing it re-creates every event for every subscriber.
const UID_NAMESPACE: Uuid = Uuid::from_u128(0xef2256c4_162e_446b_9ccf_81050809d0c9);

/// Stable UID for one episode of one subject.
pub fn event_uid(subject_id: u64, episode_id: u64) -> String {
    let key = format!("subject-{subject_id}-episode-{episode_id}");
    Uuid::new_v5(&UID_NAMESPACE, key.as_bytes()).to_string()
}

/// Render the feed for `subjects` as seen at `now`.
///
/// Episodes airing more than [`LOOKAHEAD_DAYS`] after `now` are skipped.
/// Output is byte-identical for identical input apart from `DTSTAMP`.
pub fn generate_ics(subjects: &[SlimSubject], now: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();

    cal.append_property(Property::new("NAME", CALENDAR_NAME));
    cal.append_property(Property::new("X-WR-CALNAME", CALENDAR_NAME));
    cal.append_property(Property::new("X-PUBLISHED-TTL", PUBLISHED_TTL));

    let mut refresh = Property::new("REFRESH-INTERVAL", PUBLISHED_TTL);
    refresh.add_parameter("VALUE", "DURATION");
    cal.append_property(refresh);

    let dtstamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    let last_day = now.date_naive() + Duration::days(LOOKAHEAD_DAYS);

    for subject in subjects {
        for episode in &subject.future_episodes {
            // Structurally valid but impossible dates (month 13) cannot be rendered
            let Some(start) = episode.air_date.to_naive_date() else {
                continue;
            };
            if start > last_day {
                continue;
            }
            let Some(end) = start.succ_opt() else {
                continue;
            };

            let event = episode_event(subject, episode, start, end, &dtstamp);
            cal.push(event);
        }
    }

    let cal = cal.done();
    strip_ics_bloat(&cal.to_string())
}

fn episode_event(
    subject: &SlimSubject,
    episode: &ParsedEpisode,
    start: NaiveDate,
    end: NaiveDate,
    dtstamp: &str,
) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event_uid(subject.id, episode.id));
    ics_event.add_property("DTSTAMP", dtstamp);
    ics_event.summary(&format!("{} {}", subject.name, episode.sort));

    add_date_property(&mut ics_event, "DTSTART", start);
    add_date_property(&mut ics_event, "DTEND", end);

    if let Some(description) = episode_description(episode) {
        ics_event.description(&description);
    }

    ics_event.add_property("URL", format!("{}/{}", EPISODE_URL_BASE, episode.id));

    ics_event.done()
}

/// Episode title and runtime, one per line. `None` when both are empty.
fn episode_description(episode: &ParsedEpisode) -> Option<String> {
    let mut parts = Vec::new();
    if !episode.name.is_empty() {
        parts.push(episode.name.clone());
    }
    if !episode.duration.is_empty() {
        parts.push(format!("时长：{}", episode.duration));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

fn add_date_property(ics_event: &mut icalendar::Event, name: &str, date: NaiveDate) {
    let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    ics_event.append_property(prop);
}

/// Clean up output from the icalendar crate
/// - Replace PRODID with ours
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODUCT_ID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
