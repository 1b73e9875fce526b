//! Episode air date parsing and "upcoming" filtering.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::bangumi::Episode;

/// A `year-month-day` triple as written upstream.
///
/// Structurally valid only: a month of 13 survives parsing and is rejected
/// later, when a real calendar date is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct AirDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

impl AirDate {
    pub fn new(year: i32, month: i32, day: i32) -> Self {
        AirDate { year, month, day }
    }

    /// The real calendar date, if this triple names one.
    pub fn to_naive_date(self) -> Option<NaiveDate> {
        let month = u32::try_from(self.month).ok()?;
        let day = u32::try_from(self.day).ok()?;
        NaiveDate::from_ymd_opt(self.year, month, day)
    }
}

impl From<NaiveDate> for AirDate {
    fn from(date: NaiveDate) -> Self {
        AirDate::new(date.year(), date.month() as i32, date.day() as i32)
    }
}

impl From<[i32; 3]> for AirDate {
    fn from([year, month, day]: [i32; 3]) -> Self {
        AirDate::new(year, month, day)
    }
}

impl From<AirDate> for [i32; 3] {
    fn from(date: AirDate) -> Self {
        [date.year, date.month, date.day]
    }
}

impl fmt::Display for AirDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parse `YYYY-M-D`. Exactly three integer components, anything else is `None`.
pub fn parse_air_date(raw: &str) -> Option<AirDate> {
    let mut parts = raw.split('-');
    let year = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    let day = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(AirDate::new(year, month, day))
}

/// An episode whose air date parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEpisode {
    pub id: u64,
    pub sort: f64,
    pub name: String,
    pub air_date: AirDate,
    pub duration: String,
}

impl ParsedEpisode {
    /// Returns `None` when the raw airdate is missing or malformed.
    pub fn from_raw(episode: Episode) -> Option<Self> {
        let air_date = parse_air_date(&episode.airdate)?;
        Some(ParsedEpisode {
            id: episode.id,
            sort: episode.sort,
            name: display_name(&episode.name_cn, &episode.name),
            air_date,
            duration: episode.duration,
        })
    }
}

/// Parse every episode, silently dropping the ones without a usable date.
pub fn parse_episodes(episodes: Vec<Episode>) -> Vec<ParsedEpisode> {
    episodes
        .into_iter()
        .filter_map(ParsedEpisode::from_raw)
        .collect()
}

/// Episodes airing on or after `today - grace_days`.
///
/// Negative grace counts as zero. A window reaching past the earliest
/// representable date keeps every episode.
pub fn filter_future(
    episodes: &[ParsedEpisode],
    today: NaiveDate,
    grace_days: i64,
) -> Vec<ParsedEpisode> {
    let grace = Days::new(u64::try_from(grace_days).unwrap_or(0));
    let Some(cutoff) = today.checked_sub_days(grace).map(AirDate::from) else {
        return episodes.to_vec();
    };

    episodes
        .iter()
        .filter(|ep| ep.air_date >= cutoff)
        .cloned()
        .collect()
}

/// Localized name if present, else the original; HTML entities unescaped.
pub(crate) fn display_name(localized: &str, original: &str) -> String {
    let name = if localized.trim().is_empty() {
        original
    } else {
        localized
    };
    html_unescape(name)
}

fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
