/// Publication recency classification
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Time-since-publication buckets, ordered newest to oldest.
///
/// `Unknown` is the fallback for missing or unparsable timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecencyCategory {
    LastTwoWeeks,
    TwoToFourWeeks,
    OneToThreeMonths,
    MoreThanThreeMonths,
    Unknown,
}

impl RecencyCategory {
    /// All categories in report order
    pub const ALL: [RecencyCategory; 5] = [
        RecencyCategory::LastTwoWeeks,
        RecencyCategory::TwoToFourWeeks,
        RecencyCategory::OneToThreeMonths,
        RecencyCategory::MoreThanThreeMonths,
        RecencyCategory::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RecencyCategory::LastTwoWeeks => "Last 2 weeks",
            RecencyCategory::TwoToFourWeeks => "2-4 weeks ago",
            RecencyCategory::OneToThreeMonths => "1-3 months ago",
            RecencyCategory::MoreThanThreeMonths => "More than 3 months ago",
            RecencyCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RecencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorize a video by its publication timestamp.
///
/// Accepts ISO-8601 timestamps as returned by the YouTube API (a trailing
/// `Z` is treated as UTC). Anything that fails to parse yields `Unknown`.
pub fn categorize_by_date(published_at: &str) -> RecencyCategory {
    match DateTime::parse_from_rfc3339(published_at) {
        Ok(published) => {
            let now = Utc::now().with_timezone(published.offset());
            categorize_at(published, now)
        }
        Err(_) => RecencyCategory::Unknown,
    }
}

/// Bucket thresholds evaluated in order, upper bounds inclusive:
/// day 14 is still "Last 2 weeks", day 15 falls into "2-4 weeks ago".
fn categorize_at(published: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> RecencyCategory {
    let days = (now - published).num_days();

    if days <= 14 {
        RecencyCategory::LastTwoWeeks
    } else if days <= 28 {
        RecencyCategory::TwoToFourWeeks
    } else if days <= 90 {
        RecencyCategory::OneToThreeMonths
    } else {
        RecencyCategory::MoreThanThreeMonths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fixed_now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00+00:00").unwrap()
    }

    fn days_ago(days: i64) -> DateTime<FixedOffset> {
        fixed_now() - Duration::days(days)
    }

    #[test]
    fn test_bucket_boundaries() {
        let now = fixed_now();
        assert_eq!(categorize_at(days_ago(0), now), RecencyCategory::LastTwoWeeks);
        assert_eq!(categorize_at(days_ago(14), now), RecencyCategory::LastTwoWeeks);
        assert_eq!(categorize_at(days_ago(15), now), RecencyCategory::TwoToFourWeeks);
        assert_eq!(categorize_at(days_ago(28), now), RecencyCategory::TwoToFourWeeks);
        assert_eq!(categorize_at(days_ago(29), now), RecencyCategory::OneToThreeMonths);
        assert_eq!(categorize_at(days_ago(90), now), RecencyCategory::OneToThreeMonths);
        assert_eq!(categorize_at(days_ago(91), now), RecencyCategory::MoreThanThreeMonths);
        assert_eq!(categorize_at(days_ago(365), now), RecencyCategory::MoreThanThreeMonths);
    }

    #[test]
    fn test_unparsable_timestamps_are_unknown() {
        assert_eq!(categorize_by_date(""), RecencyCategory::Unknown);
        assert_eq!(categorize_by_date("not a date"), RecencyCategory::Unknown);
        assert_eq!(categorize_by_date("2024-13-45T99:00:00Z"), RecencyCategory::Unknown);
    }

    #[test]
    fn test_trailing_z_parses_as_utc() {
        // A freshly published timestamp must land in the newest bucket
        let just_now = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        assert!(just_now.ends_with('Z'));
        assert_eq!(categorize_by_date(&just_now), RecencyCategory::LastTwoWeeks);
    }

    #[test]
    fn test_labels() {
        assert_eq!(RecencyCategory::LastTwoWeeks.to_string(), "Last 2 weeks");
        assert_eq!(RecencyCategory::TwoToFourWeeks.to_string(), "2-4 weeks ago");
        assert_eq!(RecencyCategory::OneToThreeMonths.to_string(), "1-3 months ago");
        assert_eq!(
            RecencyCategory::MoreThanThreeMonths.to_string(),
            "More than 3 months ago"
        );
        assert_eq!(RecencyCategory::Unknown.to_string(), "Unknown");
    }
}
