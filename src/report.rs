/// Report projection helpers: CSV export, grouping, display formatting
use tracing::debug;

use crate::classify::RecencyCategory;
use crate::merge::EnrichedVideo;

/// Column order of the flat CSV export
pub const EXPORT_HEADER: &[&str] = &[
    "Video ID",
    "Title",
    "Published At",
    "Recency",
    "API Views",
    "CSV Views",
    "Impressions",
    "CTR (%)",
    "Avg View Duration",
    "Watch Time (hrs)",
    "Video URL",
];

/// Render the merged records as a flat CSV table.
pub fn export_csv(records: &[EnrichedVideo]) -> String {
    let mut out = String::new();
    out.push_str(&EXPORT_HEADER.join(","));
    out.push('\n');

    for record in records {
        let fields = [
            record.video_id.clone(),
            record.title.clone(),
            record.published_at.clone(),
            record.category.to_string(),
            record.api_views.to_string(),
            record.metrics.csv_views.to_string(),
            record.metrics.impressions.to_string(),
            record.metrics.impressions_ctr.to_string(),
            record.metrics.average_view_duration.clone(),
            record.metrics.watch_time_hours.to_string(),
            record.watch_url(),
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    debug!("exported {} records", records.len());
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Group records by recency, in bucket order, skipping empty buckets.
/// Within each bucket records are ordered by displayed views, descending.
pub fn group_by_category(records: &[EnrichedVideo]) -> Vec<(RecencyCategory, Vec<&EnrichedVideo>)> {
    let mut groups = Vec::new();
    for category in RecencyCategory::ALL {
        let mut members: Vec<&EnrichedVideo> = records
            .iter()
            .filter(|r| r.category == category)
            .collect();
        if members.is_empty() {
            continue;
        }
        members.sort_by(|a, b| b.display_views().cmp(&a.display_views()));
        groups.push((category, members));
    }
    groups
}

/// Per-bucket record counts, in bucket order, including empty buckets.
pub fn summary_counts(records: &[EnrichedVideo]) -> Vec<(RecencyCategory, usize)> {
    RecencyCategory::ALL
        .iter()
        .map(|&category| {
            let count = records.iter().filter(|r| r.category == category).count();
            (category, count)
        })
        .collect()
}

/// Format large counts with K/M/B suffixes for display.
pub fn format_number(num: u64) -> String {
    if num >= 1_000_000_000 {
        format!("{:.1}B", num as f64 / 1_000_000_000.0)
    } else if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

/// Display form of an average-view-duration cell; blank means unwatched.
pub fn format_duration(duration: &str) -> &str {
    if duration.is_empty() {
        "0:00"
    } else {
        duration
    }
}
