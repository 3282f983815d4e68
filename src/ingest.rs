/// Analytics CSV ingestion: header aliasing, identifier extraction, dedup
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extractor::TrafficSourceExtractor;

/// Per-table cap on surfaced row warnings; the remainder is summarized
pub const MAX_ROW_WARNINGS: usize = 5;

/// Engagement metrics carried by the analytics export itself.
///
/// Created once per unique video ID; the first occurrence in the table wins
/// and later rows for the same ID are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsvMetrics {
    pub impressions: u64,
    pub impressions_ctr: f64,
    pub csv_views: u64,
    pub average_view_duration: String,
    pub watch_time_hours: f64,
}

impl Default for CsvMetrics {
    fn default() -> Self {
        Self {
            impressions: 0,
            impressions_ctr: 0.0,
            csv_views: 0,
            average_view_duration: "0:00".to_string(),
            watch_time_hours: 0.0,
        }
    }
}

/// Fatal conditions for a single table. Other tables are unaffected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("input table has no header row")]
    EmptyTable,
    #[error("required column '{0}' not found in header")]
    MissingColumn(&'static str),
}

/// Ordered IDs, per-ID metrics, and capped warnings for one table
#[derive(Debug, Default)]
pub struct IngestResult {
    pub video_ids: Vec<String>,
    pub metrics: HashMap<String, CsvMetrics>,
    pub warnings: Vec<String>,
}

// Accepted header spellings per logical field, matched case-insensitively.
// Only the traffic-source column is required.
const TRAFFIC_SOURCE_ALIASES: &[&str] = &["traffic source", "traffic_source", "source"];
const IMPRESSIONS_ALIASES: &[&str] = &["impressions"];
const CTR_ALIASES: &[&str] = &[
    "impressions click-through rate (%)",
    "impressions click through rate (%)",
    "impressions ctr (%)",
    "click-through rate (%)",
    "ctr (%)",
    "ctr",
];
const VIEWS_ALIASES: &[&str] = &["views"];
const DURATION_ALIASES: &[&str] = &["average view duration", "avg view duration"];
const WATCH_TIME_ALIASES: &[&str] = &["watch time (hours)", "watch time hours", "watch time"];

/// Logical field → physical column index, resolved once per table
#[derive(Debug)]
struct ColumnMap {
    traffic_source: usize,
    impressions: Option<usize>,
    impressions_ctr: Option<usize>,
    views: Option<usize>,
    average_view_duration: Option<usize>,
    watch_time_hours: Option<usize>,
}

fn find_column(header: &[String], aliases: &[&str]) -> Option<usize> {
    header.iter().position(|name| {
        let name = name.trim().to_lowercase();
        aliases.iter().any(|alias| name == *alias)
    })
}

fn resolve_columns(header: &[String]) -> Result<ColumnMap, IngestError> {
    let traffic_source = find_column(header, TRAFFIC_SOURCE_ALIASES)
        .ok_or(IngestError::MissingColumn("traffic source"))?;

    Ok(ColumnMap {
        traffic_source,
        impressions: find_column(header, IMPRESSIONS_ALIASES),
        impressions_ctr: find_column(header, CTR_ALIASES),
        views: find_column(header, VIEWS_ALIASES),
        average_view_duration: find_column(header, DURATION_ALIASES),
        watch_time_hours: find_column(header, WATCH_TIME_ALIASES),
    })
}

/// Split one CSV line, honoring double-quoted fields and `""` escapes
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Parses analytics tables into ordered video IDs and per-ID metrics
pub struct TabularIngestor {
    extractor: TrafficSourceExtractor,
    max_row_warnings: usize,
}

impl TabularIngestor {
    pub fn new() -> Self {
        Self {
            extractor: TrafficSourceExtractor::new(),
            max_row_warnings: MAX_ROW_WARNINGS,
        }
    }

    pub fn with_warning_cap(max_row_warnings: usize) -> Self {
        Self {
            extractor: TrafficSourceExtractor::new(),
            max_row_warnings,
        }
    }

    /// Ingest one table.
    ///
    /// Rows without an extractable video ID are skipped silently. Numeric
    /// cells that fail to parse degrade to the field default and surface a
    /// warning; only a missing traffic-source column fails the table.
    pub fn ingest(&self, content: &str) -> Result<IngestResult, IngestError> {
        let mut lines = content.lines().filter(|line| !line.trim().is_empty());
        let header_line = lines.next().ok_or(IngestError::EmptyTable)?;
        let header = split_csv_line(header_line);
        let columns = resolve_columns(&header)?;

        let mut video_ids = Vec::new();
        let mut metrics: HashMap<String, CsvMetrics> = HashMap::new();
        let mut warnings = Vec::new();
        let mut suppressed = 0usize;

        for (data_index, line) in lines.enumerate() {
            let cells = split_csv_line(line);

            // Exports often lead with an aggregate row; not an error
            if data_index == 0 && is_totals_row(&cells) {
                debug!("skipping leading totals row");
                continue;
            }

            let traffic_source = cells
                .get(columns.traffic_source)
                .map(String::as_str)
                .unwrap_or("");
            let video_id = match self.extractor.extract(traffic_source) {
                Some(id) => id,
                None => continue,
            };

            // First occurrence wins
            if metrics.contains_key(&video_id) {
                continue;
            }

            let row_number = data_index + 2;
            let mut record = CsvMetrics::default();

            if let Some(raw) = cell(&cells, columns.impressions) {
                match parse_count(raw) {
                    Some(value) => record.impressions = value,
                    None => self.push_warning(
                        &mut warnings,
                        &mut suppressed,
                        format!("row {}: invalid impressions value '{}', using 0", row_number, raw),
                    ),
                }
            }

            if let Some(raw) = cell(&cells, columns.impressions_ctr) {
                match parse_rate(raw) {
                    Some(value) => record.impressions_ctr = value,
                    None => self.push_warning(
                        &mut warnings,
                        &mut suppressed,
                        format!("row {}: invalid CTR value '{}', using 0", row_number, raw),
                    ),
                }
            }

            if let Some(raw) = cell(&cells, columns.views) {
                match parse_count(raw) {
                    Some(value) => record.csv_views = value,
                    None => self.push_warning(
                        &mut warnings,
                        &mut suppressed,
                        format!("row {}: invalid views value '{}', using 0", row_number, raw),
                    ),
                }
            }

            if let Some(raw) = cell(&cells, columns.average_view_duration) {
                record.average_view_duration = raw.to_string();
            }

            if let Some(raw) = cell(&cells, columns.watch_time_hours) {
                match parse_rate(raw) {
                    Some(value) => record.watch_time_hours = value,
                    None => self.push_warning(
                        &mut warnings,
                        &mut suppressed,
                        format!("row {}: invalid watch time value '{}', using 0", row_number, raw),
                    ),
                }
            }

            video_ids.push(video_id.clone());
            metrics.insert(video_id, record);
        }

        if suppressed > 0 {
            warnings.push(format!("{} additional row warnings suppressed", suppressed));
        }

        debug!("ingested {} unique video IDs", video_ids.len());
        Ok(IngestResult {
            video_ids,
            metrics,
            warnings,
        })
    }

    fn push_warning(&self, warnings: &mut Vec<String>, suppressed: &mut usize, message: String) {
        if warnings.len() < self.max_row_warnings {
            warn!("{}", message);
            warnings.push(message);
        } else {
            *suppressed += 1;
        }
    }
}

impl Default for TabularIngestor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_totals_row(cells: &[String]) -> bool {
    cells
        .first()
        .map(|c| c.trim().eq_ignore_ascii_case("total"))
        .unwrap_or(false)
}

fn cell<'a>(cells: &'a [String], index: Option<usize>) -> Option<&'a str> {
    index
        .and_then(|i| cells.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

fn parse_rate(raw: &str) -> Option<f64> {
    raw.trim_end_matches('%')
        .replace(',', "")
        .parse()
        .ok()
        .filter(|value: &f64| *value >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Traffic source,Impressions,Impressions click-through rate (%),Views,Average view duration,Watch time (hours)";

    #[test]
    fn test_basic_ingest() {
        let csv = format!(
            "{}\n\
             YT_RELATED.dQw4w9WgXcQ,1000,4.5,250,3:42,15.5\n\
             YT_RELATED.abcdefghijk,500,2.1,80,1:05,2.0\n",
            HEADER
        );

        let result = TabularIngestor::new().ingest(&csv).unwrap();
        assert_eq!(result.video_ids, vec!["dQw4w9WgXcQ", "abcdefghijk"]);

        let first = &result.metrics["dQw4w9WgXcQ"];
        assert_eq!(first.impressions, 1000);
        assert_eq!(first.impressions_ctr, 4.5);
        assert_eq!(first.csv_views, 250);
        assert_eq!(first.average_view_duration, "3:42");
        assert_eq!(first.watch_time_hours, 15.5);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_header_aliases_and_column_order() {
        // Shuffled columns, different alias spellings, mixed case
        let csv = "VIEWS,ctr (%),TRAFFIC SOURCE,Watch Time\n\
                   42,1.5,YT_RELATED.dQw4w9WgXcQ,3.25\n";

        let result = TabularIngestor::new().ingest(csv).unwrap();
        let record = &result.metrics["dQw4w9WgXcQ"];
        assert_eq!(record.csv_views, 42);
        assert_eq!(record.impressions_ctr, 1.5);
        assert_eq!(record.watch_time_hours, 3.25);
        // Unresolved optional fields fall back to defaults
        assert_eq!(record.impressions, 0);
        assert_eq!(record.average_view_duration, "0:00");
    }

    #[test]
    fn test_leading_totals_row_is_skipped() {
        let csv = format!(
            "{}\n\
             Total,10000,3.2,5000,2:00,100.0\n\
             YT_RELATED.dQw4w9WgXcQ,1000,4.5,250,3:42,15.5\n",
            HEADER
        );

        let result = TabularIngestor::new().ingest(&csv).unwrap();
        assert_eq!(result.video_ids, vec!["dQw4w9WgXcQ"]);
    }

    #[test]
    fn test_non_related_rows_skipped_silently() {
        let csv = format!(
            "{}\n\
             YT_SEARCH.something,1,1.0,1,0:30,0.1\n\
             External,2,2.0,2,0:30,0.2\n\
             YT_RELATED.dQw4w9WgXcQ,1000,4.5,250,3:42,15.5\n",
            HEADER
        );

        let result = TabularIngestor::new().ingest(&csv).unwrap();
        assert_eq!(result.video_ids, vec!["dQw4w9WgXcQ"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let csv = format!(
            "{}\n\
             YT_RELATED.dQw4w9WgXcQ,1000,4.5,250,3:42,15.5\n\
             YT_RELATED.abcdefghijk,500,2.1,80,1:05,2.0\n\
             YT_RELATED.dQw4w9WgXcQ,9999,9.9,999,9:99,99.0\n",
            HEADER
        );

        let result = TabularIngestor::new().ingest(&csv).unwrap();
        assert_eq!(result.video_ids, vec!["dQw4w9WgXcQ", "abcdefghijk"]);
        assert_eq!(result.metrics["dQw4w9WgXcQ"].impressions, 1000);
        assert_eq!(result.metrics["dQw4w9WgXcQ"].csv_views, 250);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "Impressions,Views\n100,50\n";
        let err = TabularIngestor::new().ingest(csv).unwrap_err();
        assert_eq!(err, IngestError::MissingColumn("traffic source"));
    }

    #[test]
    fn test_empty_input() {
        let err = TabularIngestor::new().ingest("").unwrap_err();
        assert_eq!(err, IngestError::EmptyTable);
    }

    #[test]
    fn test_bad_numeric_cells_degrade_to_defaults() {
        let csv = format!(
            "{}\n\
             YT_RELATED.dQw4w9WgXcQ,not-a-number,4.5,250,3:42,15.5\n",
            HEADER
        );

        let result = TabularIngestor::new().ingest(&csv).unwrap();
        let record = &result.metrics["dQw4w9WgXcQ"];
        // Row survives; only the bad field defaults
        assert_eq!(record.impressions, 0);
        assert_eq!(record.csv_views, 250);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("invalid impressions value 'not-a-number'"));
    }

    #[test]
    fn test_warning_cap_summarizes_remainder() {
        let mut csv = format!("{}\n", HEADER);
        for i in 0..8 {
            csv.push_str(&format!(
                "YT_RELATED.aaaaaaaaa{:02},bad,4.5,250,3:42,15.5\n",
                i
            ));
        }

        let result = TabularIngestor::new().ingest(&csv).unwrap();
        assert_eq!(result.video_ids.len(), 8);
        // 5 surfaced warnings plus one summary line
        assert_eq!(result.warnings.len(), MAX_ROW_WARNINGS + 1);
        assert!(result.warnings[MAX_ROW_WARNINGS].contains("3 additional row warnings suppressed"));
    }

    #[test]
    fn test_quoted_fields_and_thousands_separators() {
        let csv = "Name,Traffic source,Views\n\
                   \"Doe, John\",YT_RELATED.dQw4w9WgXcQ,\"1,234\"\n";

        let result = TabularIngestor::new().ingest(csv).unwrap();
        assert_eq!(result.metrics["dQw4w9WgXcQ"].csv_views, 1234);
    }

    #[test]
    fn test_split_csv_line_quote_escapes() {
        assert_eq!(
            split_csv_line(r#"a,"b,c","say ""hi""",d"#),
            vec!["a", "b,c", "say \"hi\"", "d"]
        );
        assert_eq!(split_csv_line(""), vec![""]);
    }

    #[test]
    fn test_ctr_percent_suffix_accepted() {
        let csv = format!(
            "{}\n\
             YT_RELATED.dQw4w9WgXcQ,100,4.5%,250,3:42,15.5\n",
            HEADER
        );

        let result = TabularIngestor::new().ingest(&csv).unwrap();
        assert_eq!(result.metrics["dQw4w9WgXcQ"].impressions_ctr, 4.5);
    }
}
