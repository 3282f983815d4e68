/// Combines CSV metrics with fetched metadata into enriched records
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::{ContentType, VideoData};
use crate::classify::{categorize_by_date, RecencyCategory};
use crate::ingest::CsvMetrics;
use crate::overlap::{OverlapAnalyzer, OverlapMetrics};

/// One fully merged report row. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedVideo {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub category: RecencyCategory,
    pub content_type: ContentType,
    pub api_views: u64,
    pub thumbnail_url: String,
    pub metrics: CsvMetrics,
    pub overlap: OverlapMetrics,
}

impl EnrichedVideo {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    /// Views shown in reports: the API count when available, else the
    /// count the export itself carried
    pub fn display_views(&self) -> u64 {
        if self.api_views > 0 {
            self.api_views
        } else {
            self.metrics.csv_views
        }
    }
}

/// Merge fetched metadata into the ingested records, in ingest order.
///
/// Only IDs present in `metrics` produce a row: every output row traces
/// back to an observed table row. IDs the fetch could not resolve degrade
/// to placeholder metadata rather than being dropped.
pub fn merge_records(
    video_ids: &[String],
    metrics: &HashMap<String, CsvMetrics>,
    videos: &HashMap<String, VideoData>,
    analyzer: &OverlapAnalyzer,
    reference: Option<&VideoData>,
) -> Vec<EnrichedVideo> {
    let mut records = Vec::with_capacity(video_ids.len());

    for video_id in video_ids {
        let Some(csv_metrics) = metrics.get(video_id) else {
            continue;
        };

        let record = match videos.get(video_id) {
            Some(video) => EnrichedVideo {
                video_id: video_id.clone(),
                title: video.title.clone(),
                published_at: video.published_at.clone(),
                category: categorize_by_date(&video.published_at),
                content_type: video.content_type,
                api_views: video.view_count,
                thumbnail_url: video.thumbnail_url.clone(),
                metrics: csv_metrics.clone(),
                overlap: analyzer.compare(reference, video),
            },
            None => EnrichedVideo {
                video_id: video_id.clone(),
                title: format!("Video ID: {}", video_id),
                published_at: String::new(),
                category: RecencyCategory::Unknown,
                content_type: ContentType::Unknown,
                api_views: 0,
                thumbnail_url: String::new(),
                metrics: csv_metrics.clone(),
                overlap: analyzer.compare(reference, &VideoData::default()),
            },
        };
        records.push(record);
    }

    records
}
