/// YouTube Traffic Analyzer - Rust Implementation
///
/// Enrichment pipeline for YouTube Analytics traffic-source exports.
/// Designed to replace the Python implementation with explicit degradation
/// paths and tested batching behavior.

pub mod api;
pub mod cache;
pub mod classify;
pub mod config;
pub mod extractor;
pub mod ingest;
pub mod merge;
pub mod overlap;
pub mod pipeline;
pub mod report;

// Re-export main types for easy access
pub use crate::api::{
    ContentType, FetchOutcome, VideoData, VideoDataSource, VideoMetadataFetcher, YouTubeClient,
};
pub use crate::cache::ResponseCache;
pub use crate::classify::{categorize_by_date, RecencyCategory};
pub use crate::config::Config;
pub use crate::extractor::TrafficSourceExtractor;
pub use crate::ingest::{CsvMetrics, IngestError, IngestResult, TabularIngestor};
pub use crate::merge::{merge_records, EnrichedVideo};
pub use crate::overlap::{OverlapAnalyzer, OverlapMetrics};
pub use crate::pipeline::{AnalysisResult, InputTable, TrafficAnalyzer};
