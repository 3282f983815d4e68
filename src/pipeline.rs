/// End-to-end enrichment pipeline over one or more input tables
use tracing::{info, warn};

use crate::api::{VideoDataSource, VideoMetadataFetcher};
use crate::config::IngestConfig;
use crate::ingest::TabularIngestor;
use crate::merge::{merge_records, EnrichedVideo};
use crate::overlap::OverlapAnalyzer;

/// One input table: a label for diagnostics plus its raw CSV text
#[derive(Debug, Clone)]
pub struct InputTable {
    pub label: String,
    pub content: String,
}

impl InputTable {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
        }
    }
}

/// Combined output across all processed tables
#[derive(Debug, Default)]
pub struct AnalysisResult {
    pub records: Vec<EnrichedVideo>,
    pub warnings: Vec<String>,
    pub tables_processed: usize,
    pub tables_failed: usize,
    pub total_identifiers: usize,
}

/// Drives ingest → fetch → merge for each table, strictly sequentially.
///
/// Tables are independent: a fatal ingest condition skips that table only,
/// and outputs are concatenated without cross-table deduplication.
pub struct TrafficAnalyzer<S: VideoDataSource> {
    ingestor: TabularIngestor,
    overlap: OverlapAnalyzer,
    fetcher: VideoMetadataFetcher<S>,
}

impl<S: VideoDataSource> TrafficAnalyzer<S> {
    pub fn new(fetcher: VideoMetadataFetcher<S>) -> Self {
        Self {
            ingestor: TabularIngestor::new(),
            overlap: OverlapAnalyzer::new(),
            fetcher,
        }
    }

    pub fn with_ingest_config(fetcher: VideoMetadataFetcher<S>, config: &IngestConfig) -> Self {
        Self {
            ingestor: TabularIngestor::with_warning_cap(config.max_row_warnings),
            overlap: OverlapAnalyzer::new(),
            fetcher,
        }
    }

    pub async fn analyze(
        &mut self,
        tables: &[InputTable],
        reference_url: Option<&str>,
    ) -> AnalysisResult {
        let mut result = AnalysisResult::default();

        let reference = match reference_url {
            Some(url) => {
                info!("🔗 Looking up reference video: {}", url);
                let reference = self.fetcher.fetch_reference(url).await;
                if reference.is_none() {
                    result.warnings.push(
                        "reference video lookup failed; overlap columns will be empty".to_string(),
                    );
                }
                reference
            }
            None => None,
        };

        for table in tables {
            info!("📄 Processing table: {}", table.label);

            let ingested = match self.ingestor.ingest(&table.content) {
                Ok(ingested) => ingested,
                Err(e) => {
                    warn!("⚠️ Skipping table {}: {}", table.label, e);
                    result.warnings.push(format!("{}: {}", table.label, e));
                    result.tables_failed += 1;
                    continue;
                }
            };

            info!(
                "🔍 Found {} unique video IDs in {}",
                ingested.video_ids.len(),
                table.label
            );
            result.total_identifiers += ingested.video_ids.len();
            result
                .warnings
                .extend(ingested.warnings.iter().map(|w| format!("{}: {}", table.label, w)));

            let outcome = self.fetcher.fetch(&ingested.video_ids).await;
            if outcome.from_cache {
                info!("📚 Metadata for {} served from cache", table.label);
            }
            result
                .warnings
                .extend(outcome.warnings.iter().map(|w| format!("{}: {}", table.label, w)));

            let records = merge_records(
                &ingested.video_ids,
                &ingested.metrics,
                &outcome.videos,
                &self.overlap,
                reference.as_ref(),
            );
            info!("✅ Merged {} records from {}", records.len(), table.label);
            result.records.extend(records);
            result.tables_processed += 1;
        }

        result
    }
}
