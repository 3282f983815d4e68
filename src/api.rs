/// YouTube Data API client and batched metadata fetching
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::cache::ResponseCache;
use crate::config::ApiConfig;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Hard upper bound on IDs per videos.list request (API constraint)
pub const MAX_BATCH_SIZE: usize = 50;

/// Minimum accepted API key length; shorter keys are rejected before any
/// network call is attempted
pub const MIN_API_KEY_LEN: usize = 20;

/// Broad content classification derived from the live-streaming fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentType {
    Live,
    LongForm,
    Unknown,
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Unknown
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentType::Live => "Live",
            ContentType::LongForm => "Long-form",
            ContentType::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Metadata fetched for a single video
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoData {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub published_at: String,
    pub view_count: u64,
    pub thumbnail_url: String,
    pub content_type: ContentType,
}

#[derive(Debug, Error)]
#[error("API key must be at least {MIN_API_KEY_LEN} characters")]
pub struct InvalidApiKey;

/// Per-batch fetch failure. Transport failures are retried with backoff;
/// an error payload from the API abandons the batch without retry.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API error: {0}")]
    Api(String),
}

/// Source of video metadata for one batch of IDs.
///
/// The production implementation is [`YouTubeClient`]; tests drive the
/// fetch loop with scripted sources.
#[async_trait]
pub trait VideoDataSource: Send + Sync {
    async fn fetch_batch(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoData>, BatchError>;
}

/// HTTP client for the YouTube Data API v3
pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
}

impl YouTubeClient {
    /// Create a client, validating the API key format up front.
    pub fn new(api_key: impl Into<String>, timeout_seconds: u64) -> Result<Self, InvalidApiKey> {
        let api_key = api_key.into();
        if api_key.trim().len() < MIN_API_KEY_LEN {
            return Err(InvalidApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl VideoDataSource for YouTubeClient {
    async fn fetch_batch(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoData>, BatchError> {
        let ids = video_ids.join(",");
        debug!("requesting metadata for {} video IDs", video_ids.len());

        let response = self
            .client
            .get(format!("{}/videos", YOUTUBE_API_BASE))
            .query(&[
                ("part", "snippet,statistics,liveStreamingDetails"),
                ("id", ids.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BatchError::Transport(e.to_string()))?;

        let body: VideoListResponse = response
            .json()
            .await
            .map_err(|e| BatchError::Transport(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(BatchError::Api(format!("{} ({})", error.message, error.code)));
        }

        let mut videos = HashMap::new();
        for item in body.items.unwrap_or_default() {
            videos.insert(item.id.clone(), video_data_from_item(item));
        }
        Ok(videos)
    }
}

fn video_data_from_item(item: VideoItem) -> VideoData {
    let broadcast_active = item
        .snippet
        .as_ref()
        .and_then(|s| s.live_broadcast_content.as_deref())
        .map(|flag| flag != "none")
        .unwrap_or(false);
    let is_live = broadcast_active || item.live_streaming_details.is_some();

    let snippet = item.snippet.unwrap_or_default();
    let view_count = item
        .statistics
        .and_then(|s| s.view_count)
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    VideoData {
        title: snippet.title,
        description: snippet.description,
        tags: snippet.tags.unwrap_or_default(),
        published_at: snippet.published_at,
        view_count,
        thumbnail_url: snippet
            .thumbnails
            .and_then(|t| t.medium)
            .map(|t| t.url)
            .unwrap_or_default(),
        content_type: if is_live {
            ContentType::Live
        } else {
            ContentType::LongForm
        },
    }
}

/// Extract a video ID from a watch-page URL by taking the `v=` parameter.
pub fn extract_watch_id(watch_url: &str) -> Option<String> {
    if let Ok(parsed) = Url::parse(watch_url) {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
    }

    // Scheme-less inputs the url crate rejects, e.g. "youtube.com/watch?v=..."
    watch_url.split_once("v=").map(|(_, rest)| {
        rest.split(['&', '#']).next().unwrap_or(rest).to_string()
    })
}

/// Result of one fetch call, with cache provenance and failure accounting
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub videos: HashMap<String, VideoData>,
    pub from_cache: bool,
    pub failed_batches: usize,
    pub warnings: Vec<String>,
}

/// Batched metadata fetcher with retry, rate-limit pacing, and caching.
///
/// Network and API failures never propagate as errors: a batch that cannot
/// be fetched leaves its IDs absent from the result and is counted in the
/// outcome's warnings.
pub struct VideoMetadataFetcher<S: VideoDataSource> {
    source: S,
    config: ApiConfig,
    cache: ResponseCache,
    reference_cache: HashMap<String, VideoData>,
}

impl<S: VideoDataSource> VideoMetadataFetcher<S> {
    pub fn new(source: S, config: ApiConfig) -> Self {
        let cache = ResponseCache::new(Duration::from_secs(config.cache_ttl_seconds));
        Self {
            source,
            config,
            cache,
            reference_cache: HashMap::new(),
        }
    }

    /// Fetch metadata for a list of video IDs, batching as needed.
    pub async fn fetch(&mut self, video_ids: &[String]) -> FetchOutcome {
        if video_ids.is_empty() {
            return FetchOutcome::default();
        }

        let key = ResponseCache::cache_key(video_ids);
        if let Some(videos) = self.cache.get(key) {
            debug!("cache hit for {} video IDs", video_ids.len());
            return FetchOutcome {
                videos,
                from_cache: true,
                ..FetchOutcome::default()
            };
        }

        let batch_size = self.config.batch_size.clamp(1, MAX_BATCH_SIZE);
        let batch_count = video_ids.len().div_ceil(batch_size);
        let mut videos = HashMap::new();
        let mut warnings = Vec::new();
        let mut failed_batches = 0;

        for (index, batch) in video_ids.chunks(batch_size).enumerate() {
            match self.fetch_batch_with_retry(batch).await {
                Ok(data) => {
                    videos.extend(data);
                    // Pace successive requests to stay under the rate limit
                    if index + 1 < batch_count {
                        sleep(Duration::from_millis(self.config.batch_pause_ms)).await;
                    }
                }
                Err(e) => {
                    warn!("batch {}/{} abandoned: {}", index + 1, batch_count, e);
                    warnings.push(format!("batch {}/{} failed: {}", index + 1, batch_count, e));
                    failed_batches += 1;
                }
            }
        }

        if failed_batches > 0 {
            warnings.push(format!(
                "{} of {} metadata batches failed",
                failed_batches, batch_count
            ));
        } else {
            // Partial results are not cached, so a later call retries the
            // failed batches instead of seeing an hour-old gap
            self.cache.insert(key, videos.clone());
        }

        FetchOutcome {
            videos,
            from_cache: false,
            failed_batches,
            warnings,
        }
    }

    /// Look up the reference video behind a watch-page URL.
    ///
    /// Cached per identifier for the lifetime of the fetcher; lookup
    /// failures degrade to `None` with a warning.
    pub async fn fetch_reference(&mut self, watch_url: &str) -> Option<VideoData> {
        let video_id = match extract_watch_id(watch_url) {
            Some(id) => id,
            None => {
                warn!("no video ID found in reference URL: {}", watch_url);
                return None;
            }
        };

        if let Some(video) = self.reference_cache.get(&video_id) {
            return Some(video.clone());
        }

        match self
            .fetch_batch_with_retry(std::slice::from_ref(&video_id))
            .await
        {
            Ok(mut videos) => match videos.remove(&video_id) {
                Some(video) => {
                    self.reference_cache.insert(video_id, video.clone());
                    Some(video)
                }
                None => {
                    warn!("reference video {} not found", video_id);
                    None
                }
            },
            Err(e) => {
                warn!("reference video lookup failed: {}", e);
                None
            }
        }
    }

    async fn fetch_batch_with_retry(
        &self,
        batch: &[String],
    ) -> Result<HashMap<String, VideoData>, BatchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..max_attempts {
            match self.source.fetch_batch(batch).await {
                Ok(videos) => return Ok(videos),
                Err(err @ BatchError::Api(_)) => return Err(err),
                Err(err) => {
                    last_error = Some(err);
                    if attempt + 1 < max_attempts {
                        let delay =
                            Duration::from_millis(self.config.backoff_base_ms) * 2u32.pow(attempt);
                        warn!(
                            "batch attempt {} failed, retrying in {:?}",
                            attempt + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BatchError::Transport("all attempts failed".to_string())))
    }
}

// --- YouTube Data API v3 response types ---

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Option<Vec<VideoItem>>,
    error: Option<ApiErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    code: u32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
    #[serde(rename = "liveStreamingDetails")]
    live_streaming_details: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    tags: Option<Vec<String>>,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
    thumbnails: Option<Thumbnails>,
    #[serde(rename = "liveBroadcastContent")]
    live_broadcast_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoStatistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}
