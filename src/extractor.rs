/// Video identifier extraction from analytics traffic-source values
use regex::Regex;

/// Prefix used by YouTube Analytics for suggested-video traffic sources
pub const RELATED_PREFIX: &str = "YT_RELATED.";

/// Extracts and validates video identifiers from traffic-source cells
pub struct TrafficSourceExtractor {
    id_pattern: Regex,
}

impl TrafficSourceExtractor {
    pub fn new() -> Self {
        Self {
            id_pattern: Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap(),
        }
    }

    /// Extract a video ID from a `YT_RELATED.{video_id}` traffic-source value.
    ///
    /// Returns `None` for any other prefix or for tokens that are not a valid
    /// 11-character video ID. Malformed input is never an error, only absence.
    pub fn extract(&self, traffic_source: &str) -> Option<String> {
        let token = traffic_source.strip_prefix(RELATED_PREFIX)?;
        if self.id_pattern.is_match(token) {
            Some(token.to_string())
        } else {
            None
        }
    }

    /// Check whether a token has the shape of a video ID (11 chars of `[A-Za-z0-9_-]`)
    pub fn is_valid_id(&self, token: &str) -> bool {
        self.id_pattern.is_match(token)
    }
}

impl Default for TrafficSourceExtractor {
    fn default() -> Self {
        Self::new()
    }
}
