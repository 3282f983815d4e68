/// Lexical overlap analysis against a reference video
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::api::VideoData;

/// Word and tag overlap between a video and the reference video.
///
/// Each field is a lexically sorted, comma-joined string; all fields are
/// empty when no reference video was supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverlapMetrics {
    pub common_title_words: String,
    pub common_description_words: String,
    pub common_tags: String,
    pub new_tags: String,
}

/// Compares video metadata against a reference video's metadata
pub struct OverlapAnalyzer {
    word_pattern: Regex,
}

impl OverlapAnalyzer {
    pub fn new() -> Self {
        Self {
            word_pattern: Regex::new(r"[a-zA-Z0-9]+").unwrap(),
        }
    }

    /// Compute overlap metrics for one video.
    ///
    /// Without a reference the result is all-empty. Tags are compared
    /// case-insensitively as whole strings; titles and descriptions are
    /// tokenized into lowercase alphanumeric words first.
    pub fn compare(&self, reference: Option<&VideoData>, video: &VideoData) -> OverlapMetrics {
        let reference = match reference {
            Some(reference) => reference,
            None => return OverlapMetrics::default(),
        };

        let ref_title = self.word_set(&reference.title);
        let video_title = self.word_set(&video.title);
        let ref_description = self.word_set(&reference.description);
        let video_description = self.word_set(&video.description);
        let ref_tags = tag_set(&reference.tags);
        let video_tags = tag_set(&video.tags);

        OverlapMetrics {
            common_title_words: join(ref_title.intersection(&video_title)),
            common_description_words: join(ref_description.intersection(&video_description)),
            common_tags: join(ref_tags.intersection(&video_tags)),
            new_tags: join(video_tags.difference(&ref_tags)),
        }
    }

    /// Lowercase alphanumeric word tokens; punctuation and whitespace are
    /// separators, not content
    fn word_set(&self, text: &str) -> BTreeSet<String> {
        self.word_pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }
}

impl Default for OverlapAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn tag_set(tags: &[String]) -> BTreeSet<String> {
    tags.iter().map(|tag| tag.to_lowercase()).collect()
}

fn join<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
