//! Metered features.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A metered capability gated by plan flags, rate limits, and monthly quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// AI content generation.
    ContentGeneration,

    /// Sentiment analysis of existing content.
    SentimentAnalysis,

    /// Keyword extraction from existing content.
    KeywordExtraction,

    /// Content summarization.
    Summarization,

    /// Programmatic API access (key-authenticated calls).
    ApiCall,
}

impl Feature {
    /// All metered features, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::ContentGeneration,
        Self::SentimentAnalysis,
        Self::KeywordExtraction,
        Self::Summarization,
        Self::ApiCall,
    ];

    /// Get the feature name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentGeneration => "content_generation",
            Self::SentimentAnalysis => "sentiment_analysis",
            Self::KeywordExtraction => "keyword_extraction",
            Self::Summarization => "summarization",
            Self::ApiCall => "api_call",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_serde_snake_case() {
        let json = serde_json::to_string(&Feature::SentimentAnalysis).unwrap();
        assert_eq!(json, "\"sentiment_analysis\"");
        let parsed: Feature = serde_json::from_str("\"api_call\"").unwrap();
        assert_eq!(parsed, Feature::ApiCall);
    }

    #[test]
    fn feature_all_is_exhaustive() {
        assert_eq!(Feature::ALL.len(), 5);
        for feature in Feature::ALL {
            assert_eq!(feature.to_string(), feature.as_str());
        }
    }
}
