//! ScamGuard Core Classification Engine
//!
//! This crate provides the scam-classification pipeline: reputation
//! backend adapters, verdict normalization, the per-request orchestrator
//! with its community-watchlist short-circuit, and rolling-window
//! detection analytics. It has no web or database dependency; persistence
//! is reached through the trait seams in [`store`].

pub mod adapters;
pub mod analytics;
pub mod normalize;
pub mod pipeline;
pub mod store;

use serde::{Deserialize, Serialize};

pub use adapters::{RawBackendResponse, ScamAdapter, UpstreamError};
pub use normalize::{normalize, Thresholds};
pub use pipeline::{DetectionOutcome, DetectionPipeline, DetectionRequest, PipelineError};
pub use store::{DetectionRecord, HistoryStore, StoreError, WatchlistEntry, WatchlistStore, WatchlistType};

/// Which channel a detection request originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Text,
    Image,
    Url,
    Phone,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Text => "text",
            SourceType::Image => "image",
            SourceType::Url => "url",
            SourceType::Phone => "phone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(SourceType::Text),
            "image" => Some(SourceType::Image),
            "url" => Some(SourceType::Url),
            "phone" => Some(SourceType::Phone),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical two-valued classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Scam,
    Safe,
}

impl Classification {
    pub fn is_scam(&self) -> bool {
        matches!(self, Classification::Scam)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Scam => "scam",
            Classification::Safe => "safe",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scam" => Some(Classification::Scam),
            "safe" => Some(Classification::Safe),
            _ => None,
        }
    }

    pub fn from_flag(is_scam: bool) -> Self {
        if is_scam {
            Classification::Scam
        } else {
            Classification::Safe
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical output of any reputation backend.
///
/// Produced fresh per request and never cached. `source_fields` preserves
/// the backend's native diagnostic fields (scores, flags, carrier/domain
/// metadata) for display; `classification` and `explanation` are always
/// populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub classification: Classification,
    pub explanation: String,
    pub raw_score: Option<f64>,
    pub source_fields: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_round_trip() {
        for ty in [SourceType::Text, SourceType::Image, SourceType::Url, SourceType::Phone] {
            assert_eq!(SourceType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(SourceType::parse("carrier-pigeon"), None);
    }

    #[test]
    fn test_classification_flag() {
        assert_eq!(Classification::from_flag(true), Classification::Scam);
        assert_eq!(Classification::from_flag(false), Classification::Safe);
        assert!(Classification::Scam.is_scam());
    }
}
