//! Rolling-window detection analytics
//!
//! Pure read over a user's history; no side effects.

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::store::DetectionRecord;
use crate::{Classification, SourceType};

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Trailing window, in days.
    pub window_days: i64,
    /// When true, `total_scams` counts only records classified as scam.
    /// The default reproduces the legacy behavior: every in-window
    /// detection counts, regardless of classification. The field name is
    /// historical; flipping this switch is a product decision, not a bug
    /// fix.
    pub scams_only: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            scams_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub text: u32,
    pub image: u32,
    pub url: u32,
    pub phone: u32,
}

impl TypeCount {
    fn bump(&mut self, source_type: SourceType) {
        match source_type {
            SourceType::Text => self.text += 1,
            SourceType::Image => self.image += 1,
            SourceType::Url => self.url += 1,
            SourceType::Phone => self.phone += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_scams: u32,
    pub type_count: TypeCount,
    pub safety_score: u32,
}

/// Compute trailing-window analytics over a user's detection history.
///
/// `safety_score = max(100 - 5 * total, 0)`.
pub fn compute(config: &AnalyticsConfig, records: &[DetectionRecord]) -> AnalyticsSummary {
    let cutoff = Utc::now() - Duration::days(config.window_days);

    let mut type_count = TypeCount::default();
    let mut total: u32 = 0;

    for record in records.iter().filter(|r| r.date >= cutoff) {
        type_count.bump(record.source_type);
        if !config.scams_only || record.result == Classification::Scam {
            total += 1;
        }
    }

    AnalyticsSummary {
        total_scams: total,
        type_count,
        safety_score: 100u32.saturating_sub(total.saturating_mul(5)),
    }
}
