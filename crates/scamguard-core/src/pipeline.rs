//! Classification orchestration
//!
//! Per-request flow, strictly sequential: watchlist check (url/phone only)
//! -> backend call on miss -> normalize -> atomic history append ->
//! respond. A watchlist hit short-circuits the backend entirely:
//! community reports override automated scoring, and the remote call is
//! skipped before it is ever issued. No retries: a transient upstream
//! failure surfaces immediately and the caller resubmits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::adapters::{RawBackendResponse, ScamAdapter, UpstreamError};
use crate::normalize::{normalize_with, Thresholds};
use crate::store::{
    DetectionRecord, HistoryStore, StoreError, WatchlistEntry, WatchlistStore, WatchlistType,
};
use crate::{Classification, SourceType, Verdict};

/// Canonical explanation attached to watchlist short-circuit verdicts.
pub const WATCHLIST_EXPLANATION: &str = "Reported by users";

/// One inbound classification request. For image sources, `content` is the
/// OCR-extracted text; adapters never see raw bytes.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub user_id: Uuid,
    pub source_type: SourceType,
    pub content: String,
}

/// Terminal success state of a request.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    /// A reputation backend was invoked and its response normalized.
    Scored { verdict: Verdict },
    /// A community watchlist hit short-circuited the backend.
    Reported {
        verdict: Verdict,
        date_added: DateTime<Utc>,
    },
}

impl DetectionOutcome {
    pub fn verdict(&self) -> &Verdict {
        match self {
            DetectionOutcome::Scored { verdict } => verdict,
            DetectionOutcome::Reported { verdict, .. } => verdict,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("empty payload")]
    EmptyPayload,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The orchestrator. Adapters, thresholds, and stores are injected at
/// construction; nothing here reads ambient configuration.
pub struct DetectionPipeline {
    text_adapter: Box<dyn ScamAdapter>,
    url_adapter: Box<dyn ScamAdapter>,
    phone_adapter: Box<dyn ScamAdapter>,
    watchlist: Arc<dyn WatchlistStore>,
    history: Arc<dyn HistoryStore>,
    thresholds: Thresholds,
}

impl DetectionPipeline {
    pub fn new(
        text_adapter: Box<dyn ScamAdapter>,
        url_adapter: Box<dyn ScamAdapter>,
        phone_adapter: Box<dyn ScamAdapter>,
        watchlist: Arc<dyn WatchlistStore>,
        history: Arc<dyn HistoryStore>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            text_adapter,
            url_adapter,
            phone_adapter,
            watchlist,
            history,
            thresholds,
        }
    }

    /// Run one request through the pipeline. The history append happens
    /// before the verdict is returned; persistence failure fails the
    /// request even when the backend already answered.
    pub async fn classify(
        &self,
        request: DetectionRequest,
    ) -> Result<DetectionOutcome, PipelineError> {
        if request.content.trim().is_empty() {
            return Err(PipelineError::EmptyPayload);
        }

        if let Some(entry_type) = watchlist_type_for(request.source_type) {
            if let Some(hit) = self.watchlist.lookup(&request.content, entry_type).await? {
                debug!(source = %request.source_type, "watchlist hit, skipping remote backend");
                let verdict = watchlist_verdict(&hit);
                self.persist(&request, &verdict).await?;
                return Ok(DetectionOutcome::Reported {
                    verdict,
                    date_added: hit.date_added,
                });
            }
        }

        let adapter = self.adapter_for(request.source_type);
        debug!(adapter = adapter.name(), source = %request.source_type, "invoking reputation backend");
        let raw: RawBackendResponse = adapter.evaluate(&request.content).await?;

        let verdict = normalize_with(&self.thresholds, &raw);
        self.persist(&request, &verdict).await?;

        Ok(DetectionOutcome::Scored { verdict })
    }

    fn adapter_for(&self, source_type: SourceType) -> &dyn ScamAdapter {
        match source_type {
            // image payloads arrive as OCR-extracted text
            SourceType::Text | SourceType::Image => self.text_adapter.as_ref(),
            SourceType::Url => self.url_adapter.as_ref(),
            SourceType::Phone => self.phone_adapter.as_ref(),
        }
    }

    async fn persist(&self, request: &DetectionRequest, verdict: &Verdict) -> Result<(), StoreError> {
        self.history
            .append(
                request.user_id,
                DetectionRecord {
                    content: request.content.clone(),
                    result: verdict.classification,
                    explanation: verdict.explanation.clone(),
                    source_type: request.source_type,
                    date: Utc::now(),
                },
            )
            .await
    }
}

/// Text and image content has no watchlist concept; url and phone values
/// are checked against the community ledger first.
fn watchlist_type_for(source_type: SourceType) -> Option<WatchlistType> {
    match source_type {
        SourceType::Url => Some(WatchlistType::Url),
        SourceType::Phone => Some(WatchlistType::Phone),
        SourceType::Text | SourceType::Image => None,
    }
}

fn watchlist_verdict(hit: &WatchlistEntry) -> Verdict {
    let mut source_fields = serde_json::Map::new();
    source_fields.insert("dateAdded".to_string(), json!(hit.date_added));

    Verdict {
        classification: Classification::Scam,
        explanation: WATCHLIST_EXPLANATION.to_string(),
        raw_score: None,
        source_fields,
    }
}
