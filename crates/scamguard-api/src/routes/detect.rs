//! Detection routes: check-text, check-image, check-url, check-phone,
//! history, analytics.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use scamguard_core::analytics::{self, AnalyticsSummary};
use scamguard_core::{
    Classification, DetectionOutcome, DetectionRecord, DetectionRequest, HistoryStore, SourceType,
    Verdict,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Canonical verdict wire shape.
#[derive(Serialize)]
pub struct ScamResultBody {
    pub classification: Classification,
    pub explanation: String,
    #[serde(rename = "riskScore", skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(rename = "sourceFields", skip_serializing_if = "Map::is_empty")]
    pub source_fields: Map<String, Value>,
}

impl From<&Verdict> for ScamResultBody {
    fn from(verdict: &Verdict) -> Self {
        Self {
            classification: verdict.classification,
            explanation: verdict.explanation.clone(),
            risk_score: verdict.raw_score,
            source_fields: verdict.source_fields.clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct CheckTextRequest {
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct CheckTextResponse {
    #[serde(rename = "scamResult")]
    pub scam_result: ScamResultBody,
}

pub async fn check_text(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CheckTextRequest>,
) -> Result<Json<CheckTextResponse>, ApiError> {
    let text = payload
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Text is required".to_string()))?;

    let outcome = state
        .pipeline
        .classify(DetectionRequest {
            user_id: user.id,
            source_type: SourceType::Text,
            content: text,
        })
        .await?;

    Ok(Json(CheckTextResponse {
        scam_result: outcome.verdict().into(),
    }))
}

#[derive(Serialize)]
pub struct CheckImageResponse {
    #[serde(rename = "scamResult")]
    pub scam_result: ScamResultBody,
    #[serde(rename = "extractedText")]
    pub extracted_text: String,
}

pub async fn check_image(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<CheckImageResponse>, ApiError> {
    let mut image_data = Vec::new();
    let mut file_name = String::from("image");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        if field.name() == Some("image") {
            if let Some(name) = field.file_name() {
                file_name = name.to_string();
            }
            image_data = field
                .bytes()
                .await
                .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
                .to_vec();
        }
    }

    if image_data.is_empty() {
        return Err(ApiError::Validation("Image required".to_string()));
    }

    // durable copy; losing it does not fail the detection
    if let Err(e) = state.media.upload(image_data.clone(), &file_name).await {
        warn!(error = %e, "image upload to object storage failed");
    }

    // OCR failure fails the whole request
    let extracted_text = state.ocr.recognize(&image_data).await?;

    let outcome = state
        .pipeline
        .classify(DetectionRequest {
            user_id: user.id,
            source_type: SourceType::Image,
            content: extracted_text.clone(),
        })
        .await?;

    Ok(Json(CheckImageResponse {
        scam_result: outcome.verdict().into(),
        extracted_text,
    }))
}

#[derive(Deserialize)]
pub struct CheckUrlRequest {
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct ReputationResponse {
    pub result: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    pub explanation: String,
}

pub async fn check_url(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CheckUrlRequest>,
) -> Result<Json<ReputationResponse>, ApiError> {
    let url = payload
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("URL is required".to_string()))?;

    let outcome = state
        .pipeline
        .classify(DetectionRequest {
            user_id: user.id,
            source_type: SourceType::Url,
            content: url,
        })
        .await?;

    let verdict = outcome.verdict();
    let details = match &outcome {
        DetectionOutcome::Scored { .. } => Some(verdict.source_fields.clone()),
        DetectionOutcome::Reported { .. } => None,
    };

    Ok(Json(ReputationResponse {
        result: verdict.classification,
        details,
        explanation: verdict.explanation.clone(),
    }))
}

#[derive(Deserialize)]
pub struct CheckPhoneRequest {
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
}

/// Phone checks answer in two shapes: the watchlist short-circuit form and
/// the scored reputation form.
#[derive(Serialize)]
#[serde(untagged)]
pub enum CheckPhoneResponse {
    Reported {
        result: Classification,
        reason: String,
        #[serde(rename = "dateAdded")]
        date_added: DateTime<Utc>,
    },
    Scored {
        result: Classification,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Map<String, Value>>,
        explanation: String,
    },
}

pub async fn check_phone(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CheckPhoneRequest>,
) -> Result<Json<CheckPhoneResponse>, ApiError> {
    let phone_number = payload
        .phone_number
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Phone number is required".to_string()))?;

    let outcome = state
        .pipeline
        .classify(DetectionRequest {
            user_id: user.id,
            source_type: SourceType::Phone,
            content: phone_number,
        })
        .await?;

    let response = match outcome {
        DetectionOutcome::Reported { verdict, date_added } => CheckPhoneResponse::Reported {
            result: verdict.classification,
            reason: verdict.explanation,
            date_added,
        },
        DetectionOutcome::Scored { verdict } => CheckPhoneResponse::Scored {
            result: verdict.classification,
            details: Some(verdict.source_fields),
            explanation: verdict.explanation,
        },
    };

    Ok(Json(response))
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<DetectionRecord>,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = state.history.records_for_user(user.id).await?;
    Ok(Json(HistoryResponse { history }))
}

pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let records = state.history.records_for_user(user.id).await?;
    let summary = analytics::compute(&state.config.analytics, &records);
    Ok(Json(summary))
}
