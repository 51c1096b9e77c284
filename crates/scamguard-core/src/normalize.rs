//! Verdict normalization
//!
//! Reconciles each backend's idiosyncratic response fields (risk scores on
//! different scales, boolean flags, free-text explanations) into the single
//! canonical [`Verdict`] shape. Deterministic: the same raw response always
//! yields the same verdict.

use serde_json::{json, Map, Value};

use crate::adapters::{LlmAssessment, PhoneReputation, RawBackendResponse, UrlReputation};
use crate::{Classification, Verdict};

/// Score cut-offs for the score-based backends. These are deployment
/// configuration, injected at pipeline construction.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// URL is a scam at or above this risk score (0-100 scale).
    pub url_risk: f64,
    /// Phone number is a scam at or above this fraud score (0-100 scale).
    pub phone_fraud: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            url_risk: 70.0,
            phone_fraud: 70.0,
        }
    }
}

/// Normalize a raw backend response with default thresholds.
pub fn normalize(raw: &RawBackendResponse) -> Verdict {
    normalize_with(&Thresholds::default(), raw)
}

/// Normalize a raw backend response into the canonical verdict shape.
///
/// The enum variant identifies the producing backend family, which fixes
/// the decision rule and the diagnostic fields to preserve.
pub fn normalize_with(thresholds: &Thresholds, raw: &RawBackendResponse) -> Verdict {
    match raw {
        RawBackendResponse::Generative(assessment) => from_generative(assessment),
        RawBackendResponse::UrlReputation(reputation) => from_url(thresholds, reputation),
        RawBackendResponse::PhoneReputation(reputation) => from_phone(thresholds, reputation),
    }
}

fn from_generative(assessment: &LlmAssessment) -> Verdict {
    let raw_score = assessment.risk_score.as_ref().and_then(coerce_score);
    let mut source_fields = Map::new();
    if let Some(score) = &assessment.risk_score {
        source_fields.insert("risk_score".to_string(), score.clone());
    }

    Verdict {
        classification: assessment.result,
        explanation: assessment.explanation.clone(),
        raw_score,
        source_fields,
    }
}

fn from_url(thresholds: &Thresholds, reputation: &UrlReputation) -> Verdict {
    let is_scam = reputation.risk_score >= thresholds.url_risk
        || reputation.suspicious
        || reputation.phishing;

    let explanation = format!(
        "Risk Score: {}/100, Suspicious: {}, Phishing: {}, Malicious: {}",
        reputation.risk_score, reputation.suspicious, reputation.phishing, reputation.malware
    );

    let mut source_fields = Map::new();
    source_fields.insert("risk_score".to_string(), json!(reputation.risk_score));
    source_fields.insert("suspicious".to_string(), json!(reputation.suspicious));
    source_fields.insert("phishing".to_string(), json!(reputation.phishing));
    source_fields.insert("malware".to_string(), json!(reputation.malware));
    source_fields.insert("unsafe".to_string(), json!(reputation.unsafe_site));
    source_fields.insert("domain".to_string(), json!(reputation.domain));
    source_fields.insert("server".to_string(), json!(reputation.server));
    source_fields.insert("page_title".to_string(), json!(reputation.page_title));
    source_fields.insert("country".to_string(), json!(reputation.country_code));

    Verdict {
        classification: Classification::from_flag(is_scam),
        explanation,
        raw_score: Some(reputation.risk_score),
        source_fields,
    }
}

fn from_phone(thresholds: &Thresholds, reputation: &PhoneReputation) -> Verdict {
    let is_scam = reputation.fraud_score >= thresholds.phone_fraud
        || reputation.recent_abuse
        || reputation.spammer;

    let explanation = format!(
        "Fraud Score: {}/100, Spammer: {}, Recent Abuse: {}, Active: {}, Line Type: {}, Carrier: {}",
        reputation.fraud_score,
        reputation.spammer,
        reputation.recent_abuse,
        reputation.active,
        reputation.line_type.as_deref().unwrap_or("unknown"),
        reputation.carrier.as_deref().unwrap_or("unknown"),
    );

    let mut source_fields = Map::new();
    source_fields.insert("fraud_score".to_string(), json!(reputation.fraud_score));
    source_fields.insert("spammer".to_string(), json!(reputation.spammer));
    source_fields.insert("recent_abuse".to_string(), json!(reputation.recent_abuse));
    source_fields.insert("active".to_string(), json!(reputation.active));
    source_fields.insert("line_type".to_string(), json!(reputation.line_type));
    source_fields.insert("carrier".to_string(), json!(reputation.carrier));
    source_fields.insert("country".to_string(), json!(reputation.country));
    source_fields.insert("city".to_string(), json!(reputation.city));
    source_fields.insert("do_not_call".to_string(), json!(reputation.do_not_call));
    source_fields.insert("timezone".to_string(), json!(reputation.timezone));

    Verdict {
        classification: Classification::from_flag(is_scam),
        explanation,
        raw_score: Some(reputation.fraud_score),
        source_fields,
    }
}

/// The generative classifier reports its score as a bare number or a
/// numeric string ("8", "8/10"); take the leading number either way.
fn coerce_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_reputation(risk_score: f64, suspicious: bool, phishing: bool) -> RawBackendResponse {
        RawBackendResponse::UrlReputation(UrlReputation {
            risk_score,
            suspicious,
            phishing,
            malware: false,
            unsafe_site: false,
            domain: Some("example.com".to_string()),
            server: None,
            page_title: None,
            country_code: Some("US".to_string()),
        })
    }

    fn phone_reputation(fraud_score: f64, recent_abuse: bool, spammer: bool) -> RawBackendResponse {
        RawBackendResponse::PhoneReputation(PhoneReputation {
            fraud_score,
            spammer,
            recent_abuse,
            active: true,
            line_type: Some("Wireless".to_string()),
            carrier: Some("ExampleTel".to_string()),
            country: Some("US".to_string()),
            city: None,
            do_not_call: false,
            timezone: None,
        })
    }

    #[test]
    fn test_url_threshold_boundary() {
        assert_eq!(
            normalize(&url_reputation(69.9, false, false)).classification,
            Classification::Safe
        );
        assert_eq!(
            normalize(&url_reputation(70.0, false, false)).classification,
            Classification::Scam
        );
    }

    #[test]
    fn test_url_flags_override_low_score() {
        assert_eq!(
            normalize(&url_reputation(5.0, true, false)).classification,
            Classification::Scam
        );
        assert_eq!(
            normalize(&url_reputation(5.0, false, true)).classification,
            Classification::Scam
        );
    }

    #[test]
    fn test_url_preserves_diagnostics() {
        let verdict = normalize(&url_reputation(42.0, false, false));
        assert_eq!(verdict.raw_score, Some(42.0));
        assert_eq!(verdict.source_fields["domain"], json!("example.com"));
        assert!(verdict.explanation.starts_with("Risk Score: 42/100"));
    }

    #[test]
    fn test_phone_rules() {
        assert_eq!(
            normalize(&phone_reputation(85.0, false, false)).classification,
            Classification::Scam
        );
        assert_eq!(
            normalize(&phone_reputation(10.0, true, false)).classification,
            Classification::Scam
        );
        assert_eq!(
            normalize(&phone_reputation(10.0, false, true)).classification,
            Classification::Scam
        );
        assert_eq!(
            normalize(&phone_reputation(10.0, false, false)).classification,
            Classification::Safe
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let strict = Thresholds {
            url_risk: 40.0,
            phone_fraud: 40.0,
        };
        assert_eq!(
            normalize_with(&strict, &url_reputation(45.0, false, false)).classification,
            Classification::Scam
        );
    }

    #[test]
    fn test_generative_score_coercion() {
        let assessment = LlmAssessment {
            result: Classification::Scam,
            explanation: "urgency + gift card request".to_string(),
            risk_score: Some(json!("8/10")),
        };
        let verdict = normalize(&RawBackendResponse::Generative(assessment));
        assert_eq!(verdict.raw_score, Some(8.0));
        assert_eq!(verdict.classification, Classification::Scam);
    }

    #[test]
    fn test_deterministic() {
        let raw = phone_reputation(85.0, true, false);
        assert_eq!(normalize(&raw), normalize(&raw));
    }
}
