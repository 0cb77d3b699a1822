use serde::{Deserialize, Serialize};

use crate::record::UNRANKED_POSITION;

/// Structured insight report produced by either synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub question: String,
    pub summary: String,
    pub top_opportunities: Vec<Opportunity>,
    pub recommended_actions: Vec<String>,
    pub estimated_impact: EstimatedImpact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub keyword: String,
    #[serde(default)]
    pub volume: u64,
    #[serde(default = "unranked", alias = "position")]
    pub current_position: u32,
    #[serde(default, alias = "asset", alias = "asset_type")]
    pub suggested_asset: String,
    #[serde(default)]
    pub notes: String,
}

fn unranked() -> u32 {
    UNRANKED_POSITION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactEstimate {
    pub method: String,
    pub total_volume_in_gaps: u64,
    pub estimated_additional_clicks_per_month: u64,
    pub confidence: String,
}

/// Either a computed estimate or a free-text note. Model replies that fit
/// neither shape are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EstimatedImpact {
    Estimate(ImpactEstimate),
    Note(String),
    Freeform(serde_json::Value),
}

/// Returned instead of a report when synthesis could not produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisFailure {
    pub error: String,
    pub raw_response: String,
}

/// Outcome of one synthesis request. Serializes as the bare report or as an
/// object carrying an `error` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Insight {
    Report(Report),
    Failed(SynthesisFailure),
}

impl Insight {
    pub fn failed(error: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Insight::Failed(SynthesisFailure {
            error: error.into(),
            raw_response: raw_response.into(),
        })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Insight::Failed(_))
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Insight::Report(report) => Some(report),
            Insight::Failed(_) => None,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_serializes_with_error_key() {
        let insight = Insight::failed("reply was not valid JSON", "sorry, I can't");
        let value = serde_json::to_value(&insight).unwrap();

        assert_eq!(
            value,
            json!({"error": "reply was not valid JSON", "raw_response": "sorry, I can't"})
        );
        assert!(insight.is_failure());
        assert!(insight.report().is_none());
    }

    #[test]
    fn impact_accepts_estimate_note_or_freeform() {
        let estimate: EstimatedImpact = serde_json::from_value(json!({
            "method": "m",
            "total_volume_in_gaps": 10,
            "estimated_additional_clicks_per_month": 0,
            "confidence": "low"
        }))
        .unwrap();
        assert!(matches!(estimate, EstimatedImpact::Estimate(_)));

        let note: EstimatedImpact = serde_json::from_value(json!("moderate")).unwrap();
        assert_eq!(note, EstimatedImpact::Note("moderate".into()));

        let other: EstimatedImpact =
            serde_json::from_value(json!({"clicks_range": [100, 400]})).unwrap();
        assert!(matches!(other, EstimatedImpact::Freeform(_)));
    }

    #[test]
    fn opportunity_tolerates_sparse_model_output() {
        let opportunity: Opportunity =
            serde_json::from_value(json!({"keyword": "ivf cost", "position": 41})).unwrap();

        assert_eq!(opportunity.current_position, 41);
        assert_eq!(opportunity.volume, 0);
        assert!(opportunity.suggested_asset.is_empty());
    }
}
