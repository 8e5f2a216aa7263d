use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::disease::Severity;

/// Overall severity of an analysis; `Unknown` when there was nothing to assess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallSeverity {
    Mild,
    Moderate,
    Severe,
    Unknown,
}

impl OverallSeverity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::Unknown => "Unknown",
        }
    }

    pub const fn tier(self) -> Option<Severity> {
        match self {
            Self::Mild => Some(Severity::Mild),
            Self::Moderate => Some(Severity::Moderate),
            Self::Severe => Some(Severity::Severe),
            Self::Unknown => None,
        }
    }
}

impl From<Severity> for OverallSeverity {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Mild => Self::Mild,
            Severity::Moderate => Self::Moderate,
            Severity::Severe => Self::Severe,
        }
    }
}

impl fmt::Display for OverallSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityAssessment {
    pub overall_severity: OverallSeverity,
    pub urgency: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclaimer {
    pub title: String,
    pub content: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub input_symptoms: String,
    pub severity_assessment: SeverityAssessment,
    pub lifestyle_recommendations: Vec<String>,
    pub dietary_recommendations: Vec<String>,
    pub self_care_tips: Vec<String>,
    pub warning_signs: Vec<String>,
    pub followup_recommendations: Vec<String>,
    pub disclaimer: Disclaimer,
}

/// Returned instead of a bundle when there were no candidates to work from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationUnavailable {
    pub error: String,
    pub general_advice: String,
}

/// Output of the recommendation deriver.
///
/// Serialized untagged: a full bundle carries `severity_assessment`, the
/// unavailable shape carries `error`, so JSON consumers can branch on keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recommendation {
    Bundle(Box<RecommendationBundle>),
    Unavailable(RecommendationUnavailable),
}

impl Recommendation {
    pub fn bundle(&self) -> Option<&RecommendationBundle> {
        match self {
            Self::Bundle(bundle) => Some(&**bundle),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
