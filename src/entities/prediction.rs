use serde::{Deserialize, Serialize};

use crate::entities::disease::{DiseaseRecord, Severity};

/// A ranked disease match for one symptom query.
///
/// `confidence` is a percentage in `[0, 100]` rounded to two decimals. For
/// hybrid rankings it is a blended score, so confidences of a list do not
/// sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCandidate {
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    pub description: String,
    pub precautions: String,
    pub diet_recommendations: String,
    pub matched_symptoms: String,
}

impl PredictionCandidate {
    pub fn from_record(record: &DiseaseRecord, confidence: f64) -> Self {
        Self {
            disease: record.disease_name.clone(),
            confidence: round2(confidence),
            severity: record.severity,
            description: record.description.clone(),
            precautions: record.precautions.clone(),
            diet_recommendations: record.diet_recommendations.clone(),
            matched_symptoms: record.symptom_description.clone(),
        }
    }
}

/// Which scoring signal produced a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    #[default]
    Hybrid,
    Similarity,
    Classifier,
}

impl PredictionMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::Similarity => "similarity",
            Self::Classifier => "classifier",
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
