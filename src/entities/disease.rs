use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TriageError;
use crate::transform::normalize::split_phrases;

/// Clinical urgency tier of a catalog disease, ordered `Mild < Moderate < Severe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Mild = 1,
    Moderate = 2,
    Severe = 3,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Self::Mild, Self::Moderate, Self::Severe];

    pub const fn priority(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TriageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            other => Err(TriageError::InvalidArgument(format!(
                "unknown severity '{other}' (expected Mild, Moderate, or Severe)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub disease_name: String,
    /// `;`-delimited symptom phrases used as the matching target.
    pub symptom_description: String,
    pub severity: Severity,
    pub description: String,
    /// `,`-delimited care actions.
    pub precautions: String,
    /// `,`-delimited dietary actions.
    pub diet_recommendations: String,
}

impl DiseaseRecord {
    pub fn symptom_phrases(&self) -> Vec<String> {
        split_phrases(&self.symptom_description, ';')
    }

    pub fn precaution_list(&self) -> Vec<String> {
        split_phrases(&self.precautions, ',')
    }

    pub fn diet_list(&self) -> Vec<String> {
        split_phrases(&self.diet_recommendations, ',')
    }
}

/// One row of `catalog list` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub disease: String,
    pub severity: Severity,
    pub symptom_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptoms_preview: Option<String>,
}

const PREVIEW_SYMPTOMS: usize = 4;

impl From<&DiseaseRecord> for CatalogEntry {
    fn from(record: &DiseaseRecord) -> Self {
        let phrases = record.symptom_phrases();
        let preview = phrases
            .iter()
            .take(PREVIEW_SYMPTOMS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            disease: record.disease_name.clone(),
            severity: record.severity,
            symptom_count: phrases.len(),
            symptoms_preview: (!preview.is_empty()).then_some(preview),
        }
    }
}
