use serde::Deserialize;

use crate::entities::disease::{DiseaseRecord, Severity};
use crate::error::TriageError;

/// Raw catalog row as it appears in the CSV file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "Disease")]
    pub disease: String,
    #[serde(rename = "Symptoms")]
    pub symptoms: String,
    #[serde(rename = "Severity")]
    pub severity: String,
    #[serde(rename = "Precautions")]
    pub precautions: String,
    #[serde(rename = "Diet_Recommendations")]
    pub diet_recommendations: String,
    #[serde(rename = "Description")]
    pub description: String,
}

pub fn from_catalog_row(row: CatalogRow, origin: &str, line: u64) -> Result<DiseaseRecord, TriageError> {
    let malformed = |message: String| TriageError::CatalogRow {
        origin: origin.to_string(),
        line,
        message,
    };

    let disease_name = row.disease.trim().to_string();
    if disease_name.is_empty() {
        return Err(malformed("empty Disease".into()));
    }
    let symptom_description = row.symptoms.trim().to_string();
    if symptom_description.is_empty() {
        return Err(malformed(format!("empty Symptoms for '{disease_name}'")));
    }
    if row.severity.trim().is_empty() {
        return Err(malformed(format!("empty Severity for '{disease_name}'")));
    }
    let severity: Severity = row
        .severity
        .parse()
        .map_err(|err: TriageError| malformed(err.to_string()))?;

    Ok(DiseaseRecord {
        disease_name,
        symptom_description,
        severity,
        description: row.description.trim().to_string(),
        precautions: row.precautions.trim().to_string(),
        diet_recommendations: row.diet_recommendations.trim().to_string(),
    })
}
