use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::entities::disease::Severity;
use crate::entities::prediction::PredictionCandidate;
use crate::entities::recommendation::Recommendation;
use crate::error::TriageError;

/// How the symptom text reached the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InputMethod {
    #[default]
    Text,
    Checklist,
    Report,
}

impl InputMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Checklist => "checklist",
            Self::Report => "report",
        }
    }
}

/// Immutable snapshot of one analysis as written to the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub input_symptoms: String,
    pub input_method: InputMethod,
    pub predictions: Vec<PredictionCandidate>,
    pub recommendations: Recommendation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<Severity>,
    pub processing_time_ms: f64,
}

const ID_LEN: usize = 12;

impl HistoryRecord {
    /// Snapshots one analysis taken at `at`. The id is the first 12 hex
    /// digits of the md5 of timestamp and input.
    pub fn new(
        at: OffsetDateTime,
        input_symptoms: &str,
        input_method: InputMethod,
        predictions: Vec<PredictionCandidate>,
        recommendations: Recommendation,
        processing_time_ms: f64,
    ) -> Result<Self, TriageError> {
        let timestamp = at.format(&Rfc3339)?;
        let digest = format!("{:x}", md5::compute(format!("{timestamp}{input_symptoms}")));
        let top = predictions.first();
        Ok(Self {
            id: digest[..ID_LEN].to_string(),
            top_prediction: top.map(|c| c.disease.clone()),
            top_confidence: top.map(|c| c.confidence),
            severity_level: top.map(|c| c.severity),
            timestamp,
            input_symptoms: input_symptoms.to_string(),
            input_method,
            predictions,
            recommendations,
            processing_time_ms,
        })
    }

    /// Parsed timestamp; `None` for a record written by hand with a bad value.
    pub fn recorded_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &Rfc3339).ok()
    }

    /// Calendar date of the timestamp, when it parses.
    pub fn date(&self) -> Option<time::Date> {
        self.recorded_at().map(|t| t.date())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomCount {
    pub symptom: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_analysis: Option<String>,
    pub avg_confidence: f64,
    pub severity_distribution: BTreeMap<String, usize>,
    pub top_symptoms: Vec<SymptomCount>,
}

const TOP_SYMPTOMS: usize = 5;

impl HistorySummary {
    /// Aggregates records given in any order; `last_analysis` is the latest timestamp.
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        let last_analysis = records
            .iter()
            .filter_map(|r| r.recorded_at().map(|at| (at, r.timestamp.as_str())))
            .max_by_key(|(at, _)| *at)
            .map(|(_, timestamp)| timestamp);

        let confidences: Vec<f64> = records.iter().filter_map(|r| r.top_confidence).collect();
        let avg_confidence = if confidences.is_empty() {
            0.0
        } else {
            crate::entities::prediction::round2(
                confidences.iter().sum::<f64>() / confidences.len() as f64,
            )
        };

        let mut severity_distribution = BTreeMap::new();
        for severity in records.iter().filter_map(|r| r.severity_level) {
            *severity_distribution
                .entry(severity.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut counts: Vec<SymptomCount> = Vec::new();
        for record in records {
            for symptom in record.input_symptoms.split(',') {
                let symptom = symptom.trim().to_lowercase();
                if symptom.is_empty() {
                    continue;
                }
                match counts.iter_mut().find(|c| c.symptom == symptom) {
                    Some(existing) => existing.count += 1,
                    None => counts.push(SymptomCount { symptom, count: 1 }),
                }
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(TOP_SYMPTOMS);

        Self {
            total_sessions: records.len(),
            last_analysis: last_analysis.map(str::to_string),
            avg_confidence,
            severity_distribution,
            top_symptoms: counts,
        }
    }
}
