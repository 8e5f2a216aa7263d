use serde::Serialize;

use crate::error::TriageError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, TriageError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::to_pretty;
    use crate::engine::recommend::recommend;
    use crate::entities::disease::{DiseaseRecord, Severity};
    use crate::entities::prediction::PredictionCandidate;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Demo<'a> {
        disease: &'a str,
        score: f64,
    }

    #[test]
    fn to_pretty_serializes_with_indentation() {
        let payload = Demo {
            disease: "Flu",
            score: 81.67,
        };
        let json = to_pretty(&payload).expect("json");
        assert!(json.contains('\n'));
        assert!(json.contains("\"disease\": \"Flu\""));
        assert!(json.contains("\"score\": 81.67"));
    }

    #[test]
    fn json_render_candidates_round_trip() {
        let record = DiseaseRecord {
            disease_name: "Migraine".to_string(),
            symptom_description: "headache;nausea".to_string(),
            severity: Severity::Moderate,
            description: "Recurrent headaches".to_string(),
            precautions: "Rest in dark room".to_string(),
            diet_recommendations: "Avoid caffeine".to_string(),
        };
        let candidates = vec![PredictionCandidate::from_record(&record, 55.555)];
        let json = to_pretty(&candidates).expect("json");
        assert!(json.contains("\"severity\": \"Moderate\""));
        let back: Vec<PredictionCandidate> = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, candidates);
    }

    #[test]
    fn json_render_unavailable_recommendation_has_error_key() {
        let json = to_pretty(&recommend(&[], "text")).expect("json");
        assert!(json.contains("\"error\""));
        assert!(!json.contains("severity_assessment"));
    }
}
