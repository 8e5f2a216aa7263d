use std::collections::HashMap;

use crate::entities::prediction::{PredictionCandidate, round2};

pub const SIMILARITY_WEIGHT: f64 = 0.6;
pub const CLASSIFIER_WEIGHT: f64 = 0.4;

/// Blends the two rankings: `0.6 × similarity + 0.4 × classifier`, where a
/// disease missing from one source simply gets nothing from it.
///
/// Ties keep first-seen order (similarity results are visited first), and
/// catalog fields come from the first source that produced the disease.
pub fn blend(
    similarity: Vec<PredictionCandidate>,
    classifier: Vec<PredictionCandidate>,
    top_n: usize,
) -> Vec<PredictionCandidate> {
    let mut combined: Vec<(PredictionCandidate, f64)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    let weighted = similarity
        .into_iter()
        .map(|c| (c, SIMILARITY_WEIGHT))
        .chain(classifier.into_iter().map(|c| (c, CLASSIFIER_WEIGHT)));
    for (candidate, weight) in weighted {
        let contribution = candidate.confidence * weight;
        match position.get(&candidate.disease) {
            Some(&i) => combined[i].1 += contribution,
            None => {
                position.insert(candidate.disease.clone(), combined.len());
                combined.push((candidate, contribution));
            }
        }
    }

    combined.sort_by(|a, b| b.1.total_cmp(&a.1));
    combined
        .into_iter()
        .take(top_n)
        .map(|(mut candidate, score)| {
            candidate.confidence = round2(score);
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::disease::Severity;

    fn candidate(disease: &str, confidence: f64, description: &str) -> PredictionCandidate {
        PredictionCandidate {
            disease: disease.to_string(),
            confidence,
            severity: Severity::Mild,
            description: description.to_string(),
            precautions: String::new(),
            diet_recommendations: String::new(),
            matched_symptoms: String::new(),
        }
    }

    #[test]
    fn both_sources_combine_with_fixed_weights() {
        let out = blend(
            vec![candidate("Flu", 81.67, "sim")],
            vec![candidate("Flu", 63.0, "clf")],
            3,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, round2(0.6 * 81.67 + 0.4 * 63.0));
        assert_eq!(out[0].description, "sim");
    }

    #[test]
    fn single_source_contributes_only_its_weight() {
        let out = blend(
            vec![candidate("Flu", 50.0, "")],
            vec![candidate("Migraine", 100.0, "")],
            3,
        );
        assert_eq!(out[0].disease, "Migraine");
        assert_eq!(out[0].confidence, 40.0);
        assert_eq!(out[1].disease, "Flu");
        assert_eq!(out[1].confidence, 30.0);
    }

    #[test]
    fn ties_keep_similarity_first_order() {
        let out = blend(
            vec![candidate("Flu", 40.0, "")],
            vec![candidate("Cold", 60.0, "")],
            3,
        );
        assert_eq!(out[0].disease, "Flu");
        assert_eq!(out[1].disease, "Cold");
        assert_eq!(out[0].confidence, out[1].confidence);
    }

    #[test]
    fn truncates_and_handles_empty_inputs() {
        let out = blend(
            vec![candidate("A", 90.0, ""), candidate("B", 80.0, ""), candidate("C", 70.0, "")],
            vec![candidate("D", 10.0, "")],
            2,
        );
        assert_eq!(out.len(), 2);
        assert!(blend(Vec::new(), Vec::new(), 3).is_empty());
    }
}
