//! Deterministic rules turning ranked candidates into care guidance.
//!
//! Condition-specific tips and warnings are chosen by case-insensitive
//! substring tests against the disease label, not by any taxonomy: a
//! disease named "Cardiac Stroke" triggers both the heart and the stroke
//! warnings.

use crate::entities::disease::Severity;
use crate::entities::prediction::PredictionCandidate;
use crate::entities::recommendation::{
    Disclaimer, OverallSeverity, Recommendation, RecommendationBundle, RecommendationUnavailable,
    SeverityAssessment,
};
use crate::transform::normalize::split_phrases;

struct TierAction {
    urgency: &'static str,
    action: &'static str,
    timeframe: &'static str,
}

const fn tier_action(severity: Severity) -> TierAction {
    match severity {
        Severity::Mild => TierAction {
            urgency: "Low Priority",
            action: "Monitor symptoms and try self-care measures",
            timeframe: "If symptoms persist for more than 3-5 days",
        },
        Severity::Moderate => TierAction {
            urgency: "Medium Priority",
            action: "Consider scheduling an appointment with healthcare provider",
            timeframe: "If symptoms persist for more than 24-48 hours or worsen",
        },
        Severity::Severe => TierAction {
            urgency: "HIGH PRIORITY",
            action: "Seek immediate medical attention",
            timeframe: "Contact healthcare provider immediately or visit emergency room",
        },
    }
}

const GENERAL_HEALTH_TIPS: [&str; 8] = [
    "💧 Stay well-hydrated by drinking plenty of water throughout the day",
    "😴 Ensure adequate rest and sleep (7-9 hours for adults)",
    "🏃‍♂️ Maintain light physical activity as tolerated",
    "🧘‍♀️ Practice stress management techniques like meditation or deep breathing",
    "🚭 Avoid smoking and limit alcohol consumption",
    "🧼 Maintain good hygiene practices",
    "🌡️ Monitor your symptoms and track any changes",
    "📱 Keep emergency contacts readily available",
];

const GENERAL_DIETARY_TIPS: [&str; 4] = [
    "🥗 Eat a balanced diet rich in fruits and vegetables",
    "💊 Consider appropriate vitamin supplements if recommended",
    "🍯 Natural remedies like honey and ginger may help with some symptoms",
    "🚫 Avoid foods that may worsen your condition",
];

const MIN_DIETARY_ITEMS: usize = 3;

const SELF_CARE_GROUPS: &[(&[&str], &[&str])] = &[
    (
        &["cold", "flu"],
        &[
            "🤧 Use a humidifier or breathe steam from a hot shower",
            "🍵 Drink warm beverages like tea with honey",
            "🧊 Gargle with warm salt water for sore throat",
        ],
    ),
    (
        &["headache", "migraine"],
        &[
            "🌑 Rest in a dark, quiet room",
            "❄️ Apply cold or warm compress to head/neck",
            "💆‍♀️ Try gentle neck and shoulder massage",
        ],
    ),
    (
        &["stomach", "gastro"],
        &[
            "🍚 Follow BRAT diet (Bananas, Rice, Applesauce, Toast)",
            "💧 Sip clear fluids frequently",
            "🌡️ Use heating pad on stomach for comfort",
        ],
    ),
];

const SEVERE_SELF_CARE: &str =
    "⚠️ Seek immediate medical attention - self-care not appropriate for severe conditions";

const GENERAL_WARNING_SIGNS: [&str; 8] = [
    "🚨 Difficulty breathing or shortness of breath",
    "🚨 Chest pain or pressure",
    "🚨 High fever (>103°F/39.4°C)",
    "🚨 Severe dehydration",
    "🚨 Persistent vomiting",
    "🚨 Severe abdominal pain",
    "🚨 Signs of infection (spreading redness, pus)",
    "🚨 Loss of consciousness or confusion",
];

const GENERAL_WARNINGS_SHOWN: usize = 5;

const CONDITION_WARNINGS: &[(&[&str], &str)] = &[
    (
        &["heart", "cardiac"],
        "🚨 Chest pain radiating to arm, jaw, or back",
    ),
    (
        &["stroke"],
        "🚨 Sudden weakness, speech difficulty, or vision problems",
    ),
    (&["asthma"], "🚨 Severe difficulty breathing or wheezing"),
    (
        &["diabetes"],
        "🚨 Extremely high or low blood sugar levels",
    ),
];

const fn followup_for(severity: Severity) -> &'static [&'static str] {
    match severity {
        Severity::Severe => &[
            "🏥 Seek immediate emergency medical care",
            "📞 Call emergency services if symptoms are life-threatening",
            "👨‍⚕️ Follow up with specialists as recommended",
        ],
        Severity::Moderate => &[
            "📅 Schedule appointment with primary care physician within 24-48 hours",
            "📊 Consider getting relevant tests or screenings",
            "📝 Keep a symptom diary to track changes",
            "💊 Follow prescribed treatment plan if applicable",
        ],
        Severity::Mild => &[
            "📋 Monitor symptoms for 3-5 days",
            "📅 Schedule routine check-up if symptoms persist",
            "📱 Consider telehealth consultation if available",
            "📖 Research reputable health information sources",
        ],
    }
}

const DISCLAIMER_TITLE: &str = "⚠️ IMPORTANT MEDICAL DISCLAIMER";
const DISCLAIMER_CONTENT: [&str; 4] = [
    "This system is for informational purposes only and does not constitute medical advice.",
    "Always consult with qualified healthcare professionals for proper diagnosis and treatment.",
    "In case of medical emergency, call your local emergency services immediately.",
    "This tool should not replace professional medical consultation, examination, or treatment.",
];

const NO_PREDICTIONS_ERROR: &str = "No predictions available to generate recommendations";
const NO_PREDICTIONS_ADVICE: &str =
    "Please consult with a healthcare provider for proper evaluation.";

fn push_unique(list: &mut Vec<String>, item: impl Into<String>) {
    let item = item.into();
    if !list.contains(&item) {
        list.push(item);
    }
}

fn name_matches(disease: &str, fragments: &[&str]) -> bool {
    let disease = disease.to_lowercase();
    fragments.iter().any(|fragment| disease.contains(fragment))
}

/// Highest severity among the candidates.
pub fn overall_severity(candidates: &[PredictionCandidate]) -> Option<Severity> {
    candidates.iter().map(|c| c.severity).max()
}

pub fn assess_severity(candidates: &[PredictionCandidate]) -> SeverityAssessment {
    match overall_severity(candidates) {
        Some(severity) => {
            let action = tier_action(severity);
            SeverityAssessment {
                overall_severity: severity.into(),
                urgency: action.urgency.to_string(),
                recommendation: action.action.to_string(),
                timeframe: Some(action.timeframe.to_string()),
            }
        }
        None => SeverityAssessment {
            overall_severity: OverallSeverity::Unknown,
            urgency: "Consult healthcare provider".to_string(),
            recommendation: "Unable to assess. Please consult a healthcare provider.".to_string(),
            timeframe: None,
        },
    }
}

pub fn lifestyle_recommendations(candidates: &[PredictionCandidate]) -> Vec<String> {
    let Some(overall) = overall_severity(candidates) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for candidate in candidates {
        for precaution in split_phrases(&candidate.precautions, ',') {
            push_unique(&mut out, format!("⚠️ {precaution}"));
        }
    }
    let general = match overall {
        Severity::Severe => 2,
        Severity::Mild | Severity::Moderate => 4,
    };
    for tip in &GENERAL_HEALTH_TIPS[..general] {
        push_unique(&mut out, *tip);
    }
    out
}

pub fn dietary_recommendations(candidates: &[PredictionCandidate]) -> Vec<String> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for candidate in candidates {
        for item in split_phrases(&candidate.diet_recommendations, ',') {
            push_unique(&mut out, format!("🍽️ {item}"));
        }
    }
    if out.len() < MIN_DIETARY_ITEMS {
        for tip in &GENERAL_DIETARY_TIPS[..2] {
            push_unique(&mut out, *tip);
        }
    }
    out
}

/// Any severe candidate replaces all condition tips with a single
/// "seek immediate medical attention" entry.
pub fn self_care_tips(candidates: &[PredictionCandidate]) -> Vec<String> {
    if candidates.iter().any(|c| c.severity == Severity::Severe) {
        return vec![SEVERE_SELF_CARE.to_string()];
    }
    let mut out = Vec::new();
    for candidate in candidates {
        for (fragments, tips) in SELF_CARE_GROUPS {
            if name_matches(&candidate.disease, fragments) {
                for tip in *tips {
                    push_unique(&mut out, *tip);
                }
            }
        }
    }
    out
}

pub fn warning_signs(candidates: &[PredictionCandidate]) -> Vec<String> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for candidate in candidates {
        for (fragments, warning) in CONDITION_WARNINGS {
            if name_matches(&candidate.disease, fragments) {
                push_unique(&mut out, *warning);
            }
        }
    }
    for warning in &GENERAL_WARNING_SIGNS[..GENERAL_WARNINGS_SHOWN] {
        push_unique(&mut out, *warning);
    }
    out
}

pub fn followup_recommendations(candidates: &[PredictionCandidate]) -> Vec<String> {
    let tier = overall_severity(candidates).unwrap_or(Severity::Mild);
    followup_for(tier).iter().map(|s| (*s).to_string()).collect()
}

pub fn disclaimer() -> Disclaimer {
    Disclaimer {
        title: DISCLAIMER_TITLE.to_string(),
        content: DISCLAIMER_CONTENT.iter().map(|s| (*s).to_string()).collect(),
    }
}

/// One-line banner keyed on the top candidate's severity.
pub fn severity_warning(candidates: &[PredictionCandidate]) -> &'static str {
    match candidates.first().map(|c| c.severity) {
        None => "No matching conditions found.",
        Some(Severity::Mild) => "💚 Low concern - Monitor symptoms and consider self-care measures.",
        Some(Severity::Moderate) => {
            "🟡 Moderate concern - Consider consulting a healthcare provider if symptoms persist or worsen."
        }
        Some(Severity::Severe) => {
            "🔴 HIGH CONCERN - Seek immediate medical attention. This could be a serious condition."
        }
    }
}

/// Derives the full recommendation for a ranked candidate list. An empty
/// list yields [`Recommendation::Unavailable`] rather than an error.
pub fn recommend(candidates: &[PredictionCandidate], input_symptoms: &str) -> Recommendation {
    if candidates.is_empty() {
        return Recommendation::Unavailable(RecommendationUnavailable {
            error: NO_PREDICTIONS_ERROR.to_string(),
            general_advice: NO_PREDICTIONS_ADVICE.to_string(),
        });
    }

    Recommendation::Bundle(Box::new(RecommendationBundle {
        input_symptoms: input_symptoms.to_string(),
        severity_assessment: assess_severity(candidates),
        lifestyle_recommendations: lifestyle_recommendations(candidates),
        dietary_recommendations: dietary_recommendations(candidates),
        self_care_tips: self_care_tips(candidates),
        warning_signs: warning_signs(candidates),
        followup_recommendations: followup_recommendations(candidates),
        disclaimer: disclaimer(),
    }))
}
