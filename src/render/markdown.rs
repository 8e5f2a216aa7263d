use std::sync::OnceLock;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::engine::recommend::severity_warning;
use crate::entities::disease::{CatalogEntry, DiseaseRecord};
use crate::entities::history::{HistoryRecord, HistorySummary};
use crate::entities::prediction::{PredictionCandidate, PredictionMethod};
use crate::entities::recommendation::{Recommendation, RecommendationBundle};
use crate::error::TriageError;
use crate::transform::normalize::split_phrases;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

const LIFESTYLE_SHOWN: usize = 6;
const DIETARY_SHOWN: usize = 5;
const SELF_CARE_SHOWN: usize = 4;
const WARNINGS_SHOWN: usize = 5;

#[derive(Serialize)]
struct SectionView<'a> {
    title: &'static str,
    items: &'a [String],
    hidden: usize,
}

fn section<'a>(title: &'static str, items: &'a [String], shown: usize) -> SectionView<'a> {
    let visible = items.len().min(shown);
    SectionView {
        title,
        items: &items[..visible],
        hidden: items.len() - visible,
    }
}

fn env() -> Result<&'static Environment<'static>, TriageError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("truncate", |s: String, max_chars: usize| -> String {
        if s.chars().count() <= max_chars {
            return s;
        }
        if max_chars == 0 {
            return "…".to_string();
        }
        let mut out: String = s.chars().take(max_chars).collect();
        out.truncate(out.trim_end().len());
        out.push('…');
        out
    });
    env.add_filter("pct", |v: f64| -> String { format!("{v:.2}%") });
    env.add_filter("ms", |v: f64| -> String { format!("{v:.1} ms") });
    env.add_filter("phrases", |s: String, delimiter: String| -> String {
        let delimiter = delimiter.chars().next().unwrap_or(';');
        split_phrases(&s, delimiter).join(", ")
    });
    env.add_filter("quote", |s: String| -> String { quote_arg(&s) });
    env.add_template(
        "predictions.md.j2",
        include_str!("../../templates/predictions.md.j2"),
    )?;
    env.add_template(
        "recommendations.md.j2",
        include_str!("../../templates/recommendations.md.j2"),
    )?;
    env.add_template("catalog.md.j2", include_str!("../../templates/catalog.md.j2"))?;
    env.add_template("disease.md.j2", include_str!("../../templates/disease.md.j2"))?;
    env.add_template(
        "checklist.md.j2",
        include_str!("../../templates/checklist.md.j2"),
    )?;
    env.add_template(
        "history_list.md.j2",
        include_str!("../../templates/history_list.md.j2"),
    )?;
    env.add_template(
        "history_record.md.j2",
        include_str!("../../templates/history_record.md.j2"),
    )?;
    env.add_template(
        "history_summary.md.j2",
        include_str!("../../templates/history_summary.md.j2"),
    )?;

    let _ = ENV.set(env);
    Ok(ENV
        .get()
        .expect("ENV should be initialized by the time this is reached"))
}

fn quote_arg(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        return String::new();
    }
    if v.chars().any(|c| c.is_whitespace()) {
        return format!("\"{}\"", v.replace('\"', "\\\""));
    }
    v.to_string()
}

fn format_related(related: Vec<String>) -> String {
    related
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| format!("`symtriage {v}`"))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn related_predictions(candidates: &[PredictionCandidate]) -> Vec<String> {
    candidates
        .iter()
        .take(2)
        .map(|c| format!("catalog get {}", quote_arg(&c.disease)))
        .collect()
}

fn related_disease(record: &DiseaseRecord) -> Vec<String> {
    let symptoms = record.symptom_phrases();
    if symptoms.is_empty() {
        return Vec::new();
    }
    vec![format!("predict {}", quote_arg(&symptoms.join(", ")))]
}

fn join_blocks(blocks: &[String]) -> String {
    let mut out = String::new();
    for block in blocks {
        let block = block.trim_end();
        if block.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(block);
    }
    out.push('\n');
    out
}

pub fn predictions_markdown(
    symptoms: &str,
    method: PredictionMethod,
    candidates: &[PredictionCandidate],
) -> Result<String, TriageError> {
    let tmpl = env()?.get_template("predictions.md.j2")?;
    Ok(tmpl.render(context! {
        symptoms => symptoms.trim(),
        method => method.label(),
        warning => severity_warning(candidates),
        candidates => candidates,
        related => format_related(related_predictions(candidates)),
    })?)
}

pub fn recommendation_markdown(recommendation: &Recommendation) -> Result<String, TriageError> {
    let tmpl = env()?.get_template("recommendations.md.j2")?;
    let body = match recommendation {
        Recommendation::Unavailable(unavailable) => tmpl.render(context! {
            unavailable => unavailable,
        })?,
        Recommendation::Bundle(bundle) => {
            let bundle: &RecommendationBundle = bundle;
            let sections: Vec<SectionView<'_>> = [
                section("Lifestyle", &bundle.lifestyle_recommendations, LIFESTYLE_SHOWN),
                section("Diet", &bundle.dietary_recommendations, DIETARY_SHOWN),
                section("Self-Care", &bundle.self_care_tips, SELF_CARE_SHOWN),
                section("Warning Signs", &bundle.warning_signs, WARNINGS_SHOWN),
                section(
                    "Follow-Up",
                    &bundle.followup_recommendations,
                    bundle.followup_recommendations.len(),
                ),
            ]
            .into_iter()
            .filter(|s| !s.items.is_empty())
            .collect();
            tmpl.render(context! {
                bundle => bundle,
                sections => sections,
            })?
        }
    };
    Ok(body)
}

/// Predictions followed by recommendations, plus a note when the analysis
/// was saved.
pub fn analysis_markdown(
    symptoms: &str,
    method: PredictionMethod,
    candidates: &[PredictionCandidate],
    recommendation: &Recommendation,
    saved: Option<&HistoryRecord>,
) -> Result<String, TriageError> {
    let mut blocks = vec![
        predictions_markdown(symptoms, method, candidates)?,
        recommendation_markdown(recommendation)?,
    ];
    if let Some(record) = saved {
        blocks.push(format!(
            "Saved as `{}`. View again with `symtriage history show {}`.",
            record.id, record.id
        ));
    }
    Ok(join_blocks(&blocks))
}

pub fn catalog_markdown(origin: &str, entries: &[CatalogEntry]) -> Result<String, TriageError> {
    let tmpl = env()?.get_template("catalog.md.j2")?;
    Ok(tmpl.render(context! {
        origin => origin,
        count => entries.len(),
        entries => entries,
    })?)
}

pub fn disease_markdown(record: &DiseaseRecord) -> Result<String, TriageError> {
    let tmpl = env()?.get_template("disease.md.j2")?;
    Ok(tmpl.render(context! {
        name => &record.disease_name,
        severity => record.severity.as_str(),
        description => record.description.trim(),
        symptoms => record.symptom_phrases(),
        precautions => record.precaution_list(),
        diet => record.diet_list(),
        related => format_related(related_disease(record)),
    })?)
}

pub fn checklist_markdown(symptoms: &[&str]) -> Result<String, TriageError> {
    let tmpl = env()?.get_template("checklist.md.j2")?;
    Ok(tmpl.render(context! {
        symptoms => symptoms,
        example => symptoms.iter().take(3).collect::<Vec<_>>(),
    })?)
}

pub fn history_list_markdown(
    records: &[HistoryRecord],
    since: Option<&str>,
) -> Result<String, TriageError> {
    let tmpl = env()?.get_template("history_list.md.j2")?;
    Ok(tmpl.render(context! {
        records => records,
        since => since,
    })?)
}

pub fn history_record_markdown(record: &HistoryRecord) -> Result<String, TriageError> {
    let header = env()?
        .get_template("history_record.md.j2")?
        .render(context! { r => record })?;
    let method = PredictionMethod::Hybrid;
    Ok(join_blocks(&[
        header,
        predictions_markdown(&record.input_symptoms, method, &record.predictions)?,
        recommendation_markdown(&record.recommendations)?,
    ]))
}

pub fn history_summary_markdown(summary: &HistorySummary) -> Result<String, TriageError> {
    let tmpl = env()?.get_template("history_summary.md.j2")?;
    Ok(tmpl.render(context! { s => summary })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recommend::recommend;
    use crate::entities::checklist::CHECKLIST_SYMPTOMS;
    use crate::entities::disease::Severity;
    use crate::entities::history::InputMethod;

    fn flu() -> DiseaseRecord {
        DiseaseRecord {
            disease_name: "Flu".to_string(),
            symptom_description: "fever;cough;chills;fatigue".to_string(),
            severity: Severity::Moderate,
            description: "Influenza viral infection".to_string(),
            precautions: "Bed rest, avoid contact with others".to_string(),
            diet_recommendations: "Light meals, plenty of fluids".to_string(),
        }
    }

    fn common_cold() -> DiseaseRecord {
        DiseaseRecord {
            disease_name: "Common Cold".to_string(),
            symptom_description: "fever;runny nose;cough".to_string(),
            severity: Severity::Mild,
            description: "Upper respiratory infection".to_string(),
            precautions: "Rest, stay hydrated".to_string(),
            diet_recommendations: "Warm fluids".to_string(),
        }
    }

    fn candidates() -> Vec<PredictionCandidate> {
        vec![
            PredictionCandidate::from_record(&flu(), 71.2),
            PredictionCandidate::from_record(&common_cold(), 18.456),
        ]
    }

    #[test]
    fn quote_arg_wraps_whitespace_and_escapes_quotes() {
        assert_eq!(quote_arg("Flu"), "Flu");
        assert_eq!(quote_arg("Common Cold"), "\"Common Cold\"");
        assert_eq!(quote_arg("say \"ah\""), "\"say \\\"ah\\\"\"");
    }

    #[test]
    fn predictions_markdown_lists_ranked_table_and_warning() {
        let markdown =
            predictions_markdown("fever, cough", PredictionMethod::Hybrid, &candidates()).expect("md");
        assert!(markdown.contains("# Predictions: fever, cough"));
        assert!(markdown.contains("| 1 | Flu | 71.20% | Moderate |"));
        assert!(markdown.contains("| 2 | Common Cold | 18.46% | Mild |"));
        assert!(markdown.contains("🟡 Moderate concern"));
        assert!(markdown.contains("Catalog symptoms: fever, cough, chills, fatigue"));
        assert!(markdown.contains("`symtriage catalog get \"Common Cold\"`"));
    }

    #[test]
    fn predictions_markdown_without_candidates_explains_no_match() {
        let markdown = predictions_markdown("zzz", PredictionMethod::Similarity, &[]).expect("md");
        assert!(markdown.contains("No matching conditions found."));
        assert!(markdown.contains("No catalog disease shares terms"));
        assert!(markdown.contains("Method: similarity"));
    }

    #[test]
    fn recommendation_markdown_truncates_long_sections() {
        let rec = recommend(&candidates(), "fever, cough");
        let markdown = recommendation_markdown(&rec).expect("md");
        assert!(markdown.contains("- Overall severity: Moderate"));
        assert!(markdown.contains("## Lifestyle"));
        assert!(markdown.contains("- ⚠️ Bed rest"));
        // 4 precautions + 4 general tips, 6 shown
        assert!(markdown.contains("...and 2 more"));
        assert!(markdown.contains("## ⚠️ IMPORTANT MEDICAL DISCLAIMER"));
        assert!(markdown.contains("> This system is for informational purposes only"));
    }

    #[test]
    fn recommendation_markdown_unavailable_shape() {
        let rec = recommend(&[], "nothing");
        let markdown = recommendation_markdown(&rec).expect("md");
        assert!(markdown.contains("No predictions available to generate recommendations"));
        assert!(!markdown.contains("Severity Assessment"));
    }

    #[test]
    fn catalog_and_disease_markdown() {
        let records = [flu(), common_cold()];
        let entries: Vec<CatalogEntry> = records.iter().map(CatalogEntry::from).collect();
        let markdown = catalog_markdown("test.csv", &entries).expect("md");
        assert!(markdown.contains("Source: test.csv (2 diseases)"));
        assert!(markdown.contains("| Common Cold | Mild | 3 | fever, runny nose, cough |"));

        let markdown = disease_markdown(&flu()).expect("md");
        assert!(markdown.contains("# Flu"));
        assert!(markdown.contains("- avoid contact with others"));
        assert!(markdown.contains("`symtriage predict \"fever, cough, chills, fatigue\"`"));
    }

    #[test]
    fn checklist_markdown_numbers_every_symptom() {
        let markdown = checklist_markdown(&CHECKLIST_SYMPTOMS).expect("md");
        assert!(markdown.contains("1. fever"));
        assert!(markdown.contains("18. skin rash"));
        assert!(markdown.contains("--symptom fever --symptom cough --symptom headache"));
    }

    #[test]
    fn history_markdown_renders_list_record_and_summary() {
        let record = HistoryRecord::new(
            time::OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("ts"),
            "fever, cough",
            InputMethod::Text,
            candidates(),
            recommend(&candidates(), "fever, cough"),
            2.5,
        )
        .expect("record");

        let list = history_list_markdown(std::slice::from_ref(&record), Some("2023-01-01"))
            .expect("list");
        assert!(list.contains(&format!("| {} |", record.id)));
        assert!(list.contains("71.20%"));
        assert!(list.contains("Since 2023-01-01."));

        let empty = history_list_markdown(&[], None).expect("empty");
        assert!(empty.contains("No saved analyses."));

        let detail = history_record_markdown(&record).expect("detail");
        assert!(detail.contains(&format!("# Analysis {}", record.id)));
        assert!(detail.contains("Top prediction: Flu (71.20%, Moderate)"));
        assert!(detail.contains("## Severity Assessment"));

        let summary = HistorySummary::from_records(&[record]);
        let markdown = history_summary_markdown(&summary).expect("summary");
        assert!(markdown.contains("- Sessions: 1"));
        assert!(markdown.contains("| Moderate | 1 |"));
        assert!(markdown.contains("| fever | 1 |"));
    }
}
