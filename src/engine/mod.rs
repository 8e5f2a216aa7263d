//! Hybrid symptom matcher: TF-IDF cosine similarity blended with a seeded
//! random forest, plus the rule-based recommendation deriver.

pub mod forest;
pub mod hybrid;
pub mod recommend;
pub mod similarity;
pub mod vectorizer;

use tracing::{debug, info};

use crate::entities::prediction::{PredictionCandidate, PredictionMethod};
use crate::entities::recommendation::Recommendation;
use crate::error::TriageError;
use crate::sources::catalog::Catalog;
use crate::transform::normalize::normalize_symptoms;

pub use forest::{ForestParams, RandomForest};
pub use similarity::LexicalScorer;
pub use vectorizer::{TermVector, TfIdfVectorizer};

pub const DEFAULT_TOP_N: usize = 3;

/// Classifier labels at or below this probability are dropped.
const MIN_CLASSIFIER_PROBABILITY: f64 = 0.01;

/// Read-only prediction engine. Built once from a catalog; every query
/// method takes `&self` and keeps its intermediate values local.
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Catalog,
    vectorizer: TfIdfVectorizer,
    scorer: LexicalScorer,
    forest: RandomForest,
    /// Forest label `i` is `catalog.records()[labels[i]]`; labels follow
    /// sorted disease-name order.
    labels: Vec<usize>,
}

impl Engine {
    pub fn new(catalog: Catalog) -> Result<Self, TriageError> {
        Self::build(catalog, ForestParams::default())
    }

    /// Fits the vectorizer over the catalog symptom descriptions and trains
    /// the forest with one sample per disease.
    pub fn build(catalog: Catalog, params: ForestParams) -> Result<Self, TriageError> {
        let documents: Vec<String> = catalog
            .records()
            .iter()
            .map(|r| normalize_symptoms(&r.symptom_description))
            .collect();
        let vectorizer = TfIdfVectorizer::fit(documents.iter().map(String::as_str))?;
        let vectors: Vec<TermVector> = documents.iter().map(|d| vectorizer.transform(d)).collect();

        let mut labels: Vec<usize> = (0..catalog.len()).collect();
        labels.sort_by(|a, b| {
            catalog.records()[*a]
                .disease_name
                .cmp(&catalog.records()[*b].disease_name)
        });
        let samples: Vec<Vec<f64>> = labels
            .iter()
            .map(|&record| vectors[record].as_slice().to_vec())
            .collect();
        let targets: Vec<usize> = (0..labels.len()).collect();
        let forest = RandomForest::fit(&samples, &targets, labels.len(), params)?;

        info!(
            diseases = catalog.len(),
            vocabulary = vectorizer.len(),
            trees = forest.n_trees(),
            "trained prediction engine"
        );

        Ok(Self {
            catalog,
            vectorizer,
            scorer: LexicalScorer::new(vectors),
            forest,
            labels,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.len()
    }

    pub fn n_trees(&self) -> usize {
        self.forest.n_trees()
    }

    pub fn vectorize(&self, symptoms: &str) -> TermVector {
        self.vectorizer.transform(&normalize_symptoms(symptoms))
    }

    /// Hybrid ranking. Empty or unmatched input yields an empty list.
    pub fn predict(&self, symptoms: &str, top_n: usize) -> Vec<PredictionCandidate> {
        self.predict_with(symptoms, top_n, PredictionMethod::Hybrid)
    }

    pub fn predict_with(
        &self,
        symptoms: &str,
        top_n: usize,
        method: PredictionMethod,
    ) -> Vec<PredictionCandidate> {
        let query = self.vectorize(symptoms);
        if query.is_zero() || top_n == 0 {
            debug!(method = method.label(), "no vocabulary overlap");
            return Vec::new();
        }
        let candidates = match method {
            PredictionMethod::Similarity => self.similarity_candidates(&query, top_n),
            PredictionMethod::Classifier => self.classifier_candidates(&query, top_n),
            PredictionMethod::Hybrid => hybrid::blend(
                self.similarity_candidates(&query, top_n),
                self.classifier_candidates(&query, top_n),
                top_n,
            ),
        };
        debug!(
            method = method.label(),
            top = candidates.first().map(|c| c.disease.as_str()).unwrap_or("-"),
            count = candidates.len(),
            "ranked candidates"
        );
        candidates
    }

    pub fn similarity_candidates(&self, query: &TermVector, top_n: usize) -> Vec<PredictionCandidate> {
        self.scorer
            .rank(query, top_n)
            .into_iter()
            .map(|(i, score)| PredictionCandidate::from_record(&self.catalog.records()[i], score * 100.0))
            .collect()
    }

    /// Forest ranking; an all-zero query carries no signal and yields
    /// nothing.
    pub fn classifier_candidates(&self, query: &TermVector, top_n: usize) -> Vec<PredictionCandidate> {
        if query.is_zero() {
            return Vec::new();
        }
        let mut ranked: Vec<(usize, f64)> = self
            .forest
            .predict_proba(query.as_slice())
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > MIN_CLASSIFIER_PROBABILITY)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_n);
        ranked
            .into_iter()
            .map(|(label, p)| {
                PredictionCandidate::from_record(&self.catalog.records()[self.labels[label]], p * 100.0)
            })
            .collect()
    }

    pub fn recommend(&self, candidates: &[PredictionCandidate], symptoms: &str) -> Recommendation {
        recommend::recommend(candidates, symptoms)
    }
}
