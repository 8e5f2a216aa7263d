use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::TriageError;
use crate::transform::normalize::terms;

/// Dense, L2-normalized TF-IDF vector over a fitted vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVector(Vec<f64>);

impl TermVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|w| *w == 0.0)
    }

    /// Cosine similarity; both vectors are unit length or zero.
    pub fn cosine(&self, other: &TermVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Unigram + bigram TF-IDF model with smoothed IDF, fitted once over the
/// catalog symptom descriptions.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Fits over already-normalized documents. Vocabulary order is
    /// lexicographic so feature indices do not depend on catalog order.
    pub fn fit<'a, I>(documents: I) -> Result<Self, TriageError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        let mut n_documents = 0usize;
        for document in documents {
            n_documents += 1;
            let unique: HashSet<String> = terms(document).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }
        if document_frequency.is_empty() {
            return Err(TriageError::EmptyVocabulary);
        }

        let n = n_documents as f64;
        let mut vocabulary = Vec::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (term, df) in document_frequency {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.push(term);
        }
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        Ok(Self {
            vocabulary,
            index,
            idf,
        })
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.vocabulary.get(index).map(String::as_str)
    }

    /// Vectorizes normalized text; out-of-vocabulary terms are ignored.
    pub fn transform(&self, normalized: &str) -> TermVector {
        let mut weights = vec![0.0; self.vocabulary.len()];
        for term in terms(normalized) {
            if let Some(&i) = self.index.get(&term) {
                weights[i] += 1.0;
            }
        }
        for (weight, idf) in weights.iter_mut().zip(&self.idf) {
            *weight *= idf;
        }
        let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in &mut weights {
                *weight /= norm;
            }
        }
        TermVector(weights)
    }
}
