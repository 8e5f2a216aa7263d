use crate::engine::vectorizer::TermVector;

/// Cosine ranking of a query against the catalog's symptom vectors.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    documents: Vec<TermVector>,
}

impl LexicalScorer {
    pub fn new(documents: Vec<TermVector>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[TermVector] {
        &self.documents
    }

    pub fn scores(&self, query: &TermVector) -> Vec<f64> {
        self.documents.iter().map(|doc| doc.cosine(query)).collect()
    }

    /// Catalog indices with similarity > 0, best first, ties in catalog
    /// order, at most `top_n`.
    pub fn rank(&self, query: &TermVector, top_n: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self
            .scores(query)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_n);
        ranked
    }
}
