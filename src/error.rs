#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum TriageError {
    #[error("Catalog not found: {path}\n\nSet SYMTRIAGE_CATALOG or pass --catalog <path>")]
    CatalogNotFound { path: String },

    #[error("Malformed catalog row in {origin} at line {line}: {message}")]
    CatalogRow {
        origin: String,
        line: u64,
        message: String,
    },

    #[error("Duplicate disease '{name}' in catalog (line {line}, first seen at line {first_line})")]
    DuplicateDisease {
        name: String,
        first_line: u64,
        line: u64,
    },

    #[error("Classifier needs at least 2 distinct diseases, catalog has {found}")]
    InsufficientClasses { found: usize },

    #[error("Catalog symptoms produce an empty vocabulary (every term is a stop word)")]
    EmptyVocabulary,

    #[error("{entity} '{id}' not found.\n\n{suggestion}")]
    NotFound {
        entity: String,
        id: String,
        suggestion: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("History file {path} is unreadable: {message}")]
    History { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::TriageError;

    #[test]
    fn not_found_display_includes_suggestion() {
        let err = TriageError::NotFound {
            entity: "disease".to_string(),
            id: "Dengue".to_string(),
            suggestion: "Try: symtriage catalog list".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("disease 'Dengue' not found"));
        assert!(msg.contains("Try: symtriage catalog list"));
    }

    #[test]
    fn catalog_row_display_includes_origin_and_line() {
        let err = TriageError::CatalogRow {
            origin: "diseases.csv".to_string(),
            line: 7,
            message: "missing field `Severity`".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("diseases.csv"));
        assert!(msg.contains("line 7"));
        assert!(msg.contains("Severity"));
    }

    #[test]
    fn duplicate_disease_display_names_both_lines() {
        let err = TriageError::DuplicateDisease {
            name: "Flu".to_string(),
            first_line: 2,
            line: 9,
        };

        let msg = err.to_string();
        assert!(msg.contains("'Flu'"));
        assert!(msg.contains("line 9"));
        assert!(msg.contains("line 2"));
    }

    #[test]
    fn insufficient_classes_reports_count() {
        let err = TriageError::InsufficientClasses { found: 1 };
        assert!(err.to_string().contains("has 1"));
    }
}
