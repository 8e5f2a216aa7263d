use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use rust_embed::RustEmbed;
use tracing::{debug, info};

use crate::entities::disease::{CatalogEntry, DiseaseRecord};
use crate::error::TriageError;
use crate::transform::catalog::{CatalogRow, from_catalog_row};

#[derive(RustEmbed)]
#[folder = "data/"]
struct EmbeddedData;

pub const DEFAULT_CATALOG_FILE: &str = "diseases.csv";

/// The fixed disease reference table, read-only after load.
#[derive(Debug, Clone)]
pub struct Catalog {
    origin: String,
    records: Vec<DiseaseRecord>,
}

impl Catalog {
    /// Loads `path` when given, otherwise `$SYMTRIAGE_CATALOG`, otherwise the
    /// catalog compiled into the binary.
    pub fn load(path: Option<&Path>) -> Result<Self, TriageError> {
        if let Some(path) = path {
            return Self::from_path(path);
        }
        match crate::utils::paths::catalog_override() {
            Some(path) => Self::from_path(&path),
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self, TriageError> {
        let Some(asset) = EmbeddedData::get(DEFAULT_CATALOG_FILE) else {
            return Err(TriageError::CatalogNotFound {
                path: format!("<embedded>/{DEFAULT_CATALOG_FILE}"),
            });
        };
        let bytes: Cow<'static, [u8]> = asset.data;
        Self::from_reader(bytes.as_ref(), &format!("<embedded>/{DEFAULT_CATALOG_FILE}"))
    }

    pub fn from_path(path: &Path) -> Result<Self, TriageError> {
        let file = std::fs::File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => TriageError::CatalogNotFound {
                path: path.display().to_string(),
            },
            _ => TriageError::Io(err),
        })?;
        Self::from_reader(file, &path.display().to_string())
    }

    /// Parses CSV with the `Disease, Symptoms, Severity, Precautions,
    /// Diet_Recommendations, Description` header. Any malformed row aborts
    /// the whole load.
    pub fn from_reader<R: Read>(reader: R, origin: &str) -> Result<Self, TriageError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut records = Vec::new();
        let mut seen: HashMap<String, u64> = HashMap::new();
        for (idx, raw) in csv_reader.records().enumerate() {
            let raw = raw.map_err(|err| TriageError::CatalogRow {
                origin: origin.to_string(),
                line: err.position().map(|p| p.line()).unwrap_or(idx as u64 + 2),
                message: err.to_string(),
            })?;
            let line = raw.position().map(|p| p.line()).unwrap_or(idx as u64 + 2);
            let row: CatalogRow =
                raw.deserialize(Some(&headers))
                    .map_err(|err| TriageError::CatalogRow {
                        origin: origin.to_string(),
                        line,
                        message: err.to_string(),
                    })?;
            let record = from_catalog_row(row, origin, line)?;

            let key = name_key(&record.disease_name);
            if let Some(first_line) = seen.get(&key) {
                return Err(TriageError::DuplicateDisease {
                    name: record.disease_name,
                    first_line: *first_line,
                    line,
                });
            }
            seen.insert(key, line);
            debug!(line, disease = %record.disease_name, "catalog row");
            records.push(record);
        }

        info!(origin, diseases = records.len(), "loaded disease catalog");
        Ok(Self {
            origin: origin.to_string(),
            records,
        })
    }

    /// Builds a catalog from records already in memory, applying the same
    /// duplicate-name rule as file loading.
    pub fn from_records(records: Vec<DiseaseRecord>) -> Result<Self, TriageError> {
        let mut seen: HashMap<String, u64> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            let position = idx as u64 + 1;
            if let Some(first) = seen.insert(name_key(&record.disease_name), position) {
                return Err(TriageError::DuplicateDisease {
                    name: record.disease_name.clone(),
                    first_line: first,
                    line: position,
                });
            }
        }
        Ok(Self {
            origin: "<memory>".to_string(),
            records,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn records(&self) -> &[DiseaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive lookup by disease name.
    pub fn get(&self, name: &str) -> Option<&DiseaseRecord> {
        let key = name_key(name);
        self.records.iter().find(|r| name_key(&r.disease_name) == key)
    }

    pub fn find(&self, name: &str) -> Result<&DiseaseRecord, TriageError> {
        self.get(name).ok_or_else(|| TriageError::NotFound {
            entity: "disease".into(),
            id: name.trim().to_string(),
            suggestion: "Try: symtriage catalog list".into(),
        })
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.records.iter().map(CatalogEntry::from).collect()
    }
}

/// Case-folded name used for duplicate detection and lookup.
fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
