//! Append-only JSON-lines store of analysis snapshots.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use time::Date;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::entities::history::{HistoryRecord, HistorySummary};
use crate::error::TriageError;
use crate::utils::paths;

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$SYMTRIAGE_HISTORY` or the per-user data directory.
    pub fn open_default() -> Self {
        Self::new(paths::history_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, message: String) -> TriageError {
        TriageError::History {
            path: self.path.display().to_string(),
            message,
        }
    }

    /// Cuts an unterminated last line left by an interrupted append, so the
    /// next record starts on a line of its own.
    async fn trim_partial_tail(&self) -> Result<(), TriageError> {
        let mut file = match tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        let len = file.metadata().await?.len();
        if len == 0 {
            return Ok(());
        }
        file.seek(SeekFrom::End(-1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        if last[0] == b'\n' {
            return Ok(());
        }

        file.seek(SeekFrom::Start(0)).await?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;
        let keep = content
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |idx| idx + 1) as u64;
        file.set_len(keep).await?;
        warn!(
            path = %self.path.display(),
            dropped_bytes = len - keep,
            "dropped truncated history line before append"
        );
        Ok(())
    }

    pub async fn append(&self, record: &HistoryRecord) -> Result<(), TriageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        self.trim_partial_tail().await?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!(id = %record.id, path = %self.path.display(), "appended history record");
        Ok(())
    }

    /// Every record in write order. A missing file is an empty history.
    pub async fn all(&self) -> Result<Vec<HistoryRecord>, TriageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let complete = content.ends_with('\n');
        let lines: Vec<&str> = content.lines().collect();
        let mut records = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryRecord>(line) {
                Ok(record) => records.push(record),
                // An unterminated last line is an interrupted append.
                Err(err) if idx + 1 == lines.len() && !complete => {
                    warn!(path = %self.path.display(), line = idx + 1, "skipping truncated history line: {err}");
                }
                Err(err) => return Err(self.corrupt(format!("line {}: {err}", idx + 1))),
            }
        }
        Ok(records)
    }

    /// Most recent first, optionally only records dated on or after `since`.
    pub async fn list(
        &self,
        limit: Option<usize>,
        since: Option<Date>,
    ) -> Result<Vec<HistoryRecord>, TriageError> {
        let mut records = self.all().await?;
        records.reverse();
        if let Some(since) = since {
            records.retain(|r| r.date().is_some_and(|d| d >= since));
        }
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<HistoryRecord, TriageError> {
        let id = id.trim();
        self.all()
            .await?
            .into_iter()
            .rev()
            .find(|r| r.id == id)
            .ok_or_else(|| TriageError::NotFound {
                entity: "history record".into(),
                id: id.to_string(),
                suggestion: "Try: symtriage history list".into(),
            })
    }

    pub async fn summary(&self) -> Result<HistorySummary, TriageError> {
        Ok(HistorySummary::from_records(&self.all().await?))
    }

    /// Writes all records as a pretty JSON array; returns how many.
    pub async fn export(&self, target: &Path) -> Result<usize, TriageError> {
        let records = self.all().await?;
        let body = serde_json::to_string_pretty(&records)?;
        paths::write_atomic(target, &body).await?;
        Ok(records.len())
    }

    /// Deletes the history file; returns how many records it held. An
    /// unreadable file is removed too, counting its non-blank lines.
    pub async fn clear(&self) -> Result<usize, TriageError> {
        let count = match self.all().await {
            Ok(records) => records.len(),
            Err(TriageError::History { message, .. }) => {
                warn!(path = %self.path.display(), "clearing unreadable history: {message}");
                tokio::fs::read_to_string(&self.path)
                    .await?
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .count()
            }
            Err(err) => return Err(err),
        };
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(count),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::history::InputMethod;
    use crate::entities::recommendation::{Recommendation, RecommendationUnavailable};
    use time::OffsetDateTime;

    fn record(unix: i64, symptoms: &str) -> HistoryRecord {
        HistoryRecord::new(
            OffsetDateTime::from_unix_timestamp(unix).expect("timestamp"),
            symptoms,
            InputMethod::Text,
            Vec::new(),
            Recommendation::Unavailable(RecommendationUnavailable {
                error: "No predictions available to generate recommendations".to_string(),
                general_advice: "consult".to_string(),
            }),
            1.0,
        )
        .expect("record")
    }

    #[tokio::test]
    async fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("none.jsonl"));
        assert!(store.all().await.expect("all").is_empty());
        assert_eq!(store.clear().await.expect("clear"), 0);
    }

    #[tokio::test]
    async fn append_then_list_most_recent_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("sub").join("history.jsonl"));
        let first = record(1_700_000_000, "fever");
        let second = record(1_700_100_000, "cough");
        store.append(&first).await.expect("append");
        store.append(&second).await.expect("append");

        let listed = store.list(None, None).await.expect("list");
        assert_eq!(listed, vec![second.clone(), first.clone()]);
        assert_eq!(store.list(Some(1), None).await.expect("limit").len(), 1);
        assert_eq!(store.get(&first.id).await.expect("get"), first);
    }

    #[tokio::test]
    async fn list_filters_by_since_date() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.jsonl"));
        store.append(&record(1_600_000_000, "old")).await.expect("append");
        let recent = record(1_700_000_000, "new");
        store.append(&recent).await.expect("append");

        let since = crate::utils::date::parse_since("2023").expect("since");
        let listed = store.list(None, Some(since)).await.expect("list");
        assert_eq!(listed, vec![recent]);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.jsonl"));
        let err = store.get("abc").await.expect_err("missing");
        assert!(matches!(err, TriageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn truncated_tail_is_skipped_but_corrupt_middle_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&record(1_700_000_000, "fever")).expect("json");

        std::fs::write(&path, format!("{good}\n{{\"id\":\"tru")).expect("write");
        let store = HistoryStore::new(&path);
        assert_eq!(store.all().await.expect("all").len(), 1);

        std::fs::write(&path, format!("not json\n{good}\n")).expect("write");
        let err = store.all().await.expect_err("corrupt");
        assert!(err.to_string().contains("line 1"));
    }

    #[tokio::test]
    async fn append_after_truncated_tail_keeps_history_readable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.jsonl");
        let first = record(1_700_000_000, "fever");
        let good = serde_json::to_string(&first).expect("json");
        std::fs::write(&path, format!("{good}\n{{\"id\":\"tru")).expect("write");

        let store = HistoryStore::new(&path);
        let second = record(1_700_000_100, "cough");
        store.append(&second).await.expect("append");

        assert_eq!(store.all().await.expect("all"), vec![first, second]);
        assert!(std::fs::read_to_string(&path).expect("read").ends_with('\n'));
        assert_eq!(store.clear().await.expect("clear"), 2);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn clear_removes_unreadable_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.jsonl");
        let good = serde_json::to_string(&record(1_700_000_000, "fever")).expect("json");
        std::fs::write(&path, format!("not json\n{good}\n")).expect("write");

        let store = HistoryStore::new(&path);
        assert!(store.all().await.is_err());
        assert_eq!(store.clear().await.expect("clear"), 2);
        assert!(!path.exists());
        assert!(store.all().await.expect("all").is_empty());
    }

    #[tokio::test]
    async fn export_and_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path().join("history.jsonl"));
        store.append(&record(1_700_000_000, "fever, cough")).await.expect("append");
        store.append(&record(1_700_000_500, "fever")).await.expect("append");

        let target = dir.path().join("export.json");
        assert_eq!(store.export(&target).await.expect("export"), 2);
        let exported: Vec<HistoryRecord> =
            serde_json::from_str(&std::fs::read_to_string(&target).expect("read")).expect("parse");
        assert_eq!(exported.len(), 2);

        let summary = store.summary().await.expect("summary");
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.top_symptoms[0].symptom, "fever");

        assert_eq!(store.clear().await.expect("clear"), 2);
        assert!(store.all().await.expect("all").is_empty());
    }
}
