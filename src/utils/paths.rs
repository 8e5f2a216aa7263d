use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWriteExt;

use crate::error::TriageError;

pub const CATALOG_ENV: &str = "SYMTRIAGE_CATALOG";
pub const HISTORY_ENV: &str = "SYMTRIAGE_HISTORY";

const APP_DIR: &str = "symtriage";
const HISTORY_FILE: &str = "history.jsonl";

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub fn catalog_override() -> Option<PathBuf> {
    env_path(CATALOG_ENV)
}

pub fn data_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join(APP_DIR),
        None => std::env::temp_dir().join(APP_DIR),
    }
}

/// `$SYMTRIAGE_HISTORY`, else `<data_dir>/symtriage/history.jsonl`.
pub fn history_path() -> PathBuf {
    env_path(HISTORY_ENV).unwrap_or_else(|| data_dir().join(HISTORY_FILE))
}

/// Writes `content` to a sibling temp file and renames it over `path`, so
/// readers never observe a partial file.
pub async fn write_atomic(path: &Path, content: &str) -> Result<(), TriageError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => {
            return Err(TriageError::InvalidArgument(format!(
                "Invalid output path {} (no parent directory)",
                path.display()
            )));
        }
    };
    tokio::fs::create_dir_all(&dir).await?;

    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut opened = None;
    for attempt in 0..32_u32 {
        let candidate = dir.join(format!(
            ".{stem}.{}.{}.tmp",
            std::process::id(),
            seed.saturating_add(attempt as u128)
        ));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => {
                opened = Some((candidate, file));
                break;
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    let Some((tmp_path, mut file)) = opened else {
        return Err(TriageError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "Unable to allocate temporary output file",
        )));
    };
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    drop(file);

    if let Err(err) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_path_ends_with_jsonl() {
        let path = data_dir().join(HISTORY_FILE);
        assert!(path.ends_with("symtriage/history.jsonl"));
    }

    #[tokio::test]
    async fn write_atomic_replaces_content_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested").join("out.json");
        write_atomic(&target, "[1]").await.expect("first write");
        write_atomic(&target, "[2]").await.expect("second write");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "[2]");
        let leftovers = std::fs::read_dir(target.parent().expect("parent"))
            .expect("list")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
