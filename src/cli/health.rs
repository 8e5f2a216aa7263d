use std::path::Path;
use std::time::Instant;

use crate::engine::Engine;
use crate::sources::catalog::Catalog;

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthRow {
    pub check: String,
    pub status: String,
    pub detail: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub healthy: usize,
    pub total: usize,
    pub rows: Vec<HealthRow>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# symtriage Health Check\n\n");
        out.push_str("| Check | Status | Detail |\n");
        out.push_str("|-------|--------|--------|\n");
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                row.check, row.status, row.detail
            ));
        }
        out.push_str(&format!(
            "\nStatus: {}/{} checks healthy\n",
            self.healthy, self.total
        ));
        out
    }
}

fn ok_row(check: String, detail: String) -> HealthRow {
    HealthRow {
        check,
        status: "ok".into(),
        detail,
    }
}

fn error_row(check: String, detail: impl std::fmt::Display) -> HealthRow {
    let detail = detail.to_string();
    HealthRow {
        check,
        status: "error".into(),
        detail: detail.lines().next().unwrap_or_default().to_string(),
    }
}

fn check_engine(catalog_path: Option<&Path>) -> Vec<HealthRow> {
    let start = Instant::now();
    let catalog = match Catalog::load(catalog_path) {
        Ok(catalog) => catalog,
        Err(err) => {
            return vec![
                error_row("Catalog".into(), err),
                error_row("Engine".into(), "catalog unavailable"),
            ];
        }
    };
    let catalog_row = ok_row(
        format!("Catalog ({})", catalog.origin()),
        format!("{} diseases, {}ms", catalog.len(), start.elapsed().as_millis()),
    );

    let start = Instant::now();
    let engine_row = match Engine::new(catalog) {
        Ok(engine) => ok_row(
            "Engine".into(),
            format!(
                "{} terms, {} trees, {}ms",
                engine.vocabulary_size(),
                engine.n_trees(),
                start.elapsed().as_millis()
            ),
        ),
        Err(err) => error_row("Engine".into(), err),
    };
    vec![catalog_row, engine_row]
}

async fn check_history_dir(history: &Path) -> HealthRow {
    let start = Instant::now();
    let dir = history
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let probe = dir.join(format!(".symtriage-healthcheck-{suffix}.tmp"));

    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&probe, b"ok").await?;
        match tokio::fs::remove_file(&probe).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
    .await;

    let check = format!("History dir ({})", dir.display());
    match result {
        Ok(()) => ok_row(check, format!("{}ms", start.elapsed().as_millis())),
        Err(err) => error_row(check, format!("{:?}", err.kind())),
    }
}

/// Loads the catalog, trains the engine, and probes the history directory
/// for writability.
pub async fn check(catalog: Option<&Path>, history: &Path, skip_history: bool) -> HealthReport {
    let mut rows = check_engine(catalog);
    if !skip_history {
        rows.push(check_history_dir(history).await);
    }
    let healthy = rows.iter().filter(|r| r.status == "ok").count();
    HealthReport {
        healthy,
        total: rows.len(),
        rows,
    }
}
