//! Command-line surface: argument parsing and command dispatch.

pub mod health;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::engine::{DEFAULT_TOP_N, Engine};
use crate::entities::checklist::{CHECKLIST_SYMPTOMS, join_selected};
use crate::entities::history::{HistoryRecord, InputMethod};
use crate::entities::prediction::{PredictionCandidate, PredictionMethod};
use crate::error::TriageError;
use crate::render::{json, markdown};
use crate::sources::catalog::Catalog;
use crate::sources::history::HistoryStore;

const MAX_TOP_N: usize = 10;
const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Parser, Debug)]
#[command(
    name = "symtriage",
    version,
    about = "Symptom triage: rank catalog diseases for reported symptoms and derive care guidance",
    after_help = "Informational aid only. Not a substitute for professional medical advice."
)]
pub struct Cli {
    /// Emit JSON instead of Markdown.
    #[arg(long, global = true)]
    pub json: bool,

    /// Disease catalog CSV (default: $SYMTRIAGE_CATALOG, then the built-in catalog).
    #[arg(long, global = true, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank catalog diseases for free-text symptoms
    Predict {
        /// Symptoms, e.g. `fever, cough, chills`
        #[arg(required = true, num_args = 1..)]
        symptoms: Vec<String>,
        /// Number of candidates (1-10)
        #[arg(short = 'n', long = "top", default_value_t = DEFAULT_TOP_N)]
        top: usize,
        #[arg(long, value_enum, default_value_t = PredictionMethod::Hybrid)]
        method: PredictionMethod,
    },
    /// Derive recommendations from a JSON candidate list (`predict --json` output)
    Recommend {
        /// JSON file, or `-` for stdin
        #[arg(long, value_name = "FILE")]
        from: String,
        /// Original symptom text to echo in the bundle
        #[arg(long)]
        symptoms: Option<String>,
    },
    /// Predict and recommend in one step
    Analyze {
        /// Free-text symptoms
        symptoms: Vec<String>,
        /// Checklist selection, repeatable (see `symtriage checklist`)
        #[arg(long = "symptom", value_name = "SYMPTOM")]
        selected: Vec<String>,
        /// Number of candidates (1-10)
        #[arg(short = 'n', long = "top", default_value_t = DEFAULT_TOP_N)]
        top: usize,
        /// How the symptoms were collected (default: checklist when only --symptom is given)
        #[arg(long = "method-tag", value_enum)]
        method_tag: Option<InputMethod>,
        /// Append the analysis to the history file
        #[arg(long)]
        save: bool,
    },
    /// Show the common-symptom checklist
    Checklist,
    /// Browse the disease catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Saved analyses
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Check catalog loading, engine training, and the history directory
    Health {
        /// Skip the history directory write probe
        #[arg(long)]
        skip_history: bool,
    },
    /// Print the version
    Version,
    /// Run the MCP server over stdio
    Mcp,
    /// Alias for `mcp`
    Serve,
    /// Run the MCP server over HTTP (SSE)
    ServeHttp {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List every disease with severity and a symptom preview
    List,
    /// Show one disease
    Get {
        /// Disease name (case-insensitive)
        name: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Most recent analyses first
    List {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
        /// Only analyses on or after YYYY, YYYY-MM, or YYYY-MM-DD
        #[arg(long)]
        since: Option<String>,
    },
    /// Show one saved analysis
    Show { id: String },
    /// Aggregate statistics over all saved analyses
    Summary,
    /// Write all saved analyses to a JSON file
    Export { path: PathBuf },
    /// Delete all saved analyses
    Clear,
}

impl Commands {
    fn needs_engine(&self) -> bool {
        matches!(
            self,
            Self::Predict { .. } | Self::Analyze { .. } | Self::Catalog { .. }
        )
    }
}

/// Engine and history store shared by every command in a process.
#[derive(Debug)]
pub struct AppContext {
    engine: Engine,
    history: HistoryStore,
}

impl AppContext {
    pub fn new(engine: Engine, history: HistoryStore) -> Self {
        Self { engine, history }
    }

    /// Loads the catalog, trains the engine, and opens the default history
    /// store.
    pub fn load(catalog: Option<&Path>) -> Result<Self, TriageError> {
        let engine = Engine::new(Catalog::load(catalog)?)?;
        Ok(Self::new(engine, HistoryStore::open_default()))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }
}

pub fn overview() -> &'static str {
    include_str!("../../templates/overview.md")
}

fn validate_top_n(top: usize) -> Result<usize, TriageError> {
    if (1..=MAX_TOP_N).contains(&top) {
        Ok(top)
    } else {
        Err(TriageError::InvalidArgument(format!(
            "-n must be between 1 and {MAX_TOP_N} (got {top})"
        )))
    }
}

fn join_words(words: &[String]) -> String {
    words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateInput {
    List(Vec<PredictionCandidate>),
    Analysis {
        predictions: Vec<PredictionCandidate>,
        #[serde(default)]
        input_symptoms: Option<String>,
    },
}

fn parse_candidates(text: &str) -> Result<(Vec<PredictionCandidate>, Option<String>), TriageError> {
    let input: CandidateInput = serde_json::from_str(text)?;
    Ok(match input {
        CandidateInput::List(list) => (list, None),
        CandidateInput::Analysis {
            predictions,
            input_symptoms,
        } => (predictions, input_symptoms),
    })
}

async fn read_input(from: &str) -> Result<String, TriageError> {
    if from.trim() == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }
    Ok(tokio::fs::read_to_string(from).await?)
}

fn run_standalone(cli: &Cli) -> Option<anyhow::Result<String>> {
    let json_output = cli.json;
    let out = match &cli.command {
        Commands::Version => {
            let version = format!("symtriage {}", env!("CARGO_PKG_VERSION"));
            if json_output {
                json::to_pretty(&serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }))
            } else {
                Ok(version)
            }
        }
        Commands::Checklist => {
            if json_output {
                json::to_pretty(&CHECKLIST_SYMPTOMS)
            } else {
                markdown::checklist_markdown(&CHECKLIST_SYMPTOMS)
            }
        }
        Commands::Recommend { .. }
        | Commands::History { .. }
        | Commands::Health { .. }
        | Commands::Predict { .. }
        | Commands::Analyze { .. }
        | Commands::Catalog { .. }
        | Commands::Mcp
        | Commands::Serve
        | Commands::ServeHttp { .. } => return None,
    };
    Some(out.map_err(anyhow::Error::from))
}

/// Runs a parsed command, building the engine only when the command needs
/// it.
///
/// # Errors
///
/// Returns an error when the catalog cannot be loaded, arguments are
/// invalid, or rendering fails.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    if let Some(out) = run_standalone(&cli) {
        return out;
    }
    if cli.command.needs_engine() {
        let ctx = AppContext::load(cli.catalog.as_deref())?;
        return run_with(cli, &ctx).await;
    }

    let history = HistoryStore::open_default();
    run_without_engine(cli, &history).await
}

/// Parses `args` (program name first) and runs the command against an
/// existing context. Help and version requests render as output.
///
/// # Errors
///
/// Returns an error for unparseable arguments or a failing command.
pub async fn execute_with(args: Vec<String>, ctx: &AppContext) -> anyhow::Result<String> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                return Ok(err.to_string());
            }
            _ => return Err(anyhow::anyhow!(err.to_string())),
        },
    };
    if cli.catalog.is_some() && cli.command.needs_engine() {
        let engine = Engine::new(Catalog::load(cli.catalog.as_deref())?)?;
        let scoped = AppContext::new(engine, ctx.history.clone());
        return run_with(cli, &scoped).await;
    }
    run_with(cli, ctx).await
}

/// Runs a parsed command against `ctx`.
///
/// # Errors
///
/// Returns an error when arguments are invalid or a command fails.
pub async fn run_with(cli: Cli, ctx: &AppContext) -> anyhow::Result<String> {
    if let Some(out) = run_standalone(&cli) {
        return out;
    }
    let json_output = cli.json;
    match cli.command {
        Commands::Predict {
            symptoms,
            top,
            method,
        } => {
            let top = validate_top_n(top)?;
            let text = join_words(&symptoms);
            let candidates = ctx.engine.predict_with(&text, top, method);
            if json_output {
                Ok(json::to_pretty(&candidates)?)
            } else {
                Ok(markdown::predictions_markdown(&text, method, &candidates)?)
            }
        }
        Commands::Analyze {
            symptoms,
            selected,
            top,
            method_tag,
            save,
        } => {
            let top = validate_top_n(top)?;
            let free_text = join_words(&symptoms);
            let checklist = join_selected(&selected);
            let text = [free_text.as_str(), checklist.as_str()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            if text.is_empty() {
                return Err(TriageError::InvalidArgument(
                    "analyze needs symptoms: pass text or one or more --symptom".into(),
                )
                .into());
            }
            let input_method = method_tag.unwrap_or(if free_text.is_empty() {
                InputMethod::Checklist
            } else {
                InputMethod::Text
            });

            let start = Instant::now();
            let candidates = ctx.engine.predict(&text, top);
            let recommendation = ctx.engine.recommend(&candidates, &text);
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            let record = HistoryRecord::new(
                OffsetDateTime::now_utc(),
                &text,
                input_method,
                candidates,
                recommendation,
                elapsed_ms,
            )?;
            if save {
                ctx.history.append(&record).await?;
                info!(id = %record.id, "saved analysis");
            }
            if json_output {
                Ok(json::to_pretty(&record)?)
            } else {
                Ok(markdown::analysis_markdown(
                    &text,
                    PredictionMethod::Hybrid,
                    &record.predictions,
                    &record.recommendations,
                    save.then_some(&record),
                )?)
            }
        }
        Commands::Catalog { command } => {
            let catalog = ctx.engine.catalog();
            match command {
                CatalogCommand::List => {
                    let entries = catalog.entries();
                    if json_output {
                        Ok(json::to_pretty(&entries)?)
                    } else {
                        Ok(markdown::catalog_markdown(catalog.origin(), &entries)?)
                    }
                }
                CatalogCommand::Get { name } => {
                    let record = catalog.find(&join_words(&name))?;
                    if json_output {
                        Ok(json::to_pretty(record)?)
                    } else {
                        Ok(markdown::disease_markdown(record)?)
                    }
                }
            }
        }
        command => {
            let cli = Cli {
                json: json_output,
                catalog: cli.catalog,
                command,
            };
            run_without_engine(cli, &ctx.history).await
        }
    }
}

async fn run_without_engine(cli: Cli, history: &HistoryStore) -> anyhow::Result<String> {
    let json_output = cli.json;
    match cli.command {
        Commands::Recommend { from, symptoms } => {
            let text = read_input(&from).await?;
            let (candidates, embedded_symptoms) = parse_candidates(&text)?;
            let symptoms = symptoms.or(embedded_symptoms).unwrap_or_default();
            let recommendation = crate::engine::recommend::recommend(&candidates, &symptoms);
            if json_output {
                Ok(json::to_pretty(&recommendation)?)
            } else {
                Ok(markdown::recommendation_markdown(&recommendation)?)
            }
        }
        Commands::History { command } => run_history(command, history, json_output).await,
        Commands::Health { skip_history } => {
            let report =
                health::check(cli.catalog.as_deref(), history.path(), skip_history).await;
            if json_output {
                Ok(json::to_pretty(&report)?)
            } else {
                Ok(report.to_markdown())
            }
        }
        Commands::Mcp | Commands::Serve | Commands::ServeHttp { .. } => Err(anyhow::anyhow!(
            "MCP server commands cannot run inside another command"
        )),
        Commands::Predict { .. }
        | Commands::Analyze { .. }
        | Commands::Catalog { .. }
        | Commands::Checklist
        | Commands::Version => Err(anyhow::anyhow!(
            "command requires the prediction engine"
        )),
    }
}

async fn run_history(
    command: HistoryCommand,
    history: &HistoryStore,
    json_output: bool,
) -> anyhow::Result<String> {
    match command {
        HistoryCommand::List { limit, since } => {
            let since_date = since
                .as_deref()
                .map(crate::utils::date::parse_since)
                .transpose()?;
            let records = history.list(Some(limit), since_date).await?;
            if json_output {
                Ok(json::to_pretty(&records)?)
            } else {
                Ok(markdown::history_list_markdown(&records, since.as_deref())?)
            }
        }
        HistoryCommand::Show { id } => {
            let record = history.get(&id).await?;
            if json_output {
                Ok(json::to_pretty(&record)?)
            } else {
                Ok(markdown::history_record_markdown(&record)?)
            }
        }
        HistoryCommand::Summary => {
            let summary = history.summary().await?;
            if json_output {
                Ok(json::to_pretty(&summary)?)
            } else {
                Ok(markdown::history_summary_markdown(&summary)?)
            }
        }
        HistoryCommand::Export { path } => {
            let count = history.export(&path).await?;
            if json_output {
                Ok(json::to_pretty(&serde_json::json!({
                    "exported": count,
                    "path": path.display().to_string(),
                }))?)
            } else {
                Ok(format!("Exported {count} analyses to {}", path.display()))
            }
        }
        HistoryCommand::Clear => {
            let count = history.clear().await?;
            if json_output {
                Ok(json::to_pretty(&serde_json::json!({ "cleared": count }))?)
            } else {
                Ok(format!("Cleared {count} analyses from {}", history.path().display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::disease::{DiseaseRecord, Severity};

    fn record(name: &str, symptoms: &str, severity: Severity) -> DiseaseRecord {
        DiseaseRecord {
            disease_name: name.to_string(),
            symptom_description: symptoms.to_string(),
            severity,
            description: String::new(),
            precautions: "Rest".to_string(),
            diet_recommendations: "Fluids".to_string(),
        }
    }

    fn context(dir: &Path) -> AppContext {
        let catalog = Catalog::from_records(vec![
            record("Flu", "fever;cough;chills;fatigue", Severity::Moderate),
            record("Common Cold", "fever;runny nose;cough", Severity::Mild),
            record("Migraine", "headache;nausea;light sensitivity", Severity::Moderate),
        ])
        .expect("catalog");
        AppContext::new(
            Engine::new(catalog).expect("engine"),
            HistoryStore::new(dir.join("history.jsonl")),
        )
    }

    fn args(line: &str) -> Vec<String> {
        let mut out = vec!["symtriage".to_string()];
        out.extend(shlex::split(line).expect("valid command line"));
        out
    }

    #[tokio::test]
    async fn predict_json_lists_candidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let out = execute_with(args("predict fever, cough, chills -n 2 --json"), &ctx)
            .await
            .expect("predict");
        let candidates: Vec<PredictionCandidate> = serde_json::from_str(&out).expect("json");
        assert_eq!(candidates[0].disease, "Flu");
        assert!(candidates.len() <= 2);
    }

    #[tokio::test]
    async fn top_n_outside_range_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        for n in ["0", "11"] {
            let err = execute_with(args(&format!("predict fever -n {n}")), &ctx)
                .await
                .expect_err("out of range");
            assert!(err.to_string().contains("between 1 and 10"));
        }
    }

    #[tokio::test]
    async fn analyze_save_then_history_show() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let out = execute_with(
            args("analyze --symptom headache --symptom Nausea --save --json"),
            &ctx,
        )
        .await
        .expect("analyze");
        let saved: HistoryRecord = serde_json::from_str(&out).expect("record");
        assert_eq!(saved.input_symptoms, "headache, nausea");
        assert_eq!(saved.input_method, InputMethod::Checklist);
        assert_eq!(saved.top_prediction.as_deref(), Some("Migraine"));

        let shown = execute_with(args(&format!("history show {}", saved.id)), &ctx)
            .await
            .expect("show");
        assert!(shown.contains(&format!("# Analysis {}", saved.id)));

        let listed = execute_with(args("history list --since 2020"), &ctx)
            .await
            .expect("list");
        assert!(listed.contains(&saved.id));
    }

    #[tokio::test]
    async fn analyze_without_symptoms_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let err = execute_with(args("analyze"), &ctx).await.expect_err("no symptoms");
        assert!(err.to_string().contains("analyze needs symptoms"));
    }

    #[tokio::test]
    async fn read_input_reads_files_without_blocking_and_reports_missing_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("candidates.json");
        std::fs::write(&file, "[]").expect("write");
        let text = read_input(&file.display().to_string()).await.expect("read");
        assert_eq!(text, "[]");

        let missing = dir.path().join("missing.json").display().to_string();
        let err = read_input(&missing).await.expect_err("missing file");
        assert!(matches!(err, TriageError::Io(_)));
    }

    #[tokio::test]
    async fn recommend_reads_predict_output_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let predictions = execute_with(args("predict fever cough chills --json"), &ctx)
            .await
            .expect("predict");
        let file = dir.path().join("predictions.json");
        std::fs::write(&file, predictions).expect("write");

        let line = format!("recommend --from {} --symptoms 'fever, cough' --json", file.display());
        let out = execute_with(args(&line), &ctx).await.expect("recommend");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["input_symptoms"], "fever, cough");
        assert_eq!(value["severity_assessment"]["overall_severity"], "Moderate");
    }

    #[test]
    fn parse_candidates_accepts_list_or_analysis() {
        let (list, symptoms) = parse_candidates("[]").expect("list");
        assert!(list.is_empty());
        assert!(symptoms.is_none());
        let (list, symptoms) =
            parse_candidates(r#"{"predictions": [], "input_symptoms": "fever"}"#).expect("object");
        assert!(list.is_empty());
        assert_eq!(symptoms.as_deref(), Some("fever"));
        assert!(parse_candidates("{\"nope\": 1}").is_err());
    }

    #[tokio::test]
    async fn catalog_get_unknown_suggests_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let err = execute_with(args("catalog get Scurvy"), &ctx)
            .await
            .expect_err("unknown");
        assert!(err.to_string().contains("symtriage catalog list"));
        let found = execute_with(args("catalog get common cold"), &ctx)
            .await
            .expect("found");
        assert!(found.contains("# Common Cold"));
    }

    #[tokio::test]
    async fn help_and_version_render_as_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        let help = execute_with(args("--help"), &ctx).await.expect("help");
        assert!(help.contains("predict"));
        let version = execute_with(args("version"), &ctx).await.expect("version");
        assert!(version.starts_with("symtriage "));
    }
}
