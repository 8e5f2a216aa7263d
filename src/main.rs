use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = symptom_triage::cli::Cli::parse();
    let catalog = cli.catalog.clone();
    match cli.command {
        symptom_triage::cli::Commands::Mcp | symptom_triage::cli::Commands::Serve => {
            match symptom_triage::mcp::run_stdio(catalog.as_deref()).await {
                Ok(()) => std::process::ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::ExitCode::from(1)
                }
            }
        }
        symptom_triage::cli::Commands::ServeHttp { host, port } => {
            match symptom_triage::mcp::run_http(catalog.as_deref(), &host, port).await {
                Ok(()) => std::process::ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("Error: {err}");
                    std::process::ExitCode::from(1)
                }
            }
        }
        _ => match symptom_triage::cli::run(cli).await {
            Ok(output) => {
                println!("{output}");
                std::process::ExitCode::SUCCESS
            }
            Err(err) => {
                if let Some(triage_err) = err.downcast_ref::<symptom_triage::error::TriageError>() {
                    eprintln!("Error: {triage_err}");
                } else {
                    eprintln!("Error: {err}");
                }
                std::process::ExitCode::from(1)
            }
        },
    }
}
