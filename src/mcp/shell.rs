use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use rmcp::model::{
    AnnotateAble, Implementation, ListResourcesResult, PaginatedRequestParam, RawResource,
    ReadResourceRequestParam, ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{Error as McpError, ServerHandler, ServiceExt, tool};
use tokio_util::sync::CancellationToken;

use crate::cli::AppContext;

/// MCP server exposing read-only CLI commands through one `shell` tool.
#[derive(Debug, Clone)]
pub struct TriageMcpServer {
    ctx: Arc<AppContext>,
}

const RESOURCE_HELP_URI: &str = "symtriage://help";
const MAX_COMMAND_LEN: usize = 1024;

fn shell_description() -> &'static str {
    include_str!("../../templates/mcp_shell_description.txt")
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|a| a == flag || a.starts_with(&format!("{flag}=")))
}

fn reads_stdin(args: &[String]) -> bool {
    args.windows(2)
        .any(|pair| pair[0] == "--from" && pair[1].trim() == "-")
        || args.iter().any(|a| a == "--from=-")
}

fn is_allowed_mcp_command(args: &[String]) -> bool {
    // args[0] is the binary name ("symtriage")
    let Some(cmd) = args.get(1).map(|s| s.trim().to_ascii_lowercase()) else {
        return false;
    };

    match cmd.as_str() {
        "predict" | "checklist" | "catalog" | "health" | "version" => true,
        "recommend" => !reads_stdin(args),
        "analyze" => !has_flag(args, "--save"),
        "history" => {
            let sub = args
                .get(2)
                .map(|s| s.trim().to_ascii_lowercase())
                .unwrap_or_default();
            matches!(sub.as_str(), "list" | "show" | "summary")
        }
        _ => false,
    }
}

impl TriageMcpServer {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }
}

#[tool(tool_box)]
impl TriageMcpServer {
    #[tool(description = shell_description())]
    async fn shell(&self, #[tool(param)] command: String) -> Result<String, String> {
        if command.len() > MAX_COMMAND_LEN {
            return Err("Error: command is too long".to_string());
        }

        let split = match shlex::split(&command) {
            Some(args) => args,
            None => return Err(format!("Error: Invalid command syntax: {command}")),
        };

        let mut args = vec!["symtriage".to_string()];
        if split.first().is_some_and(|s| s == "symtriage") {
            args.extend(split.into_iter().skip(1));
        } else {
            args.extend(split);
        }

        if !is_allowed_mcp_command(&args) {
            return Err(
                "Error: MCP shell allows read-only commands only (predict/recommend/analyze/checklist/catalog/history list|show|summary/health/version)."
                    .to_string(),
            );
        }

        crate::cli::execute_with(args, &self.ctx)
            .await
            .map_err(|e| format!("Error: {e}"))
    }
}

#[tool(tool_box)]
impl ServerHandler for TriageMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "symtriage".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "symtriage ranks diseases from a fixed catalog for reported symptoms and \
                 derives care recommendations. Use the `shell` tool to run symtriage CLI \
                 commands, starting with `predict <symptoms>` or `analyze <symptoms>`. \
                 Output is informational, never a diagnosis."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    fn list_resources(
        &self,
        _request: PaginatedRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListResourcesResult {
            next_cursor: None,
            resources: build_resource_list()
                .into_iter()
                .map(|r| r.no_annotation())
                .collect(),
        }))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        std::future::ready(read_resource_markdown(&request.uri))
    }
}

fn read_resource_markdown(uri: &str) -> Result<ReadResourceResult, McpError> {
    if uri == RESOURCE_HELP_URI {
        return Ok(to_resource_result(uri, crate::cli::overview().to_string()));
    }

    Err(McpError::resource_not_found(
        format!("Unknown resource: {uri}"),
        None,
    ))
}

fn build_resource_list() -> Vec<RawResource> {
    vec![RawResource {
        uri: RESOURCE_HELP_URI.to_string(),
        name: "symtriage Overview".to_string(),
        description: None,
        mime_type: Some("text/markdown".to_string()),
        size: None,
    }]
}

fn to_resource_result(uri: &str, content: String) -> ReadResourceResult {
    ReadResourceResult {
        contents: vec![ResourceContents::TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some("text/markdown".to_string()),
            text: content,
        }],
    }
}

pub async fn run_stdio(catalog: Option<&Path>) -> anyhow::Result<()> {
    let server = TriageMcpServer::new(AppContext::load(catalog)?);
    let shutdown = CancellationToken::new();

    let cancel = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let running = server
        .serve_with_ct(rmcp::transport::stdio(), shutdown)
        .await?;
    let _reason = running.waiting().await?;
    Ok(())
}

pub async fn run_http(catalog: Option<&Path>, host: &str, port: u16) -> anyhow::Result<()> {
    use rmcp::transport::sse_server::SseServer;

    let server = TriageMcpServer::new(AppContext::load(catalog)?);
    let ip: std::net::IpAddr = host
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid host address: {e}"))?;
    let bind = std::net::SocketAddr::new(ip, port);

    tracing::info!("symtriage HTTP server listening on http://{bind}");
    tracing::info!("  SSE endpoint:  GET  http://{bind}/sse");
    tracing::info!("  Post endpoint: POST http://{bind}/message");

    let ct = SseServer::serve(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP server: {e}"))?
        .with_service(move || server.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down…");
    ct.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        let mut out = vec!["symtriage".to_string()];
        out.extend(line.split_whitespace().map(str::to_string));
        out
    }

    #[test]
    fn mcp_allowlist_blocks_mutating_commands() {
        assert!(is_allowed_mcp_command(&args("predict fever cough")));
        assert!(is_allowed_mcp_command(&args("analyze --symptom fever")));
        assert!(is_allowed_mcp_command(&args("history list --limit 3")));
        assert!(is_allowed_mcp_command(&args("history summary")));
        assert!(is_allowed_mcp_command(&args("catalog get Flu")));
        assert!(is_allowed_mcp_command(&args("recommend --from preds.json")));

        assert!(!is_allowed_mcp_command(&args("analyze fever --save")));
        assert!(!is_allowed_mcp_command(&args("history clear")));
        assert!(!is_allowed_mcp_command(&args("history export out.json")));
        assert!(!is_allowed_mcp_command(&args("history")));
        assert!(!is_allowed_mcp_command(&args("recommend --from -")));
        assert!(!is_allowed_mcp_command(&args("serve")));
        assert!(!is_allowed_mcp_command(&args("")));
    }

    #[test]
    fn help_resource_is_listed_and_readable() {
        let resources = build_resource_list();
        assert_eq!(resources[0].uri, RESOURCE_HELP_URI);
        let result = read_resource_markdown(RESOURCE_HELP_URI).expect("help");
        match &result.contents[0] {
            ResourceContents::TextResourceContents { text, .. } => {
                assert!(text.contains("predict"));
            }
            other => panic!("unexpected contents: {other:?}"),
        }
        assert!(read_resource_markdown("symtriage://nope").is_err());
    }
}
