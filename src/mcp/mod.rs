//! MCP server entrypoints for stdio and HTTP transports.

mod shell;

pub use shell::TriageMcpServer;

/// Runs the symtriage MCP server over stdio.
///
/// # Errors
///
/// Returns an error when the engine cannot be built or the stdio transport
/// fails.
pub async fn run_stdio(catalog: Option<&std::path::Path>) -> anyhow::Result<()> {
    shell::run_stdio(catalog).await
}

/// Runs the symtriage MCP server over HTTP with SSE transport.
///
/// Starts an HTTP server on `host:port` with:
/// - `GET /sse` — SSE stream for server-to-client messages
/// - `POST /message?sessionId=<id>` — client-to-server JSON-RPC messages
///
/// # Errors
///
/// Returns an error when the engine cannot be built or the TCP bind fails.
pub async fn run_http(catalog: Option<&std::path::Path>, host: &str, port: u16) -> anyhow::Result<()> {
    shell::run_http(catalog, host, port).await
}
