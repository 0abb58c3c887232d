use anyhow::Result;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

use mr_confluence_mcp::config::Config;
use mr_confluence_mcp::server::MrReportServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (logs go to stderr to keep stdout clean for MCP)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mr_confluence_mcp=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let service = MrReportServer::new(&config).await?;
    tracing::info!("Starting MCP server for GitLab MR analysis");
    let server = service.serve(stdio()).await?;
    server.waiting().await?;

    Ok(())
}
