//! MCP server initialization for stdio and streamable HTTP transports.
//!
//! Provides [`setup_engine`], which wires the persona catalog and commentary
//! generator into an [`Engine`], plus [`serve_stdio`] and [`serve_http`],
//! which expose that engine as MCP tools.

use crate::config::MarginaliaConfig;
use crate::engine::Engine;
use crate::generator;
use crate::persona::PersonaCatalog;
use crate::tools::MarginaliaTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Shared setup: load the persona catalog, create the generator, build the engine.
pub fn setup_engine(config: &MarginaliaConfig) -> Result<Arc<Engine>> {
    let catalog = match config.resolved_personas_path() {
        Some(path) => {
            let catalog = PersonaCatalog::load_from(&path)?;
            tracing::info!(path = %path.display(), personas = catalog.len(), "persona catalog loaded");
            catalog
        }
        None => PersonaCatalog::builtin(),
    };

    let generator = generator::create_generator(&config.generator)?;
    tracing::info!(
        provider = generator.name(),
        model = %config.generator.model,
        "commentary generator ready"
    );

    Ok(Arc::new(Engine::new(
        config.engine.clone(),
        catalog,
        generator,
    )))
}

/// Start the MCP server on the configured transport.
pub async fn serve(config: MarginaliaConfig) -> Result<()> {
    match config.server.transport.as_str() {
        "stdio" => serve_stdio(config).await,
        "http" => serve_http(config).await,
        other => anyhow::bail!("unsupported transport: {other}. Supported: stdio, http"),
    }
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: MarginaliaConfig) -> Result<()> {
    tracing::info!("starting Marginalia MCP server on stdio");

    let engine = setup_engine(&config)?;
    tracing::info!(
        policy = %config.engine.density_policy,
        max_attempts = config.engine.max_attempts,
        ttl_secs = config.engine.session_ttl_secs,
        "engine ready"
    );

    let tools = MarginaliaTools::new(engine);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over streamable HTTP. Every MCP client shares one
/// engine, so writing sessions are keyed by `session_id` alone.
pub async fn serve_http(config: MarginaliaConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting Marginalia MCP server on HTTP");

    let engine = setup_engine(&config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(MarginaliaTools::new(engine.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
