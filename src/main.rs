//! Main entry point for CLI command to start the server.

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use usergraph::execution::ExecutionService;
use usergraph::schema::Schema;
use usergraph::server;
use usergraph::store::UserStore;

/// Options for the server
#[derive(Parser, Debug)]
#[command(name = "usergraph", about = "GraphQL user directory server")]
struct Opt {
    /// Log level (off|error|warn|info|debug|trace).
    #[arg(long = "log", default_value = "info", env = "USERGRAPH_LOG")]
    env_filter: String,

    /// Address to listen on.
    #[arg(long = "listen", default_value = "0.0.0.0:8080", env = "USERGRAPH_LISTEN")]
    listen: SocketAddr,
}

fn main() -> Result<()> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    let runtime = builder.build()?;
    runtime.block_on(rt_main())
}

async fn rt_main() -> Result<()> {
    let opt = Opt::parse();

    let env_filter = std::env::var("RUST_LOG").ok().unwrap_or(opt.env_filter);
    let builder = tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::try_new(&env_filter).context("could not parse log")?);
    if std::io::stdout().is_terminal() {
        builder.init();
    } else {
        builder.json().init();
    }

    // Shared read-only state, built once before the listener accepts
    // connections. A schema inconsistency aborts startup here.
    let schema = Arc::new(Schema::user_directory().context("schema construction failed")?);
    let store = Arc::new(UserStore::seeded());
    let service = ExecutionService::new(schema, store);

    let listener = tokio::net::TcpListener::bind(opt.listen)
        .await
        .with_context(|| format!("could not bind to {}", opt.listen))?;
    let address = listener.local_addr()?;
    tracing::info!("GraphQL endpoint exposed at http://{address}/graphql 🚀");

    server::serve(listener, server::router(service)).await?;
    Ok(())
}
