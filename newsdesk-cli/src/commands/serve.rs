//! HTTP server command for the news API

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use newsdesk_server::db::{create_pool_with_options, migrations, pool::DEFAULT_MAX_CONNECTIONS};
use newsdesk_server::http::server::DEFAULT_USER_HEADER;
use newsdesk_server::{run_server, MemoryNewsStore, NewsStore, PgNewsStore, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "NEWSDESK_BIND", default_value = "127.0.0.1:3030")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long, env = "NEWSDESK_CORS_PERMISSIVE")]
    pub cors_permissive: bool,

    /// Request timeout in seconds
    #[arg(long, env = "NEWSDESK_REQUEST_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Header the upstream auth layer sets to the user id
    #[arg(long, env = "NEWSDESK_USER_HEADER", default_value = DEFAULT_USER_HEADER)]
    pub user_header: String,

    /// Keep articles in memory instead of Postgres (data is lost on exit)
    #[arg(long)]
    pub in_memory: bool,

    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, env = "NEWSDESK_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_permissive: self.cors_permissive,
            request_timeout: Duration::from_secs(self.timeout),
            user_header: self.user_header.clone(),
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.server_config();

    let store: Arc<dyn NewsStore> = if args.in_memory {
        if args.database_url.is_some() {
            tracing::warn!("--in-memory set, ignoring DATABASE_URL");
        }
        tracing::warn!("Using in-memory store - data is not persisted");
        Arc::new(MemoryNewsStore::new())
    } else {
        let database_url = args.database_url.context(
            "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env (or pass --in-memory)",
        )?;

        let pool = create_pool_with_options(&database_url, args.max_connections)
            .await
            .context("Failed to create database pool")?;

        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;

        Arc::new(PgNewsStore::new(pool))
    };

    tracing::info!("Starting newsdesk server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(store, config).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ServeArgs,
    }

    #[test]
    fn flags_build_server_config() {
        let wrapper = Wrapper::parse_from([
            "serve",
            "--bind",
            "0.0.0.0:8080",
            "--timeout",
            "5",
            "--user-header",
            "x-auth-user",
            "--in-memory",
        ]);
        let config = wrapper.args.server_config();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.user_header, "x-auth-user");
        assert!(wrapper.args.in_memory);
    }

    #[test]
    fn defaults() {
        let wrapper = Wrapper::parse_from(["serve"]);
        assert!(!wrapper.args.in_memory);
        assert_eq!(wrapper.args.bind.port(), 3030);
        assert_eq!(wrapper.args.user_header, DEFAULT_USER_HEADER);
    }
}
