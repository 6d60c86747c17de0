//! Backend entry-point: parses configuration, runs migrations, serves the API.

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use clap::Parser;
use std::env;
use std::net::SocketAddr;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{run_migrations, DbPool, PoolConfig};
use backend::server::{create_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "backend", about = "Session-authenticated diary API server")]
struct Cli {
    /// PostgreSQL connection string; omitted, state is held in memory.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// File holding the session key material.
    #[arg(
        long,
        env = "SESSION_KEY_FILE",
        default_value = "/var/run/secrets/session_key"
    )]
    session_key_file: String,

    /// Set to 0 to allow the session cookie over plain HTTP.
    #[arg(long, env = "SESSION_COOKIE_SECURE")]
    session_cookie_secure: Option<String>,

    /// OAuth client id Google-issued tokens must be minted for.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    google_client_id: Option<String>,

    /// Address and port to serve on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: SocketAddr,
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();

    let key = load_session_key(&cli.session_key_file)?;
    let cookie_secure = cli
        .session_cookie_secure
        .as_deref()
        .map_or(true, |v| v != "0");

    let mut config = ServerConfig::new(key, cookie_secure, SameSite::Lax, cli.bind_addr)
        .with_google_client_id(cli.google_client_id.clone());

    if let Some(database_url) = cli.database_url.as_deref() {
        run_migrations(database_url)
            .await
            .map_err(std::io::Error::other)?;
        let pool = DbPool::new(PoolConfig::new(database_url))
            .await
            .map_err(std::io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(make_metrics()));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}

/// Load the session key from disk, or generate a throwaway one in
/// development builds.
fn load_session_key(key_path: &str) -> std::io::Result<Key> {
    match std::fs::read(key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    PrometheusMetricsBuilder::new("diary")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
