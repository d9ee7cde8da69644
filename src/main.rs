//! HU Transfer service entry point
//!
//! ```text
//! hu_transfer [--env dev] [--port 8080]
//! hu_transfer --env dev --dev-token <user_id> [--session <sid>]
//! ```
//!
//! `--dev-token` prints a bearer token signed with the configured secret and
//! exits; for local testing without the external login.

use std::sync::Arc;

use anyhow::Context;
use hu_transfer::config::AppConfig;
use hu_transfer::db::Database;
use hu_transfer::gateway::{self, SessionTokenVerifier};
use hu_transfer::logging::init_logging;
use hu_transfer::vault::SessionId;

fn get_arg(names: &[&str]) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if names.contains(&args[i].as_str()) && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn get_env() -> String {
    get_arg(&["--env", "-e"]).unwrap_or_else(|| "dev".to_string())
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    get_arg(&["--port"]).and_then(|p| p.parse().ok())
}

fn print_dev_token(config: &AppConfig, user_id: &str) -> anyhow::Result<()> {
    let user_id: i64 = user_id.parse().context("--dev-token expects a numeric user id")?;
    let session = get_arg(&["--session"])
        .unwrap_or_else(|| format!("dev-{}", uuid::Uuid::new_v4().simple()));
    let session = SessionId::new(session);
    let token = SessionTokenVerifier::new(config.auth.jwt_secret.clone())
        .issue_token(user_id, &session, chrono::Duration::hours(8))
        .context("Failed to sign token")?;
    println!("{}", token);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    if let Some(user_id) = get_arg(&["--dev-token"]) {
        return print_dev_token(&config, &user_id);
    }

    let _log_guard = init_logging(&config);
    tracing::info!(env = %env, version = gateway::handlers::health::VERSION, "Starting HU Transfer service");

    let pg_db = match &config.postgres_url {
        Some(url) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.run_migrations()
                .await
                .context("Failed to apply database migrations")?;
            Some(Arc::new(db))
        }
        None => None,
    };

    let state = Arc::new(gateway::build_state(&config, pg_db)?);
    gateway::run_server(&config, state).await
}
