mod app;
mod auth;
mod catalog;
mod config;
mod db;
mod error;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "shipdesk=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, store) = state::AppState::init().await?;

    if let Err(e) = store.migrate().await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let lockout = &app_state.config.lockout;
    tracing::info!(
        max_attempts = lockout.max_attempts,
        lock_duration_ms = lockout.lock_duration_ms,
        "login lockout configured"
    );

    app::serve(app::build_app(app_state)).await
}
