use chrono::Utc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keydesk::config::Config;
use keydesk::crypto::hash_password;
use keydesk::handlers;
use keydesk::models::AdminUser;
use keydesk::state::AppState;
use keydesk::store::{SqliteStore, UserStore};
use keydesk::token::TokenIssuer;

/// Create the default admin account on first startup.
///
/// This is an operational bootstrap so the panel is reachable out of the
/// box, not a security control; the credentials are logged loudly and
/// should be changed immediately.
fn bootstrap_admin(users: &dyn UserStore, username: &str, password: &str) {
    let existing = users.get().expect("Failed to read admin user");
    if existing.is_some() {
        return;
    }

    users
        .save(&AdminUser {
            username: username.to_string(),
            password_hash: hash_password(password),
            updated_at: Utc::now(),
        })
        .expect("Failed to create bootstrap admin");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED");
    tracing::info!("Username: {}", username);
    tracing::info!("============================================");
    tracing::info!("CHANGE THIS PASSWORD AFTER FIRST LOGIN");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keydesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.jwt_secret_generated {
        tracing::warn!(
            "JWT_SECRET not set; using a random per-process secret. \
             Issued tokens will not survive a restart."
        );
    }

    let store = SqliteStore::open(&config.database_path).expect("Failed to open database");

    bootstrap_admin(&store, &config.admin_username, &config.admin_password);

    let state = AppState::new(store, TokenIssuer::new(config.jwt_secret.as_bytes()));

    let app = handlers::router(state.clone())
        .layer(TraceLayer::new_for_http())
        // The admin panel is a static page served from anywhere; the API
        // itself is protected by bearer tokens, not by origin.
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Keydesk server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
