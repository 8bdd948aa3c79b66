mod auth;
mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod mail;
mod models;
mod pagination;
mod policy;
mod rating;
mod reviews;
mod routes;
mod signup;
mod token;
mod users;

use std::{sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::AttemptLimiter, catalog::CatalogStore, config::Config, mail::Mailer,
    reviews::ReviewStore, token::TokenIssuer, users::UserStore,
};

const ATTEMPT_GC_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser)]
#[command(name = "yamdb", version, about = "Reviews and ratings API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create an active admin superuser, or promote an existing user.
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: UserStore,
    pub catalog: CatalogStore,
    pub reviews: ReviewStore,
    pub tokens: Arc<TokenIssuer>,
    pub mailer: Arc<dyn Mailer>,
    pub attempts: Arc<AttemptLimiter>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: DatabaseConnection, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            users: UserStore::new(db.clone(), config.confirmation_code_ttl_secs),
            catalog: CatalogStore::new(db.clone()),
            reviews: ReviewStore::new(db),
            tokens: Arc::new(TokenIssuer::new(&config.jwt_secret, config.access_token_ttl_secs)),
            attempts: Arc::new(auth::attempt_limiter(config.confirmation_attempts_per_minute)),
            mailer,
            config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,yamdb=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);
    let db = db::connect_and_migrate(&config.database_url).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::CreateSuperuser { username, email } => {
            let users = UserStore::new(db, config.confirmation_code_ttl_secs);
            users.ensure_superuser(&username, &email).await?;
            Ok(())
        },
    }
}

async fn serve(config: Arc<Config>, db: DatabaseConnection) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone(), db, Arc::new(mail::LogMailer)));
    auth::spawn_attempt_gc(state.attempts.clone(), ATTEMPT_GC_INTERVAL);

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
