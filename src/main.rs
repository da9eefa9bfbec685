use anyhow::{Context, bail};
use axum::http::{HeaderValue, Method, header};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use teamdesk::config::Config;
use teamdesk::db::{self, AppState, queries};
use teamdesk::handlers;
use teamdesk::jwt::TokenIssuer;
use teamdesk::models::{RegisterUser, UserRole};
use teamdesk::password;

#[derive(Parser, Debug)]
#[command(name = "teamdesk", about = "Team and project management API", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Create an admin account directly in the database
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        /// Initial password; read from TEAMDESK_ADMIN_PASSWORD when omitted
        #[arg(long, env = "TEAMDESK_ADMIN_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teamdesk=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let pool = db::create_pool(&config.database_path)
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    {
        let conn = pool.get()?;
        db::init_db(&conn).context("failed to initialize schema")?;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::CreateAdmin {
            name,
            email,
            mobile,
            password,
        } => create_admin(&pool, name, email, mobile, password),
    }
}

async fn serve(config: Config, pool: db::DbPool) -> anyhow::Result<()> {
    let tokens = match &config.jwt_secret {
        Some(secret) => TokenIssuer::new(secret.as_bytes(), config.token_ttl_secs),
        None if config.dev_mode => {
            tracing::warn!("JWT_SECRET not set, using an ephemeral signing key (dev mode)");
            TokenIssuer::ephemeral(config.token_ttl_secs)
        }
        None => bail!("JWT_SECRET must be set outside dev mode"),
    };

    let state = AppState {
        db: pool,
        tokens,
        allow_admin_registration: config.allow_admin_registration,
    };

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS_ORIGIN {}", config.cors_origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = handlers::router(state.clone())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("teamdesk listening on http://{}", listener.local_addr()?);
    if config.dev_mode {
        tracing::info!("running in dev mode");
    }

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_admin(
    pool: &db::DbPool,
    name: String,
    email: String,
    mobile: String,
    password: String,
) -> anyhow::Result<()> {
    let new_user = RegisterUser {
        name: Some(name),
        email: Some(email),
        password: Some(password),
        mobile: Some(mobile),
        role: Some(UserRole::Admin.as_ref().to_string()),
    }
    .validate()?;

    let hash = password::hash_password(&new_user.password)?;
    let conn = pool.get()?;
    let user = queries::create_user(&conn, &new_user, &hash)?;

    tracing::info!(user_id = %user.id, email = %user.email, "admin account created");
    Ok(())
}
