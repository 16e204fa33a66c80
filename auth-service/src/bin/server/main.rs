use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth_service::config::Config;
use auth_service::domain::account::management::UserManagementService;
use auth_service::domain::account::seed::AccountSeeder;
use auth_service::domain::account::service::AuthService;
use auth_service::domain::action_token::ports::ActionTokenStore;
use auth_service::domain::action_token::service::ActionTokenService;
use auth_service::domain::clock::Clock;
use auth_service::domain::clock::SystemClock;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::email::SmtpEmailSender;
use auth_service::outbound::repositories::PostgresAccountRepository;
use auth_service::outbound::repositories::PostgresActionTokenRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        smtp_host = %config.email.smtp_host,
        require_verified_email = config.policy.require_verified_email,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let clock = Arc::new(SystemClock);
    let authenticator = Arc::new(Authenticator::new(config.token_settings())?);
    let account_repository = Arc::new(PostgresAccountRepository::new(pg_pool.clone()));
    let action_token_repository = Arc::new(PostgresActionTokenRepository::new(pg_pool));
    let email_sender = Arc::new(SmtpEmailSender::new(&config.email)?);

    let action_tokens = Arc::new(ActionTokenService::new(
        action_token_repository,
        config.action_token_ttl(),
    ));

    let seeder = AccountSeeder::new(
        Arc::clone(&account_repository),
        Arc::clone(&clock),
        Arc::clone(&authenticator),
        config.admin_seed()?,
    );
    let outcome = seeder.ensure_seeded().await?;
    tracing::info!(outcome = ?outcome, "Admin seeding finished");

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&account_repository),
        Arc::clone(&action_tokens),
        email_sender,
        Arc::clone(&clock),
        Arc::clone(&authenticator),
        config.auth_policy(),
    ));
    let user_management = Arc::new(UserManagementService::new(
        account_repository,
        Arc::clone(&clock),
    ));

    spawn_token_purger(
        Arc::clone(&action_tokens),
        Arc::clone(&clock),
        Duration::from_secs(config.action_tokens.purge_interval_seconds.max(1)),
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, user_management, authenticator, clock);

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

/// Periodically delete expired action tokens.
fn spawn_token_purger<TS, C>(action_tokens: Arc<TS>, clock: Arc<C>, every: Duration)
where
    TS: ActionTokenStore,
    C: Clock,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match action_tokens.purge_expired(clock.now()).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "Expired action tokens purged"),
                Err(e) => tracing::error!(error = %e, "Failed to purge expired action tokens"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
