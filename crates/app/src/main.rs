use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "saldo={level},server={level},ledger={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let ledger = ledger::Ledger::builder().database(db.clone()).build();

    let auth = server::AuthConfig {
        signing_secret: settings.server.signing_secret.clone(),
        token_ttl: chrono::Duration::hours(settings.server.token_ttl_hours.unwrap_or(24)),
    };

    let bind = settings
        .server
        .bind
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");

    server::run_with_listener(ledger, db, auth, listener).await?;
    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
