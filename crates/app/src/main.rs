use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "hamtdaa={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no [server] section in settings, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;

    let mut builder = engine::Engine::builder().database(db);
    if let Some(cost) = server.password_cost {
        builder = builder.password_cost(cost);
    }
    let engine = builder.build().await?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    // SQLite has a single writer; one pooled connection queues transactions
    // instead of failing them with SQLITE_BUSY.
    let mut options = sea_orm::ConnectOptions::new(url);
    options.max_connections(1);
    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
