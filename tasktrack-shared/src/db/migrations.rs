/// Schema migrations
///
/// The workspace `migrations/` directory is compiled into the binary, so a
/// deployed server can bring an empty database up to date on its own.

use sqlx::{
    migrate::{MigrateDatabase, MigrateError, Migrator},
    postgres::PgPool,
    Postgres,
};
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Applies every migration not yet recorded in `_sqlx_migrations`
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let known = MIGRATOR.iter().count();
    MIGRATOR.run(pool).await?;

    info!(migrations = known, "Database schema is up to date");
    Ok(())
}

/// Creates the database named in `database_url` when it is missing
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        return Ok(());
    }

    info!("Creating missing database");
    Postgres::create_database(database_url).await
}
