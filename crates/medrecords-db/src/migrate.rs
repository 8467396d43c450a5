use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

/// Records schema, embedded from `migrations/` at build time
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Bring the records schema up to the newest embedded version
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    let latest = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default();
    info!(
        embedded = MIGRATOR.iter().count(),
        latest, "Migrating records schema"
    );
    MIGRATOR.run(pool).await?;
    info!(version = latest, "Records schema ready");
    Ok(())
}
