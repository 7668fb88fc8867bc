use rocket_db_pools::{Database, sqlx};

#[derive(Database)]
#[database("wayfarer_db")]
pub struct WayfarerDb(sqlx::PgPool);

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Applies pending migrations; idempotent across restarts.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
