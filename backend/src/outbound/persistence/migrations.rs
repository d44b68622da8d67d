//! Embedded schema migrations, one set per service database.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const CATALOG: EmbeddedMigrations = embed_migrations!("migrations/catalog");
const CART: EmbeddedMigrations = embed_migrations!("migrations/cart");
const ORDERS: EmbeddedMigrations = embed_migrations!("migrations/orders");
const USERS: EmbeddedMigrations = embed_migrations!("migrations/users");

/// Which service database to migrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationSet {
    /// `albums`.
    Catalog,
    /// `cart_items`.
    Cart,
    /// `orders` and `order_items`.
    Orders,
    /// `users` and `session_tokens`.
    Users,
}

impl MigrationSet {
    fn apply(self, conn: &mut PgConnection) -> diesel::migration::Result<usize> {
        let versions = match self {
            Self::Catalog => conn.run_pending_migrations(CATALOG)?,
            Self::Cart => conn.run_pending_migrations(CART)?,
            Self::Orders => conn.run_pending_migrations(ORDERS)?,
            Self::Users => conn.run_pending_migrations(USERS)?,
        };
        Ok(versions.len())
    }
}

/// Errors raised while applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The database could not be reached.
    #[error("failed to connect for migrations: {message}")]
    Connect { message: String },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply { message: String },
    /// The blocking migration task did not complete.
    #[error("migration task failed: {message}")]
    Task { message: String },
}

/// Apply pending migrations for `set`, returning how many ran.
///
/// Runs on the blocking pool because the migration harness needs a
/// synchronous connection.
///
/// # Errors
/// Returns [`MigrationError`] when connecting or applying fails.
pub async fn run_migrations(database_url: &str, set: MigrationSet) -> Result<usize, MigrationError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url).map_err(|err| MigrationError::Connect {
            message: err.to_string(),
        })?;
        set.apply(&mut conn).map_err(|err| MigrationError::Apply {
                message: err.to_string(),
            })
    })
    .await
    .map_err(|err| MigrationError::Task {
        message: err.to_string(),
    })??;
    info!(?set, applied, "database migrations applied");
    Ok(applied)
}
