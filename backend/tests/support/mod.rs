//! Shared helpers for the Diesel repository integration suites.
//!
//! Each suite boots its own embedded PostgreSQL cluster, recreates a
//! scratch database on it, and applies the service's migration set before
//! handing a pool to the repository under test.

pub mod pg_embed;

use postgres::{Client, NoTls};
use pg_embedded_setup_unpriv::TestCluster;

/// Render a `postgres` error with its SQLSTATE and message.
///
/// `Display` for `postgres::Error` usually collapses to `db error`, which
/// hides the reason a statement failed.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

/// Drop and recreate `name` on the cluster, returning its connection URL.
///
/// Runs through the `postgres` client so `DROP DATABASE` is not wrapped in a
/// transaction.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<String, String> {
    let admin_url = cluster.connection().database_url("postgres");
    let mut client =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!(
            "DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE); CREATE DATABASE \"{name}\";"
        ))
        .map_err(|err| format_postgres_error(&err))?;
    Ok(cluster.connection().database_url(name))
}

/// Whether `SKIP_TEST_CLUSTER` is set to `1`, `true`, or `yes`.
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip (returning `None`) when `SKIP_TEST_CLUSTER` is set, otherwise fail
/// loudly so a broken cluster is never silently ignored in CI.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
