//! Per-service settings loaded via OrthoConfig.
//!
//! Every field can come from a CLI flag, a prefixed environment variable
//! (`CATALOG_BIND_ADDR`, `CART_ORDER_SERVICE_URL`, …), or a config file.
//! Unset optional fields fall back to the defaults exposed by the accessor
//! methods.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{RetryPolicy, SimulatedPaymentGate};

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

/// Catalogue service settings (`CATALOG_` prefix).
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CATALOG")]
pub struct CatalogSettings {
    /// Listen address.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; albums are kept in memory when unset.
    pub database_url: Option<String>,
    /// Pool size.
    pub db_max_connections: Option<u32>,
    /// Cart service base URL for server-to-server calls.
    pub cart_service_url: Option<String>,
    /// Cart base URL as seen by browsers, used in redirects.
    pub cart_public_url: Option<String>,
    /// Users service base URL for token verification.
    pub users_service_url: Option<String>,
    /// Directory receiving uploaded covers.
    pub uploads_dir: Option<PathBuf>,
    /// Per-request timeout for outbound calls.
    pub http_timeout_ms: Option<u64>,
}

impl CatalogSettings {
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or("0.0.0.0:5000")
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    #[must_use]
    pub fn cart_service_url(&self) -> &str {
        self.cart_service_url
            .as_deref()
            .unwrap_or("http://localhost:5002")
    }

    /// Public cart URL, defaulting to the internal one.
    #[must_use]
    pub fn cart_public_url(&self) -> &str {
        self.cart_public_url
            .as_deref()
            .unwrap_or_else(|| self.cart_service_url())
    }

    #[must_use]
    pub fn users_service_url(&self) -> &str {
        self.users_service_url
            .as_deref()
            .unwrap_or("http://localhost:5003")
    }

    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.uploads_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("static/uploads"))
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS))
    }
}

/// Cart service settings (`CART_` prefix).
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CART")]
pub struct CartSettings {
    /// Listen address.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; carts are kept in memory when unset.
    pub database_url: Option<String>,
    /// Pool size.
    pub db_max_connections: Option<u32>,
    /// Order service base URL.
    pub order_service_url: Option<String>,
    /// Catalogue base URL, used to resolve album details and as the
    /// "continue shopping" link.
    pub store_service_url: Option<String>,
    /// Fraction of payments declined by the simulated gate.
    pub payment_decline_rate: Option<f64>,
    /// Simulated payment processing delay.
    pub processing_delay_ms: Option<u64>,
    /// Per-request timeout for outbound calls.
    pub http_timeout_ms: Option<u64>,
    /// Attempts per outbound call, including the first.
    pub retry_attempts: Option<u32>,
}

impl CartSettings {
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or("0.0.0.0:5002")
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    #[must_use]
    pub fn order_service_url(&self) -> &str {
        self.order_service_url
            .as_deref()
            .unwrap_or("http://localhost:5001")
    }

    #[must_use]
    pub fn store_service_url(&self) -> &str {
        self.store_service_url
            .as_deref()
            .unwrap_or("http://localhost:5000")
    }

    #[must_use]
    pub fn payment_decline_rate(&self) -> f64 {
        self.payment_decline_rate
            .unwrap_or(SimulatedPaymentGate::DEFAULT_DECLINE_RATE)
    }

    #[must_use]
    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms.unwrap_or(2_000))
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS))
    }

    /// Retry policy for idempotent outbound calls.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_attempts
            .map_or_else(RetryPolicy::default, |attempts| {
                RetryPolicy::new(attempts, Duration::from_millis(100), Duration::from_secs(2))
            })
    }
}

/// Order service settings (`ORDER_` prefix).
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ORDER")]
pub struct OrderSettings {
    /// Listen address.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; orders are kept in memory when unset.
    pub database_url: Option<String>,
    /// Pool size.
    pub db_max_connections: Option<u32>,
}

impl OrderSettings {
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or("0.0.0.0:5001")
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }
}

/// Users service settings (`USERS_` prefix).
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USERS")]
pub struct UsersSettings {
    /// Listen address.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; users and tokens are kept in memory when unset.
    pub database_url: Option<String>,
    /// Pool size.
    pub db_max_connections: Option<u32>,
    /// Password given to the bootstrap `admin` account.
    pub admin_password: Option<String>,
    /// Token lifetime in seconds.
    pub token_ttl_secs: Option<i64>,
}

impl UsersSettings {
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or("0.0.0.0:5003")
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    #[must_use]
    pub fn admin_password(&self) -> &str {
        self.admin_password.as_deref().unwrap_or("admin")
    }

    /// Token lifetime; non-positive or unrepresentable values fall back to
    /// one day.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::TimeDelta {
        self.token_ttl_secs
            .filter(|secs| *secs > 0)
            .and_then(chrono::TimeDelta::try_seconds)
            .unwrap_or_else(|| chrono::TimeDelta::days(1))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for service settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    fn args(bin: &str) -> [OsString; 1] {
        [OsString::from(bin)]
    }

    #[rstest]
    fn catalog_defaults_apply_when_unset() {
        let _guard = lock_env([
            ("CATALOG_BIND_ADDR", None::<String>),
            ("CATALOG_DATABASE_URL", None::<String>),
            ("CATALOG_CART_SERVICE_URL", None::<String>),
            ("CATALOG_CART_PUBLIC_URL", None::<String>),
            ("CATALOG_UPLOADS_DIR", None::<String>),
        ]);

        let settings = CatalogSettings::load_from_iter(args("catalog-service")).expect("settings");

        assert_eq!(settings.bind_addr(), "0.0.0.0:5000");
        assert!(settings.database_url.is_none());
        assert_eq!(settings.cart_public_url(), "http://localhost:5002");
        assert_eq!(settings.uploads_dir(), PathBuf::from("static/uploads"));
    }

    #[rstest]
    fn cart_environment_overrides_are_respected() {
        let _guard = lock_env([
            ("CART_ORDER_SERVICE_URL", Some("http://orders:5001".to_owned())),
            ("CART_PAYMENT_DECLINE_RATE", Some("0".to_owned())),
            ("CART_PROCESSING_DELAY_MS", Some("0".to_owned())),
            ("CART_RETRY_ATTEMPTS", Some("5".to_owned())),
        ]);

        let settings = CartSettings::load_from_iter(args("cart-service")).expect("settings");

        assert_eq!(settings.order_service_url(), "http://orders:5001");
        assert!(settings.payment_decline_rate() <= 0.0);
        assert_eq!(settings.processing_delay(), Duration::ZERO);
        assert_eq!(settings.retry_policy().max_attempts(), 5);
    }

    #[rstest]
    #[case(None, 86_400)]
    #[case(Some("3600"), 3_600)]
    #[case(Some("-5"), 86_400)]
    #[case(Some("9223372036854775807"), 86_400)]
    fn users_token_ttl_falls_back_to_a_day(#[case] raw: Option<&str>, #[case] expected: i64) {
        let _guard = lock_env([
            ("USERS_TOKEN_TTL_SECS", raw.map(str::to_owned)),
            ("USERS_ADMIN_PASSWORD", None::<String>),
        ]);

        let settings = UsersSettings::load_from_iter(args("users-service")).expect("settings");

        assert_eq!(settings.token_ttl().num_seconds(), expected);
        assert_eq!(settings.admin_password(), "admin");
    }
}
