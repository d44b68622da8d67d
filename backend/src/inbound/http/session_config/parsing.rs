//! Environment parsing helpers for session configuration.

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, SAMESITE_ENV, SessionConfigError};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Boolean environment toggle with its debug-build default.
pub(super) struct BoolToggle {
    name: &'static str,
    default_value: bool,
}

impl BoolToggle {
    pub(super) const fn new(name: &'static str, default_value: bool) -> Self {
        Self {
            name,
            default_value,
        }
    }
}

pub(super) fn parse_bool_env<E: Env>(
    env: &E,
    mode: BuildMode,
    toggle: BoolToggle,
) -> Result<bool, SessionConfigError> {
    let BoolToggle {
        name,
        default_value,
    } = toggle;
    match env.string(name) {
        Some(value) => match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None => {
                let logged = value.clone();
                debug_warn_or_error(
                    mode,
                    default_value,
                    SessionConfigError::InvalidEnv {
                        name,
                        value,
                        expected: BOOL_EXPECTED,
                    },
                    || warn!(value = %logged, "invalid {name}; defaulting to {default_value}"),
                )
            }
        },
        None => debug_warn_or_error(
            mode,
            default_value,
            SessionConfigError::MissingEnv { name },
            || warn!("{name} not set; defaulting to {default_value}"),
        ),
    }
}

pub(super) fn debug_warn_or_error<T, F>(
    mode: BuildMode,
    fallback: T,
    error: SessionConfigError,
    warn_fn: F,
) -> Result<T, SessionConfigError>
where
    F: FnOnce(),
{
    if mode.is_debug() {
        warn_fn();
        Ok(fallback)
    } else {
        Err(error)
    }
}

pub(super) fn parse_same_site(
    value: String,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" => debug_warn_or_error(
            mode,
            SameSite::None,
            SessionConfigError::InsecureSameSiteNone,
            || warn!("SESSION_SAMESITE=None without a secure cookie; browsers may drop it"),
        ),
        _ => {
            let logged = value.clone();
            debug_warn_or_error(
                mode,
                SameSite::Lax,
                SessionConfigError::InvalidEnv {
                    name: SAMESITE_ENV,
                    value,
                    expected: SAMESITE_EXPECTED,
                },
                || warn!(value = %logged, "invalid SESSION_SAMESITE; using Lax"),
            )
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
