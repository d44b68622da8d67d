//! Bearer token extraction shared by the catalogue admin actions and the
//! users API.
//!
//! Tokens may arrive in an `Authorization: Bearer` header or, for HTML forms
//! and legacy clients, as a `token` field. The header wins when both are
//! present.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};

use crate::domain::SessionToken;

const BEARER_PREFIX: &str = "bearer ";

/// Token from an `Authorization: Bearer …` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let prefix = value.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    SessionToken::parse(value.get(BEARER_PREFIX.len()..)?).ok()
}

/// Token from the header or, failing that, from the first non-blank
/// fallback value.
#[must_use]
pub fn presented_token<'a>(
    headers: &HeaderMap,
    fallbacks: impl IntoIterator<Item = Option<&'a str>>,
) -> Option<SessionToken> {
    bearer_token(headers).or_else(|| {
        fallbacks
            .into_iter()
            .flatten()
            .find_map(|raw| SessionToken::parse(raw).ok())
    })
}
