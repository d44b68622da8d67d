//! Idempotency key handling for order creation and checkout.

use actix_web::http::header::HeaderMap;
use tracing::debug;

pub use crate::domain::IDEMPOTENCY_KEY_HEADER;
use crate::domain::{Error, IdempotencyKey, IdempotencyKeyValidationError};

/// Response header set when an earlier order is returned for a repeated key.
pub const IDEMPOTENT_REPLAYED_HEADER: &str = "Idempotent-Replayed";

/// Extract the idempotency key from request headers.
///
/// # Errors
/// Returns [`IdempotencyKeyValidationError`] for blank or non-UUID values.
pub fn extract_idempotency_key(
    headers: &HeaderMap,
) -> Result<Option<IdempotencyKey>, IdempotencyKeyValidationError> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key_str = header_value
        .to_str()
        .map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;

    IdempotencyKey::new(key_str).map(Some)
}

/// Map idempotency key validation errors to domain errors.
#[must_use]
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    match err {
        IdempotencyKeyValidationError::EmptyKey => {
            Error::invalid_request("Idempotency-Key header must not be empty")
        }
        IdempotencyKeyValidationError::InvalidKey => {
            Error::invalid_request("Idempotency-Key header must be a valid UUID")
        }
    }
}

/// Key for a checkout submission: the form's `checkout_token` when it is a
/// valid UUID, otherwise a fresh key.
#[must_use]
pub fn checkout_key(token: Option<&str>) -> IdempotencyKey {
    match token.map(IdempotencyKey::new) {
        Some(Ok(key)) => key,
        Some(Err(err)) => {
            debug!(error = %err, "replacing invalid checkout token");
            IdempotencyKey::random()
        }
        None => IdempotencyKey::random(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};
    use rstest::rstest;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("idempotency-key"),
            HeaderValue::from_static(value),
        );
        headers
    }

    #[rstest]
    fn absent_header_is_none() {
        assert_eq!(extract_idempotency_key(&HeaderMap::new()), Ok(None));
    }

    #[rstest]
    fn uuid_header_is_parsed() {
        let key = extract_idempotency_key(&headers_with("550e8400-e29b-41d4-a716-446655440000"))
            .expect("valid key")
            .expect("present");
        assert_eq!(key.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[rstest]
    #[case("", IdempotencyKeyValidationError::EmptyKey)]
    #[case("order-1", IdempotencyKeyValidationError::InvalidKey)]
    fn malformed_header_is_rejected(
        #[case] value: &'static str,
        #[case] expected: IdempotencyKeyValidationError,
    ) {
        assert_eq!(extract_idempotency_key(&headers_with(value)), Err(expected));
    }

    #[rstest]
    fn checkout_token_is_reused_when_valid() {
        let token = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(checkout_key(Some(token)).to_string(), token);
        assert_ne!(checkout_key(Some("bogus")).to_string(), "bogus");
    }
}
