//! Admin token verification used by the catalogue service.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::ServiceEndpoint;
use crate::domain::ports::{AuthClient, AuthClientError};
use crate::domain::{SessionToken, UserProfile, retry_with_backoff};

/// `POST {users}/api/verify` client.
#[derive(Clone)]
pub struct HttpAuthClient {
    endpoint: ServiceEndpoint,
}

impl HttpAuthClient {
    #[must_use]
    pub const fn new(endpoint: ServiceEndpoint) -> Self {
        Self { endpoint }
    }

    async fn verify_once(
        &self,
        token: &SessionToken,
    ) -> Result<Option<UserProfile>, AuthClientError> {
        let response = self
            .endpoint
            .post("/api/verify")
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|err| AuthClientError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| AuthClientError::transport(err.to_string()))?;
        decode_verification(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct Verification {
    valid: bool,
    user: Option<UserProfile>,
}

fn decode_verification(
    status: StatusCode,
    body: &[u8],
) -> Result<Option<UserProfile>, AuthClientError> {
    match status {
        StatusCode::OK => {
            let verification: Verification = serde_json::from_slice(body)
                .map_err(|err| AuthClientError::decode(err.to_string()))?;
            Ok(verification.user.filter(|_| verification.valid))
        }
        StatusCode::UNAUTHORIZED => Ok(None),
        other => Err(AuthClientError::status(other.as_u16())),
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn verify(&self, token: &SessionToken) -> Result<Option<UserProfile>, AuthClientError> {
        retry_with_backoff(
            self.endpoint.retry,
            self.endpoint.sleeper.as_ref(),
            "users.verify",
            |_| self.verify_once(token),
        )
        .await
    }
}
