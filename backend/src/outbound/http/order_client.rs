//! Order submission used by the cart service.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::info;

use super::{ServiceEndpoint, error_message};
use crate::domain::ports::{OrderClient, OrderClientError};
use crate::domain::{
    IDEMPOTENCY_KEY_HEADER, IdempotencyKey, OrderDraft, OrderReceipt, retry_with_backoff,
};

/// `POST {orders}/api/orders` client.
///
/// Every attempt carries the same `Idempotency-Key`, so retrying after a
/// timeout cannot create a second order.
#[derive(Clone)]
pub struct HttpOrderClient {
    endpoint: ServiceEndpoint,
}

impl HttpOrderClient {
    #[must_use]
    pub const fn new(endpoint: ServiceEndpoint) -> Self {
        Self { endpoint }
    }

    async fn create_once(
        &self,
        draft: &OrderDraft,
        key: IdempotencyKey,
    ) -> Result<OrderReceipt, OrderClientError> {
        let response = self
            .endpoint
            .post("/api/orders")
            .header(IDEMPOTENCY_KEY_HEADER, key.to_string())
            .json(draft)
            .send()
            .await
            .map_err(|err| OrderClientError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| OrderClientError::transport(err.to_string()))?;
        decode_receipt(status, &body)
    }
}

fn decode_receipt(status: StatusCode, body: &[u8]) -> Result<OrderReceipt, OrderClientError> {
    if status != StatusCode::CREATED {
        return Err(OrderClientError::status(
            status.as_u16(),
            error_message(status, body),
        ));
    }
    serde_json::from_slice(body).map_err(|err| OrderClientError::decode(err.to_string()))
}

#[async_trait]
impl OrderClient for HttpOrderClient {
    async fn create_order(
        &self,
        draft: &OrderDraft,
        idempotency_key: IdempotencyKey,
    ) -> Result<OrderReceipt, OrderClientError> {
        let receipt = retry_with_backoff(
            self.endpoint.retry,
            self.endpoint.sleeper.as_ref(),
            "orders.create_order",
            |_| self.create_once(draft, idempotency_key),
        )
        .await?;
        info!(order_number = %receipt.order_number, "order accepted by order service");
        Ok(receipt)
    }
}
