//! Add-to-cart forwarding used by the catalogue service.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{ServiceEndpoint, error_message};
use crate::domain::ports::{CartAddReceipt, CartAddRequest, CartClient, CartClientError};
use crate::domain::{CartSessionId, retry_with_backoff};

/// `POST {cart}/add_to_cart` client.
///
/// Adding is not idempotent, so callers should configure the endpoint
/// without retries.
#[derive(Clone)]
pub struct HttpCartClient {
    endpoint: ServiceEndpoint,
}

impl HttpCartClient {
    #[must_use]
    pub const fn new(endpoint: ServiceEndpoint) -> Self {
        Self { endpoint }
    }

    async fn add_once(&self, request: &CartAddRequest) -> Result<CartAddReceipt, CartClientError> {
        let response = self
            .endpoint
            .post("/add_to_cart")
            .form(&AddToCartForm::from(request))
            .send()
            .await
            .map_err(|err| CartClientError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| CartClientError::transport(err.to_string()))?;
        if status != StatusCode::OK {
            return Err(CartClientError::status(
                status.as_u16(),
                error_message(status, &body),
            ));
        }
        parse_receipt(&body)
    }
}

#[derive(Debug, Serialize)]
struct AddToCartForm {
    album_id: i32,
    quantity: u32,
    album_name: String,
    artist: String,
    price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
}

impl From<&CartAddRequest> for AddToCartForm {
    fn from(request: &CartAddRequest) -> Self {
        let album = &request.album;
        Self {
            album_id: album.album_id.get(),
            quantity: request.quantity.get(),
            album_name: album.album_name.clone(),
            artist: album.artist.clone(),
            price: album.price.to_string(),
            cover_url: album.cover_url.clone(),
            session_id: request.session_id.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddToCartAck {
    #[serde(default)]
    message: String,
    session_id: String,
}

fn parse_receipt(body: &[u8]) -> Result<CartAddReceipt, CartClientError> {
    let ack: AddToCartAck =
        serde_json::from_slice(body).map_err(|err| CartClientError::decode(err.to_string()))?;
    let session_id = CartSessionId::parse(&ack.session_id)
        .map_err(|err| CartClientError::decode(err.to_string()))?;
    Ok(CartAddReceipt {
        session_id,
        message: ack.message,
    })
}

#[async_trait]
impl CartClient for HttpCartClient {
    async fn add_to_cart(
        &self,
        request: &CartAddRequest,
    ) -> Result<CartAddReceipt, CartClientError> {
        retry_with_backoff(
            self.endpoint.retry,
            self.endpoint.sleeper.as_ref(),
            "cart.add_to_cart",
            |_| self.add_once(request),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlbumDetails, AlbumId, Price, Quantity};

    const SESSION: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn form_carries_details_and_session() {
        let request = CartAddRequest {
            session_id: Some(CartSessionId::parse(SESSION).expect("session")),
            album: AlbumDetails {
                album_id: AlbumId::new(2),
                album_name: "Ride the Lightning".to_owned(),
                artist: "Metallica".to_owned(),
                price: Price::parse("21.5").expect("price"),
                cover_url: None,
            },
            quantity: Quantity::new(3).expect("quantity"),
        };

        let built = reqwest::Client::new()
            .post("http://cart.test/add_to_cart")
            .form(&AddToCartForm::from(&request))
            .build()
            .expect("request");
        let encoded = built
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .expect("form body");

        assert!(encoded.contains("album_id=2"));
        assert!(encoded.contains("quantity=3"));
        assert!(encoded.contains("price=21.50"));
        assert!(encoded.contains(&format!("session_id={SESSION}")));
        assert!(!encoded.contains("cover_url"));
    }

    #[test]
    fn acknowledgement_yields_session() {
        let body = format!(
            r#"{{"success":true,"message":"Item added to cart","session_id":"{SESSION}","redirect_url":"/"}}"#
        );

        let receipt = parse_receipt(body.as_bytes()).expect("receipt");

        assert_eq!(receipt.session_id.as_str(), SESSION);
        assert_eq!(receipt.message, "Item added to cart");
    }

    #[test]
    fn malformed_session_in_acknowledgement_is_a_decode_error() {
        let err = parse_receipt(br#"{"session_id":"../etc"}"#).expect_err("bad session");
        assert!(matches!(err, CartClientError::Decode { .. }));
    }
}
