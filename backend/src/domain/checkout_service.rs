//! Checkout: form validation, simulated payment, and order hand-off.
//!
//! The flow is a fixed progression. Load the cart, validate the form, wait
//! out the processing delay, consult the payment gate, then create the order
//! under the caller's idempotency key and clear the cart. Every rejection
//! leaves the cart untouched so the form can be redisplayed with its lines.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::cart_service::map_cart_error;
use crate::domain::payment::{PaymentDecision, PaymentGate};
use crate::domain::ports::{CartRepository, OrderClient, OrderClientError};
use crate::domain::retry::Sleeper;
use crate::domain::{
    Cart, CartSessionId, CheckoutForm, CheckoutValidationError, Error, IdempotencyKey, OrderDraft,
    OrderLine, OrderReceipt, Price,
};

/// Why a checkout attempt did not produce an order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutRejection {
    /// The form failed validation.
    #[error(transparent)]
    Invalid(#[from] CheckoutValidationError),
    /// The simulated gate declined the card.
    #[error("Payment declined. Please check your card details and try again.")]
    Declined,
    /// The order service refused the order.
    #[error("Order processing failed. Please try again.")]
    OrderFailed,
    /// The order service could not be reached.
    #[error("Order service unavailable. Please try again later.")]
    OrderServiceUnavailable,
}

/// Result of [`CheckoutService::process_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Nothing to buy; callers redirect to the cart view.
    EmptyCart,
    /// The order was created and the cart cleared.
    Completed {
        /// Order service acknowledgement.
        receipt: OrderReceipt,
    },
    /// The attempt was rejected; the cart is unchanged.
    Rejected {
        /// Cart to redisplay alongside the error.
        cart: Cart,
        /// User-facing reason.
        reason: CheckoutRejection,
    },
}

/// Ports and tunables required by [`CheckoutService`].
#[derive(Clone)]
pub struct CheckoutPorts {
    /// Cart storage.
    pub carts: Arc<dyn CartRepository>,
    /// Order creation.
    pub orders: Arc<dyn OrderClient>,
    /// Simulated card authorisation.
    pub payments: Arc<dyn PaymentGate>,
    /// Processing delay driver.
    pub sleeper: Arc<dyn Sleeper>,
    /// Simulated processing latency.
    pub processing_delay: Duration,
}

/// Checkout application service.
#[derive(Clone)]
pub struct CheckoutService {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderClient>,
    payments: Arc<dyn PaymentGate>,
    sleeper: Arc<dyn Sleeper>,
    processing_delay: Duration,
}

impl CheckoutService {
    /// Build the service from its ports.
    #[must_use]
    pub fn new(ports: CheckoutPorts) -> Self {
        Self {
            carts: ports.carts,
            orders: ports.orders,
            payments: ports.payments,
            sleeper: ports.sleeper,
            processing_delay: ports.processing_delay,
        }
    }

    /// Run checkout for `session`.
    ///
    /// Resubmitting with the same `idempotency_key` after a lost response
    /// returns the original order rather than creating a second one.
    ///
    /// # Errors
    /// Only cart store failures are errors; every business rejection is an
    /// [`CheckoutOutcome::Rejected`].
    pub async fn process_payment(
        &self,
        session: &CartSessionId,
        form: &CheckoutForm,
        idempotency_key: IdempotencyKey,
    ) -> Result<CheckoutOutcome, Error> {
        let items = self.carts.list(session).await.map_err(map_cart_error)?;
        let cart = Cart::new(session.clone(), items);
        if cart.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        let customer = match form.validate() {
            Ok(customer) => customer,
            Err(err) => return Ok(rejected(cart, err.into())),
        };

        self.sleeper.sleep(self.processing_delay).await;

        if self.payments.authorize() == PaymentDecision::Declined {
            info!(session = %session, "payment declined");
            return Ok(rejected(cart, CheckoutRejection::Declined));
        }

        let draft = draft_for(&cart)?.with_customer(customer);
        let receipt = match self.orders.create_order(&draft, idempotency_key).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(session = %session, error = %err, "order creation failed");
                let reason = match err {
                    OrderClientError::Transport { .. } => {
                        CheckoutRejection::OrderServiceUnavailable
                    }
                    OrderClientError::Status { .. } | OrderClientError::Decode { .. } => {
                        CheckoutRejection::OrderFailed
                    }
                };
                return Ok(rejected(cart, reason));
            }
        };
        info!(
            session = %session,
            order_number = %receipt.order_number,
            total = %receipt.total,
            "order created"
        );

        if let Err(err) = self.carts.clear(session).await {
            warn!(session = %session, error = %err, "cart not cleared after order");
        }
        Ok(CheckoutOutcome::Completed { receipt })
    }
}

fn rejected(cart: Cart, reason: CheckoutRejection) -> CheckoutOutcome {
    CheckoutOutcome::Rejected { cart, reason }
}

fn draft_for(cart: &Cart) -> Result<OrderDraft, Error> {
    let items = cart
        .items()
        .iter()
        .map(|item| OrderLine {
            album_id: item.album.album_id,
            album_name: item.album.album_name.clone(),
            artist: item.album.artist.clone(),
            price: item.album.price,
            quantity: item.quantity,
        })
        .collect();
    let total = cart
        .total()
        .ok_or_else(|| Error::invalid_request("Cart total is out of range"))
        .and_then(|total| {
            Price::try_new(total)
                .map_err(|err| Error::invalid_request(format!("Cart total is invalid: {err}")))
        })?;
    Ok(OrderDraft::new(
        Some(cart.session_id().as_str().to_owned()),
        items,
        total,
    ))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::payment::MockPaymentGate;
    use crate::domain::ports::{CartRepositoryError, MockCartRepository, MockOrderClient};
    use crate::domain::retry::MockSleeper;
    use crate::domain::{
        AlbumDetails, AlbumId, CartItem, CartItemId, OrderId, OrderNumber, OrderStatus, Quantity,
        REQUIRED_FIELDS,
    };
    use chrono::Utc;
    use rstest::{fixture, rstest};

    fn session() -> CartSessionId {
        CartSessionId::parse("0123456789abcdef0123456789abcdef").expect("session id")
    }

    fn line(id: i32, price: &str, quantity: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            session_id: session(),
            album: AlbumDetails {
                album_id: AlbumId::new(id),
                album_name: format!("Album {id}"),
                artist: "Artist".to_owned(),
                price: Price::parse(price).expect("price"),
                cover_url: None,
            },
            quantity: Quantity::new(quantity).expect("quantity"),
            created_at: Utc::now(),
        }
    }

    #[fixture]
    fn valid_form() -> CheckoutForm {
        CheckoutForm::new(REQUIRED_FIELDS.iter().map(|field| {
            let value = match *field {
                "email" => "buyer@example.com",
                "card_number" => "4111 1111 1111 1234",
                "cvv" => "123",
                "cardholder_name" => "Jane Doe",
                _ => "value",
            };
            ((*field).to_owned(), value.to_owned())
        }))
    }

    fn receipt(total: &str) -> OrderReceipt {
        OrderReceipt {
            order_id: OrderId::new(1),
            order_number: OrderNumber::from_stored("ORD-20240101000000-0001"),
            status: OrderStatus::confirmed(),
            total: Price::parse(total).expect("price"),
        }
    }

    struct Harness {
        carts: MockCartRepository,
        orders: MockOrderClient,
        payments: MockPaymentGate,
        sleeper: MockSleeper,
    }

    impl Harness {
        fn with_cart(items: Vec<CartItem>) -> Self {
            let mut carts = MockCartRepository::new();
            carts.expect_list().return_once(move |_| Ok(items));
            let mut sleeper = MockSleeper::new();
            sleeper.expect_sleep().returning(|_| ());
            Self {
                carts,
                orders: MockOrderClient::new(),
                payments: MockPaymentGate::new(),
                sleeper,
            }
        }

        fn approve(mut self) -> Self {
            self.payments
                .expect_authorize()
                .returning(|| PaymentDecision::Approved);
            self
        }

        fn build(self) -> CheckoutService {
            CheckoutService::new(CheckoutPorts {
                carts: Arc::new(self.carts),
                orders: Arc::new(self.orders),
                payments: Arc::new(self.payments),
                sleeper: Arc::new(self.sleeper),
                processing_delay: Duration::from_secs(2),
            })
        }
    }

    #[rstest]
    #[tokio::test]
    async fn empty_cart_short_circuits(valid_form: CheckoutForm) {
        let mut harness = Harness::with_cart(Vec::new());
        harness.orders.expect_create_order().never();
        harness.payments.expect_authorize().never();
        let outcome = harness
            .build()
            .process_payment(&session(), &valid_form, IdempotencyKey::random())
            .await
            .expect("outcome");
        assert_eq!(outcome, CheckoutOutcome::EmptyCart);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_field_names_field_and_skips_order(
        #[values("shipping_city", "billing_zip", "cvv", "email")] blank: &str,
        valid_form: CheckoutForm,
    ) {
        let mut harness = Harness::with_cart(vec![line(1, "10.00", 1)]);
        harness.orders.expect_create_order().never();
        harness.payments.expect_authorize().never();
        let fields = REQUIRED_FIELDS.iter().map(|field| {
            let value = if *field == blank {
                String::new()
            } else {
                valid_form.value(field).to_owned()
            };
            ((*field).to_owned(), value)
        });
        let outcome = harness
            .build()
            .process_payment(&session(), &CheckoutForm::new(fields), IdempotencyKey::random())
            .await
            .expect("outcome");
        let CheckoutOutcome::Rejected { reason, cart } = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert_eq!(cart.items().len(), 1);
        assert_eq!(
            reason,
            CheckoutRejection::Invalid(CheckoutValidationError::MissingField {
                field: REQUIRED_FIELDS
                    .iter()
                    .copied()
                    .find(|field| *field == blank)
                    .expect("known field"),
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn declined_payment_keeps_cart(valid_form: CheckoutForm) {
        let mut harness = Harness::with_cart(vec![line(1, "10.00", 1)]);
        harness
            .payments
            .expect_authorize()
            .returning(|| PaymentDecision::Declined);
        harness.orders.expect_create_order().never();
        harness.carts.expect_clear().never();
        let outcome = harness
            .build()
            .process_payment(&session(), &valid_form, IdempotencyKey::random())
            .await
            .expect("outcome");
        assert!(matches!(
            outcome,
            CheckoutOutcome::Rejected {
                reason: CheckoutRejection::Declined,
                ..
            }
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn approved_payment_creates_order_and_clears_cart(valid_form: CheckoutForm) {
        let key = IdempotencyKey::random();
        let mut harness =
            Harness::with_cart(vec![line(1, "24.99", 2), line(2, "19.99", 1)]).approve();
        harness
            .orders
            .expect_create_order()
            .withf(move |draft, sent_key| {
                *sent_key == key
                    && draft.items.len() == 2
                    && draft.total == Price::parse("69.97").expect("price")
                    && draft
                        .payment_info
                        .as_ref()
                        .is_some_and(|payment| payment.card_last_four == "1234")
                    && draft.validate().is_ok()
            })
            .times(1)
            .returning(|_, _| Ok(receipt("69.97")));
        harness
            .carts
            .expect_clear()
            .times(1)
            .returning(|_| Ok(2));
        let outcome = harness
            .build()
            .process_payment(&session(), &valid_form, key)
            .await
            .expect("outcome");
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                receipt: receipt("69.97")
            }
        );
    }

    #[rstest]
    #[case(OrderClientError::transport("timed out"), CheckoutRejection::OrderServiceUnavailable)]
    #[case(OrderClientError::status(500_u16, "boom"), CheckoutRejection::OrderFailed)]
    #[case(OrderClientError::status(409_u16, "conflict"), CheckoutRejection::OrderFailed)]
    #[tokio::test]
    async fn order_failures_keep_cart(
        #[case] failure: OrderClientError,
        #[case] expected: CheckoutRejection,
        valid_form: CheckoutForm,
    ) {
        let mut harness = Harness::with_cart(vec![line(1, "10.00", 1)]).approve();
        harness
            .orders
            .expect_create_order()
            .return_once(move |_, _| Err(failure));
        harness.carts.expect_clear().never();
        let outcome = harness
            .build()
            .process_payment(&session(), &valid_form, IdempotencyKey::random())
            .await
            .expect("outcome");
        let CheckoutOutcome::Rejected { reason, .. } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(reason, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn clear_failure_still_completes(valid_form: CheckoutForm) {
        let mut harness = Harness::with_cart(vec![line(1, "10.00", 1)]).approve();
        harness
            .orders
            .expect_create_order()
            .returning(|_, _| Ok(receipt("10.00")));
        harness
            .carts
            .expect_clear()
            .returning(|_| Err(CartRepositoryError::query("deadlock")));
        let outcome = harness
            .build()
            .process_payment(&session(), &valid_form, IdempotencyKey::random())
            .await
            .expect("outcome");
        assert!(matches!(outcome, CheckoutOutcome::Completed { .. }));
    }
}
