//! Order use-cases: idempotent creation, listing, and status updates.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    IdempotencyRecord, NewOrder, OrderRepository, OrderRepositoryError, StoredOrder,
};
use crate::domain::{
    Error, IdempotencyKey, Order, OrderDraft, OrderId, OrderNumber, OrderStatus, OrderSummary,
    PayloadHash,
};

/// Attempts made to find an unused order number before giving up.
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// Result of [`OrderService::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOrderOutcome {
    /// A new order was stored.
    Created(Order),
    /// The idempotency key matched an earlier identical request.
    Replayed(Order),
}

impl CreateOrderOutcome {
    /// The order regardless of how it was obtained.
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Created(order) | Self::Replayed(order) => order,
        }
    }

    /// Whether the order already existed.
    #[must_use]
    pub const fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

/// Order application service.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    /// Build the service from its ports.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { orders, clock }
    }

    /// Validate and store an order.
    ///
    /// With an idempotency key, a repeat of an identical request returns the
    /// stored order; reusing the key for a different request is a conflict.
    ///
    /// # Errors
    /// `invalid_request` for empty or inconsistent drafts, `conflict` for key
    /// reuse, and store failures otherwise.
    pub async fn create(
        &self,
        draft: OrderDraft,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<CreateOrderOutcome, Error> {
        draft
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let idempotency = match idempotency_key {
            Some(key) => {
                let payload_hash = PayloadHash::of(&draft)
                    .map_err(|err| Error::internal(format!("payload hash failed: {err}")))?;
                if let Some(existing) = self
                    .orders
                    .find_by_idempotency_key(&key)
                    .await
                    .map_err(map_order_error)?
                {
                    return replay(existing, &payload_hash, key);
                }
                Some(IdempotencyRecord { key, payload_hash })
            }
            None => None,
        };

        let customer = draft.customer_details();
        let mut attempt = 1;
        loop {
            let created_at = self.clock.utc();
            let order_number = OrderNumber::generate(created_at, &mut rand::thread_rng());
            let new_order = NewOrder {
                order_number,
                session_id: draft.session_id.clone(),
                total: draft.total,
                status: OrderStatus::confirmed(),
                items: draft.items.clone(),
                customer: customer.clone(),
                idempotency: idempotency.clone(),
                created_at,
            };
            match self.orders.insert(&new_order).await {
                Ok(order) => {
                    info!(
                        order_id = %order.id,
                        order_number = %order.order_number,
                        total = %order.total_amount,
                        "order created"
                    );
                    return Ok(CreateOrderOutcome::Created(order));
                }
                Err(OrderRepositoryError::DuplicateOrderNumber { order_number })
                    if attempt < MAX_ORDER_NUMBER_ATTEMPTS =>
                {
                    warn!(%order_number, attempt, "order number collision; regenerating");
                    attempt += 1;
                }
                Err(OrderRepositoryError::DuplicateIdempotencyKey { .. }) => {
                    return self.replay_after_race(idempotency.as_ref()).await;
                }
                Err(err) => return Err(map_order_error(err)),
            }
        }
    }

    async fn replay_after_race(
        &self,
        idempotency: Option<&IdempotencyRecord>,
    ) -> Result<CreateOrderOutcome, Error> {
        let record =
            idempotency.ok_or_else(|| Error::internal("idempotency conflict without a key"))?;
        let existing = self
            .orders
            .find_by_idempotency_key(&record.key)
            .await
            .map_err(map_order_error)?
            .ok_or_else(|| Error::internal("idempotent order vanished after conflict"))?;
        replay(existing, &record.payload_hash, record.key)
    }

    /// Every order, newest first.
    ///
    /// # Errors
    /// Store failures.
    pub async fn list(&self) -> Result<Vec<OrderSummary>, Error> {
        self.orders.list().await.map_err(map_order_error)
    }

    /// Fetch one order with its lines.
    ///
    /// # Errors
    /// `not_found` when the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order, Error> {
        self.orders
            .find(id)
            .await
            .map_err(map_order_error)?
            .ok_or_else(|| Error::not_found("Order not found"))
    }

    /// Overwrite an order's status with any non-blank value.
    ///
    /// # Errors
    /// `invalid_request` for a blank status, `not_found` for unknown orders.
    pub async fn update_status(&self, id: OrderId, status: &str) -> Result<OrderStatus, Error> {
        let status =
            OrderStatus::parse(status).map_err(|err| Error::invalid_request(err.to_string()))?;
        let updated = self
            .orders
            .update_status(id, &status)
            .await
            .map_err(map_order_error)?;
        if !updated {
            return Err(Error::not_found("Order not found"));
        }
        info!(order_id = %id, status = %status, "order status updated");
        Ok(status)
    }
}

fn replay(
    existing: StoredOrder,
    payload_hash: &PayloadHash,
    key: IdempotencyKey,
) -> Result<CreateOrderOutcome, Error> {
    if existing.payload_hash == *payload_hash {
        info!(idempotency_key = %key, order_id = %existing.order.id, "replaying order");
        Ok(CreateOrderOutcome::Replayed(existing.order))
    } else {
        warn!(idempotency_key = %key, "idempotency key reused with a different payload");
        Err(Error::conflict(
            "Idempotency key was already used for a different order",
        ))
    }
}

fn map_order_error(error: OrderRepositoryError) -> Error {
    match error {
        OrderRepositoryError::Connection { message } => {
            warn!(%message, "order store unavailable");
            Error::service_unavailable("Order store unavailable")
        }
        other => Error::internal(format!("order store failed: {other}")),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::MockOrderRepository;
    use crate::domain::{AlbumId, ErrorCode, OrderLine, Price, Quantity};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};

    struct FixtureClock;

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
                .single()
                .expect("valid timestamp")
        }
    }

    #[fixture]
    fn draft() -> OrderDraft {
        OrderDraft::new(
            Some("s1".to_owned()),
            vec![OrderLine {
                album_id: AlbumId::new(1),
                album_name: "Paranoid".to_owned(),
                artist: "Black Sabbath".to_owned(),
                price: Price::parse("24.99").expect("price"),
                quantity: Quantity::new(2).expect("quantity"),
            }],
            Price::parse("49.98").expect("price"),
        )
    }

    fn stored(new_order: &NewOrder) -> Order {
        Order {
            id: OrderId::new(1),
            order_number: new_order.order_number.clone(),
            session_id: new_order.session_id.clone(),
            total_amount: new_order.total,
            status: new_order.status.clone(),
            created_at: new_order.created_at,
            items: new_order.items.clone(),
            customer: new_order.customer.clone(),
        }
    }

    fn service(orders: MockOrderRepository) -> OrderService {
        OrderService::new(Arc::new(orders), Arc::new(FixtureClock))
    }

    #[rstest]
    #[tokio::test]
    async fn creates_confirmed_order_with_timestamped_number(draft: OrderDraft) {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_insert()
            .times(1)
            .returning(|new_order| Ok(stored(new_order)));
        let outcome = service(orders).create(draft, None).await.expect("created");
        assert!(!outcome.is_replay());
        let order = outcome.order();
        assert_eq!(order.status.as_str(), "confirmed");
        assert!(order.order_number.as_str().starts_with("ORD-20240309140507-"));
    }

    #[rstest]
    #[tokio::test]
    async fn empty_draft_is_rejected() {
        let mut orders = MockOrderRepository::new();
        orders.expect_insert().never();
        let draft = OrderDraft::new(None, Vec::new(), Price::ZERO);
        let err = service(orders)
            .create(draft, None)
            .await
            .expect_err("no items");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "No items in order");
    }

    #[rstest]
    #[tokio::test]
    async fn mismatched_total_is_rejected(mut draft: OrderDraft) {
        draft.total = Price::parse("10.00").expect("price");
        let mut orders = MockOrderRepository::new();
        orders.expect_insert().never();
        let err = service(orders)
            .create(draft, None)
            .await
            .expect_err("mismatch");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn replays_identical_request(draft: OrderDraft) {
        let hash = PayloadHash::of(&draft).expect("hash");
        let existing = stored(&NewOrder {
            order_number: OrderNumber::from_stored("ORD-20240309140507-0001"),
            session_id: draft.session_id.clone(),
            total: draft.total,
            status: OrderStatus::confirmed(),
            items: draft.items.clone(),
            customer: None,
            idempotency: None,
            created_at: FixtureClock.utc(),
        });
        let expected = existing.clone();
        let mut orders = MockOrderRepository::new();
        orders.expect_insert().never();
        orders.expect_find_by_idempotency_key().returning(move |_| {
            Ok(Some(StoredOrder {
                order: existing.clone(),
                payload_hash: hash.clone(),
            }))
        });
        let outcome = service(orders)
            .create(draft, Some(IdempotencyKey::random()))
            .await
            .expect("replayed");
        assert!(outcome.is_replay());
        assert_eq!(outcome.order(), &expected);
    }

    #[rstest]
    #[tokio::test]
    async fn key_reuse_with_new_payload_conflicts(draft: OrderDraft) {
        let mut other = draft.clone();
        other.session_id = Some("s2".to_owned());
        let other_hash = PayloadHash::of(&other).expect("hash");
        let existing = stored(&NewOrder {
            order_number: OrderNumber::from_stored("ORD-20240309140507-0001"),
            session_id: other.session_id.clone(),
            total: other.total,
            status: OrderStatus::confirmed(),
            items: other.items.clone(),
            customer: None,
            idempotency: None,
            created_at: FixtureClock.utc(),
        });
        let mut orders = MockOrderRepository::new();
        orders.expect_insert().never();
        orders.expect_find_by_idempotency_key().returning(move |_| {
            Ok(Some(StoredOrder {
                order: existing.clone(),
                payload_hash: other_hash.clone(),
            }))
        });
        let err = service(orders)
            .create(draft, Some(IdempotencyKey::random()))
            .await
            .expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn order_number_collisions_are_retried(draft: OrderDraft) {
        let mut orders = MockOrderRepository::new();
        let mut seq = mockall::Sequence::new();
        orders
            .expect_insert()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|new_order| {
                Err(OrderRepositoryError::duplicate_order_number(
                    new_order.order_number.as_str(),
                ))
            });
        orders
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|new_order| Ok(stored(new_order)));
        service(orders).create(draft, None).await.expect("created");
    }

    #[rstest]
    #[tokio::test]
    async fn persistent_collisions_give_up(draft: OrderDraft) {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_insert()
            .times(usize::try_from(MAX_ORDER_NUMBER_ATTEMPTS).expect("small"))
            .returning(|new_order| {
                Err(OrderRepositoryError::duplicate_order_number(
                    new_order.order_number.as_str(),
                ))
            });
        let err = service(orders)
            .create(draft, None)
            .await
            .expect_err("exhausted");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_key_claim_replays_winner(draft: OrderDraft) {
        let key = IdempotencyKey::random();
        let hash = PayloadHash::of(&draft).expect("hash");
        let mut orders = MockOrderRepository::new();
        let mut seq = mockall::Sequence::new();
        orders
            .expect_find_by_idempotency_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        orders
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Err(OrderRepositoryError::duplicate_idempotency_key(key.to_string())));
        let winner = NewOrder {
            order_number: OrderNumber::from_stored("ORD-20240309140507-0009"),
            session_id: draft.session_id.clone(),
            total: draft.total,
            status: OrderStatus::confirmed(),
            items: draft.items.clone(),
            customer: None,
            idempotency: None,
            created_at: FixtureClock.utc(),
        };
        let winner = stored(&winner);
        orders
            .expect_find_by_idempotency_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| {
                Ok(Some(StoredOrder {
                    order: winner.clone(),
                    payload_hash: hash.clone(),
                }))
            });
        let outcome = service(orders)
            .create(draft, Some(key))
            .await
            .expect("replayed");
        assert!(outcome.is_replay());
    }

    #[rstest]
    #[case("", ErrorCode::InvalidRequest)]
    #[case("   ", ErrorCode::InvalidRequest)]
    #[tokio::test]
    async fn blank_status_is_rejected(#[case] status: &str, #[case] expected: ErrorCode) {
        let mut orders = MockOrderRepository::new();
        orders.expect_update_status().never();
        let err = service(orders)
            .update_status(OrderId::new(1), status)
            .await
            .expect_err("blank");
        assert_eq!(err.code(), expected);
    }

    #[tokio::test]
    async fn unknown_order_status_update_is_not_found() {
        let mut orders = MockOrderRepository::new();
        orders.expect_update_status().returning(|_, _| Ok(false));
        let err = service(orders)
            .update_status(OrderId::new(404), "shipped")
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
