//! Order records and the create-order wire payload shared by the cart and
//! order services.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AlbumId, Price, Quantity, sum_line_totals};

/// Identifier assigned to an order by the order store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i32);

impl OrderId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable order number, `ORD-YYYYMMDDHHMMSS-NNNN`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use storefront::domain::OrderNumber;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// let number = OrderNumber::generate(at, &mut rand::thread_rng());
/// assert!(number.as_str().starts_with("ORD-20240309140507-"));
/// assert_eq!(number.as_str().len(), 23);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Build a number from a timestamp and a random four-digit suffix.
    pub fn generate<R: Rng + ?Sized>(at: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: u16 = rng.gen_range(0..10_000);
        Self(format!("ORD-{}-{suffix:04}", at.format("%Y%m%d%H%M%S")))
    }

    /// Wrap a stored order number.
    #[must_use]
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the number text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-text order status. Any non-blank value is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

/// Raised when a status update carries a blank value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Status is required")]
pub struct EmptyStatusError;

impl OrderStatus {
    /// Status assigned to freshly created orders.
    #[must_use]
    pub fn confirmed() -> Self {
        Self("confirmed".to_owned())
    }

    /// Validate a caller-supplied status.
    ///
    /// # Errors
    /// Returns [`EmptyStatusError`] when the value is blank.
    pub fn parse(raw: &str) -> Result<Self, EmptyStatusError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyStatusError);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Wrap a stored status without validation.
    #[must_use]
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the status text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One album line inside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    /// Catalogue identifier.
    #[schema(value_type = i32, example = 1)]
    pub album_id: AlbumId,
    /// Album title at purchase time.
    pub album_name: String,
    /// Artist at purchase time.
    pub artist: String,
    /// Unit price at purchase time.
    #[schema(value_type = f64, example = 24.99)]
    pub price: Price,
    /// Units purchased.
    #[schema(value_type = u32, example = 2)]
    pub quantity: Quantity,
}

impl OrderLine {
    /// Price multiplied by quantity; `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.times(self.quantity.get())
    }
}

/// Shipping address and contact phone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingInfo {
    /// Recipient first name.
    pub first_name: String,
    /// Recipient last name.
    pub last_name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
    /// Contact phone number.
    pub phone: String,
}

/// Billing address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BillingInfo {
    /// Payer first name.
    pub first_name: String,
    /// Payer last name.
    pub last_name: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
}

/// Payment summary. Only the last four card digits are retained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentSummary {
    /// Name printed on the card.
    pub cardholder_name: String,
    /// Last four digits of the card number.
    pub card_last_four: String,
    /// Receipt email address.
    pub email: String,
}

/// Customer details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomerDetails {
    /// Where to ship.
    pub shipping_info: ShippingInfo,
    /// Who pays.
    pub billing_info: BillingInfo,
    /// Card summary.
    pub payment_info: PaymentSummary,
}

/// Create-order request body sent by the cart service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderDraft {
    /// Originating cart session, if known.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Purchased lines.
    pub items: Vec<OrderLine>,
    /// Order total; must equal the sum of line totals.
    #[schema(value_type = f64, example = 49.98)]
    pub total: Price,
    /// Shipping address and phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<ShippingInfo>,
    /// Billing address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_info: Option<BillingInfo>,
    /// Card summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<PaymentSummary>,
}

/// Validation failures for [`OrderDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderValidationError {
    /// The draft carried no lines.
    #[error("No items in order")]
    NoItems,
    /// The stated total did not match the lines.
    #[error("Order total {stated} does not match item total {computed}")]
    TotalMismatch {
        /// Total claimed by the caller.
        stated: Decimal,
        /// Total computed from the lines.
        computed: Decimal,
    },
    /// The line totals are too large to add up.
    #[error("Order total is out of range")]
    TotalOutOfRange,
}

impl OrderDraft {
    /// Build a draft from cart lines and checkout details.
    #[must_use]
    pub fn new(session_id: Option<String>, items: Vec<OrderLine>, total: Price) -> Self {
        Self {
            session_id,
            items,
            total,
            shipping_info: None,
            billing_info: None,
            payment_info: None,
        }
    }

    /// Attach the customer details captured at checkout.
    #[must_use]
    pub fn with_customer(mut self, customer: CustomerDetails) -> Self {
        self.shipping_info = Some(customer.shipping_info);
        self.billing_info = Some(customer.billing_info);
        self.payment_info = Some(customer.payment_info);
        self
    }

    /// Customer details when all three sections were supplied.
    #[must_use]
    pub fn customer_details(&self) -> Option<CustomerDetails> {
        match (&self.shipping_info, &self.billing_info, &self.payment_info) {
            (Some(shipping), Some(billing), Some(payment)) => Some(CustomerDetails {
                shipping_info: shipping.clone(),
                billing_info: billing.clone(),
                payment_info: payment.clone(),
            }),
            _ => None,
        }
    }

    /// Sum of line totals rounded to cents; `None` on overflow.
    #[must_use]
    pub fn computed_total(&self) -> Option<Decimal> {
        sum_line_totals(self.items.iter().map(OrderLine::line_total))
    }

    /// Check the draft is non-empty and internally consistent.
    ///
    /// # Errors
    /// Returns [`OrderValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        let computed = self
            .computed_total()
            .ok_or(OrderValidationError::TotalOutOfRange)?;
        if computed != self.total.amount() {
            return Err(OrderValidationError::TotalMismatch {
                stated: self.total.amount(),
                computed,
            });
        }
        Ok(())
    }
}

/// Durable order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    /// Generated identifier.
    #[schema(value_type = i32, example = 1)]
    pub id: OrderId,
    /// Human-readable number.
    #[schema(value_type = String, example = "ORD-20240309140507-0042")]
    pub order_number: OrderNumber,
    /// Originating cart session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Order total.
    #[schema(value_type = f64, example = 49.98)]
    pub total_amount: Price,
    /// Current status.
    #[schema(value_type = String, example = "confirmed")]
    pub status: OrderStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Purchased lines.
    pub items: Vec<OrderLine>,
    /// Shipping, billing, and payment summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerDetails>,
}

impl Order {
    /// Condensed listing view.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            order_number: self.order_number.clone(),
            total_amount: self.total_amount,
            status: self.status.clone(),
            created_at: self.created_at,
            item_count: u32::try_from(self.items.len()).unwrap_or(u32::MAX),
        }
    }

    /// Creation response for this order.
    #[must_use]
    pub fn receipt(&self) -> OrderReceipt {
        OrderReceipt {
            order_id: self.id,
            order_number: self.order_number.clone(),
            status: self.status.clone(),
            total: self.total_amount,
        }
    }
}

/// Row in the order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    /// Generated identifier.
    #[schema(value_type = i32)]
    pub id: OrderId,
    /// Human-readable number.
    #[schema(value_type = String)]
    pub order_number: OrderNumber,
    /// Order total.
    #[schema(value_type = f64)]
    pub total_amount: Price,
    /// Current status.
    #[schema(value_type = String)]
    pub status: OrderStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Number of distinct lines.
    pub item_count: u32,
}

/// Body returned by a successful create-order call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderReceipt {
    /// Generated identifier.
    #[schema(value_type = i32)]
    pub order_id: OrderId,
    /// Human-readable number.
    #[schema(value_type = String)]
    pub order_number: OrderNumber,
    /// Initial status.
    #[schema(value_type = String)]
    pub status: OrderStatus,
    /// Order total.
    #[schema(value_type = f64)]
    pub total: Price,
}
