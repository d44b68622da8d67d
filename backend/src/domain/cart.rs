//! Shopping cart primitives.
//!
//! Cart lines copy the album name, artist, price, and cover at add time. They
//! are not reconciled with later catalogue edits: the price a shopper saw when
//! adding the album is the price they pay.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AlbumId, Price, sum_line_totals};

const SESSION_ID_BYTES: usize = 16;
const SESSION_ID_LEN: usize = SESSION_ID_BYTES * 2;

/// Validation failures for caller-supplied cart session identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartSessionIdError {
    /// The identifier was blank.
    #[error("session id must not be empty")]
    Empty,
    /// The identifier had the wrong length.
    #[error("session id must be {expected} characters long")]
    WrongLength {
        /// Required length.
        expected: usize,
    },
    /// The identifier contained characters outside `[0-9a-f]`.
    #[error("session id may only contain lowercase hex digits")]
    InvalidCharacter,
}

/// Opaque identifier grouping cart lines for one shopper.
///
/// Identifiers are 32 lowercase hex characters drawn from 16 random bytes.
/// Only identifiers of that exact shape are accepted from callers, so a
/// shopper cannot be pinned to a guessable cart.
///
/// # Examples
/// ```
/// use storefront::domain::CartSessionId;
///
/// let generated = CartSessionId::generate();
/// assert_eq!(generated.as_str().len(), 32);
/// assert!(CartSessionId::parse(generated.as_str()).is_ok());
/// assert!(CartSessionId::parse("s1").is_err());
/// assert!(CartSessionId::parse("<script>").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CartSessionId(String);

impl CartSessionId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; SESSION_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Validate a caller-supplied identifier.
    ///
    /// # Errors
    /// Returns [`CartSessionIdError`] when the value is blank, is not 32
    /// characters long, or holds anything but lowercase hex digits.
    pub fn parse(raw: &str) -> Result<Self, CartSessionIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CartSessionIdError::Empty);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(CartSessionIdError::InvalidCharacter);
        }
        if trimmed.len() != SESSION_ID_LEN {
            return Err(CartSessionIdError::WrongLength {
                expected: SESSION_ID_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CartSessionId {
    type Error = CartSessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CartSessionId> for String {
    fn from(value: CartSessionId) -> Self {
        value.0
    }
}

impl fmt::Display for CartSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItemId(i32);

impl CartItemId {
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

impl fmt::Display for CartItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    /// Quantity was zero or negative.
    #[error("quantity must be at least 1")]
    NotPositive,
    /// Quantity exceeded the storable range.
    #[error("quantity is too large")]
    TooLarge,
}

/// Strictly positive unit count that fits the persisted `INTEGER` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Validate a raw count.
    ///
    /// # Errors
    /// Returns [`QuantityError`] when the value is not in `1..=i32::MAX`.
    pub fn new(raw: i64) -> Result<Self, QuantityError> {
        if raw < 1 {
            return Err(QuantityError::NotPositive);
        }
        i32::try_from(raw)
            .ok()
            .and_then(|value| u32::try_from(value).ok())
            .map(Self)
            .ok_or(QuantityError::TooLarge)
    }

    /// Raw count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Sum two quantities, saturating at the storable maximum.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        let max = u32::try_from(i32::MAX).unwrap_or(u32::MAX);
        Self(self.0.saturating_add(other.0).min(max))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

/// Album details denormalised into a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDetails {
    /// Catalogue identifier.
    pub album_id: AlbumId,
    /// Album title at add time.
    pub album_name: String,
    /// Artist at add time.
    pub artist: String,
    /// Unit price at add time.
    pub price: Price,
    /// Cover reference at add time.
    pub cover_url: Option<String>,
}

/// One album line in a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    /// Line identifier.
    pub id: CartItemId,
    /// Owning session.
    pub session_id: CartSessionId,
    /// Album details copied at add time.
    #[serde(flatten)]
    pub album: AlbumDetails,
    /// Units of the album.
    pub quantity: Quantity,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Price multiplied by quantity; `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.album.price.times(self.quantity.get())
    }
}

/// Snapshot of every line held under one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    session_id: CartSessionId,
    items: Vec<CartItem>,
}

impl Cart {
    /// Build a cart from its lines.
    #[must_use]
    pub const fn new(session_id: CartSessionId, items: Vec<CartItem>) -> Self {
        Self { session_id, items }
    }

    /// Owning session.
    #[must_use]
    pub const fn session_id(&self) -> &CartSessionId {
        &self.session_id
    }

    /// Lines, newest first.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line totals rounded to cents; `None` on overflow.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        sum_line_totals(self.items.iter().map(CartItem::line_total))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn item(id: i32, price: &str, quantity: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            session_id: CartSessionId::parse("0123456789abcdef0123456789abcdef").expect("valid session"),
            album: AlbumDetails {
                album_id: AlbumId::new(id),
                album_name: format!("Album {id}"),
                artist: "Artist".to_owned(),
                price: Price::parse(price).expect("valid price"),
                cover_url: None,
            },
            quantity: Quantity::new(quantity).expect("valid quantity"),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn generated_ids_are_lowercase_hex() {
        let id = CartSessionId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert!(CartSessionId::parse(id.as_str()).is_ok());
    }

    #[rstest]
    #[case("", CartSessionIdError::Empty)]
    #[case("a b", CartSessionIdError::InvalidCharacter)]
    #[case("x\"><", CartSessionIdError::InvalidCharacter)]
    #[case("handoff", CartSessionIdError::InvalidCharacter)]
    #[case("0123456789ABCDEF0123456789ABCDEF", CartSessionIdError::InvalidCharacter)]
    #[case("s1", CartSessionIdError::InvalidCharacter)]
    #[case("abc123", CartSessionIdError::WrongLength { expected: 32 })]
    fn rejects_malformed_session_ids(#[case] raw: &str, #[case] expected: CartSessionIdError) {
        assert_eq!(CartSessionId::parse(raw), Err(expected));
    }

    #[rstest]
    fn rejects_overlong_session_ids() {
        let raw = "a".repeat(33);
        assert_eq!(
            CartSessionId::parse(&raw),
            Err(CartSessionIdError::WrongLength { expected: 32 })
        );
    }

    #[rstest]
    fn accepts_padded_hex_ids() {
        let parsed = CartSessionId::parse(" 0123456789abcdef0123456789abcdef ").expect("valid id");
        assert_eq!(parsed.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[rstest]
    #[case(0, Err(QuantityError::NotPositive))]
    #[case(-3, Err(QuantityError::NotPositive))]
    #[case(1, Ok(1))]
    #[case(i64::from(i32::MAX) + 1, Err(QuantityError::TooLarge))]
    fn quantity_bounds(#[case] raw: i64, #[case] expected: Result<u32, QuantityError>) {
        assert_eq!(Quantity::new(raw).map(Quantity::get), expected);
    }

    #[rstest]
    fn cart_total_sums_lines() {
        let cart = Cart::new(
            CartSessionId::parse("0123456789abcdef0123456789abcdef").expect("valid session"),
            vec![item(1, "9.99", 2), item(2, "0.01", 3)],
        );
        assert_eq!(cart.total(), Some(Decimal::new(2001, 2)));
    }
}
