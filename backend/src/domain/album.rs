//! Album catalogue primitives.
//!
//! Prices are held as [`rust_decimal::Decimal`] so cart and order totals are
//! computed exactly; persistence adapters store them as integer cents.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier assigned to an album by the catalogue store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(i32);

impl AlbumId {
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

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures raised when building a [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceValidationError {
    /// The input was not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The value was below zero.
    #[error("price must not be negative")]
    Negative,
    /// The value does not fit in the persisted cents column.
    #[error("price is too large")]
    OutOfRange,
}

/// Non-negative monetary amount rounded to two decimal places.
///
/// # Examples
/// ```
/// use storefront::domain::Price;
///
/// let price = Price::parse("9.99").unwrap();
/// assert_eq!(price.to_cents(), Some(999));
/// assert!(Price::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount whose cents fit in an `i64`.
    pub const MAX: Self = Self(Decimal::from_parts(u32::MAX, 0x7FFF_FFFF, 0, false, 2));

    /// Validate and round a decimal amount.
    ///
    /// # Errors
    /// Returns [`PriceValidationError::Negative`] for amounts below zero and
    /// [`PriceValidationError::OutOfRange`] above [`Price::MAX`].
    pub fn try_new(amount: Decimal) -> Result<Self, PriceValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceValidationError::Negative);
        }
        let rounded = amount.round_dp(2);
        if rounded > Self::MAX.0 {
            return Err(PriceValidationError::OutOfRange);
        }
        Ok(Self(rounded))
    }

    /// Parse a user-supplied amount such as `"12.5"`.
    ///
    /// # Errors
    /// Returns [`PriceValidationError::NotANumber`] when the text is not a
    /// decimal and [`PriceValidationError::Negative`] for negative amounts.
    pub fn parse(raw: &str) -> Result<Self, PriceValidationError> {
        let amount = raw
            .trim()
            .parse::<Decimal>()
            .map_err(|_| PriceValidationError::NotANumber)?;
        Self::try_new(amount)
    }

    /// Rebuild a price from a stored cents value.
    ///
    /// # Errors
    /// Returns [`PriceValidationError::Negative`] for negative cents.
    pub fn from_cents(cents: i64) -> Result<Self, PriceValidationError> {
        Self::try_new(Decimal::new(cents, 2))
    }

    /// Amount in cents, or `None` when it does not fit in an `i64`.
    #[must_use]
    pub fn to_cents(self) -> Option<i64> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
    }

    /// Amount in cents, mapped to a validation error on overflow.
    ///
    /// # Errors
    /// Returns [`PriceValidationError::OutOfRange`] when the amount overflows.
    pub fn try_to_cents(self) -> Result<i64, PriceValidationError> {
        self.to_cents().ok_or(PriceValidationError::OutOfRange)
    }

    /// Underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units at this price, or `None` on overflow.
    #[must_use]
    pub fn times(self, quantity: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }
}

/// Sum line totals and round to cents. `None` when any line overflowed or
/// the sum itself does.
#[must_use]
pub fn sum_line_totals<I>(lines: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line?))
        .map(|total| total.round_dp(2))
}

impl TryFrom<Decimal> for Price {
    type Error = PriceValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Album record owned by the catalogue service.
///
/// Serialised as `{id, name, artist, price, cover_url}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Album {
    /// Generated identifier.
    #[schema(value_type = i32, example = 1)]
    pub id: AlbumId,
    /// Album title.
    #[schema(example = "Master of Puppets")]
    pub name: String,
    /// Performing artist.
    #[schema(example = "Metallica")]
    pub artist: String,
    /// Unit price.
    #[schema(value_type = f64, example = 24.99)]
    pub price: Price,
    /// Cover image URL or uploaded file path.
    pub cover_url: Option<String>,
}

/// Validation failures raised when building a [`NewAlbum`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlbumValidationError {
    /// Name was blank.
    #[error("album name must not be empty")]
    EmptyName,
    /// Artist was blank.
    #[error("artist must not be empty")]
    EmptyArtist,
    /// Price failed validation.
    #[error(transparent)]
    Price(#[from] PriceValidationError),
}

/// Validated album fields awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    name: String,
    artist: String,
    price: Price,
    cover_url: Option<String>,
}

impl NewAlbum {
    /// Validate raw form values.
    ///
    /// # Errors
    /// Returns an [`AlbumValidationError`] naming the first invalid field.
    pub fn try_from_parts(
        name: &str,
        artist: &str,
        price: &str,
    ) -> Result<Self, AlbumValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AlbumValidationError::EmptyName);
        }
        let artist = artist.trim();
        if artist.is_empty() {
            return Err(AlbumValidationError::EmptyArtist);
        }
        let price = Price::parse(price)?;
        Ok(Self {
            name: name.to_owned(),
            artist: artist.to_owned(),
            price,
            cover_url: None,
        })
    }

    /// Attach a cover reference; blank references are ignored.
    #[must_use]
    pub fn with_cover(mut self, cover_url: Option<String>) -> Self {
        self.cover_url = cover_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty());
        self
    }

    /// Album title.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Performing artist.
    #[must_use]
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Cover reference, if any.
    #[must_use]
    pub fn cover_url(&self) -> Option<&str> {
        self.cover_url.as_deref()
    }

    /// Materialise the album once the store has assigned an identifier.
    #[must_use]
    pub fn into_album(self, id: AlbumId) -> Album {
        Album {
            id,
            name: self.name,
            artist: self.artist,
            price: self.price,
            cover_url: self.cover_url,
        }
    }
}
