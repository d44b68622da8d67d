//! Checkout form validation.
//!
//! Fields are checked in a fixed order and the first failure wins, so the
//! shopper sees one actionable message at a time.

use std::collections::BTreeMap;

use super::{BillingInfo, CustomerDetails, PaymentSummary, ShippingInfo};

/// Form fields that must be present and non-blank, in validation order.
pub const REQUIRED_FIELDS: [&str; 20] = [
    "card_number",
    "expiry",
    "cvv",
    "cardholder_name",
    "shipping_first_name",
    "shipping_last_name",
    "shipping_address",
    "shipping_city",
    "shipping_state",
    "shipping_zip",
    "shipping_country",
    "billing_first_name",
    "billing_last_name",
    "billing_address",
    "billing_city",
    "billing_state",
    "billing_zip",
    "billing_country",
    "email",
    "phone",
];

/// Validation failure reported back on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutValidationError {
    /// A required field was missing or blank.
    #[error("Please fill in all required fields. Missing: {}", field_label(field))]
    MissingField {
        /// Form name of the missing field.
        field: &'static str,
    },
    /// Card number was not 13 to 19 digits.
    #[error("Invalid card number. Please enter a valid credit card number.")]
    InvalidCardNumber,
    /// CVV was not 3 or 4 digits.
    #[error("Invalid CVV. Please enter a valid 3 or 4 digit CVV.")]
    InvalidCvv,
    /// Cardholder name shorter than two characters.
    #[error("Please enter the cardholder name as it appears on the card.")]
    InvalidCardholderName,
    /// Email did not look like an address.
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

/// Turn `shipping_first_name` into `Shipping First Name`.
#[must_use]
pub fn field_label(field: &str) -> String {
    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw checkout form values keyed by field name.
///
/// # Examples
/// ```
/// use storefront::domain::{CheckoutForm, CheckoutValidationError};
///
/// let form = CheckoutForm::new([("card_number".to_owned(), String::new())]);
/// assert_eq!(
///     form.validate(),
///     Err(CheckoutValidationError::MissingField { field: "card_number" })
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    fields: BTreeMap<String, String>,
}

impl CheckoutForm {
    /// Collect form values.
    pub fn new(fields: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Trimmed value of `name`, or an empty string when absent.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", |value| value.trim())
    }

    /// Validate the form and extract the customer details sent with the
    /// order. Only the last four card digits survive.
    ///
    /// # Errors
    /// Returns the first [`CheckoutValidationError`] encountered.
    pub fn validate(&self) -> Result<CustomerDetails, CheckoutValidationError> {
        if let Some(field) = REQUIRED_FIELDS
            .iter()
            .copied()
            .find(|field| self.value(field).is_empty())
        {
            return Err(CheckoutValidationError::MissingField { field });
        }

        let card_number: String = self
            .value("card_number")
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        if !(13..=19).contains(&card_number.len())
            || !card_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(CheckoutValidationError::InvalidCardNumber);
        }

        let cvv = self.value("cvv");
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(CheckoutValidationError::InvalidCvv);
        }

        let cardholder_name = self.value("cardholder_name");
        if cardholder_name.chars().count() < 2 {
            return Err(CheckoutValidationError::InvalidCardholderName);
        }

        let email = self.value("email");
        if !is_plausible_email(email) {
            return Err(CheckoutValidationError::InvalidEmail);
        }

        let last_four_start = card_number.len().saturating_sub(4);
        let card_last_four = card_number.get(last_four_start..).unwrap_or_default();

        Ok(CustomerDetails {
            shipping_info: ShippingInfo {
                first_name: self.value("shipping_first_name").to_owned(),
                last_name: self.value("shipping_last_name").to_owned(),
                address: self.value("shipping_address").to_owned(),
                city: self.value("shipping_city").to_owned(),
                state: self.value("shipping_state").to_owned(),
                zip_code: self.value("shipping_zip").to_owned(),
                country: self.value("shipping_country").to_owned(),
                phone: self.value("phone").to_owned(),
            },
            billing_info: BillingInfo {
                first_name: self.value("billing_first_name").to_owned(),
                last_name: self.value("billing_last_name").to_owned(),
                address: self.value("billing_address").to_owned(),
                city: self.value("billing_city").to_owned(),
                state: self.value("billing_state").to_owned(),
                zip_code: self.value("billing_zip").to_owned(),
                country: self.value("billing_country").to_owned(),
            },
            payment_info: PaymentSummary {
                cardholder_name: cardholder_name.to_owned(),
                card_last_four: card_last_four.to_owned(),
                email: email.to_owned(),
            },
        })
    }
}

/// `local@domain.tld` where local is `[A-Za-z0-9._%+-]+`, domain is
/// `[A-Za-z0-9.-]+`, and the tld has at least two letters.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    local_ok && host_ok && tld_ok
}
