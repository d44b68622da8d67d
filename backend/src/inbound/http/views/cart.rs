//! Cart, checkout, and order confirmation pages.

use std::fmt::Write as _;

use super::{error_banner, escape_html, money, money_or_overflow, page};
use crate::domain::{Cart, IdempotencyKey, OrderReceipt, REQUIRED_FIELDS, field_label};

fn session_field(cart: &Cart) -> String {
    format!(
        "<input type=\"hidden\" name=\"session_id\" value=\"{}\">",
        escape_html(cart.session_id().as_str())
    )
}

fn cart_rows(cart: &Cart, editable: bool) -> String {
    let mut rows = String::new();
    for item in cart.items() {
        let quantity = if editable {
            format!(
                "<form class=\"inline\" method=\"post\" action=\"/update_quantity\">{session}\
<input type=\"hidden\" name=\"item_id\" value=\"{id}\">\
<input type=\"number\" name=\"quantity\" value=\"{quantity}\" min=\"0\">\
<button type=\"submit\">Update</button></form>\
<form class=\"inline\" method=\"post\" action=\"/remove_item\">{session}\
<input type=\"hidden\" name=\"item_id\" value=\"{id}\">\
<button type=\"submit\">Remove</button></form>",
                session = session_field(cart),
                id = item.id,
                quantity = item.quantity.get(),
            )
        } else {
            item.quantity.get().to_string()
        };
        let _ = write!(
            rows,
            "<tr><td>{name}</td><td>{artist}</td><td>{price}</td><td>{quantity}</td><td>{line}</td></tr>",
            name = escape_html(&item.album.album_name),
            artist = escape_html(&item.album.artist),
            price = money(item.album.price.amount()),
            line = money_or_overflow(item.line_total()),
        );
    }
    format!(
        "<table><thead><tr><th>Album</th><th>Artist</th><th>Price</th><th>Quantity</th>\
<th>Total</th></tr></thead><tbody>{rows}</tbody></table><p><strong>Total: {total}</strong></p>",
        total = money_or_overflow(cart.total()),
    )
}

/// Cart contents with quantity controls.
#[must_use]
pub fn cart_page(cart: &Cart) -> String {
    let body = if cart.is_empty() {
        "<h1>Shopping Cart</h1><p>Your cart is empty.</p>".to_owned()
    } else {
        format!(
            "<h1>Shopping Cart</h1>{rows}<p><a href=\"/checkout?session_id={session}\">\
Proceed to checkout</a></p>",
            rows = cart_rows(cart, true),
            session = escape_html(cart.session_id().as_str()),
        )
    };
    page("Shopping Cart", &body)
}

fn input_type(field: &str) -> &'static str {
    match field {
        "email" => "email",
        "phone" => "tel",
        "cvv" => "password",
        _ => "text",
    }
}

/// Checkout form. `checkout_token` is echoed back on submission and keys
/// the order request, so resubmitting the same page cannot order twice.
#[must_use]
pub fn checkout_page(cart: &Cart, checkout_token: IdempotencyKey, error: Option<&str>) -> String {
    let mut fields = String::new();
    for field in REQUIRED_FIELDS {
        let _ = write!(
            fields,
            "<label>{label}<br><input type=\"{kind}\" name=\"{field}\" required></label><br>",
            label = field_label(field),
            kind = input_type(field),
        );
    }
    let body = format!(
        "<h1>Checkout</h1>{banner}{summary}\
<form method=\"post\" action=\"/process_payment\">{session}\
<input type=\"hidden\" name=\"checkout_token\" value=\"{checkout_token}\">\
{fields}<button type=\"submit\">Place order</button></form>",
        banner = error_banner(error),
        summary = cart_rows(cart, false),
        session = session_field(cart),
    );
    page("Checkout", &body)
}

/// Confirmation shown after a successful checkout.
#[must_use]
pub fn order_success_page(receipt: Option<&OrderReceipt>) -> String {
    let details = receipt.map_or_else(String::new, |receipt| {
        format!(
            "<p>Order number: <strong>{number}</strong></p><p>Status: {status}</p>\
<p>Total: {total}</p>",
            number = escape_html(receipt.order_number.as_str()),
            status = escape_html(receipt.status.as_str()),
            total = money(receipt.total.amount()),
        )
    });
    let body = format!(
        "<h1>Thank you for your order!</h1>{details}<p>Your payment was processed \
successfully.</p><p><a href=\"/\">Back to cart</a></p>"
    );
    page("Order Confirmed", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::domain::{
        AlbumDetails, AlbumId, CartItem, CartItemId, CartSessionId, OrderId, OrderNumber,
        OrderStatus, Price, Quantity,
    };

    fn cart_with_one_line() -> Cart {
        let session = CartSessionId::parse("0123456789abcdef0123456789abcdef").expect("session id");
        let item = CartItem {
            id: CartItemId::new(3),
            session_id: session.clone(),
            album: AlbumDetails {
                album_id: AlbumId::new(1),
                album_name: "Master & Servant".to_owned(),
                artist: "Band".to_owned(),
                price: Price::parse("10.00").expect("price"),
                cover_url: None,
            },
            quantity: Quantity::new(2).expect("quantity"),
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).single().expect("time"),
        };
        Cart::new(session, vec![item])
    }

    #[test]
    fn cart_page_shows_lines_and_total() {
        let html = cart_page(&cart_with_one_line());
        assert!(html.contains("Master &amp; Servant"));
        assert!(html.contains("Total: $20.00"));
        assert!(html.contains("name=\"item_id\" value=\"3\""));
        assert!(html.contains("/checkout?session_id=s1"));
    }

    #[test]
    fn empty_cart_page_has_no_checkout_link() {
        let cart = Cart::new(CartSessionId::parse("0123456789abcdef0123456789abcdef").expect("session id"), Vec::new());
        let html = cart_page(&cart);
        assert!(html.contains("Your cart is empty."));
        assert!(!html.contains("/checkout"));
    }

    #[test]
    fn checkout_page_embeds_token_and_error() {
        let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").expect("key");
        let html = checkout_page(&cart_with_one_line(), key, Some("Payment declined."));
        assert!(html.contains("value=\"550e8400-e29b-41d4-a716-446655440000\""));
        assert!(html.contains("Payment declined."));
        assert!(html.contains("name=\"shipping_first_name\""));
        assert!(html.contains("Shipping First Name"));
    }

    #[test]
    fn success_page_shows_receipt() {
        let receipt = OrderReceipt {
            order_id: OrderId::new(1),
            order_number: OrderNumber::from_stored("ORD-20240309140507-0042"),
            status: OrderStatus::confirmed(),
            total: Price::parse("20.00").expect("price"),
        };
        let html = order_success_page(Some(&receipt));
        assert!(html.contains("ORD-20240309140507-0042"));
        assert!(html.contains("$20.00"));
    }
}
