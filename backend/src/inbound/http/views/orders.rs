//! Order dashboard and detail pages.

use std::fmt::Write as _;

use super::{escape_html, money, money_or_overflow, page};
use crate::domain::{Order, OrderSummary, sum_line_totals};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Order counts, revenue, and the order table.
#[must_use]
pub fn dashboard(orders: &[OrderSummary]) -> String {
    let revenue = sum_line_totals(orders.iter().map(|order| Some(order.total_amount.amount())));
    let items: u64 = orders.iter().map(|order| u64::from(order.item_count)).sum();
    let mut rows = String::new();
    for order in orders {
        let _ = write!(
            rows,
            "<tr><td><a href=\"/order/{id}\">{number}</a></td><td>{total}</td><td>{status}</td>\
<td>{items}</td><td>{created}</td></tr>",
            id = order.id,
            number = escape_html(order.order_number.as_str()),
            total = money(order.total_amount.amount()),
            status = escape_html(order.status.as_str()),
            items = order.item_count,
            created = order.created_at.format(TIME_FORMAT),
        );
    }
    let table = if orders.is_empty() {
        "<p>No orders yet.</p>".to_owned()
    } else {
        format!(
            "<table><thead><tr><th>Order</th><th>Total</th><th>Status</th><th>Items</th>\
<th>Created</th></tr></thead><tbody>{rows}</tbody></table>"
        )
    };
    let body = format!(
        "<h1>Order Management</h1><p>Total orders: <strong>{count}</strong></p>\
<p>Total revenue: <strong>{revenue}</strong></p><p>Line items: <strong>{items}</strong></p>{table}",
        count = orders.len(),
        revenue = money_or_overflow(revenue),
    );
    page("Orders", &body)
}

/// One order with its lines and customer details.
#[must_use]
pub fn detail(order: &Order) -> String {
    let mut rows = String::new();
    for line in &order.items {
        let _ = write!(
            rows,
            "<tr><td>{name}</td><td>{artist}</td><td>{price}</td><td>{quantity}</td><td>{total}</td></tr>",
            name = escape_html(&line.album_name),
            artist = escape_html(&line.artist),
            price = money(line.price.amount()),
            quantity = line.quantity.get(),
            total = money_or_overflow(line.line_total()),
        );
    }
    let customer = order.customer.as_ref().map_or_else(String::new, |customer| {
        let shipping = &customer.shipping_info;
        format!(
            "<h2>Shipping</h2><p>{first} {last}<br>{address}<br>{city}, {state} {zip}<br>{country}</p>\
<h2>Payment</h2><p>{holder}, card ending {last_four}<br>{email}</p>",
            first = escape_html(&shipping.first_name),
            last = escape_html(&shipping.last_name),
            address = escape_html(&shipping.address),
            city = escape_html(&shipping.city),
            state = escape_html(&shipping.state),
            zip = escape_html(&shipping.zip_code),
            country = escape_html(&shipping.country),
            holder = escape_html(&customer.payment_info.cardholder_name),
            last_four = escape_html(&customer.payment_info.card_last_four),
            email = escape_html(&customer.payment_info.email),
        )
    });
    let body = format!(
        "<p><a href=\"/\">All orders</a></p><h1>Order {number}</h1><p>Status: {status}</p>\
<p>Placed: {created}</p><table><thead><tr><th>Album</th><th>Artist</th><th>Price</th>\
<th>Quantity</th><th>Total</th></tr></thead><tbody>{rows}</tbody></table>\
<p><strong>Total: {total}</strong></p>{customer}",
        number = escape_html(order.order_number.as_str()),
        status = escape_html(order.status.as_str()),
        created = order.created_at.format(TIME_FORMAT),
        total = money(order.total_amount.amount()),
    );
    page(&format!("Order {}", order.order_number), &body)
}
