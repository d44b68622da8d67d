//! Server-rendered HTML pages.
//!
//! Pages are assembled from inline strings. Every value that originates
//! outside the binary goes through [`escape_html`] before it is embedded.

pub mod cart;
pub mod catalog;
pub mod orders;

use actix_web::HttpResponse;
use actix_web::http::header;
use rust_decimal::Decimal;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:960px;\
background:#111;color:#eee}a{color:#e33}table{width:100%;border-collapse:collapse}\
td,th{padding:.4rem;border-bottom:1px solid #333;text-align:left}\
.error{background:#511;padding:.8rem;border-radius:4px}\
.card{display:inline-block;width:200px;margin:.5rem;vertical-align:top}\
.card img{width:200px;height:200px;object-fit:cover}\
form.inline{display:inline}input,button{margin:.2rem 0}";

/// Escape text for use in element content and quoted attribute values.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Amount with two decimal places and a leading dollar sign.
#[must_use]
pub fn money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Format a computed total; overflowed totals render as a placeholder.
#[must_use]
pub fn money_or_overflow(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "out of range".to_owned(), money)
}

/// Wrap `body` in the shared page chrome.
#[must_use]
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title} - Metal Music Store</title><style>{STYLE}</style></head>\
<body>{body}</body></html>",
        title = escape_html(title),
    )
}

/// `200 OK` response carrying an HTML document.
#[must_use]
pub fn html_ok(document: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
        .body(document)
}

/// Banner shown above a form after a rejected submission.
#[must_use]
pub fn error_banner(message: Option<&str>) -> String {
    message.map_or_else(String::new, |message| {
        format!("<p class=\"error\" role=\"alert\">{}</p>", escape_html(message))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("plain", "plain")]
    #[case("<script>alert('x')</script>", "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;")]
    #[case("Tom & \"Jerry\"", "Tom &amp; &quot;Jerry&quot;")]
    fn escapes_markup(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(escape_html(raw), expected);
    }

    #[rstest]
    #[case("9.99", "$9.99")]
    #[case("10", "$10.00")]
    #[case("12.345", "$12.34")]
    fn formats_money(#[case] amount: &str, #[case] expected: &str) {
        let amount = Decimal::from_str(amount).expect("decimal literal");
        assert_eq!(money(amount), expected);
    }

    #[rstest]
    fn page_escapes_title() {
        let document = page("<Cart>", "<p>body</p>");
        assert!(document.contains("<title>&lt;Cart&gt; - Metal Music Store</title>"));
        assert!(document.contains("<p>body</p>"));
    }

    #[rstest]
    fn banner_is_empty_without_message() {
        assert!(error_banner(None).is_empty());
        assert!(error_banner(Some("a < b")).contains("a &lt; b"));
    }
}
