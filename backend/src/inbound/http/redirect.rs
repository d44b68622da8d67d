//! Redirect responses used by the HTML flows.

use actix_web::HttpResponse;
use actix_web::http::header;

/// `303 See Other`: the browser follows with a `GET`.
#[must_use]
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// `307 Temporary Redirect`: the browser replays the method and body.
#[must_use]
pub fn temporary_redirect(location: &str) -> HttpResponse {
    HttpResponse::TemporaryRedirect()
        .insert_header((header::LOCATION, location))
        .finish()
}
