//! Cart service endpoints.
//!
//! ```text
//! GET  /                  cart page (?session_id=…)
//! POST /add_to_cart       add a line, JSON acknowledgement
//! POST /update_quantity   change a line, redirect to the cart
//! POST /remove_item       drop a line, redirect to the cart
//! GET  /checkout          checkout form
//! POST /process_payment   validate, pay, order, clear
//! GET  /order_success     confirmation page
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{
    AlbumDetails, AlbumId, CartItemId, CartSessionId, CheckoutForm, CheckoutOutcome, Error,
    IdempotencyKey, Price, Quantity,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::checkout_key;
use crate::inbound::http::redirect::see_other;
use crate::inbound::http::session::{
    SessionContext, explicit_session_id, explicit_session_id_lenient,
};
use crate::inbound::http::state::CartState;
use crate::inbound::http::views::cart::{cart_page, checkout_page, order_success_page};
use crate::inbound::http::views::html_ok;

/// Optional `session_id` carried in a query string.
#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

fn cart_location(session: &CartSessionId) -> String {
    format!("/?session_id={session}")
}

/// Cart page. A well-formed `session_id` query parameter takes over the
/// cookie session.
#[get("/")]
pub async fn view_cart(
    state: web::Data<CartState>,
    session: SessionContext,
    query: web::Query<SessionQuery>,
) -> ApiResult<HttpResponse> {
    let explicit = explicit_session_id_lenient(query.session_id.as_deref());
    let id = session.resolve_or_start(explicit)?;
    let cart = state.cart.view(&id).await?;
    Ok(html_ok(cart_page(&cart)))
}

/// Add-to-cart form. Album details are optional; when any of name, artist,
/// or price is missing the cart fetches them from the catalogue.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct AddToCartRequest {
    pub album_id: i32,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|value| value.trim()).filter(|value| !value.is_empty())
}

impl AddToCartRequest {
    fn album_details(&self) -> Result<Option<AlbumDetails>, Error> {
        let (Some(album_name), Some(artist), Some(price)) = (
            non_blank(self.album_name.as_ref()),
            non_blank(self.artist.as_ref()),
            non_blank(self.price.as_ref()),
        ) else {
            return Ok(None);
        };
        let price = Price::parse(price)
            .map_err(|err| Error::invalid_request(format!("invalid price: {err}")))?;
        Ok(Some(AlbumDetails {
            album_id: AlbumId::new(self.album_id),
            album_name: album_name.to_owned(),
            artist: artist.to_owned(),
            price,
            cover_url: non_blank(self.cover_url.as_ref()).map(str::to_owned),
        }))
    }
}

/// Acknowledgement returned by `POST /add_to_cart`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddToCartResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
    pub redirect_url: String,
}

/// Add an album to the resolved cart session.
#[utoipa::path(
    post,
    path = "/add_to_cart",
    request_body(content = AddToCartRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Line added", body = AddToCartResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Album not found", body = Error),
        (status = 503, description = "Catalogue unavailable", body = Error)
    ),
    tags = ["cart"],
    operation_id = "addToCart"
)]
#[post("/add_to_cart")]
pub async fn add_to_cart(
    state: web::Data<CartState>,
    session: SessionContext,
    form: web::Form<AddToCartRequest>,
) -> ApiResult<web::Json<AddToCartResponse>> {
    let request = form.into_inner();
    let explicit = explicit_session_id(request.session_id.as_deref())?;
    let quantity = Quantity::new(request.quantity.unwrap_or(1))
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let details = request.album_details()?;
    let id = session.resolve_or_start(explicit)?;
    let item = state
        .cart
        .add(&id, AlbumId::new(request.album_id), quantity, details)
        .await?;
    info!(
        session = %id,
        album_id = %item.album.album_id,
        quantity = item.quantity.get(),
        "cart line added"
    );
    Ok(web::Json(AddToCartResponse {
        success: true,
        message: "Item added to cart".to_owned(),
        session_id: id.to_string(),
        redirect_url: "/".to_owned(),
    }))
}

/// Quantity change posted from the cart page.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub item_id: i32,
    pub quantity: i64,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Set a line's quantity; zero or less removes it.
#[post("/update_quantity")]
pub async fn update_quantity(
    state: web::Data<CartState>,
    session: SessionContext,
    form: web::Form<UpdateQuantityForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let explicit = explicit_session_id_lenient(form.session_id.as_deref());
    let Some(id) = session.resolve(explicit)? else {
        return Ok(see_other("/"));
    };
    state
        .cart
        .update_quantity(&id, CartItemId::new(form.item_id), form.quantity)
        .await?;
    Ok(see_other(&cart_location(&id)))
}

/// Line removal posted from the cart page.
#[derive(Debug, Deserialize)]
pub struct RemoveItemForm {
    pub item_id: i32,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Remove a line.
#[post("/remove_item")]
pub async fn remove_item(
    state: web::Data<CartState>,
    session: SessionContext,
    form: web::Form<RemoveItemForm>,
) -> ApiResult<HttpResponse> {
    let form = form.into_inner();
    let explicit = explicit_session_id_lenient(form.session_id.as_deref());
    let Some(id) = session.resolve(explicit)? else {
        return Ok(see_other("/"));
    };
    state
        .cart
        .remove(&id, CartItemId::new(form.item_id))
        .await?;
    Ok(see_other(&cart_location(&id)))
}

/// Checkout form for a non-empty cart.
#[get("/checkout")]
pub async fn checkout(
    state: web::Data<CartState>,
    session: SessionContext,
    query: web::Query<SessionQuery>,
) -> ApiResult<HttpResponse> {
    let explicit = explicit_session_id_lenient(query.session_id.as_deref());
    let Some(id) = session.resolve(explicit)? else {
        return Ok(see_other("/"));
    };
    let cart = state.cart.view(&id).await?;
    if cart.is_empty() {
        return Ok(see_other(&cart_location(&id)));
    }
    Ok(html_ok(checkout_page(&cart, IdempotencyKey::random(), None)))
}

/// Run checkout. Rejections re-render the form with a banner and the same
/// `checkout_token`, so a resubmission after a lost order response is
/// deduplicated by the order service.
#[post("/process_payment")]
pub async fn process_payment(
    state: web::Data<CartState>,
    session: SessionContext,
    query: web::Query<SessionQuery>,
    form: web::Form<Vec<(String, String)>>,
) -> ApiResult<HttpResponse> {
    let form = CheckoutForm::new(form.into_inner());
    let explicit = explicit_session_id_lenient(query.session_id.as_deref())
        .or_else(|| explicit_session_id_lenient(Some(form.value("session_id"))));
    let Some(id) = session.resolve(explicit)? else {
        return Ok(see_other("/"));
    };
    let key = checkout_key(Some(form.value("checkout_token")).filter(|raw| !raw.is_empty()));
    match state.checkout.process_payment(&id, &form, key).await? {
        CheckoutOutcome::EmptyCart => Ok(see_other(&cart_location(&id))),
        CheckoutOutcome::Completed { receipt } => {
            session.remember_order(&receipt)?;
            Ok(see_other("/order_success"))
        }
        CheckoutOutcome::Rejected { cart, reason } => Ok(html_ok(checkout_page(
            &cart,
            key,
            Some(&reason.to_string()),
        ))),
    }
}

/// Confirmation page shown once after a successful checkout.
#[get("/order_success")]
pub async fn order_success(
    session: SessionContext,
    query: web::Query<SessionQuery>,
) -> ApiResult<HttpResponse> {
    if let Some(id) = explicit_session_id_lenient(query.session_id.as_deref()) {
        session.persist_cart_session(&id)?;
    }
    let receipt = session.take_last_order();
    Ok(html_ok(order_success_page(receipt.as_ref())))
}

/// Register the cart routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(view_cart)
        .service(add_to_cart)
        .service(update_quantity)
        .service(remove_item)
        .service(checkout)
        .service(process_payment)
        .service(order_success);
}

#[cfg(test)]
#[path = "cart_tests.rs"]
mod tests;
