//! Catalogue service endpoints.
//!
//! ```text
//! GET  /                     storefront page
//! POST /add                  multipart album creation (admin)
//! POST /delete/{id}          album deletion (admin)
//! GET  /api/albums           JSON listing
//! GET  /api/album/{id}       JSON album
//! POST /add_to_cart          forward to the cart service, then redirect
//! GET  /cart, /checkout      redirect to the cart service
//! POST /process_payment      307 to the cart service
//! ```

use std::collections::HashMap;

use actix_multipart::{Multipart, MultipartError};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use futures_util::StreamExt as _;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::domain::{
    Album, AlbumId, AlbumValidationError, CoverUpload, Error, NewAlbum, Quantity,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::presented_token;
use crate::inbound::http::redirect::{see_other, temporary_redirect};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::CatalogState;
use crate::inbound::http::views::{self, html_ok};

/// Largest accepted cover image.
pub const MAX_COVER_BYTES: usize = 10 * 1024 * 1024;
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
const COVER_FIELD: &str = "cover_file";

/// Storefront page listing every album.
#[get("/")]
pub async fn index(state: web::Data<CatalogState>) -> ApiResult<HttpResponse> {
    let albums = state.catalog.list_albums().await?;
    Ok(html_ok(views::catalog::index(&albums)))
}

/// Every album as JSON.
#[utoipa::path(
    get,
    path = "/api/albums",
    responses(
        (status = 200, description = "Albums", body = [Album]),
        (status = 503, description = "Catalogue store unavailable", body = Error)
    ),
    tags = ["catalog"],
    operation_id = "listAlbums"
)]
#[get("/api/albums")]
pub async fn list_albums(state: web::Data<CatalogState>) -> ApiResult<web::Json<Vec<Album>>> {
    Ok(web::Json(state.catalog.list_albums().await?))
}

/// One album as JSON.
#[utoipa::path(
    get,
    path = "/api/album/{id}",
    params(("id" = i32, Path, description = "Album identifier")),
    responses(
        (status = 200, description = "Album", body = Album),
        (status = 404, description = "Album not found", body = Error)
    ),
    tags = ["catalog"],
    operation_id = "getAlbum"
)]
#[get("/api/album/{id}")]
pub async fn get_album(
    state: web::Data<CatalogState>,
    path: web::Path<i32>,
) -> ApiResult<web::Json<Album>> {
    let album = state.catalog.get_album(AlbumId::new(path.into_inner())).await?;
    Ok(web::Json(album))
}

#[derive(Debug, Default)]
struct AlbumForm {
    fields: HashMap<String, String>,
    cover: Option<CoverUpload>,
}

impl AlbumForm {
    fn value(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }
}

fn map_multipart_error(err: MultipartError) -> Error {
    Error::invalid_request(format!("malformed album form: {err}"))
}

async fn read_album_form(mut payload: Multipart) -> Result<AlbumForm, Error> {
    let mut form = AlbumForm::default();
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(map_multipart_error)?;
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_owned);
        let limit = if name == COVER_FIELD {
            MAX_COVER_BYTES
        } else {
            MAX_TEXT_FIELD_BYTES
        };
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(map_multipart_error)?;
            if bytes.len() + chunk.len() > limit {
                return Err(Error::invalid_request(format!("{name} is too large")));
            }
            bytes.extend_from_slice(&chunk);
        }
        if name == COVER_FIELD {
            form.cover = file_name
                .filter(|file_name| !file_name.is_empty())
                .map(|file_name| CoverUpload { file_name, bytes });
        } else {
            let value = String::from_utf8(bytes)
                .map_err(|_| Error::invalid_request(format!("{name} must be valid UTF-8")))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

fn map_album_validation_error(err: AlbumValidationError) -> Error {
    let field = match err {
        AlbumValidationError::EmptyName => "name",
        AlbumValidationError::EmptyArtist => "artist",
        AlbumValidationError::Price(_) => "price",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Create an album from the admin form. An uploaded `cover_file` wins over
/// `cover_url`.
#[post("/add")]
pub async fn add_album(
    state: web::Data<CatalogState>,
    req: HttpRequest,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let form = read_album_form(payload).await?;
    let token = presented_token(req.headers(), [Some(form.value("token"))]);
    let album = NewAlbum::try_from_parts(form.value("name"), form.value("artist"), form.value("price"))
        .map_err(map_album_validation_error)?
        .with_cover(Some(form.value("cover_url").to_owned()));
    state
        .catalog
        .create_album(token.as_ref(), album, form.cover)
        .await?;
    Ok(see_other("/"))
}

/// Optional form body carrying an admin token.
#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    #[serde(default)]
    pub token: Option<String>,
}

/// Delete an album.
#[post("/delete/{id}")]
pub async fn delete_album(
    state: web::Data<CatalogState>,
    req: HttpRequest,
    path: web::Path<i32>,
    form: Option<web::Form<TokenForm>>,
) -> ApiResult<HttpResponse> {
    let form = form.map(web::Form::into_inner).unwrap_or_default();
    let token = presented_token(req.headers(), [form.token.as_deref()]);
    state
        .catalog
        .delete_album(token.as_ref(), AlbumId::new(path.into_inner()))
        .await?;
    Ok(see_other("/"))
}

/// Add-to-cart form posted from the storefront page.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub album_id: i32,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Forward an add-to-cart request and send the browser to the cart.
#[post("/add_to_cart")]
pub async fn add_to_cart(
    state: web::Data<CatalogState>,
    session: SessionContext,
    form: web::Form<AddToCartForm>,
) -> ApiResult<HttpResponse> {
    let AddToCartForm { album_id, quantity } = form.into_inner();
    let quantity = Quantity::new(quantity.unwrap_or(1))
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let receipt = state
        .catalog
        .add_to_cart(session.cart_session()?, AlbumId::new(album_id), quantity)
        .await?;
    session.persist_cart_session(&receipt.session_id)?;
    info!(album_id, session = %receipt.session_id, "album forwarded to cart");
    Ok(see_other(
        &state.cart_url("/", Some(receipt.session_id.as_str())),
    ))
}

fn cart_session_param(session: &SessionContext) -> Result<Option<String>, Error> {
    Ok(session.cart_session()?.map(String::from))
}

/// Send the browser to its cart.
#[get("/cart")]
pub async fn cart_redirect(
    state: web::Data<CatalogState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let id = cart_session_param(&session)?;
    Ok(see_other(&state.cart_url("/", id.as_deref())))
}

/// Send the browser to the cart's checkout form.
#[get("/checkout")]
pub async fn checkout_redirect(
    state: web::Data<CatalogState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let id = cart_session_param(&session)?;
    Ok(see_other(&state.cart_url("/checkout", id.as_deref())))
}

/// Replay a payment form against the cart service.
#[post("/process_payment")]
pub async fn process_payment_redirect(
    state: web::Data<CatalogState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let id = cart_session_param(&session)?;
    Ok(temporary_redirect(
        &state.cart_url("/process_payment", id.as_deref()),
    ))
}

/// Register the catalogue routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(list_albums)
        .service(get_album)
        .service(add_album)
        .service(delete_album)
        .service(add_to_cart)
        .service(cart_redirect)
        .service(checkout_redirect)
        .service(process_payment_redirect);
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
