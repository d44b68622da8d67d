//! Catalogue storefront page.

use std::fmt::Write as _;

use super::{escape_html, money, page};
use crate::domain::Album;

fn album_card(album: &Album) -> String {
    let cover = album.cover_url.as_deref().map_or_else(String::new, |url| {
        format!(
            "<img src=\"{}\" alt=\"{} cover\">",
            escape_html(url),
            escape_html(&album.name)
        )
    });
    format!(
        "<div class=\"card\">{cover}<h3>{name}</h3><p>{artist}</p><p>{price}</p>\
<form method=\"post\" action=\"/add_to_cart\">\
<input type=\"hidden\" name=\"album_id\" value=\"{id}\">\
<input type=\"number\" name=\"quantity\" value=\"1\" min=\"1\">\
<button type=\"submit\">Add to cart</button></form>\
<form class=\"inline admin\" method=\"post\" action=\"/delete/{id}\">\
<input type=\"password\" name=\"token\" placeholder=\"Admin token\">\
<button type=\"submit\">Delete</button></form></div>",
        name = escape_html(&album.name),
        artist = escape_html(&album.artist),
        price = money(album.price.amount()),
        id = album.id,
    )
}

const ADMIN_FORM: &str = "<section class=\"admin\"><h2>Add album</h2>\
<form method=\"post\" action=\"/add\" enctype=\"multipart/form-data\">\
<input name=\"name\" placeholder=\"Album name\" required><br>\
<input name=\"artist\" placeholder=\"Artist\" required><br>\
<input name=\"price\" placeholder=\"Price\" inputmode=\"decimal\" required><br>\
<input name=\"cover_url\" placeholder=\"Cover URL\"><br>\
<input type=\"file\" name=\"cover_file\" accept=\"image/*\"><br>\
<input type=\"password\" name=\"token\" placeholder=\"Admin token\" required><br>\
<button type=\"submit\">Add album</button></form></section>";

/// Album listing with add-to-cart and admin forms.
#[must_use]
pub fn index(albums: &[Album]) -> String {
    let mut cards = String::new();
    for album in albums {
        cards.push_str(&album_card(album));
    }
    if albums.is_empty() {
        cards.push_str("<p>No albums in the catalogue yet.</p>");
    }
    let mut body = String::from("<h1>Metal Music Store</h1><p><a href=\"/cart\">View cart</a></p>");
    let _ = write!(body, "<section class=\"albums\">{cards}</section>{ADMIN_FORM}");
    page("Albums", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlbumId, Price};

    fn album(name: &str, cover_url: Option<&str>) -> Album {
        Album {
            id: AlbumId::new(7),
            name: name.to_owned(),
            artist: "Band".to_owned(),
            price: Price::parse("9.99").expect("price"),
            cover_url: cover_url.map(str::to_owned),
        }
    }

    #[test]
    fn lists_albums_with_escaped_names() {
        let html = index(&[album("<Ride>", Some("/static/uploads/ride.jpg"))]);
        assert!(html.contains("&lt;Ride&gt;"));
        assert!(html.contains("$9.99"));
        assert!(html.contains("src=\"/static/uploads/ride.jpg\""));
        assert!(html.contains("action=\"/delete/7\""));
    }

    #[test]
    fn omits_image_without_cover() {
        let html = index(&[album("Ride", None)]);
        assert!(!html.contains("<img"));
    }

    #[test]
    fn empty_catalogue_says_so() {
        assert!(index(&[]).contains("No albums in the catalogue yet."));
    }
}
