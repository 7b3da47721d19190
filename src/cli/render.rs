//! Table rendering for query results.

use crate::models::{GuestReservation, PropertyListing, User};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use num_traits::ToPrimitive;
use sqlx::types::Decimal;

fn table_with_header(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

/// Formats a major-unit price, e.g. `$930.61`.
pub fn format_price(price: Decimal) -> String {
    format!("${:.2}", price)
}

/// Formats an average rating to two decimals, or `-` when there is none.
pub fn format_rating(rating: Option<Decimal>) -> String {
    rating
        .and_then(|r| r.to_f64())
        .map_or_else(|| "-".to_string(), |r| format!("{r:.2}"))
}

pub fn users_table(users: &[User]) -> Table {
    let mut table = table_with_header(&["ID", "Name", "Email"]);
    for user in users {
        table.add_row(vec![user.id.to_string(), user.name.clone(), user.email.clone()]);
    }
    table
}

pub fn listings_table(listings: &[PropertyListing]) -> Table {
    let mut table = table_with_header(&[
        "ID", "Title", "City", "Per night", "Beds", "Baths", "Parking", "Rating",
    ]);
    for listing in listings {
        let p = &listing.property;
        table.add_row(vec![
            p.id.to_string(),
            p.title.clone(),
            format!("{}, {}", p.city, p.province),
            format_price(p.nightly_price()),
            p.number_of_bedrooms.to_string(),
            p.number_of_bathrooms.to_string(),
            p.parking_spaces.to_string(),
            format_rating(listing.average_rating),
        ]);
    }
    table
}

pub fn reservations_table(reservations: &[GuestReservation]) -> Table {
    let mut table = table_with_header(&[
        "Reservation",
        "Property",
        "City",
        "Check-in",
        "Check-out",
        "Nights",
        "Per night",
    ]);
    for entry in reservations {
        let r = &entry.reservation;
        let p = &entry.property;
        table.add_row(vec![
            r.id.to_string(),
            p.title.clone(),
            p.city.clone(),
            r.start_date.to_string(),
            r.end_date.to_string(),
            r.nights().to_string(),
            format_price(p.nightly_price()),
        ]);
    }
    table
}
