use super::Property;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// A row of the `reservations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Reservation {
    pub id: i32,
    pub guest_id: i32,
    pub property_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Reservation {
    /// Number of nights between check-in and check-out.
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

/// Input for `Database::add_reservation`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReservation {
    pub guest_id: i32,
    pub property_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewReservation {
    pub fn validate(&self) -> Result<(), String> {
        if self.end_date <= self.start_date {
            return Err(format!(
                "end_date {} must be after start_date {}",
                self.end_date, self.start_date
            ));
        }
        Ok(())
    }
}

/// A guest's reservation joined with the property it is for.
///
/// Decoded from rows that select `reservations.id AS reservation_id` alongside
/// `properties.*`, so the two `id` columns do not collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestReservation {
    pub reservation: Reservation,
    pub property: Property,
}

impl<'r> FromRow<'r, PgRow> for GuestReservation {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            reservation: Reservation {
                id: row.try_get("reservation_id")?,
                guest_id: row.try_get("guest_id")?,
                property_id: row.try_get("property_id")?,
                start_date: row.try_get("start_date")?,
                end_date: row.try_get("end_date")?,
            },
            property: Property::from_row(row)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nights() {
        let reservation = Reservation {
            id: 1,
            guest_id: 3,
            property_id: 2,
            start_date: NaiveDate::from_ymd_opt(2018, 9, 11).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2018, 9, 26).unwrap(),
        };
        assert_eq!(reservation.nights(), 15);
    }

    #[test]
    fn test_new_reservation_needs_at_least_one_night() {
        let mut reservation = NewReservation {
            guest_id: 3,
            property_id: 2,
            start_date: NaiveDate::from_ymd_opt(2018, 9, 11).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2018, 9, 12).unwrap(),
        };
        assert_eq!(reservation.validate(), Ok(()));

        reservation.end_date = reservation.start_date;
        assert!(reservation.validate().unwrap_err().contains("end_date"));
    }

    #[test]
    fn test_new_reservation_parses_iso_dates() {
        let json = r#"{"guest_id": 1, "property_id": 4, "start_date": "2018-09-11", "end_date": "2018-09-26"}"#;
        let reservation: NewReservation = serde_json::from_str(json).unwrap();
        assert_eq!(reservation.start_date, NaiveDate::from_ymd_opt(2018, 9, 11).unwrap());
    }
}
