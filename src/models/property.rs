use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Decimal;
use sqlx::{FromRow, Row};

/// Number of minor currency units per major unit (cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i32 = 100;

/// A row of the `properties` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Property {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    /// Nullable in the LightBnB schema.
    pub description: Option<String>,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    /// Nightly price in minor units (cents).
    pub cost_per_night: i32,
    pub parking_spaces: i32,
    pub number_of_bathrooms: i32,
    pub number_of_bedrooms: i32,
    pub country: String,
    pub street: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
}

impl Property {
    /// Nightly price in major units, e.g. `12345` cents becomes `123.45`.
    pub fn nightly_price(&self) -> Decimal {
        Decimal::new(i64::from(self.cost_per_night), 2)
    }
}

/// A search result row: the property plus the average of its review ratings.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyListing {
    pub property: Property,
    /// `avg(property_reviews.rating)`, computed at query time.
    pub average_rating: Option<Decimal>,
}

impl<'r> FromRow<'r, PgRow> for PropertyListing {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            property: Property::from_row(row)?,
            average_rating: row.try_get("average_rating")?,
        })
    }
}

/// Input for `Database::add_property`.
///
/// Field order matches the column order bound by the insert statement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProperty {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub number_of_bedrooms: i32,
    pub number_of_bathrooms: i32,
    pub parking_spaces: i32,
    /// Nightly price in minor units (cents).
    pub cost_per_night: i32,
    pub thumbnail_photo_url: String,
    pub cover_photo_url: String,
    pub street: String,
    pub country: String,
    pub city: String,
    pub province: String,
    pub post_code: String,
    pub owner_id: i32,
}

impl NewProperty {
    /// Checks the fields the database cannot check for us.
    ///
    /// Returns a human-readable reason for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("title", &self.title),
            ("street", &self.street),
            ("city", &self.city),
            ("province", &self.province),
            ("post_code", &self.post_code),
            ("country", &self.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(format!("{field} must not be blank"));
        }

        let counts = [
            ("cost_per_night", self.cost_per_night),
            ("number_of_bedrooms", self.number_of_bedrooms),
            ("number_of_bathrooms", self.number_of_bathrooms),
            ("parking_spaces", self.parking_spaces),
        ];
        if let Some((field, value)) = counts.iter().find(|(_, v)| *v < 0) {
            return Err(format!("{field} must not be negative (got {value})"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_new_property() -> NewProperty {
        NewProperty {
            title: "Speed lamp".to_string(),
            description: Some("description".to_string()),
            number_of_bedrooms: 3,
            number_of_bathrooms: 1,
            parking_spaces: 6,
            cost_per_night: 93061,
            thumbnail_photo_url: "https://images.pexels.com/photos/2086676/pexels-photo-2086676.jpeg?auto=compress&cs=tinysrgb&h=350".to_string(),
            cover_photo_url: "https://images.pexels.com/photos/2086676/pexels-photo-2086676.jpeg".to_string(),
            street: "536 Namsub Highway".to_string(),
            country: "Canada".to_string(),
            city: "Sotboske".to_string(),
            province: "Quebec".to_string(),
            post_code: "28142".to_string(),
            owner_id: 1,
        }
    }

    #[test]
    fn test_nightly_price_divides_minor_units() {
        let new = sample_new_property();
        let property = Property {
            id: 1,
            owner_id: new.owner_id,
            title: new.title,
            description: new.description,
            thumbnail_photo_url: new.thumbnail_photo_url,
            cover_photo_url: new.cover_photo_url,
            cost_per_night: 93061,
            parking_spaces: new.parking_spaces,
            number_of_bathrooms: new.number_of_bathrooms,
            number_of_bedrooms: new.number_of_bedrooms,
            country: new.country,
            street: new.street,
            city: new.city,
            province: new.province,
            post_code: new.post_code,
        };
        assert_eq!(property.nightly_price(), Decimal::from_str("930.61").unwrap());
    }

    #[test]
    fn test_validate_accepts_complete_property() {
        assert_eq!(sample_new_property().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_blank_and_negative_fields() {
        let mut property = sample_new_property();
        property.city = " ".to_string();
        assert_eq!(property.validate(), Err("city must not be blank".to_string()));

        let mut property = sample_new_property();
        property.cost_per_night = -1;
        assert!(property.validate().unwrap_err().contains("cost_per_night"));
    }

    #[test]
    fn test_deserializes_fixture_record_without_description() {
        let json = r#"{
            "id": 7,
            "owner_id": 4,
            "title": "Aside",
            "thumbnail_photo_url": "https://example.com/t.jpeg",
            "cover_photo_url": "https://example.com/c.jpeg",
            "cost_per_night": 3902,
            "parking_spaces": 0,
            "number_of_bathrooms": 2,
            "number_of_bedrooms": 3,
            "country": "Canada",
            "street": "651 Nami Road",
            "city": "Bohbatev",
            "province": "Alberta",
            "post_code": "83680"
        }"#;
        let property: NewProperty = serde_json::from_str(json).unwrap();
        assert_eq!(property.owner_id, 4);
        assert_eq!(property.description, None);
        assert_eq!(property.cost_per_night, 3902);
    }
}
