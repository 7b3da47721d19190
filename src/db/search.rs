//! Builds the parameterized property search statement.
//!
//! Filters are optional and applied in a fixed order (city, owner, minimum price,
//! maximum price, minimum rating), followed by the row limit. Placeholders are
//! numbered from the position of each bound value, so `$n` always refers to the
//! n-th entry of [`SearchQuery::params`].

use crate::error::{AppError, Result};
use crate::models::{MAX_REVIEW_RATING, MINOR_UNITS_PER_MAJOR};

/// Upper bound accepted for `minimum_rating`.
pub const MAX_RATING: f64 = MAX_REVIEW_RATING as f64;

const BASE_QUERY: &str = "SELECT properties.*, avg(property_reviews.rating) AS average_rating
FROM properties
JOIN property_reviews ON properties.id = property_reviews.property_id
WHERE 1 = 1";

/// Optional criteria for `Database::get_all_properties`.
///
/// Prices are per night in major currency units; they are compared against
/// `cost_per_night` after dividing out the minor units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub owner_id: Option<i32>,
    pub minimum_price_per_night: Option<i64>,
    pub maximum_price_per_night: Option<i64>,
    pub minimum_rating: Option<f64>,
}

/// A value bound to one placeholder of a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchParam {
    Text(String),
    Int(i64),
    Float(f64),
}

/// SQL text plus the values for its placeholders, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    sql: String,
    params: Vec<SearchParam>,
}

impl SearchQuery {
    fn new(base: &str) -> Self {
        Self {
            sql: base.to_string(),
            params: Vec::new(),
        }
    }

    /// Starts a new line of SQL.
    fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push('\n');
        self.sql.push_str(fragment);
        self
    }

    /// Records `value` and writes its placeholder at the end of the statement.
    fn push_bind(&mut self, value: SearchParam) -> &mut Self {
        self.params.push(value);
        self.sql.push_str(&format!(" ${}", self.params.len()));
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SearchParam] {
        &self.params
    }
}

impl PropertyFilter {
    /// Assembles the search statement for this filter, returning at most `limit` rows.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedInput` when the limit is not positive, a price is
    /// negative, the price range is inverted, or the rating is outside `0..=5`.
    pub fn build(&self, limit: i64) -> Result<SearchQuery> {
        self.validate(limit)?;

        let mut query = SearchQuery::new(BASE_QUERY);

        if let Some(city) = self.city() {
            query
                .push("AND properties.city LIKE")
                .push_bind(SearchParam::Text(format!("%{city}")));
        }

        if let Some(owner_id) = self.owner_id {
            query
                .push("AND properties.owner_id =")
                .push_bind(SearchParam::Int(i64::from(owner_id)));
        }

        if let Some(minimum) = self.minimum_price_per_night {
            query
                .push(&format!(
                    "AND properties.cost_per_night / {MINOR_UNITS_PER_MAJOR} >"
                ))
                .push_bind(SearchParam::Int(minimum));
        }

        if let Some(maximum) = self.maximum_price_per_night {
            query
                .push(&format!(
                    "AND properties.cost_per_night / {MINOR_UNITS_PER_MAJOR} <"
                ))
                .push_bind(SearchParam::Int(maximum));
        }

        query.push("GROUP BY properties.id");

        if let Some(rating) = self.minimum_rating {
            query
                .push("HAVING avg(property_reviews.rating) >=")
                .push_bind(SearchParam::Float(rating));
        }

        query
            .push("ORDER BY properties.cost_per_night")
            .push("LIMIT")
            .push_bind(SearchParam::Int(limit));

        Ok(query)
    }

    /// The city filter, ignoring blank input.
    fn city(&self) -> Option<&str> {
        self.city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
    }

    fn validate(&self, limit: i64) -> Result<()> {
        if limit < 1 {
            return Err(AppError::MalformedInput(format!(
                "limit must be at least 1 (got {limit})"
            )));
        }

        for (name, price) in [
            ("minimum_price_per_night", self.minimum_price_per_night),
            ("maximum_price_per_night", self.maximum_price_per_night),
        ] {
            if let Some(price) = price.filter(|p| *p < 0) {
                return Err(AppError::MalformedInput(format!(
                    "{name} must not be negative (got {price})"
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.minimum_price_per_night, self.maximum_price_per_night)
        {
            if min > max {
                return Err(AppError::MalformedInput(format!(
                    "minimum_price_per_night ({min}) is greater than maximum_price_per_night ({max})"
                )));
            }
        }

        if let Some(rating) = self.minimum_rating {
            if !(0.0..=MAX_RATING).contains(&rating) {
                return Err(AppError::MalformedInput(format!(
                    "minimum_rating must be between 0 and {MAX_RATING} (got {rating})"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Placeholder numbers in the order they appear in the SQL text.
    fn placeholders(sql: &str) -> Vec<usize> {
        sql.split('$')
            .skip(1)
            .map(|rest| {
                rest.chars()
                    .take_while(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .unwrap()
            })
            .collect()
    }

    fn position(sql: &str, needle: &str) -> usize {
        sql.find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not found in:\n{sql}"))
    }

    #[test]
    fn test_no_filters_binds_only_the_limit() {
        let query = PropertyFilter::default().build(10).unwrap();
        let sql = query.sql();

        assert!(sql.starts_with(BASE_QUERY));
        assert!(!sql.contains("AND "), "unexpected AND clause in:\n{sql}");
        assert!(sql.contains("GROUP BY properties.id"));
        assert!(!sql.contains("HAVING"));
        assert!(sql.ends_with("ORDER BY properties.cost_per_night\nLIMIT $1"));
        assert_eq!(query.params(), &[SearchParam::Int(10)]);
    }

    #[test]
    fn test_city_uses_leading_wildcard_only() {
        let filter = PropertyFilter {
            city: Some("van".to_string()),
            ..Default::default()
        };
        let query = filter.build(10).unwrap();

        assert!(query.sql().contains("AND properties.city LIKE $1"));
        assert_eq!(query.params()[0], SearchParam::Text("%van".to_string()));
        assert_eq!(query.params()[1], SearchParam::Int(10));
    }

    #[rstest]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[case(None)]
    fn test_blank_city_is_ignored(#[case] city: Option<&str>) {
        let filter = PropertyFilter {
            city: city.map(str::to_string),
            ..Default::default()
        };
        let query = filter.build(10).unwrap();
        assert!(!query.sql().contains("LIKE"));
        assert_eq!(query.params().len(), 1);
    }

    #[test]
    fn test_price_range_divides_cost_per_night() {
        let filter = PropertyFilter {
            minimum_price_per_night: Some(50),
            maximum_price_per_night: Some(150),
            ..Default::default()
        };
        let query = filter.build(10).unwrap();
        let sql = query.sql();

        assert!(sql.contains("AND properties.cost_per_night / 100 > $1"));
        assert!(sql.contains("AND properties.cost_per_night / 100 < $2"));
        assert!(sql.ends_with("LIMIT $3"));
        assert_eq!(placeholders(sql), vec![1, 2, 3]);
        assert_eq!(
            query.params(),
            &[
                SearchParam::Int(50),
                SearchParam::Int(150),
                SearchParam::Int(10)
            ]
        );
    }

    #[test]
    fn test_rating_binds_having_before_limit() {
        let filter = PropertyFilter {
            minimum_rating: Some(4.0),
            ..Default::default()
        };
        let query = filter.build(5).unwrap();
        let sql = query.sql();

        let group_by = position(sql, "GROUP BY properties.id");
        let having = position(sql, "HAVING avg(property_reviews.rating) >= $1");
        let order_by = position(sql, "ORDER BY");
        assert!(group_by < having && having < order_by);

        let params = query.params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[params.len() - 2], SearchParam::Float(4.0));
        assert_eq!(params[params.len() - 1], SearchParam::Int(5));
    }

    #[test]
    fn test_owner_placeholder_uses_position_not_value() {
        let filter = PropertyFilter {
            city: Some("Vancouver".to_string()),
            owner_id: Some(7),
            ..Default::default()
        };
        let query = filter.build(10).unwrap();

        assert!(query.sql().contains("AND properties.owner_id = $2"));
        assert!(!query.sql().contains("$7"));
        assert_eq!(query.params()[1], SearchParam::Int(7));
    }

    #[test]
    fn test_all_filters_in_fixed_order() {
        let filter = PropertyFilter {
            city: Some("Vancouver".to_string()),
            owner_id: Some(3),
            minimum_price_per_night: Some(100),
            maximum_price_per_night: Some(400),
            minimum_rating: Some(3.5),
        };
        let query = filter.build(20).unwrap();
        let sql = query.sql();

        let clauses = [
            "properties.city LIKE $1",
            "properties.owner_id = $2",
            "cost_per_night / 100 > $3",
            "cost_per_night / 100 < $4",
            "GROUP BY properties.id",
            "HAVING avg(property_reviews.rating) >= $5",
            "ORDER BY properties.cost_per_night",
            "LIMIT $6",
        ];
        let offsets: Vec<usize> = clauses.iter().map(|c| position(sql, c)).collect();
        assert!(offsets.windows(2).all(|pair| pair[0] < pair[1]));

        assert_eq!(
            query.params(),
            &[
                SearchParam::Text("%Vancouver".to_string()),
                SearchParam::Int(3),
                SearchParam::Int(100),
                SearchParam::Int(400),
                SearchParam::Float(3.5),
                SearchParam::Int(20),
            ]
        );
    }

    #[rstest]
    #[case(PropertyFilter::default())]
    #[case(PropertyFilter { owner_id: Some(12), ..Default::default() })]
    #[case(PropertyFilter { maximum_price_per_night: Some(90), minimum_rating: Some(2.0), ..Default::default() })]
    #[case(PropertyFilter { city: Some("Calgary".into()), minimum_price_per_night: Some(10), minimum_rating: Some(4.5), ..Default::default() })]
    fn test_placeholders_are_sequential(#[case] filter: PropertyFilter) {
        let query = filter.build(10).unwrap();
        let expected: Vec<usize> = (1..=query.params().len()).collect();
        assert_eq!(placeholders(query.sql()), expected);
    }

    #[test]
    fn test_zero_rating_is_still_a_filter() {
        let filter = PropertyFilter {
            minimum_rating: Some(0.0),
            ..Default::default()
        };
        let query = filter.build(10).unwrap();
        assert!(query.sql().contains("HAVING"));
        assert_eq!(query.params()[0], SearchParam::Float(0.0));
    }

    #[rstest]
    #[case::zero_limit(PropertyFilter::default(), 0)]
    #[case::negative_limit(PropertyFilter::default(), -5)]
    #[case::negative_price(PropertyFilter { minimum_price_per_night: Some(-1), ..Default::default() }, 10)]
    #[case::inverted_range(PropertyFilter { minimum_price_per_night: Some(200), maximum_price_per_night: Some(100), ..Default::default() }, 10)]
    #[case::rating_too_high(PropertyFilter { minimum_rating: Some(5.5), ..Default::default() }, 10)]
    #[case::rating_nan(PropertyFilter { minimum_rating: Some(f64::NAN), ..Default::default() }, 10)]
    fn test_rejects_malformed_input(#[case] filter: PropertyFilter, #[case] limit: i64) {
        assert!(matches!(
            filter.build(limit),
            Err(AppError::MalformedInput(_))
        ));
    }
}
