use serde::Deserialize;

/// Highest rating a review can carry.
pub const MAX_REVIEW_RATING: i16 = 5;

/// Input for `Database::add_review`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReview {
    pub guest_id: i32,
    pub property_id: i32,
    /// The stay being reviewed, when there is one.
    #[serde(default)]
    pub reservation_id: Option<i32>,
    pub rating: i16,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_REVIEW_RATING).contains(&self.rating) {
            return Err(format!(
                "rating must be between 1 and {MAX_REVIEW_RATING} (got {})",
                self.rating
            ));
        }
        Ok(())
    }
}
