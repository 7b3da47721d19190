//! Provides PostgreSQL database interaction functionalities using `sqlx`.
//!
//! Each public operation issues a single statement against the pool owned by
//! [`Database`]. Failures are returned as classified `AppError`s; single-row lookups
//! that match nothing resolve to `Ok(None)`.
//! Also contains integration tests for database operations (requires the `integration-tests` feature).

use super::search::{PropertyFilter, SearchParam};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    GuestReservation, NewProperty, NewReservation, NewReview, NewUser, Property, PropertyListing,
    Reservation, User,
};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use tracing::{debug, error, info};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema statements, run in order by [`Database::init_schema`].
const SCHEMA: [(&str, &str); 8] = [
    (
        "users table",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            password VARCHAR(255) NOT NULL
        )
        "#,
    ),
    (
        "properties table",
        r#"
        CREATE TABLE IF NOT EXISTS properties (
            id SERIAL PRIMARY KEY,
            owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            thumbnail_photo_url VARCHAR(255) NOT NULL,
            cover_photo_url VARCHAR(255) NOT NULL,
            cost_per_night INTEGER NOT NULL DEFAULT 0, -- minor units (cents)
            parking_spaces INTEGER NOT NULL DEFAULT 0,
            number_of_bathrooms INTEGER NOT NULL DEFAULT 0,
            number_of_bedrooms INTEGER NOT NULL DEFAULT 0,
            country VARCHAR(255) NOT NULL,
            street VARCHAR(255) NOT NULL,
            city VARCHAR(255) NOT NULL,
            province VARCHAR(255) NOT NULL,
            post_code VARCHAR(255) NOT NULL
        )
        "#,
    ),
    (
        "reservations table",
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id SERIAL PRIMARY KEY,
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
            guest_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "property_reviews table",
        r#"
        CREATE TABLE IF NOT EXISTS property_reviews (
            id SERIAL PRIMARY KEY,
            guest_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
            reservation_id INTEGER REFERENCES reservations(id) ON DELETE CASCADE,
            rating SMALLINT NOT NULL DEFAULT 0,
            message TEXT
        )
        "#,
    ),
    (
        "city index",
        "CREATE INDEX IF NOT EXISTS idx_properties_city ON properties(city)",
    ),
    (
        "owner index",
        "CREATE INDEX IF NOT EXISTS idx_properties_owner_id ON properties(owner_id)",
    ),
    (
        "guest index",
        "CREATE INDEX IF NOT EXISTS idx_reservations_guest_id ON reservations(guest_id)",
    ),
    (
        "review property index",
        "CREATE INDEX IF NOT EXISTS idx_property_reviews_property_id ON property_reviews(property_id)",
    ),
];

/// Data-access handle for the LightBnB tables.
///
/// Owns the `sqlx` connection pool; clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Creates a new `Database` instance by establishing a connection pool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConnectionFailure` if the pool cannot reach the database.
    pub async fn new(config: &Config) -> Result<Self> {
        info!(
            max_connections = config.max_connections,
            "Connecting to database..."
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                AppError::from(e)
            })?;

        info!("Connected to database successfully");
        Ok(Self::from_pool(pool))
    }

    /// Wraps a pool that was built elsewhere.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the LightBnB tables and indexes if they do not exist yet.
    ///
    /// Safe to run repeatedly.
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema (if necessary)...");

        for (label, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    error!("Failed to create {}: {}", label, e);
                    AppError::from(e)
                })?;
            debug!("Ensured {}", label);
        }

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Checks whether all four LightBnB tables exist.
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let query = r#"
        SELECT COUNT(*) = 4
        FROM information_schema.tables
        WHERE table_schema = current_schema()
          AND table_name IN ('users', 'properties', 'reservations', 'property_reviews')
        "#;
        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to check schema existence: {}", e);
                AppError::from(e)
            })?;
        let initialized: bool = row.try_get(0)?;
        debug!("Schema initialized status: {}", initialized);
        Ok(initialized)
    }

    // --- Users ---

    /// Fetches the user registered with `email`, or `None` when there is none.
    pub async fn get_user_with_email(&self, email: &str) -> Result<Option<User>> {
        debug!("Looking up user by email");
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users WHERE users.email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to look up user by email: {}", e);
            AppError::from(e)
        })?;

        if user.is_none() {
            debug!("No user registered with that email");
        }
        Ok(user)
    }

    /// Fetches the user with `id`, or `None` when there is none.
    pub async fn get_user_with_id(&self, id: i32) -> Result<Option<User>> {
        debug!(user_id = id, "Looking up user by id");
        sqlx::query_as::<_, User>("SELECT id, name, email, password FROM users WHERE users.id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to look up user {}: {}", id, e);
                AppError::from(e)
            })
    }

    /// Inserts a user and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedInput` for blank fields and
    /// `AppError::ConstraintViolation` when the email is already registered.
    pub async fn add_user(&self, user: &NewUser) -> Result<User> {
        if let Some(field) = user.blank_field() {
            return Err(AppError::MalformedInput(format!(
                "user {field} must not be blank"
            )));
        }

        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert user: {}", e);
            AppError::from(e)
        })?;

        info!(user_id = created.id, "Added user");
        Ok(created)
    }

    // --- Reservations ---

    /// Fetches up to `limit` reservations made by `guest_id`, each joined with its property.
    ///
    /// Rows come back in whatever order the database produces.
    pub async fn get_all_reservations(
        &self,
        guest_id: i32,
        limit: i64,
    ) -> Result<Vec<GuestReservation>> {
        if limit < 1 {
            return Err(AppError::MalformedInput(format!(
                "limit must be at least 1 (got {limit})"
            )));
        }

        let query = r#"
        SELECT reservations.id AS reservation_id,
               reservations.guest_id,
               reservations.property_id,
               reservations.start_date,
               reservations.end_date,
               properties.*
        FROM reservations
        JOIN properties ON reservations.property_id = properties.id
        WHERE reservations.guest_id = $1
        LIMIT $2
        "#;

        let reservations = sqlx::query_as::<_, GuestReservation>(query)
            .bind(guest_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch reservations for guest {}: {}", guest_id, e);
                AppError::from(e)
            })?;

        info!(
            "Retrieved {} reservations for guest {}",
            reservations.len(),
            guest_id
        );
        Ok(reservations)
    }

    /// Books `reservation` and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedInput` when the stay is empty and
    /// `AppError::ConstraintViolation` when the guest or property does not exist.
    pub async fn add_reservation(&self, reservation: &NewReservation) -> Result<Reservation> {
        reservation.validate().map_err(AppError::MalformedInput)?;

        let query = r#"
        INSERT INTO reservations (start_date, end_date, property_id, guest_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, guest_id, property_id, start_date, end_date
        "#;

        let created = sqlx::query_as::<_, Reservation>(query)
            .bind(reservation.start_date)
            .bind(reservation.end_date)
            .bind(reservation.property_id)
            .bind(reservation.guest_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to insert reservation: {}", e);
                AppError::from(e)
            })?;

        info!(
            reservation_id = created.id,
            guest_id = created.guest_id,
            "Added reservation"
        );
        Ok(created)
    }

    // --- Reviews ---

    /// Records a review and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedInput` for a rating outside 1..=5 and
    /// `AppError::ConstraintViolation` when a referenced row does not exist.
    pub async fn add_review(&self, review: &NewReview) -> Result<i32> {
        review.validate().map_err(AppError::MalformedInput)?;

        let query = r#"
        INSERT INTO property_reviews (guest_id, property_id, reservation_id, rating, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#;

        let id = sqlx::query_scalar::<_, i32>(query)
            .bind(review.guest_id)
            .bind(review.property_id)
            .bind(review.reservation_id)
            .bind(review.rating)
            .bind(&review.message)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to insert review: {}", e);
                AppError::from(e)
            })?;

        debug!(review_id = id, property_id = review.property_id, "Added review");
        Ok(id)
    }

    // --- Properties ---

    /// Searches properties matching `filter`, cheapest first, at most `limit` rows.
    ///
    /// Only properties with at least one review are returned, since the average
    /// rating is taken over the joined reviews.
    pub async fn get_all_properties(
        &self,
        filter: &PropertyFilter,
        limit: i64,
    ) -> Result<Vec<PropertyListing>> {
        let search = filter.build(limit)?;
        debug!(sql = search.sql(), params = ?search.params(), "Running property search");

        let mut query = sqlx::query_as::<_, PropertyListing>(search.sql());
        for param in search.params() {
            query = match param {
                SearchParam::Text(text) => query.bind(text.as_str()),
                SearchParam::Int(value) => query.bind(*value),
                SearchParam::Float(value) => query.bind(*value),
            };
        }

        let listings = query.fetch_all(&self.pool).await.map_err(|e| {
            error!("Failed to search properties: {}", e);
            AppError::from(e)
        })?;

        info!("Property search returned {} rows", listings.len());
        Ok(listings)
    }

    /// Fetches the property `owner_id` listed under `title`, if any.
    pub async fn find_property(&self, owner_id: i32, title: &str) -> Result<Option<Property>> {
        sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE owner_id = $1 AND title = $2 ORDER BY id LIMIT 1",
        )
        .bind(owner_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to look up property of owner {}: {}", owner_id, e);
            AppError::from(e)
        })
    }

    /// Inserts a property and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedInput` when validation fails and
    /// `AppError::ConstraintViolation` when the owner does not exist.
    pub async fn add_property(&self, property: &NewProperty) -> Result<Property> {
        property.validate().map_err(AppError::MalformedInput)?;

        let query = r#"
        INSERT INTO properties (title, description, number_of_bedrooms, number_of_bathrooms,
            parking_spaces, cost_per_night, thumbnail_photo_url, cover_photo_url, street,
            country, city, province, post_code, owner_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#;

        let created = sqlx::query_as::<_, Property>(query)
            .bind(&property.title)
            .bind(&property.description)
            .bind(property.number_of_bedrooms)
            .bind(property.number_of_bathrooms)
            .bind(property.parking_spaces)
            .bind(property.cost_per_night)
            .bind(&property.thumbnail_photo_url)
            .bind(&property.cover_photo_url)
            .bind(&property.street)
            .bind(&property.country)
            .bind(&property.city)
            .bind(&property.province)
            .bind(&property.post_code)
            .bind(property.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to insert property: {}", e);
                AppError::from(e)
            })?;

        info!(
            property_id = created.id,
            owner_id = created.owner_id,
            "Added property"
        );
        Ok(created)
    }
}
