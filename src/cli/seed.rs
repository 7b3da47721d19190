//! Loads fixture files and inserts them into the database.
//!
//! Fixtures are JSON, either a plain array of records or an object keyed by id
//! (`{"1": {...}, "2": {...}}`). Every record carries the `id` other fixture files use
//! to refer to it. Those ids are translated to the ids the database actually assigns,
//! so seeding works against a database that already holds rows.

use super::SeedArgs;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{NewProperty, NewReservation, NewReview, NewUser};
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile<T> {
    List(Vec<T>),
    Keyed(BTreeMap<String, T>),
}

/// A fixture record plus the id other fixtures reference it by.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fixture<T> {
    pub id: i32,
    #[serde(flatten)]
    pub record: T,
}

/// Parses fixture records from JSON text, ordered by fixture id.
pub fn parse_fixture<T: DeserializeOwned>(json: &str) -> Result<Vec<Fixture<T>>> {
    let file: FixtureFile<Fixture<T>> = serde_json::from_str(json)?;
    let mut records = match file {
        FixtureFile::List(records) => records,
        FixtureFile::Keyed(map) => map.into_values().collect(),
    };
    records.sort_by_key(|fixture| fixture.id);
    Ok(records)
}

/// Reads and parses a fixture file.
pub fn load_fixture<T: DeserializeOwned>(path: &Path) -> Result<Vec<Fixture<T>>> {
    debug!("Reading fixture {}", path.display());
    let json = fs::read_to_string(path).map_err(|e| {
        AppError::Cli(format!("Cannot read fixture {}: {}", path.display(), e))
    })?;
    parse_fixture(&json)
}

/// Every fixture file needed for a seed run.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSet {
    pub users: Vec<Fixture<NewUser>>,
    pub properties: Vec<Fixture<NewProperty>>,
    pub reservations: Vec<Fixture<NewReservation>>,
    pub reviews: Vec<Fixture<NewReview>>,
}

impl FixtureSet {
    pub fn load(args: &SeedArgs) -> Result<Self> {
        Ok(Self {
            users: load_fixture(&args.users)?,
            properties: load_fixture(&args.properties)?,
            reservations: load_fixture(&args.reservations)?,
            reviews: load_fixture(&args.reviews)?,
        })
    }

    pub fn record_count(&self) -> usize {
        self.users.len() + self.properties.len() + self.reservations.len() + self.reviews.len()
    }
}

/// Outcome of a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Fixture id to database id, per table.
#[derive(Default)]
struct IdMap {
    users: HashMap<i32, i32>,
    properties: HashMap<i32, i32>,
    reservations: HashMap<i32, i32>,
}

/// Inserts `fixtures` in dependency order, advancing `progress` once per record.
///
/// Users whose email is already registered are reused. A property already listed by
/// its owner under the same title is skipped along with its reservations and reviews,
/// so running the seed twice inserts nothing the second time.
pub async fn seed_fixtures(
    db: &Database,
    fixtures: &FixtureSet,
    progress: &ProgressBar,
) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut ids = IdMap::default();

    progress.set_message("users");
    for fixture in &fixtures.users {
        progress.inc(1);
        let user = &fixture.record;
        let id = match skip_constraint_violation(db.add_user(user).await)? {
            Some(created) => {
                report.inserted += 1;
                created.id
            },
            None => {
                report.skipped += 1;
                match db.get_user_with_email(&user.email).await? {
                    Some(existing) => existing.id,
                    None => continue,
                }
            },
        };
        ids.users.insert(fixture.id, id);
    }

    progress.set_message("properties");
    for fixture in &fixtures.properties {
        progress.inc(1);
        let Some(&owner_id) = ids.users.get(&fixture.record.owner_id) else {
            warn!(fixture_id = fixture.id, "Skipping property: owner not seeded");
            report.skipped += 1;
            continue;
        };
        if db.find_property(owner_id, &fixture.record.title).await?.is_some() {
            debug!(fixture_id = fixture.id, "Property already listed");
            report.skipped += 1;
            continue;
        }
        let property = NewProperty {
            owner_id,
            ..fixture.record.clone()
        };
        match skip_constraint_violation(db.add_property(&property).await)? {
            Some(created) => {
                ids.properties.insert(fixture.id, created.id);
                report.inserted += 1;
            },
            None => report.skipped += 1,
        }
    }

    progress.set_message("reservations");
    for fixture in &fixtures.reservations {
        progress.inc(1);
        let record = &fixture.record;
        let (Some(&guest_id), Some(&property_id)) = (
            ids.users.get(&record.guest_id),
            ids.properties.get(&record.property_id),
        ) else {
            debug!(fixture_id = fixture.id, "Skipping reservation: guest or property not seeded");
            report.skipped += 1;
            continue;
        };
        let reservation = NewReservation {
            guest_id,
            property_id,
            ..record.clone()
        };
        match skip_constraint_violation(db.add_reservation(&reservation).await)? {
            Some(created) => {
                ids.reservations.insert(fixture.id, created.id);
                report.inserted += 1;
            },
            None => report.skipped += 1,
        }
    }

    progress.set_message("reviews");
    for fixture in &fixtures.reviews {
        progress.inc(1);
        let record = &fixture.record;
        let reservation_id = match record.reservation_id {
            Some(id) => ids.reservations.get(&id).copied().map(Some),
            None => Some(None),
        };
        let (Some(&guest_id), Some(&property_id), Some(reservation_id)) = (
            ids.users.get(&record.guest_id),
            ids.properties.get(&record.property_id),
            reservation_id,
        ) else {
            debug!(fixture_id = fixture.id, "Skipping review: references not seeded");
            report.skipped += 1;
            continue;
        };
        let review = NewReview {
            guest_id,
            property_id,
            reservation_id,
            ..record.clone()
        };
        match skip_constraint_violation(db.add_review(&review).await)? {
            Some(_) => report.inserted += 1,
            None => report.skipped += 1,
        }
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Seed run finished"
    );
    Ok(report)
}

/// Turns a constraint violation into `None` instead of an error.
fn skip_constraint_violation<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::ConstraintViolation {
            constraint,
            message,
        }) => {
            warn!(?constraint, "Skipping fixture record: {}", message);
            Ok(None)
        },
        Err(e) => Err(e),
    }
}
