use super::render::{listings_table, reservations_table, users_table};
use super::seed::{seed_fixtures, FixtureSet};
use crate::config::Config;
use crate::db::{Database, PropertyFilter};
use crate::error::{AppError, Result};
use crate::models::{NewProperty, NewUser};
use clap::{ArgGroup, Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

const USERS_FIXTURE: &str = "fixtures/users.json";
const PROPERTIES_FIXTURE: &str = "fixtures/properties.json";
const RESERVATIONS_FIXTURE: &str = "fixtures/reservations.json";
const REVIEWS_FIXTURE: &str = "fixtures/property_reviews.json";

/// Query and manage the LightBnB listing database
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runs the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Create the LightBnB tables if they do not exist
    InitDb,

    /// Load users, properties, reservations and reviews from JSON fixture files
    Seed(SeedArgs),

    /// Look up a user by email or id
    User(UserArgs),

    /// Register a new user
    AddUser(AddUserArgs),

    /// List the reservations made by a guest
    Reservations(ReservationsArgs),

    /// Search properties, cheapest first
    Search(SearchArgs),

    /// List a new property
    AddProperty(AddPropertyArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SeedArgs {
    /// Users fixture file
    #[arg(long, default_value = USERS_FIXTURE)]
    pub users: PathBuf,

    /// Properties fixture file
    #[arg(long, default_value = PROPERTIES_FIXTURE)]
    pub properties: PathBuf,

    /// Reservations fixture file
    #[arg(long, default_value = RESERVATIONS_FIXTURE)]
    pub reservations: PathBuf,

    /// Property reviews fixture file
    #[arg(long, default_value = REVIEWS_FIXTURE)]
    pub reviews: PathBuf,
}

impl Default for SeedArgs {
    fn default() -> Self {
        Self {
            users: USERS_FIXTURE.into(),
            properties: PROPERTIES_FIXTURE.into(),
            reservations: RESERVATIONS_FIXTURE.into(),
            reviews: REVIEWS_FIXTURE.into(),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
#[command(group(ArgGroup::new("key").required(true).args(["email", "id"])))]
pub struct UserArgs {
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub id: Option<i32>,
}

/// How a single user is looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum UserLookup {
    Email(String),
    Id(i32),
}

impl UserArgs {
    pub fn lookup(&self) -> Result<UserLookup> {
        match (&self.email, self.id) {
            (Some(email), None) => Ok(UserLookup::Email(email.clone())),
            (None, Some(id)) => Ok(UserLookup::Id(id)),
            _ => Err(AppError::Cli(
                "Exactly one of --email or --id is required".to_string(),
            )),
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct AddUserArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// Password hash to store
    #[arg(long)]
    pub password: String,
}

impl From<AddUserArgs> for NewUser {
    fn from(args: AddUserArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            password: args.password,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ReservationsArgs {
    #[arg(long)]
    pub guest_id: i32,

    /// Maximum rows (defaults to LIGHTBNB_DEFAULT_LIMIT)
    #[arg(short, long)]
    pub limit: Option<i64>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SearchArgs {
    /// Matches cities ending with this text
    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub owner_id: Option<i32>,

    /// Minimum price per night, in dollars
    #[arg(long)]
    pub min_price: Option<i64>,

    /// Maximum price per night, in dollars
    #[arg(long)]
    pub max_price: Option<i64>,

    /// Minimum average rating (0-5)
    #[arg(long)]
    pub min_rating: Option<f64>,

    /// Maximum rows (defaults to LIGHTBNB_DEFAULT_LIMIT)
    #[arg(short, long)]
    pub limit: Option<i64>,
}

impl From<&SearchArgs> for PropertyFilter {
    fn from(args: &SearchArgs) -> Self {
        Self {
            city: args.city.clone(),
            owner_id: args.owner_id,
            minimum_price_per_night: args.min_price,
            maximum_price_per_night: args.max_price,
            minimum_rating: args.min_rating,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct AddPropertyArgs {
    #[arg(long)]
    pub owner_id: i32,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub bedrooms: i32,
    #[arg(long)]
    pub bathrooms: i32,
    #[arg(long, default_value = "0")]
    pub parking_spaces: i32,
    /// Nightly price in cents
    #[arg(long)]
    pub cost_per_night: i32,
    #[arg(long)]
    pub thumbnail_photo_url: String,
    #[arg(long)]
    pub cover_photo_url: String,
    #[arg(long)]
    pub street: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub province: String,
    #[arg(long)]
    pub post_code: String,
    #[arg(long, default_value = "Canada")]
    pub country: String,
}

impl From<AddPropertyArgs> for NewProperty {
    fn from(args: AddPropertyArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            number_of_bedrooms: args.bedrooms,
            number_of_bathrooms: args.bathrooms,
            parking_spaces: args.parking_spaces,
            cost_per_night: args.cost_per_night,
            thumbnail_photo_url: args.thumbnail_photo_url,
            cover_photo_url: args.cover_photo_url,
            street: args.street,
            country: args.country,
            city: args.city,
            province: args.province,
            post_code: args.post_code,
            owner_id: args.owner_id,
        }
    }
}

/// CLI application
pub struct App {
    db: Database,
    config: Config,
}

impl App {
    /// Connects to the database described by `config`.
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(&config).await?;
        Ok(Self { db, config })
    }

    pub fn default_limit(&self) -> i64 {
        self.config.default_limit
    }

    /// Run a single command
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::InitDb => {
                self.db.init_schema().await?;
                println!("{}", "Database schema is ready.".green());
            },
            Commands::Seed(args) => self.seed(&args).await?,
            Commands::User(args) => self.show_user(args.lookup()?).await?,
            Commands::AddUser(args) => self.add_user(args.into()).await?,
            Commands::Reservations(args) => {
                let limit = args.limit.unwrap_or(self.config.default_limit);
                self.show_reservations(args.guest_id, limit).await?;
            },
            Commands::Search(args) => {
                let limit = args.limit.unwrap_or(self.config.default_limit);
                self.search(&PropertyFilter::from(&args), limit).await?;
            },
            Commands::AddProperty(args) => self.add_property(args.into()).await?,
        }

        Ok(())
    }

    pub async fn show_user(&self, lookup: UserLookup) -> Result<()> {
        let user = match &lookup {
            UserLookup::Email(email) => self.db.get_user_with_email(email).await?,
            UserLookup::Id(id) => self.db.get_user_with_id(*id).await?,
        };

        match user {
            Some(user) => {
                println!("{}", users_table(std::slice::from_ref(&user)));
                Ok(())
            },
            None => Err(AppError::NotFound(match lookup {
                UserLookup::Email(email) => format!("no user with email {email}"),
                UserLookup::Id(id) => format!("no user with id {id}"),
            })),
        }
    }

    pub async fn add_user(&self, user: NewUser) -> Result<()> {
        let created = self.db.add_user(&user).await?;
        println!("{} {}", "Registered user".green(), created.id);
        println!("{}", users_table(&[created]));
        Ok(())
    }

    pub async fn show_reservations(&self, guest_id: i32, limit: i64) -> Result<()> {
        let reservations = self.db.get_all_reservations(guest_id, limit).await?;
        if reservations.is_empty() {
            println!("{}", format!("No reservations for guest {guest_id}.").yellow());
            return Ok(());
        }
        println!("Reservations for guest {}", guest_id);
        println!("{}", reservations_table(&reservations));
        Ok(())
    }

    pub async fn search(&self, filter: &PropertyFilter, limit: i64) -> Result<()> {
        let listings = self.db.get_all_properties(filter, limit).await?;
        if listings.is_empty() {
            println!("{}", "No properties match those filters.".yellow());
            return Ok(());
        }
        println!("{} properties found", listings.len());
        println!("{}", listings_table(&listings));
        Ok(())
    }

    pub async fn add_property(&self, property: NewProperty) -> Result<()> {
        let created = self.db.add_property(&property).await?;
        println!(
            "{} {} ({})",
            "Listed property".green(),
            created.id,
            created.title
        );
        Ok(())
    }

    /// Inserts the fixture files, reusing rows that are already present.
    async fn seed(&self, args: &SeedArgs) -> Result<()> {
        let fixtures = FixtureSet::load(args)?;
        info!(
            "Seeding {} users, {} properties, {} reservations and {} reviews",
            fixtures.users.len(),
            fixtures.properties.len(),
            fixtures.reservations.len(),
            fixtures.reviews.len()
        );

        if !self.db.is_schema_initialized().await? {
            self.db.init_schema().await?;
        }

        let progress = ProgressBar::new(fixtures.record_count() as u64)
            .with_style(ProgressStyle::with_template(PROGRESS_TEMPLATE)?);
        let report = seed_fixtures(&self.db, &fixtures, &progress).await?;
        progress.finish_with_message("done");

        println!(
            "{} {} records, {} skipped",
            "Seeded".green(),
            report.inserted,
            report.skipped
        );
        Ok(())
    }
}
