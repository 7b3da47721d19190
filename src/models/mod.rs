//! Defines the data structures and models used throughout the application.
//!
//! Includes row types read back from the LightBnB tables, the input records used for
//! inserts, and the joined/aggregated result rows produced by listing queries.

mod property;
mod reservation;
mod review;
mod user;

pub use property::*;
pub use reservation::*;
pub use review::*;
pub use user::*;
