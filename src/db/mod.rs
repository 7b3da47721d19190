//! Provides database interaction functionalities.
//!
//! `search` assembles the dynamic property search statement; `postgres` owns the
//! connection pool and runs every query.

mod postgres;
mod search;

pub use postgres::*;
pub use search::*;
