//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes defining commands, handling user interaction (prompts, menus),
//! rendering query results as tables, and loading fixture files.

mod commands;
mod prompts;
mod render;
mod seed;

pub use commands::*;
pub use prompts::*;
