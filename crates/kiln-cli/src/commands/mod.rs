//! Command implementations for the Kiln CLI.
//!
//! - [`develop`] - develop server with incremental page data
//! - [`schema`] - JSON Schema of the config file
//!
//! Each command provides an `execute` function taking its parsed arguments.

pub mod develop;
pub mod schema;

pub use develop::execute as develop_execute;
pub use schema::execute as schema_execute;
