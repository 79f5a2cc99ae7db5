//! Tracker Rule Core Library
//!
//! Data model shared by the filter compiler and the request-matching engine
//! that consumes its output.
//!
//! # Modules
//!
//! - `types`: `Rule`, `RuleOptions`, `RuleType` and tracker categories
//! - `database`: the categorized tracker database and its host records
//! - `url`: host extraction from URL text
//! - `json`: pretty JSON output in the database's layout

pub mod database;
pub mod json;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use database::{CategoryTable, DatabaseError, HostRecord, TrackerDatabase};
pub use json::to_pretty_json;
pub use types::{Category, Rule, RuleGroup, RuleOptions, RuleType, UnknownRuleType};
