//! Tracker database model
//!
//! The database is owned by another project. It maps a category name to a
//! table of hosts, and each host record may carry rule lists keyed by rule
//! type. Fields this crate does not know about are carried through
//! untouched so a rewrite never loses data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Category, Rule, RuleType};

/// Error type for loading a tracker database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Invalid tracker database: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Tracker database is missing category '{0}'")]
    MissingCategory(Category),
}

/// Per-host record inside a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<Rule>>,
    /// Company, URL and any other upstream fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl HostRecord {
    pub fn rules(&self, rule_type: RuleType) -> Option<&Vec<Rule>> {
        match rule_type {
            RuleType::Rule => self.rule.as_ref(),
            RuleType::Whitelist => self.whitelist.as_ref(),
        }
    }

    pub fn rules_mut(&mut self, rule_type: RuleType) -> &mut Option<Vec<Rule>> {
        match rule_type {
            RuleType::Rule => &mut self.rule,
            RuleType::Whitelist => &mut self.whitelist,
        }
    }
}

/// Hosts of one category.
pub type CategoryTable = BTreeMap<String, HostRecord>;

/// Categorized registry of tracking hosts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackerDatabase {
    categories: BTreeMap<String, CategoryTable>,
}

impl TrackerDatabase {
    /// Database with every known category present and empty.
    pub fn new() -> Self {
        let categories = Category::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), CategoryTable::new()))
            .collect();
        Self { categories }
    }

    /// Parse and validate a database document.
    pub fn from_json(text: &str) -> Result<Self, DatabaseError> {
        let db: Self = serde_json::from_str(text)?;
        db.validate()?;
        Ok(db)
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        for category in Category::ALL {
            if !self.categories.contains_key(category.as_str()) {
                return Err(DatabaseError::MissingCategory(category));
            }
        }
        Ok(())
    }

    pub fn category(&self, category: Category) -> Option<&CategoryTable> {
        self.categories.get(category.as_str())
    }

    pub fn category_mut(&mut self, category: Category) -> Option<&mut CategoryTable> {
        self.categories.get_mut(category.as_str())
    }

    pub fn host(&self, category: Category, host: &str) -> Option<&HostRecord> {
        self.category(category)?.get(host)
    }

    pub fn host_mut(&mut self, category: Category, host: &str) -> Option<&mut HostRecord> {
        self.category_mut(category)?.get_mut(host)
    }

    /// Insert or replace a host record, creating the category if needed.
    pub fn insert_host(&mut self, category: Category, host: impl Into<String>, record: HostRecord) {
        self.categories
            .entry(category.as_str().to_string())
            .or_default()
            .insert(host.into(), record);
    }
}
