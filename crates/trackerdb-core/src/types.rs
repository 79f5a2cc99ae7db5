//! Core type definitions for the tracker rule compiler
//!
//! These types map directly to the JSON shapes stored in the tracker
//! database and are shared with the request-matching engine that loads it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Rule Type (which list a run populates)
// =============================================================================

/// Run-wide mode selecting the rule list compiled rules are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Blocking rules
    Rule,
    /// Exception rules
    Whitelist,
}

impl RuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Whitelist => "whitelist",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a rule type string that is neither `rule` nor `whitelist`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown rule type '{0}' (expected 'rule' or 'whitelist')")]
pub struct UnknownRuleType(pub String);

impl FromStr for RuleType {
    type Err = UnknownRuleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(Self::Rule),
            "whitelist" => Ok(Self::Whitelist),
            other => Err(UnknownRuleType(other.to_string())),
        }
    }
}

// =============================================================================
// Tracker Categories
// =============================================================================

/// Tracker database category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Analytics,
    Social,
    Advertising,
}

impl Category {
    /// Every category, in reconciliation search order.
    pub const ALL: [Category; 3] = [Self::Analytics, Self::Social, Self::Advertising];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analytics => "Analytics",
            Self::Social => "Social",
            Self::Advertising => "Advertising",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Qualifiers parsed from a filter's `$` option string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleOptions {
    /// Domains the rule applies on. Negated domains are never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    /// Request-type tags such as `script` or `image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
}

impl RuleOptions {
    pub fn is_empty(&self) -> bool {
        self.domains.is_none() && self.types.is_none()
    }
}

/// A compiled blocking (or whitelist) rule.
///
/// Two rules are the same rule iff their patterns are identical; options
/// only matter when two such rules are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Regular expression matched against request URLs (without scheme).
    #[serde(rename = "rule")]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RuleOptions>,
}

impl Rule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            options: None,
        }
    }

    /// Attach options, leaving `options` unset when nothing was parsed.
    pub fn with_options(mut self, options: RuleOptions) -> Self {
        self.options = if options.is_empty() { None } else { Some(options) };
        self
    }

    #[inline]
    pub fn is_same_rule(&self, other: &Rule) -> bool {
        self.pattern == other.pattern
    }
}

/// Rule lists keyed by rule type, e.g. `{"rule": [...]}`.
pub type RuleGroup = BTreeMap<RuleType, Vec<Rule>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_type_round_trips_through_str() {
        assert_eq!("rule".parse::<RuleType>(), Ok(RuleType::Rule));
        assert_eq!("whitelist".parse::<RuleType>(), Ok(RuleType::Whitelist));
        assert!("block".parse::<RuleType>().is_err());
        assert_eq!(RuleType::Whitelist.to_string(), "whitelist");
    }

    #[test]
    fn category_order_is_fixed() {
        let names: Vec<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["Analytics", "Social", "Advertising"]);
    }

    #[test]
    fn rule_serializes_with_rule_key_and_omits_empty_options() {
        let rule = Rule::new(r"example\.com").with_options(RuleOptions::default());
        assert_eq!(rule.options, None);
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"rule":"example\\.com"}"#);
    }

    #[test]
    fn rule_with_options_serializes_fields() {
        let rule = Rule::new("a").with_options(RuleOptions {
            domains: Some(vec!["foo.com".into()]),
            types: None,
        });
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, r#"{"rule":"a","options":{"domains":["foo.com"]}}"#);
    }

    #[test]
    fn rule_rejects_unknown_fields() {
        let result: Result<Rule, _> = serde_json::from_str(r#"{"rule":"a","bogus":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rule_group_uses_rule_type_keys() {
        let mut group = RuleGroup::new();
        group.insert(RuleType::Whitelist, vec![Rule::new("a")]);
        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(json, r#"{"whitelist":[{"rule":"a"}]}"#);
        let back: RuleGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, group);
    }
}
