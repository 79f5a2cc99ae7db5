//! Rule merging
//!
//! Rules with identical patterns are folded together by unioning their
//! option lists. The union is commutative, associative and idempotent, so
//! duplicate rules can be folded in any order.

use std::collections::HashMap;

use trackerdb_core::{Rule, RuleOptions};

/// Merge two rules that share a pattern.
///
/// The result keeps `a`'s pattern; each option list is the ordered union of
/// both sides, `a`'s entries first.
pub fn merge_rules(a: Rule, b: Rule) -> Rule {
    debug_assert!(a.is_same_rule(&b), "merging rules with different patterns");
    Rule {
        pattern: a.pattern,
        options: merge_options(a.options, b.options),
    }
}

pub fn merge_options(a: Option<RuleOptions>, b: Option<RuleOptions>) -> Option<RuleOptions> {
    let (a, b) = match (a, b) {
        (None, None) => return None,
        (a, b) => (a.unwrap_or_default(), b.unwrap_or_default()),
    };

    let merged = RuleOptions {
        domains: union_lists(a.domains, b.domains),
        types: union_lists(a.types, b.types),
    };

    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

fn union_lists(a: Option<Vec<String>>, b: Option<Vec<String>>) -> Option<Vec<String>> {
    if a.is_none() && b.is_none() {
        return None;
    }

    let mut out: Vec<String> = Vec::new();
    for item in a.into_iter().flatten().chain(b.into_iter().flatten()) {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    Some(out)
}

/// Fold freshly compiled rules into an existing rule list.
///
/// Each incoming rule is merged with the existing rule of the same pattern,
/// if any. The result holds incoming (or merged) rules in incoming order,
/// followed by the existing rules nothing matched, in their original order.
pub fn merge_rule_lists(incoming: Vec<Rule>, existing: Vec<Rule>) -> Vec<Rule> {
    let mut leftover: Vec<Option<Rule>> = existing.into_iter().map(Some).collect();
    let mut merged = Vec::with_capacity(incoming.len() + leftover.len());

    for rule in incoming {
        let matched = leftover
            .iter_mut()
            .find(|slot| matches!(slot, Some(old) if old.is_same_rule(&rule)))
            .and_then(Option::take);

        merged.push(match matched {
            Some(old) => merge_rules(rule, old),
            None => rule,
        });
    }

    merged.extend(leftover.into_iter().flatten());
    merged
}

// =============================================================================
// Rule Table
// =============================================================================

/// Rules keyed by pattern, at most one per pattern.
///
/// Iteration follows first-seen order so output is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, merging it into an existing rule with the same pattern.
    /// Returns `true` when a merge happened.
    pub fn insert(&mut self, rule: Rule) -> bool {
        match self.index.get(&rule.pattern) {
            Some(&pos) => {
                let current = std::mem::replace(&mut self.rules[pos], Rule::new(String::new()));
                self.rules[pos] = merge_rules(current, rule);
                true
            }
            None => {
                self.index.insert(rule.pattern.clone(), self.rules.len());
                self.rules.push(rule);
                false
            }
        }
    }

    /// Fold step: the table with `rule` merged in.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.insert(rule);
        self
    }

    /// Combine two tables built independently.
    pub fn merge(self, other: RuleTable) -> RuleTable {
        other.rules.into_iter().fold(self, RuleTable::with_rule)
    }

    pub fn get(&self, pattern: &str) -> Option<&Rule> {
        self.index.get(pattern).map(|&pos| &self.rules[pos])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}

impl FromIterator<Rule> for RuleTable {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        iter.into_iter().fold(RuleTable::new(), RuleTable::with_rule)
    }
}

impl Extend<Rule> for RuleTable {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        for rule in iter {
            self.insert(rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, domains: Option<&[&str]>, types: Option<&[&str]>) -> Rule {
        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Rule::new(pattern).with_options(RuleOptions {
            domains: domains.map(to_vec),
            types: types.map(to_vec),
        })
    }

    fn sorted(list: &Option<Vec<String>>) -> Option<Vec<String>> {
        list.clone().map(|mut v| {
            v.sort();
            v
        })
    }

    fn option_sets(rule: &Rule) -> (Option<Vec<String>>, Option<Vec<String>>) {
        match &rule.options {
            Some(o) => (sorted(&o.domains), sorted(&o.types)),
            None => (None, None),
        }
    }

    #[test]
    fn merging_with_itself_is_a_no_op() {
        let a = rule("a", Some(&["x.com", "y.com"]), Some(&["script"]));
        assert_eq!(merge_rules(a.clone(), a.clone()), a);

        let bare = Rule::new("a");
        assert_eq!(merge_rules(bare.clone(), bare.clone()), bare);
    }

    #[test]
    fn merge_is_commutative_over_option_sets() {
        let a = rule("a", Some(&["x.com"]), Some(&["script"]));
        let b = rule("a", Some(&["y.com", "x.com"]), None);
        let ab = merge_rules(a.clone(), b.clone());
        let ba = merge_rules(b, a);
        assert_eq!(option_sets(&ab), option_sets(&ba));
        assert_eq!(
            option_sets(&ab),
            (
                Some(vec!["x.com".to_string(), "y.com".to_string()]),
                Some(vec!["script".to_string()])
            )
        );
    }

    #[test]
    fn fold_order_does_not_change_the_result() {
        let rules = vec![
            rule("p", None, Some(&["image"])),
            rule("p", Some(&["a.com"]), None),
            rule("p", Some(&["b.com"]), Some(&["script", "image"])),
        ];

        let forward: RuleTable = rules.iter().cloned().collect();
        let backward: RuleTable = rules.iter().rev().cloned().collect();
        let split = RuleTable::from_iter(rules[..1].to_vec())
            .merge(RuleTable::from_iter(rules[1..].to_vec()));

        let expected = option_sets(forward.get("p").unwrap());
        assert_eq!(option_sets(backward.get("p").unwrap()), expected);
        assert_eq!(option_sets(split.get("p").unwrap()), expected);
        assert_eq!(forward.len(), 1);
    }

    #[test]
    fn duplicate_patterns_collapse_into_one_rule() {
        let mut table = RuleTable::new();
        assert!(!table.insert(rule(r"a\.com", None, Some(&["script"]))));
        assert!(!table.insert(Rule::new(r"b\.com")));
        assert!(table.insert(rule(r"a\.com", Some(&["foo.com"]), Some(&["image"]))));

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(r"a\.com"),
            Some(&rule(r"a\.com", Some(&["foo.com"]), Some(&["script", "image"])))
        );
        let patterns: Vec<_> = table.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, [r"a\.com", r"b\.com"]);
    }

    #[test]
    fn rule_list_merge_puts_incoming_first_then_leftovers() {
        let incoming = vec![
            rule("new", None, Some(&["script"])),
            rule("shared", Some(&["a.com"]), None),
        ];
        let existing = vec![
            Rule::new("old1"),
            rule("shared", Some(&["b.com"]), None),
            Rule::new("old2"),
        ];

        let merged = merge_rule_lists(incoming, existing);
        let patterns: Vec<_> = merged.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["new", "shared", "old1", "old2"]);
        assert_eq!(merged[1], rule("shared", Some(&["a.com", "b.com"]), None));
    }

    #[test]
    fn rule_list_merge_keeps_each_old_rule_once() {
        let incoming = vec![Rule::new("a"), Rule::new("b"), Rule::new("c")];
        let existing = vec![Rule::new("z")];
        let merged = merge_rule_lists(incoming, existing);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.iter().filter(|r| r.pattern == "z").count(), 1);
    }

    #[test]
    fn rule_list_merge_with_itself_is_stable() {
        let list = vec![rule("a", Some(&["x.com"]), None), Rule::new("b")];
        assert_eq!(merge_rule_lists(list.clone(), list.clone()), list);
    }
}
