//! Host classification
//!
//! Recovers the hostname a compiled pattern targets. The sample-based
//! classifier generates one string the pattern matches, puts a scheme in
//! front and reads the host back out with a URL parser. That is exact when
//! the host part of the pattern has no wildcard; a wildcard in the host can
//! yield a host that is not a real tracker.

use std::collections::BTreeMap;

use log::{debug, warn};

use trackerdb_core::url::host_of_schemeless;
use trackerdb_core::{RuleGroup, RuleType};

use crate::error::ClassifyError;
use crate::merge::RuleTable;
use crate::sample::sample_match;

/// Rule groups keyed by hostname.
pub type HostRuleGroup = BTreeMap<String, RuleGroup>;

/// Group key for rules whose host could not be recovered.
pub const UNCLASSIFIED_HOST: &str = "";

/// Derives the target hostname of a compiled pattern.
pub trait HostClassifier {
    fn classify(&self, pattern: &str) -> Result<String, ClassifyError>;
}

/// Classifies by parsing a generated example match as a URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleHostClassifier;

impl HostClassifier for SampleHostClassifier {
    fn classify(&self, pattern: &str) -> Result<String, ClassifyError> {
        let sample = sample_match(pattern).map_err(|source| ClassifyError::Pattern {
            pattern: pattern.to_string(),
            source: Box::new(source),
        })?;

        match host_of_schemeless(&sample) {
            Ok(Some(host)) => Ok(host),
            Ok(None) => Err(ClassifyError::NoHost {
                pattern: pattern.to_string(),
                sample,
            }),
            Err(source) => Err(ClassifyError::Url {
                pattern: pattern.to_string(),
                sample,
                source,
            }),
        }
    }
}

/// Group every rule of `table` under its classified host.
///
/// Rules keep table order within a host. Rules with no recoverable host
/// are logged and grouped under [`UNCLASSIFIED_HOST`].
pub fn group_rules_by_host<C>(table: RuleTable, classifier: &C, rule_type: RuleType) -> HostRuleGroup
where
    C: HostClassifier + ?Sized,
{
    let mut by_host = HostRuleGroup::new();

    for rule in table.into_rules() {
        let host = match classifier.classify(&rule.pattern) {
            Ok(host) => host,
            Err(err) => {
                warn!("{err}");
                UNCLASSIFIED_HOST.to_string()
            }
        };
        debug!("{} -> {}", rule.pattern, host);

        by_host
            .entry(host)
            .or_default()
            .entry(rule_type)
            .or_default()
            .push(rule);
    }

    by_host
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackerdb_core::Rule;

    #[test]
    fn classifies_host_from_pattern() {
        let classifier = SampleHostClassifier;
        assert_eq!(classifier.classify(r"example\.com/track($|[?/])").unwrap(), "example.com");
        assert_eq!(classifier.classify(r"ads\.example\.com/.*").unwrap(), "ads.example.com");
        assert_eq!(classifier.classify(r"a\.com:8080/x").unwrap(), "a.com");
        assert_eq!(classifier.classify(r"a\.com[?/].*\.js").unwrap(), "a.com");
    }

    #[test]
    fn classification_is_deterministic_without_wildcards() {
        let classifier = SampleHostClassifier;
        let first = classifier.classify(r"cdn\.tracker\.io/p\.gif").unwrap();
        for _ in 0..10 {
            assert_eq!(classifier.classify(r"cdn\.tracker\.io/p\.gif").unwrap(), first);
        }
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = SampleHostClassifier.classify("a[").unwrap_err();
        assert!(matches!(err, ClassifyError::Pattern { .. }));
    }

    #[test]
    fn empty_sample_has_no_url() {
        let err = SampleHostClassifier.classify("($|[?/])").unwrap_err();
        assert!(matches!(err, ClassifyError::Url { .. }));
    }

    struct FixedClassifier;

    impl HostClassifier for FixedClassifier {
        fn classify(&self, pattern: &str) -> Result<String, ClassifyError> {
            match pattern.split_once('/') {
                Some((host, _)) => Ok(host.replace('\\', "")),
                None => Err(ClassifyError::NoHost {
                    pattern: pattern.to_string(),
                    sample: String::new(),
                }),
            }
        }
    }

    #[test]
    fn groups_rules_by_host_in_table_order() {
        let table: RuleTable = vec![
            Rule::new(r"a\.com/1"),
            Rule::new(r"b\.com/1"),
            Rule::new(r"a\.com/2"),
            Rule::new("nohost"),
        ]
        .into_iter()
        .collect();

        let groups = group_rules_by_host(table, &FixedClassifier, RuleType::Whitelist);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[UNCLASSIFIED_HOST][&RuleType::Whitelist], vec![Rule::new("nohost")]);

        let a_rules: Vec<_> = groups["a.com"][&RuleType::Whitelist]
            .iter()
            .map(|r| r.pattern.as_str())
            .collect();
        assert_eq!(a_rules, [r"a\.com/1", r"a\.com/2"]);
        assert!(!groups["b.com"].contains_key(&RuleType::Rule));
    }
}
