//! Translator self-test
//!
//! Checks the filter translator against a table of known filter to rule
//! mappings. A mismatch is fatal and reports both structured values.

use std::collections::BTreeMap;

use log::info;

use trackerdb_core::{Rule, RuleOptions};

use crate::error::CompileError;
use crate::parser::parse_filter;

/// One known mapping. `expected` is `None` for filters that must be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestCase {
    pub filter: String,
    pub expected: Option<Rule>,
}

impl SelfTestCase {
    fn new(filter: &str, expected: Option<Rule>) -> Self {
        Self {
            filter: filter.to_string(),
            expected,
        }
    }
}

fn strings(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

/// The built-in table.
pub fn builtin_cases() -> Vec<SelfTestCase> {
    vec![
        SelfTestCase::new(
            "||example.com/track^",
            Some(Rule::new(r"example\.com/track($|[?/])")),
        ),
        SelfTestCase::new(
            "||ads.example.com/*$script,domain=foo.com|~bar.com",
            Some(Rule::new(r"ads\.example\.com/.*").with_options(RuleOptions {
                domains: strings(&["foo.com"]),
                types: strings(&["script"]),
            })),
        ),
        SelfTestCase::new("||tracker.io/pixel$first-party", None),
        SelfTestCase::new("/banner/ads.", None),
        SelfTestCase::new("@@||example.com^$document", None),
        SelfTestCase::new(
            "||doubleclick.net^$third-party",
            Some(Rule::new(r"doubleclick\.net($|[?/])")),
        ),
        SelfTestCase::new("||example.com^*.js", Some(Rule::new(r"example\.com[?/].*\.js"))),
        SelfTestCase::new(
            "||cdn.example.com/ads*^$image,script",
            Some(Rule::new(r"cdn\.example\.com/ads.*($|[?/])").with_options(RuleOptions {
                domains: None,
                types: strings(&["image", "script"]),
            })),
        ),
        SelfTestCase::new(
            "||Google-Analytics.com/collect?v=",
            Some(Rule::new(r"google-analytics\.com/collect\?v=")),
        ),
        SelfTestCase::new(
            "||api.example.com/v1/{id}/track^",
            Some(Rule::new(r"api\.example\.com/v1/\{id\}/track($|[?/])")),
        ),
        SelfTestCase::new(
            "||widgets.example.org/(embed)/*^x$domain=~news.com",
            Some(Rule::new(r"widgets\.example\.org/\(embed\)/[?/].*x").with_options(RuleOptions {
                domains: Some(Vec::new()),
                types: None,
            })),
        ),
    ]
}

/// Parse a table given as a JSON object of `filter: rule` pairs, where a
/// rejected filter maps to `false`.
pub fn load_cases(json: &str) -> Result<Vec<SelfTestCase>, CompileError> {
    let table: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(json).map_err(CompileError::SelfTestTable)?;

    table
        .into_iter()
        .map(|(filter, value)| -> Result<SelfTestCase, CompileError> {
            let expected = match value {
                serde_json::Value::Bool(false) => None,
                other => Some(serde_json::from_value(other).map_err(CompileError::SelfTestTable)?),
            };
            Ok(SelfTestCase { filter, expected })
        })
        .collect()
}

/// Run every case, stopping at the first mismatch. Returns the number of
/// cases checked.
pub fn run_self_test(cases: &[SelfTestCase]) -> Result<usize, CompileError> {
    for case in cases {
        let actual = match parse_filter(&case.filter.to_lowercase()) {
            Ok(rule) => Some(rule),
            Err(err) if err.is_fatal() => return Err(CompileError::MalformedPattern(err)),
            Err(_) => None,
        };

        if actual != case.expected {
            return Err(CompileError::SelfTestMismatch {
                filter: case.filter.clone(),
                expected: render(case.expected.as_ref()),
                actual: render(actual.as_ref()),
            });
        }
    }

    info!("All {} self-tests passed", cases.len());
    Ok(cases.len())
}

fn render(rule: Option<&Rule>) -> String {
    match rule {
        Some(rule) => serde_json::to_string(rule).unwrap_or_else(|_| format!("{rule:?}")),
        None => "false".to_string(),
    }
}
