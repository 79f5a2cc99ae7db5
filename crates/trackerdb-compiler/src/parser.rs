//! Filter line translation
//!
//! Turns host-anchored adblock filters (`||host/path^$options`) into regex
//! rules. Every other filter syntax is rejected.

use log::{info, warn};
use regex::Regex;

use trackerdb_core::{Rule, RuleOptions};

use crate::error::{CompileError, FilterError};

const HOST_ANCHOR: &str = "||";
const OPTION_SEPARATOR: char = '$';
const FIRST_PARTY: &str = "first-party";
const THIRD_PARTY: &str = "third-party";
const DOMAIN_PREFIX: &str = "domain=";
const DOMAIN_SEPARATOR: char = '|';
const NEGATION: char = '~';

/// Replacement for a trailing `^`: end of string or a separator.
const END_ANCHOR: &str = "($|[?/])";
/// Replacement for `*^` and `^*`.
const SEPARATOR_WILDCARD: &str = "[?/].*";
/// Text preceding a `*` that is already part of `SEPARATOR_WILDCARD`.
const SEPARATOR_WILDCARD_PREFIX: &str = "[?/].";

/// Counters for one pass over a filter list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub rules: usize,
    pub unsupported: usize,
    pub first_party: usize,
}

/// Translate every line of a filter list.
///
/// Lines are lower-cased before translation and blank lines are ignored.
/// Unsupported and first-party filters are logged and skipped; a filter
/// that translates to an invalid regex aborts the whole list.
pub fn parse_filter_list(text: &str) -> Result<(Vec<Rule>, ParseStats), CompileError> {
    let mut rules = Vec::new();
    let mut stats = ParseStats::default();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        match parse_filter(&line.to_lowercase()) {
            Ok(rule) => {
                stats.rules += 1;
                rules.push(rule);
            }
            Err(err) if err.is_fatal() => return Err(CompileError::MalformedPattern(err)),
            Err(err @ FilterError::Unsupported(_)) => {
                stats.unsupported += 1;
                warn!("{err}");
            }
            Err(err) => {
                stats.first_party += 1;
                info!("{err}");
            }
        }
    }

    Ok((rules, stats))
}

/// Translate one lower-cased filter line into a rule.
pub fn parse_filter(filter: &str) -> Result<Rule, FilterError> {
    if !filter.starts_with(HOST_ANCHOR) {
        return Err(FilterError::Unsupported(filter.to_string()));
    }

    let (body, option_str) = split_rule_options(filter);
    if option_str.is_some_and(|opts| opts.contains(FIRST_PARTY)) {
        return Err(FilterError::FirstParty(filter.to_string()));
    }

    let body = body.strip_prefix(HOST_ANCHOR).unwrap_or(body);
    let pattern = translate_body(body);

    if let Err(source) = Regex::new(&pattern) {
        return Err(FilterError::MalformedPattern {
            filter: filter.to_string(),
            pattern,
            source,
        });
    }

    let options = option_str.map(parse_options).unwrap_or_default();
    Ok(Rule::new(pattern).with_options(options))
}

/// Split at the last `$`, which starts the option string.
fn split_rule_options(filter: &str) -> (&str, Option<&str>) {
    match filter.rfind(OPTION_SEPARATOR) {
        Some(pos) => (&filter[..pos], Some(&filter[pos + 1..])),
        None => (filter, None),
    }
}

/// Escape literal characters, then rewrite anchors and wildcards.
///
/// The rewrite steps run in a fixed order: each later step must not
/// re-match what an earlier one produced.
fn translate_body(body: &str) -> String {
    let escaped = escape_literals(body);

    let anchored = match escaped.strip_suffix('^') {
        Some(rest) => format!("{rest}{END_ANCHOR}"),
        None => escaped,
    };

    let separated = anchored
        .replace("*^", SEPARATOR_WILDCARD)
        .replace("^*", SEPARATOR_WILDCARD);

    expand_lone_wildcards(&separated)
}

fn escape_literals(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 8);
    for ch in body.chars() {
        if matches!(ch, '(' | ')' | '?' | '.' | '|' | '{' | '}') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `*` becomes `.*` unless it already closes a `[?/].*` sequence.
fn expand_lone_wildcards(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    for (i, ch) in pattern.char_indices() {
        if ch == '*' && !pattern[..i].ends_with(SEPARATOR_WILDCARD_PREFIX) {
            out.push_str(".*");
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parse a comma-separated option string.
///
/// `third-party` is implied for every rule and dropped. The last `domain=`
/// token wins, with negated (`~`) entries removed. Anything else is a
/// request-type tag.
pub fn parse_options(option_str: &str) -> RuleOptions {
    let mut options = RuleOptions::default();

    for token in option_str.split(',') {
        if token.is_empty() || token.contains(THIRD_PARTY) {
            continue;
        }

        if let Some(list) = token.strip_prefix(DOMAIN_PREFIX) {
            options.domains = Some(parse_domain_list(list));
            continue;
        }

        let types = options.types.get_or_insert_with(Vec::new);
        if !types.iter().any(|t| t == token) {
            types.push(token.to_string());
        }
    }

    options
}

fn parse_domain_list(list: &str) -> Vec<String> {
    list.split(DOMAIN_SEPARATOR)
        .filter(|d| !d.is_empty() && !d.starts_with(NEGATION))
        .map(str::to_string)
        .collect()
}
