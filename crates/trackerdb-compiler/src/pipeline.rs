//! End-to-end compilation
//!
//! filter lines -> rule table -> host groups -> reconciled database.
//! Everything happens in memory; callers persist the result.

use log::info;

use trackerdb_core::{RuleType, TrackerDatabase};

use crate::classifier::{group_rules_by_host, HostClassifier, SampleHostClassifier, UNCLASSIFIED_HOST};
use crate::error::CompileError;
use crate::merge::RuleTable;
use crate::parser::{parse_filter_list, ParseStats};
use crate::reconcile::{reconcile, OrphanList, ReconcileStats};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub parse: ParseStats,
    /// Distinct patterns after duplicate rules were merged.
    pub unique_rules: usize,
    /// Rules that were assigned a host.
    pub classified_rules: usize,
    pub hosts: usize,
    pub reconcile: ReconcileStats,
}

impl CompileStats {
    pub fn merged_duplicates(&self) -> usize {
        self.parse.rules - self.unique_rules
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub database: TrackerDatabase,
    pub orphans: OrphanList,
    pub stats: CompileStats,
}

/// Translate a filter list and fold duplicate patterns together.
pub fn compile_rule_table(filters: &str) -> Result<(RuleTable, ParseStats), CompileError> {
    let (rules, stats) = parse_filter_list(filters)?;
    let table = rules.into_iter().fold(RuleTable::new(), RuleTable::with_rule);
    Ok((table, stats))
}

/// Compile `filters` and reconcile them into `database`.
pub fn compile<C>(
    filters: &str,
    database: TrackerDatabase,
    rule_type: RuleType,
    classifier: &C,
) -> Result<CompileOutput, CompileError>
where
    C: HostClassifier + ?Sized,
{
    let (table, parse) = compile_rule_table(filters)?;
    let unique_rules = table.len();

    let groups = group_rules_by_host(table, classifier, rule_type);
    let classified_rules = groups
        .iter()
        .filter(|(host, _)| host.as_str() != UNCLASSIFIED_HOST)
        .filter_map(|(_, group)| group.get(&rule_type))
        .map(Vec::len)
        .sum();
    let hosts = groups.keys().filter(|host| host.as_str() != UNCLASSIFIED_HOST).count();

    let result = reconcile(groups, database, rule_type);

    let stats = CompileStats {
        parse,
        unique_rules,
        classified_rules,
        hosts,
        reconcile: result.stats,
    };

    info!(
        "Compiled {} lines: {} rules, {} after merging duplicates, {} skipped",
        stats.parse.lines,
        stats.parse.rules,
        stats.unique_rules,
        stats.parse.unsupported + stats.parse.first_party,
    );
    info!(
        "{} hosts: {} matched ({} records updated), {} unmatched",
        stats.hosts, stats.reconcile.matched_hosts, stats.reconcile.updated_records, stats.reconcile.orphaned_hosts,
    );

    Ok(CompileOutput {
        database: result.database,
        orphans: result.orphans,
        stats,
    })
}

/// Compile against a database given as JSON, using the sample classifier.
pub fn compile_json(filters: &str, database_json: &str, rule_type: RuleType) -> Result<CompileOutput, CompileError> {
    let database = TrackerDatabase::from_json(database_json)?;
    compile(filters, database, rule_type, &SampleHostClassifier)
}
