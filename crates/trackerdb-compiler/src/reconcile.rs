//! Tracker database reconciliation
//!
//! Folds per-host rule groups into the categorized tracker database. A host
//! found in several categories is updated in each of them; a host found in
//! none is returned as an orphan for manual review.

use trackerdb_core::{Category, RuleGroup, RuleType, TrackerDatabase};

use crate::classifier::{HostRuleGroup, UNCLASSIFIED_HOST};
use crate::merge::merge_rule_lists;

/// Rule groups whose host is in no category, ordered by host.
pub type OrphanList = Vec<RuleGroup>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Hosts present in at least one category.
    pub matched_hosts: usize,
    /// Host records whose rule list was installed or merged.
    pub updated_records: usize,
    pub orphaned_hosts: usize,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub database: TrackerDatabase,
    pub orphans: OrphanList,
    pub stats: ReconcileStats,
}

/// Install or merge every host's rules into `database`.
///
/// Only the `rule_type` list of matching host records is written; other
/// fields, other lists and unmatched hosts are left as they were.
pub fn reconcile(groups: HostRuleGroup, mut database: TrackerDatabase, rule_type: RuleType) -> Reconciliation {
    let mut orphans = OrphanList::new();
    let mut stats = ReconcileStats::default();

    for (host, group) in groups {
        let Some(incoming) = group.get(&rule_type) else {
            continue;
        };

        if host == UNCLASSIFIED_HOST {
            stats.orphaned_hosts += 1;
            orphans.push(group);
            continue;
        }

        let mut found = false;
        // Every category is searched: a host may belong to several.
        for category in Category::ALL {
            let Some(record) = database.host_mut(category, &host) else {
                continue;
            };
            found = true;
            stats.updated_records += 1;

            let slot = record.rules_mut(rule_type);
            let updated = match slot.take() {
                None => incoming.clone(),
                Some(existing) => merge_rule_lists(incoming.clone(), existing),
            };
            *slot = Some(updated);
        }

        if found {
            stats.matched_hosts += 1;
        } else {
            stats.orphaned_hosts += 1;
            orphans.push(group);
        }
    }

    Reconciliation {
        database,
        orphans,
        stats,
    }
}
