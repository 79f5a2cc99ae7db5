//! Tracker Rule Compiler
//!
//! This crate compiles host-anchored adblock filters into regex rules,
//! groups them by host and merges them into the tracker database.

pub mod classifier;
pub mod error;
pub mod merge;
pub mod parser;
pub mod pipeline;
pub mod reconcile;
pub mod sample;
pub mod selftest;

pub use classifier::{group_rules_by_host, HostClassifier, HostRuleGroup, SampleHostClassifier, UNCLASSIFIED_HOST};
pub use error::{ClassifyError, CompileError, FilterError};
pub use merge::{merge_rule_lists, merge_rules, RuleTable};
pub use parser::{parse_filter, parse_filter_list, ParseStats};
pub use pipeline::{compile, compile_json, compile_rule_table, CompileOutput, CompileStats};
pub use reconcile::{reconcile, OrphanList, ReconcileStats, Reconciliation};
pub use selftest::{builtin_cases, load_cases, run_self_test, SelfTestCase};
