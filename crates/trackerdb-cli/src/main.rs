//! Tracker Rule CLI
//!
//! Converts a filter list into regex rules and merges them into a tracker
//! database:
//!
//! ```text
//! trackerdb -f <filterlist> -c <tracker database> -t <rule|whitelist>
//! ```

mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use trackerdb_compiler::{builtin_cases, compile_json, load_cases, run_self_test};
use trackerdb_core::RuleType;

const DEFAULT_OUTPUT: &str = "new-trackersWithParentCompany.json";
const DEFAULT_UNMATCHED: &str = "unMatchedRules.json";

#[derive(Parser)]
#[command(name = "trackerdb")]
#[command(about = "Convert adblock filters to tracker database rules")]
struct Cli {
    /// Text file with newline-separated filter list
    #[arg(short, long)]
    file: PathBuf,

    /// Tracker database to combine with
    #[arg(short, long)]
    combine: PathBuf,

    /// Rule list to populate: 'rule' or 'whitelist'
    #[arg(short = 't', long, alias = "ruleType")]
    rule_type: RuleType,

    /// Check the filter translator against known outputs first
    #[arg(long)]
    test: bool,

    /// Extra self-test cases (JSON object of filter -> rule or false)
    #[arg(long)]
    test_cases: Option<PathBuf>,

    /// Updated tracker database
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Rules whose host is not in the database
    #[arg(short, long, default_value = DEFAULT_UNMATCHED)]
    unmatched: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    output::ensure_distinct(&cli.combine, &cli.output)?;
    output::ensure_distinct(&cli.combine, &cli.unmatched)?;
    output::ensure_distinct(&cli.output, &cli.unmatched)?;

    if cli.test || cli.test_cases.is_some() {
        let mut cases = builtin_cases();
        if let Some(path) = &cli.test_cases {
            let text = output::read_text(path)?;
            cases.extend(load_cases(&text).map_err(|e| e.to_string())?);
        }
        run_self_test(&cases).map_err(|e| e.to_string())?;
        println!("All tests passed");
    }

    let filters = output::read_text(&cli.file)?;
    let database = output::read_text(&cli.combine)?;

    let compiled = compile_json(&filters, &database, cli.rule_type).map_err(|e| e.to_string())?;
    let rendered = output::render(&compiled)?;
    output::write_all(&[
        (cli.output.as_path(), rendered.database.as_str()),
        (cli.unmatched.as_path(), rendered.orphans.as_str()),
    ])?;

    println!("Wrote new trackers file to: {}", cli.output.display());
    println!("Wrote unmatched rules to: {}", cli.unmatched.display());
    println!(
        "  Rules:    {} -> {} (merged {} duplicates)",
        compiled.stats.parse.rules,
        compiled.stats.unique_rules,
        compiled.stats.merged_duplicates()
    );
    println!(
        "  Hosts:    {} matched, {} unmatched",
        compiled.stats.reconcile.matched_hosts, compiled.stats.reconcile.orphaned_hosts
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_required_arguments_and_defaults() {
        let cli = Cli::try_parse_from(["trackerdb", "-f", "list.txt", "-c", "db.json", "-t", "whitelist"]).unwrap();
        assert_eq!(cli.rule_type, RuleType::Whitelist);
        assert_eq!(cli.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cli.unmatched, PathBuf::from(DEFAULT_UNMATCHED));
        assert!(!cli.test);
    }

    #[test]
    fn accepts_original_rule_type_flag() {
        let cli = Cli::try_parse_from(["trackerdb", "-f", "l", "-c", "d", "--ruleType", "rule", "--test"]).unwrap();
        assert_eq!(cli.rule_type, RuleType::Rule);
        assert!(cli.test);
    }

    #[test]
    fn missing_or_invalid_arguments_fail() {
        assert!(Cli::try_parse_from(["trackerdb", "-f", "list.txt", "-t", "rule"]).is_err());
        assert!(Cli::try_parse_from(["trackerdb", "-f", "l", "-c", "d", "-t", "block"]).is_err());
    }

    #[test]
    fn run_refuses_one_path_for_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.txt");
        let db = dir.path().join("db.json");
        let out = dir.path().join("out.json");
        std::fs::write(&list, "||a.com^\n").unwrap();
        std::fs::write(&db, r#"{"Analytics": {}, "Social": {}, "Advertising": {}}"#).unwrap();

        let path = |p: &PathBuf| p.to_str().unwrap().to_string();
        let args = [
            "trackerdb".to_string(),
            "-f".to_string(),
            path(&list),
            "-c".to_string(),
            path(&db),
            "-t".to_string(),
            "rule".to_string(),
            "-o".to_string(),
            path(&out),
            "-u".to_string(),
            path(&out),
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        assert!(run(&cli).is_err());
        assert!(!out.exists());
    }
}
