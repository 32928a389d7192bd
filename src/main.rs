mod config;
mod error;
mod i18n;
mod models;
mod report;
mod tap;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use config::Config;
use i18n::Localizer;
use models::{CoverageTarget, TestResult};
use report::{CoverageFormat, CoverageReport, TestFormat};
use tap::Expectation;

#[derive(Parser)]
#[command(name = "tapcheck")]
#[command(author, version, about = "Convert test and coverage reports into TAP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check coverage targets against a JaCoCo or Cobertura report
    Coverage {
        #[arg(value_enum)]
        format: CoverageFormat,

        /// Coverage report (XML)
        report: PathBuf,

        /// Coverage targets (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Number of the first TAP line
        #[arg(long, value_name = "N")]
        from: Option<String>,

        /// Language of the target descriptions (defaults to tapcheck.toml, then "en")
        #[arg(long)]
        lang: Option<String>,

        /// Print results as JSON instead of TAP
        #[arg(long)]
        json: bool,
    },

    /// Report every test case of a JUnit or xUnit report as its own TAP line
    Expand {
        #[arg(value_enum)]
        format: TestFormat,

        /// Test report (XML)
        report: PathBuf,

        /// Display names for test cases (YAML mapping)
        #[arg(short, long)]
        mappings: Option<PathBuf>,

        /// Number of the first TAP line
        #[arg(long, value_name = "N")]
        from: Option<String>,

        /// Print results as JSON instead of TAP
        #[arg(long)]
        json: bool,
    },

    /// Report a whole JUnit or xUnit report as a single TAP line
    Squash {
        #[arg(value_enum)]
        format: TestFormat,

        /// Test report (XML)
        report: PathBuf,

        /// Whether the report is expected to pass or fail
        #[arg(long, value_enum)]
        expect: Expectation,

        /// Name of the TAP line
        #[arg(long)]
        name: String,

        /// Number of the first TAP line
        #[arg(long, value_name = "N")]
        from: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    init_logging();

    let cli = Cli::parse();
    let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = Config::load(&workspace);

    let (results, mappings, from, json) = match cli.command {
        Commands::Coverage {
            format,
            report,
            config: targets_path,
            from,
            lang,
            json,
        } => {
            let targets = config::load_targets(&targets_path)?;
            let language = lang.as_deref().unwrap_or(config.language());
            let localizer = Localizer::new(language, &config.i18n);
            let converter =
                format.converter(config.jacoco.complexity, config.cobertura.instruction_rate);
            let results = check_coverage(converter.as_ref(), &report, &targets, &localizer);
            (results, HashMap::new(), from, json)
        }
        Commands::Expand {
            format,
            report,
            mappings,
            from,
            json,
        } => {
            let results = convert_tests(format, &report)?;
            let mappings = config::load_mappings(mappings.as_deref());
            (results, mappings, from, json)
        }
        Commands::Squash {
            format,
            report,
            expect,
            name,
            from,
        } => {
            let results = convert_tests(format, &report)?;
            let squashed = tap::squash(&name, &results, expect);
            (vec![squashed], HashMap::new(), from, false)
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let offset = from.as_deref().and_then(tap::parse_offset);
        print!("{}", tap::to_tap(&results, &mappings, offset));
    }

    Ok(exit_status(&results))
}

/// Evaluate `targets` against the report at `path`. A report that cannot be
/// read or parsed fails every target instead of aborting the run.
fn check_coverage(
    converter: &dyn CoverageReport,
    path: &Path,
    targets: &[CoverageTarget],
    localizer: &Localizer,
) -> Vec<TestResult> {
    read_report(path)
        .and_then(|xml| Ok(converter.evaluate(&xml, targets, localizer)?))
        .unwrap_or_else(|e| {
            warn!("{} report unusable, failing all targets: {:#}", converter.name(), e);
            report::unavailable(targets, localizer)
        })
}

fn exit_status(results: &[TestResult]) -> ExitCode {
    if tap::all_green(results) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_report(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn convert_tests(format: TestFormat, path: &Path) -> Result<Vec<TestResult>> {
    let converter = format.converter();
    let xml = read_report(path)?;
    let results = converter
        .convert(&xml)
        .with_context(|| format!("failed to parse {} report {}", converter.name(), path.display()))?;
    info!("{} test cases in {}", results.len(), path.display());
    Ok(results)
}

/// Log to stderr (stdout carries the TAP stream), or to the file named by
/// `TAPCHECK_LOG`. Verbosity follows `RUST_LOG`.
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(file) = std::env::var("TAPCHECK_LOG").ok().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .ok()
    }) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{Conditions, Target, TargetKind};
    use pretty_assertions::assert_eq;
    use report::{ComplexityRule, InstructionRate};

    fn targets() -> Vec<CoverageTarget> {
        ["com.example.Foo", "com.example.Bar"]
            .into_iter()
            .map(|name| CoverageTarget {
                target: Target {
                    kind: TargetKind::Class,
                    name: name.into(),
                    desc: None,
                },
                conditions: Conditions {
                    line: Some(0.5),
                    ..Default::default()
                },
            })
            .collect()
    }

    fn check(format: CoverageFormat, path: &Path) -> Vec<TestResult> {
        let converter = format.converter(ComplexityRule::default(), InstructionRate::default());
        check_coverage(converter.as_ref(), path, &targets(), &Localizer::english())
    }

    #[test]
    fn missing_report_fails_every_target() {
        let dir = tempfile::tempdir().unwrap();
        for format in [CoverageFormat::Jacoco, CoverageFormat::Cobertura] {
            let results = check(format, &dir.path().join("missing.xml"));
            assert_eq!(results.len(), 2);
            assert!(results.iter().all(|r| !r.ok));
            assert_eq!(exit_status(&results), ExitCode::FAILURE);
        }
    }

    #[test]
    fn truncated_report_fails_every_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jacoco.xml");
        std::fs::write(&path, "<report><package>").unwrap();

        let results = check(CoverageFormat::Jacoco, &path);
        assert_eq!(
            results,
            vec![
                TestResult::new(
                    "[Coverage] Class com.example.Foo should have a line coverage of at least 50%",
                    false
                ),
                TestResult::new(
                    "[Coverage] Class com.example.Bar should have a line coverage of at least 50%",
                    false
                ),
            ]
        );
    }

    #[test]
    fn readable_report_sets_exit_status_from_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jacoco.xml");
        std::fs::write(
            &path,
            r#"<report name="demo">
  <package name="com/example">
    <class name="com/example/Foo"><counter type="LINE" missed="1" covered="9"/></class>
    <class name="com/example/Bar"><counter type="LINE" missed="1" covered="3"/></class>
  </package>
</report>"#,
        )
        .unwrap();

        let results = check(CoverageFormat::Jacoco, &path);
        assert_eq!(
            results.iter().map(|r| r.ok).collect::<Vec<_>>(),
            vec![true, true]
        );
        assert_eq!(exit_status(&results), ExitCode::SUCCESS);

        std::fs::write(
            &path,
            r#"<report name="demo">
  <package name="com/example">
    <class name="com/example/Foo"><counter type="LINE" missed="1" covered="9"/></class>
    <class name="com/example/Bar"><counter type="LINE" missed="3" covered="1"/></class>
  </package>
</report>"#,
        )
        .unwrap();
        assert_eq!(exit_status(&check(CoverageFormat::Jacoco, &path)), ExitCode::FAILURE);
    }

    #[test]
    fn empty_results_exit_successfully() {
        assert_eq!(exit_status(&[]), ExitCode::SUCCESS);
    }
}
