pub mod cobertura;
pub mod jacoco;
pub mod junit;
pub mod scanner;
pub mod xunit;

use clap::ValueEnum;

use crate::error::ReportError;
use crate::i18n::Localizer;
use crate::models::{CoverageTarget, TestResult};

pub use cobertura::{CoberturaReport, InstructionRate};
pub use jacoco::{ComplexityRule, JacocoReport};
pub use junit::JUnitReport;
pub use xunit::XUnitReport;

/// Converter for reports that already contain pass/fail verdicts.
pub trait TestReport {
    /// Turn a whole report document into results, in document order.
    fn convert(&self, xml: &str) -> Result<Vec<TestResult>, ReportError>;

    /// Display name for this dialect (e.g., "JUnit").
    fn name(&self) -> &str;
}

/// Converter for coverage reports, judged against configured targets.
pub trait CoverageReport {
    /// Evaluate every target against the report, in target order.
    fn evaluate(
        &self,
        xml: &str,
        targets: &[CoverageTarget],
        localizer: &Localizer,
    ) -> Result<Vec<TestResult>, ReportError>;

    /// Display name for this dialect (e.g., "JaCoCo").
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestFormat {
    Junit,
    Xunit,
}

impl TestFormat {
    pub fn converter(self) -> Box<dyn TestReport> {
        match self {
            TestFormat::Junit => Box::new(JUnitReport),
            TestFormat::Xunit => Box::new(XUnitReport),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CoverageFormat {
    Jacoco,
    Cobertura,
}

impl CoverageFormat {
    pub fn converter(
        self,
        complexity: ComplexityRule,
        instruction_rate: InstructionRate,
    ) -> Box<dyn CoverageReport> {
        match self {
            CoverageFormat::Jacoco => Box::new(JacocoReport::new(complexity)),
            CoverageFormat::Cobertura => Box::new(CoberturaReport::new(instruction_rate)),
        }
    }
}

/// Results for when the coverage report could not be read at all: every
/// target fails, so the TAP stream still has one line per target.
pub fn unavailable(targets: &[CoverageTarget], localizer: &Localizer) -> Vec<TestResult> {
    targets
        .iter()
        .map(|target| TestResult::new(localizer.describe(target), false))
        .collect()
}
