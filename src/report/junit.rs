use crate::error::ReportError;
use crate::models::TestResult;

use super::TestReport;
use super::scanner::{self, Element, ScanHandler};

/// JUnit-style reports (`<testsuite>` / `<testcase>`), as written by Surefire,
/// Gradle, pytest and most other runners.
pub struct JUnitReport;

impl TestReport for JUnitReport {
    fn convert(&self, xml: &str) -> Result<Vec<TestResult>, ReportError> {
        let mut collector = Collector::default();
        scanner::scan(xml, &mut collector)?;
        Ok(collector.results)
    }

    fn name(&self) -> &str {
        "JUnit"
    }
}

#[derive(Default)]
struct Collector {
    results: Vec<TestResult>,
    failure: String,
}

impl Collector {
    fn in_testcase(stack: &[Element]) -> bool {
        stack.iter().any(|e| e.name == "testcase")
    }
}

impl ScanHandler for Collector {
    fn close(&mut self, element: Element, _stack: &[Element]) {
        if element.name != "testcase" {
            return;
        }
        let class = element
            .attr("classname")
            .and_then(|c| c.rsplit('.').next())
            .filter(|c| !c.is_empty())
            .unwrap_or("unknown");
        let name = format!("{} {}", class, element.attr("name").unwrap_or_default());
        let failure = std::mem::take(&mut self.failure);
        self.results
            .push(TestResult::new(name, failure.is_empty()).with_message(failure));
    }

    fn text(&mut self, text: &str, stack: &[Element]) {
        let text = text.trim();
        if !text.is_empty() && Self::in_testcase(stack) {
            self.failure.push_str(text);
        }
    }

    // CDATA keeps its whitespace so stack traces stay readable.
    fn cdata(&mut self, content: &str, stack: &[Element]) {
        // Suite-level <system-out> CDATA would otherwise leak into the next case.
        if Self::in_testcase(stack) {
            self.failure.push_str(content);
        }
    }
}
