use crate::error::ReportError;
use crate::models::TestResult;

use super::TestReport;
use super::scanner::{self, Element, ScanHandler};

/// xUnit.net v2 reports (`<assemblies>` / `<test>`).
pub struct XUnitReport;

impl TestReport for XUnitReport {
    fn convert(&self, xml: &str) -> Result<Vec<TestResult>, ReportError> {
        let mut collector = Collector::default();
        scanner::scan(xml, &mut collector)?;
        Ok(collector.results)
    }

    fn name(&self) -> &str {
        "xUnit"
    }
}

#[derive(Default)]
struct Collector {
    results: Vec<TestResult>,
    failure: String,
}

impl Collector {
    fn collect(&mut self, text: &str, stack: &[Element]) {
        if matches!(
            stack.last().map(|e| e.name.as_str()),
            Some("message" | "stack-trace")
        ) {
            self.failure.push_str(text);
            self.failure.push('\n');
        }
    }
}

impl ScanHandler for Collector {
    fn close(&mut self, element: Element, _stack: &[Element]) {
        if element.name != "test" {
            return;
        }
        let name = element
            .attr("name")
            .filter(|n| !n.is_empty())
            .unwrap_or("unknown");
        let failure = std::mem::take(&mut self.failure);
        self.results
            .push(TestResult::new(name, failure.is_empty()).with_message(failure));
    }

    fn text(&mut self, text: &str, stack: &[Element]) {
        self.collect(text, stack);
    }

    fn cdata(&mut self, content: &str, stack: &[Element]) {
        self.collect(content, stack);
    }
}
