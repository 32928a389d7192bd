use log::debug;
use serde::Deserialize;

use crate::error::ReportError;
use crate::i18n::Localizer;
use crate::models::{
    ConditionKind, Conditions, CoverageTarget, Target, TargetKind, TestResult, XmlTree,
};

use super::CoverageReport;

/// How a `complexity` condition is checked against a COMPLEXITY counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityRule {
    /// `covered / (missed + covered) >= complexity`, like every other counter.
    #[default]
    Ratio,
    /// `missed + covered <= complexity`.
    Ceiling,
}

/// JaCoCo XML reports (`report > package > class > method > counter`).
#[derive(Default)]
pub struct JacocoReport {
    complexity: ComplexityRule,
}

impl JacocoReport {
    pub fn new(complexity: ComplexityRule) -> Self {
        Self { complexity }
    }
}

impl CoverageReport for JacocoReport {
    fn evaluate(
        &self,
        xml: &str,
        targets: &[CoverageTarget],
        localizer: &Localizer,
    ) -> Result<Vec<TestResult>, ReportError> {
        let tree = XmlTree::parse(xml)?;
        let root = tree.root().ok_or(ReportError::Empty)?;
        if root.name != "report" {
            return Err(ReportError::UnexpectedRoot {
                expected: "report",
                found: root.name.clone(),
            });
        }

        let packages = packages(&tree, root.id);
        Ok(targets
            .iter()
            .map(|target| {
                let counters = extract_counters(&tree, &packages, &target.target);
                let ok = first_match(&counters, &target.conditions, self.complexity);
                TestResult::new(localizer.describe(target), ok)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "JaCoCo"
    }
}

/// One `<counter>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    pub kind: String,
    pub missed: f64,
    pub covered: f64,
}

impl Counter {
    fn from_node(tree: &XmlTree, id: usize) -> Self {
        let number = |key: &str| {
            tree.attr(id, key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };
        Self {
            kind: tree.attr(id, "type").unwrap_or_default().to_string(),
            missed: number("missed"),
            covered: number("covered"),
        }
    }

    pub fn ratio(&self) -> f64 {
        self.covered / (self.missed + self.covered)
    }

    fn satisfies(&self, kind: ConditionKind, threshold: f64, complexity: ComplexityRule) -> bool {
        match (kind, complexity) {
            (ConditionKind::Complexity, ComplexityRule::Ceiling) => {
                self.missed + self.covered <= threshold
            }
            _ => self.ratio() >= threshold,
        }
    }
}

/// A target passes as soon as one of its counters meets the matching
/// threshold. Counters without a configured condition are skipped.
pub fn first_match(
    counters: &[Counter],
    conditions: &Conditions,
    complexity: ComplexityRule,
) -> bool {
    counters.iter().any(|counter| {
        let Some(kind) = ConditionKind::from_counter_type(&counter.kind) else {
            return false;
        };
        conditions
            .get(kind)
            .is_some_and(|threshold| counter.satisfies(kind, threshold, complexity))
    })
}

/// `<package>` elements, including those nested in `<group>`s.
fn packages(tree: &XmlTree, parent: usize) -> Vec<usize> {
    let mut found: Vec<usize> = tree.children_named(parent, "package").collect();
    for group in tree.children_named(parent, "group") {
        found.extend(packages(tree, group));
    }
    found
}

fn find_class(tree: &XmlTree, packages: &[usize], class_name: &str) -> Option<usize> {
    packages
        .iter()
        .find_map(|&package| tree.find_child_by_name(package, "class", class_name))
}

fn extract_counters(tree: &XmlTree, packages: &[usize], target: &Target) -> Vec<Counter> {
    let owner = match target.kind {
        TargetKind::Method => {
            let (class_path, method_name) = match target.name.rsplit_once('.') {
                Some((class, method)) => (class.replace('.', "/"), method),
                None => (String::new(), target.name.as_str()),
            };
            packages.iter().find_map(|&package| {
                tree.children_named(package, "class")
                    .filter(|&class| tree.attr(class, "name") == Some(class_path.as_str()))
                    .flat_map(|class| tree.children_named(class, "method"))
                    .find(|&method| {
                        tree.attr(method, "name") == Some(method_name)
                            && target
                                .desc
                                .as_deref()
                                .is_none_or(|desc| tree.attr(method, "desc") == Some(desc))
                    })
            })
        }
        TargetKind::Class => find_class(tree, packages, &target.name.replace('.', "/")),
        TargetKind::Other => None,
    };

    match owner {
        Some(id) => tree
            .children_named(id, "counter")
            .map(|counter| Counter::from_node(tree, counter))
            .collect(),
        None => {
            debug!("{} not found in JaCoCo report", target.name);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(missed: u32, covered: u32) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd">
<report name="demo">
  <sessioninfo id="host-1" start="1" dump="2"/>
  <package name="com/example">
    <class name="com/example/Foo" sourcefilename="Foo.java">
      <method name="bar" desc="()V" line="3">
        <counter type="INSTRUCTION" missed="4" covered="6"/>
        <counter type="LINE" missed="{missed}" covered="{covered}"/>
        <counter type="COMPLEXITY" missed="1" covered="2"/>
      </method>
      <method name="bar" desc="(I)V" line="9">
        <counter type="LINE" missed="0" covered="5"/>
      </method>
      <counter type="LINE" missed="1" covered="1"/>
      <counter type="BRANCH" missed="1" covered="3"/>
    </class>
  </package>
</report>"#
        )
    }

    fn target(kind: TargetKind, name: &str, conditions: Conditions) -> CoverageTarget {
        CoverageTarget {
            target: Target {
                kind,
                name: name.into(),
                desc: None,
            },
            conditions,
        }
    }

    fn line(threshold: f64) -> Conditions {
        Conditions {
            line: Some(threshold),
            ..Default::default()
        }
    }

    fn evaluate(xml: &str, targets: &[CoverageTarget]) -> Vec<bool> {
        evaluate_with(ComplexityRule::Ratio, xml, targets)
    }

    fn evaluate_with(rule: ComplexityRule, xml: &str, targets: &[CoverageTarget]) -> Vec<bool> {
        JacocoReport::new(rule)
            .evaluate(xml, targets, &Localizer::english())
            .unwrap()
            .into_iter()
            .map(|r| r.ok)
            .collect()
    }

    #[test]
    fn method_line_coverage_meets_threshold() {
        let targets = [target(TargetKind::Method, "com.example.Foo.bar", line(0.8))];
        assert_eq!(evaluate(&report(1, 9), &targets), vec![true]);
        assert_eq!(evaluate(&report(9, 1), &targets), vec![false]);
    }

    #[test]
    fn desc_selects_an_overload() {
        let mut overload = target(TargetKind::Method, "com.example.Foo.bar", line(0.8));
        overload.target.desc = Some("(I)V".into());
        assert_eq!(evaluate(&report(9, 1), &[overload]), vec![true]);
    }

    #[test]
    fn class_targets_use_class_counters() {
        let targets = [
            target(TargetKind::Class, "com.example.Foo", line(0.5)),
            target(TargetKind::Class, "com.example.Foo", line(0.6)),
        ];
        assert_eq!(evaluate(&report(0, 1), &targets), vec![true, false]);
    }

    #[test]
    fn any_satisfied_counter_passes_the_target() {
        let conditions = Conditions {
            line: Some(0.9),
            branch: Some(0.75),
            ..Default::default()
        };
        let targets = [target(TargetKind::Class, "com.example.Foo", conditions)];
        assert_eq!(evaluate(&report(0, 1), &targets), vec![true]);
    }

    #[test]
    fn complexity_defaults_to_covered_ratio() {
        let counter = Counter {
            kind: "COMPLEXITY".into(),
            missed: 4.0,
            covered: 1.0,
        };
        let conditions = Conditions {
            complexity: Some(10.0),
            ..Default::default()
        };
        assert!(!first_match(&[counter.clone()], &conditions, ComplexityRule::default()));
        assert!(first_match(&[counter], &conditions, ComplexityRule::Ceiling));
    }

    #[test]
    fn complexity_rule_is_selectable() {
        let ratio = Conditions {
            complexity: Some(0.6),
            ..Default::default()
        };
        let within = Conditions {
            complexity: Some(3.0),
            ..Default::default()
        };
        let over = Conditions {
            complexity: Some(2.0),
            ..Default::default()
        };
        let targets = [
            target(TargetKind::Method, "com.example.Foo.bar", ratio),
            target(TargetKind::Method, "com.example.Foo.bar", within),
            target(TargetKind::Method, "com.example.Foo.bar", over),
        ];
        // bar's COMPLEXITY counter: missed=1, covered=2
        assert_eq!(
            evaluate_with(ComplexityRule::Ratio, &report(1, 1), &targets),
            vec![true, false, false]
        );
        assert_eq!(
            evaluate_with(ComplexityRule::Ceiling, &report(1, 1), &targets),
            vec![false, true, false]
        );
    }

    #[test]
    fn unknown_targets_fail() {
        let targets = [
            target(TargetKind::Method, "com.example.Foo.missing", line(0.1)),
            target(TargetKind::Class, "com.example.Bar", line(0.1)),
            target(TargetKind::Other, "com.example", line(0.1)),
            target(TargetKind::Method, "com.example.Foo.bar", Conditions::default()),
        ];
        assert_eq!(
            evaluate(&report(0, 10), &targets),
            vec![false, false, false, false]
        );
    }

    #[test]
    fn finds_packages_inside_groups() {
        let xml = r#"<report name="multi">
  <group name="core">
    <package name="a"><class name="a/A"><counter type="LINE" missed="0" covered="4"/></class></package>
  </group>
</report>"#;
        let targets = [target(TargetKind::Class, "a.A", line(1.0))];
        assert_eq!(evaluate(xml, &targets), vec![true]);
    }

    #[test]
    fn empty_counters_never_pass() {
        let counter = Counter {
            kind: "LINE".into(),
            missed: 0.0,
            covered: 0.0,
        };
        assert!(!first_match(&[counter], &line(0.1), ComplexityRule::Ratio));
    }

    #[test]
    fn rejects_other_documents() {
        let err = JacocoReport::default()
            .evaluate("<coverage/>", &[], &Localizer::english())
            .unwrap_err();
        assert!(matches!(err, ReportError::UnexpectedRoot { .. }));
    }
}
