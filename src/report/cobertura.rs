use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use crate::error::ReportError;
use crate::i18n::Localizer;
use crate::models::{
    ConditionKind, Conditions, CoverageTarget, TargetKind, TestResult, XmlTree,
};

use super::CoverageReport;

/// Which Cobertura rate an `instruction` condition is checked against.
/// Cobertura has no instruction metric of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionRate {
    /// Compare against `branch-rate`, as earlier releases did.
    #[default]
    Branch,
    Line,
}

/// Cobertura XML reports (`coverage > packages > package > classes > class`).
pub struct CoberturaReport {
    instruction_rate: InstructionRate,
}

impl CoberturaReport {
    pub fn new(instruction_rate: InstructionRate) -> Self {
        Self { instruction_rate }
    }
}

impl CoverageReport for CoberturaReport {
    fn evaluate(
        &self,
        xml: &str,
        targets: &[CoverageTarget],
        localizer: &Localizer,
    ) -> Result<Vec<TestResult>, ReportError> {
        let index = CoverageIndex::from_xml(xml)?;
        Ok(targets
            .iter()
            .map(|target| {
                let record = index.lookup(target.target.kind, &target.target.name);
                let ok = any_condition(&record, &target.conditions, self.instruction_rate);
                TestResult::new(localizer.describe(target), ok)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Cobertura"
    }
}

/// Rates recorded for one class or method. Missing attributes stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoverageRecord {
    pub line: Option<f64>,
    pub branch: Option<f64>,
}

impl CoverageRecord {
    fn from_node(tree: &XmlTree, id: usize) -> Self {
        let rate = |key: &str| tree.attr(id, key).and_then(|v| v.trim().parse::<f64>().ok());
        Self {
            line: rate("line-rate"),
            branch: rate("branch-rate"),
        }
    }
}

/// Class records keyed by class name, method records by `Class.method`.
#[derive(Debug, Default)]
pub struct CoverageIndex {
    classes: HashMap<String, CoverageRecord>,
    methods: HashMap<String, CoverageRecord>,
}

impl CoverageIndex {
    pub fn from_xml(xml: &str) -> Result<Self, ReportError> {
        let tree = XmlTree::parse(xml)?;
        let root = tree.root().ok_or(ReportError::Empty)?;
        if root.name != "coverage" {
            return Err(ReportError::UnexpectedRoot {
                expected: "coverage",
                found: root.name.clone(),
            });
        }

        let mut index = Self::default();
        let classes = tree
            .children_named(root.id, "packages")
            .flat_map(|packages| tree.children_named(packages, "package"))
            .flat_map(|package| tree.children_named(package, "classes"))
            .flat_map(|classes| tree.children_named(classes, "class"));

        for class in classes {
            let class_name = tree.attr(class, "name").unwrap_or_default();
            index
                .classes
                .insert(class_name.to_string(), CoverageRecord::from_node(&tree, class));

            let methods = tree
                .children_named(class, "methods")
                .flat_map(|methods| tree.children_named(methods, "method"));
            for method in methods {
                let method_name = tree.attr(method, "name").unwrap_or_default();
                index.methods.insert(
                    format!("{}.{}", class_name, method_name),
                    CoverageRecord::from_node(&tree, method),
                );
            }
        }
        Ok(index)
    }

    /// The record for a target, or an empty one when it is not in the report.
    pub fn lookup(&self, kind: TargetKind, name: &str) -> CoverageRecord {
        let table = match kind {
            TargetKind::Class => &self.classes,
            TargetKind::Method => &self.methods,
            TargetKind::Other => return CoverageRecord::default(),
        };
        table.get(name).copied().unwrap_or_else(|| {
            debug!("{} not found in Cobertura report", name);
            CoverageRecord::default()
        })
    }
}

/// A target passes when any configured condition is met by its recorded
/// rate, checked as branch, then line, then instruction.
pub fn any_condition(
    record: &CoverageRecord,
    conditions: &Conditions,
    instruction_rate: InstructionRate,
) -> bool {
    let instruction = match instruction_rate {
        InstructionRate::Branch => record.branch,
        InstructionRate::Line => record.line,
    };
    [
        (ConditionKind::Branch, record.branch),
        (ConditionKind::Line, record.line),
        (ConditionKind::Instruction, instruction),
    ]
    .into_iter()
    .any(|(kind, rate)| match (conditions.get(kind), rate) {
        (Some(threshold), Some(rate)) => rate >= threshold,
        _ => false,
    })
}
