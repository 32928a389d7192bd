//! Human-readable names for coverage targets.
//!
//! Phrases live in per-language catalogs keyed by [`TemplateKey`], so adding a
//! language is a matter of adding a table (built in, or from `tapcheck.toml`).

use std::collections::HashMap;

use log::warn;
use serde::Deserialize;

use crate::models::{ConditionKind, CoverageTarget, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    Coverage,
    MethodPre,
    MethodPost,
    ClassPre,
    ClassPost,
    Others,
    LineCoveragePre,
    LineCoveragePost,
    StatementCoveragePre,
    StatementCoveragePost,
    BranchCoveragePre,
    BranchCoveragePost,
    ComplexityPre,
    ComplexityPost,
    Or,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 15] = [
        TemplateKey::Coverage,
        TemplateKey::MethodPre,
        TemplateKey::MethodPost,
        TemplateKey::ClassPre,
        TemplateKey::ClassPost,
        TemplateKey::Others,
        TemplateKey::LineCoveragePre,
        TemplateKey::LineCoveragePost,
        TemplateKey::StatementCoveragePre,
        TemplateKey::StatementCoveragePost,
        TemplateKey::BranchCoveragePre,
        TemplateKey::BranchCoveragePost,
        TemplateKey::ComplexityPre,
        TemplateKey::ComplexityPost,
        TemplateKey::Or,
    ];

    /// Key as written in `[i18n.<lang>]` tables.
    pub fn name(self) -> &'static str {
        match self {
            TemplateKey::Coverage => "coverage",
            TemplateKey::MethodPre => "method_pre",
            TemplateKey::MethodPost => "method_post",
            TemplateKey::ClassPre => "class_pre",
            TemplateKey::ClassPost => "class_post",
            TemplateKey::Others => "others",
            TemplateKey::LineCoveragePre => "line_coverage_pre",
            TemplateKey::LineCoveragePost => "line_coverage_post",
            TemplateKey::StatementCoveragePre => "statement_coverage_pre",
            TemplateKey::StatementCoveragePost => "statement_coverage_post",
            TemplateKey::BranchCoveragePre => "branch_coverage_pre",
            TemplateKey::BranchCoveragePost => "branch_coverage_post",
            TemplateKey::ComplexityPre => "complexity_pre",
            TemplateKey::ComplexityPost => "complexity_post",
            TemplateKey::Or => "or",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

const EN: &[(TemplateKey, &str)] = &[
    (TemplateKey::Coverage, "[Coverage] "),
    (TemplateKey::MethodPre, "Method "),
    (TemplateKey::MethodPost, " should have "),
    (TemplateKey::ClassPre, "Class "),
    (TemplateKey::ClassPost, " should have "),
    (TemplateKey::Others, "Others should have "),
    (TemplateKey::LineCoveragePre, "a line coverage of at least "),
    (TemplateKey::LineCoveragePost, "%"),
    (
        TemplateKey::StatementCoveragePre,
        "a statement coverage (C0) of at least ",
    ),
    (TemplateKey::StatementCoveragePost, "%"),
    (
        TemplateKey::BranchCoveragePre,
        "a branch coverage (C1) of at least ",
    ),
    (TemplateKey::BranchCoveragePost, "%"),
    (
        TemplateKey::ComplexityPre,
        "a cyclomatic complexity of no more than ",
    ),
    (TemplateKey::ComplexityPost, ""),
    (TemplateKey::Or, ", or "),
];

const JA: &[(TemplateKey, &str)] = &[
    (TemplateKey::Coverage, "[網羅率] "),
    (TemplateKey::MethodPre, "メソッド "),
    (TemplateKey::MethodPost, " の"),
    (TemplateKey::ClassPre, "クラス "),
    (TemplateKey::ClassPost, " の"),
    (TemplateKey::Others, "そのほかの"),
    (TemplateKey::LineCoveragePre, "行網羅が"),
    (TemplateKey::LineCoveragePost, "%以上"),
    (TemplateKey::StatementCoveragePre, "命令網羅(C0)が"),
    (TemplateKey::StatementCoveragePost, "%以上"),
    (TemplateKey::BranchCoveragePre, "分岐網羅(C1)が"),
    (TemplateKey::BranchCoveragePost, "%以上"),
    (TemplateKey::ComplexityPre, "循環複雑度が"),
    (TemplateKey::ComplexityPost, "以下"),
    (TemplateKey::Or, "か"),
];

/// Phrases for one language.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct Catalog(HashMap<TemplateKey, String>);

impl From<HashMap<String, String>> for Catalog {
    fn from(raw: HashMap<String, String>) -> Self {
        Self(
            raw.into_iter()
                .filter_map(|(name, phrase)| match TemplateKey::from_name(&name) {
                    Some(key) => Some((key, phrase)),
                    None => {
                        warn!("ignoring unknown phrase key '{}'", name);
                        None
                    }
                })
                .collect(),
        )
    }
}

impl Catalog {
    /// A built-in catalog, if `language` has one.
    pub fn builtin(language: &str) -> Option<Self> {
        let table = match language {
            "en" => EN,
            "ja" => JA,
            _ => return None,
        };
        Some(Self(table.iter().map(|&(k, v)| (k, v.to_string())).collect()))
    }

    pub fn get(&self, key: TemplateKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    fn merge(&mut self, other: &Catalog) {
        self.0.extend(other.0.iter().map(|(&k, v)| (k, v.clone())));
    }
}

pub struct Localizer {
    catalog: Catalog,
    fallback: Catalog,
}

impl Localizer {
    /// Build a localizer for `language`, layering any configured catalog for
    /// that language over the built-in one. Keys missing from both come from
    /// English.
    pub fn new(language: &str, custom: &HashMap<String, Catalog>) -> Self {
        let builtin = Catalog::builtin(language);
        let configured = custom.get(language);
        if builtin.is_none() && configured.is_none() {
            warn!("no phrases for language '{}', using English", language);
        }

        let mut catalog = builtin.unwrap_or_default();
        if let Some(configured) = configured {
            catalog.merge(configured);
        }
        Self {
            catalog,
            fallback: Catalog::builtin("en").unwrap_or_default(),
        }
    }

    pub fn english() -> Self {
        Self::new("en", &HashMap::new())
    }

    fn phrase(&self, key: TemplateKey) -> &str {
        self.catalog
            .get(key)
            .or_else(|| self.fallback.get(key))
            .unwrap_or_default()
    }

    /// Describe what `target` has to satisfy, e.g.
    /// `[Coverage] Method a.B.c should have a line coverage of at least 80%`.
    pub fn describe(&self, target: &CoverageTarget) -> String {
        let mut out = self.phrase(TemplateKey::Coverage).to_string();
        match target.target.kind {
            TargetKind::Method => {
                out.push_str(self.phrase(TemplateKey::MethodPre));
                out.push_str(&target.target.name);
                out.push_str(self.phrase(TemplateKey::MethodPost));
            }
            TargetKind::Class => {
                out.push_str(self.phrase(TemplateKey::ClassPre));
                out.push_str(&target.target.name);
                out.push_str(self.phrase(TemplateKey::ClassPost));
            }
            TargetKind::Other => out.push_str(self.phrase(TemplateKey::Others)),
        }

        let conditions: Vec<String> = ConditionKind::ALL
            .iter()
            .filter_map(|&kind| {
                let threshold = target.conditions.get(kind)?;
                let (pre, post, value) = match kind {
                    ConditionKind::Line => (
                        TemplateKey::LineCoveragePre,
                        TemplateKey::LineCoveragePost,
                        threshold * 100.0,
                    ),
                    ConditionKind::Instruction => (
                        TemplateKey::StatementCoveragePre,
                        TemplateKey::StatementCoveragePost,
                        threshold * 100.0,
                    ),
                    ConditionKind::Branch => (
                        TemplateKey::BranchCoveragePre,
                        TemplateKey::BranchCoveragePost,
                        threshold * 100.0,
                    ),
                    ConditionKind::Complexity => (
                        TemplateKey::ComplexityPre,
                        TemplateKey::ComplexityPost,
                        threshold,
                    ),
                };
                Some(format!(
                    "{}{}{}",
                    self.phrase(pre),
                    format_number(value),
                    self.phrase(post)
                ))
            })
            .collect();
        out.push_str(&conditions.join(self.phrase(TemplateKey::Or)));
        out
    }
}

/// Render without float noise: `0.7 * 100.0` prints as `70`.
fn format_number(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    format!("{}", rounded)
}
