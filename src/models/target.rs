use serde::{Deserialize, Deserializer, Serialize};

/// A class or method plus the coverage thresholds it has to reach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageTarget {
    pub target: Target,
    #[serde(default)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// `pkg.Class.method` for methods, `pkg.Class` for classes.
    pub name: String,
    /// JVM method descriptor, used to pick one overload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Method,
    Class,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Line,
    Instruction,
    Branch,
    Complexity,
}

impl ConditionKind {
    /// Order in which conditions are described to the user.
    pub const ALL: [ConditionKind; 4] = [
        ConditionKind::Line,
        ConditionKind::Instruction,
        ConditionKind::Branch,
        ConditionKind::Complexity,
    ];

    /// Map a JaCoCo counter `type` attribute (any case) to a condition.
    pub fn from_counter_type(counter_type: &str) -> Option<Self> {
        match counter_type.to_lowercase().as_str() {
            "line" => Some(ConditionKind::Line),
            "instruction" => Some(ConditionKind::Instruction),
            "branch" => Some(ConditionKind::Branch),
            "complexity" => Some(ConditionKind::Complexity),
            _ => None,
        }
    }
}

/// Thresholds are fractions in `0.0..=1.0`. `complexity` may instead be an
/// absolute ceiling, depending on the JaCoCo `ComplexityRule`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(default, deserialize_with = "lenient_number")]
    pub line: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub instruction: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub branch: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub complexity: Option<f64>,
}

impl Conditions {
    /// The threshold for `kind`, if one is set. Zero and NaN count as unset.
    pub fn get(&self, kind: ConditionKind) -> Option<f64> {
        let value = match kind {
            ConditionKind::Line => self.line,
            ConditionKind::Instruction => self.instruction,
            ConditionKind::Branch => self.branch,
            ConditionKind::Complexity => self.complexity,
        };
        value.filter(|v| v.is_finite() && *v != 0.0)
    }
}

/// Accept numbers and numeric strings; anything else becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        #[allow(dead_code)]
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
