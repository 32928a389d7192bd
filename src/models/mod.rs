pub mod result;
pub mod target;
pub mod tree;

pub use result::TestResult;
pub use target::{ConditionKind, Conditions, CoverageTarget, Target, TargetKind};
pub use tree::XmlTree;
