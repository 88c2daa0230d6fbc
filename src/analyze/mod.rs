pub mod analyzer;

pub use analyzer::{find_team, ComponentGrouper, QaContactAnalyzer, TeamAnalyzer, OTHER_COMPONENT};
