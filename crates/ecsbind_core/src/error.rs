use crate::classify::Category;
use itertools::Itertools;
use std::fmt::{self, Display};
use thiserror::Error;

/// Fatal problems of a generation run. Any of these means no tables get produced.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("duplicate definitions: {}", .0.iter().join("; "))]
    DuplicateDefinitions(Vec<DuplicateDefinition>),
    #[error("unresolved dependencies: {}", .0.iter().join("; "))]
    UnresolvedDependencies(Vec<UnresolvedDependency>),
    #[error("archetype `{0}` is defined more than once")]
    DuplicateArchetype(String),
    #[error("invalid prior mapping: {0}")]
    InvalidPriorMapping(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{category} `{name}` is defined in both `{first_origin}` and `{second_origin}`")]
pub struct DuplicateDefinition {
    pub category: Category,
    pub name: String,
    pub first_origin: String,
    pub second_origin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentKind {
    System,
    Archetype,
}

impl Display for DependentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DependentKind::System => "system",
            DependentKind::Archetype => "archetype",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} `{owner}` depends on unknown component `{dependency}`")]
pub struct UnresolvedDependency {
    pub kind: DependentKind,
    pub owner: String,
    pub dependency: String,
}
