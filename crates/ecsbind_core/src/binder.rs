//! Resolution of system dependencies into union masks

use crate::{
    classify::Category,
    error::{AnalysisError, DependentKind, UnresolvedDependency},
    mask::Mask,
    registry::Registry,
    tables::ComponentTable,
};
use ahash::AHashMap;
use log::*;
use serde::Serialize;

/// Provides the component names a system declares it reads or writes.
pub trait DependencySource {
    /// Declared dependencies of the system, empty if it declares none.
    fn dependencies_of(&self, system: &str) -> &[String];
}

/// Dependency declarations merged from every compilation unit.
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    map: AHashMap<String, Vec<String>>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds dependencies for a system. Names already declared for it are skipped, so the list
    /// keeps the order of first declaration.
    pub fn extend<I, S>(&mut self, system: &str, components: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.map.entry(system.to_string()).or_default();
        for component in components {
            let component = component.into();
            if !list.contains(&component) {
                list.push(component);
            }
        }
    }
}

impl DependencySource for DependencyMap {
    fn dependencies_of(&self, system: &str) -> &[String] {
        self.map.get(system).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// What to do with a system that names an unknown component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Leave the system out of the binding table.
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemRecord {
    pub name: String,
    /// Dependency names, in declaration order, without duplicates.
    pub dependencies: Vec<String>,
    pub resolved_mask: Mask,
}

impl SystemRecord {
    /// Runtime-style check whether an entity with the given components is processed by this
    /// system. A system without dependencies matches everything.
    pub fn matches(&self, entity: &Mask) -> bool {
        entity.contains_all(&self.resolved_mask)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBinder {
    pub policy: UnresolvedPolicy,
}

impl SystemBinder {
    pub fn new(policy: UnresolvedPolicy) -> Self {
        Self { policy }
    }

    /// Binds every registered system, in discovery order.
    pub fn bind(
        &self,
        registry: &Registry,
        components: &ComponentTable,
        dependencies: &impl DependencySource,
    ) -> Result<Vec<SystemRecord>, AnalysisError> {
        let mut records = Vec::with_capacity(registry.count(Category::System));
        let mut unresolved = Vec::new();

        for system in registry.entities(Category::System) {
            let mut declared: Vec<String> = Vec::new();
            for name in dependencies.dependencies_of(&system.name) {
                if !declared.contains(name) {
                    declared.push(name.clone());
                }
            }

            match components.union_of(declared.iter().map(String::as_str)) {
                Ok(resolved_mask) => {
                    if declared.is_empty() {
                        debug!("System `{}` declares no dependencies", system.name);
                    }
                    records.push(SystemRecord {
                        name: system.name.clone(),
                        dependencies: declared,
                        resolved_mask,
                    })
                }
                Err(missing) => {
                    for dependency in missing {
                        let problem = UnresolvedDependency {
                            kind: DependentKind::System,
                            owner: system.name.clone(),
                            dependency: dependency.to_string(),
                        };
                        match self.policy {
                            UnresolvedPolicy::Abort => error!("{problem}"),
                            UnresolvedPolicy::Omit => warn!("{problem}, omitting its binding"),
                        }
                        unresolved.push(problem);
                    }
                }
            }
        }

        match self.policy {
            UnresolvedPolicy::Abort if !unresolved.is_empty() => {
                Err(AnalysisError::UnresolvedDependencies(unresolved))
            }
            _ => Ok(records),
        }
    }
}
