//! One complete generation run, from declarations to binding tables

use crate::{
    assign::{MaskAssigner, PriorMapping, RetirementPolicy},
    binder::{DependencyMap, SystemBinder, UnresolvedPolicy},
    classify::{Category, Classifier, Markers},
    error::AnalysisError,
    index::SymbolIndex,
    model::{CompilationUnit, TypeDeclaration},
    registry::Registry,
    tables::{bind_archetypes, ArchetypeDefinition, BindingTables, ComponentTable},
};
use log::*;
use rayon::prelude::*;

#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub markers: Markers,
    pub retirement: RetirementPolicy,
    pub unresolved: UnresolvedPolicy,
}

/// Inputs of a generation run. Construct one per run, nothing is shared between runs.
#[derive(Debug, Clone, Copy)]
pub struct Generation<'a> {
    pub options: &'a GenerationOptions,
    pub units: &'a [CompilationUnit],
    /// Declarations known only from referenced metadata. Used for base resolution, never
    /// classified themselves.
    pub metadata: &'a [TypeDeclaration],
    pub archetypes: &'a [ArchetypeDefinition],
    pub prior: Option<&'a PriorMapping>,
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub tables: BindingTables,
    /// Ordinal mapping to persist for the next run.
    pub mapping: PriorMapping,
}

impl<'a> Generation<'a> {
    pub fn new(options: &'a GenerationOptions, units: &'a [CompilationUnit]) -> Self {
        Self {
            options,
            units,
            metadata: &[],
            archetypes: &[],
            prior: None,
        }
    }

    pub fn with_metadata(mut self, metadata: &'a [TypeDeclaration]) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_archetypes(mut self, archetypes: &'a [ArchetypeDefinition]) -> Self {
        self.archetypes = archetypes;
        self
    }

    pub fn with_prior(mut self, prior: Option<&'a PriorMapping>) -> Self {
        self.prior = prior;
        self
    }

    pub fn run(self) -> Result<GenerationOutput, AnalysisError> {
        // Merge order: unit path, then declaration order within the unit
        let mut units: Vec<&CompilationUnit> = self.units.iter().collect();
        units.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.name.cmp(&b.name)));

        let index = SymbolIndex::new(self.units, self.metadata);
        if index.is_empty() {
            warn!("No type declarations found, the generated tables will be empty");
        } else {
            trace!("Symbol index holds {} identifiers", index.len());
        }

        let classifier = Classifier::new(&self.options.markers, &index);
        let classified: Vec<_> = units
            .par_iter()
            .map(|unit| classifier.classify_unit(unit))
            .collect();

        let registry = Registry::merge(classified.into_iter().flatten())?;
        info!(
            "Classified {} components, {} systems, {} global and {} local commands",
            registry.count(Category::Component),
            registry.count(Category::System),
            registry.count(Category::GlobalCommand),
            registry.count(Category::LocalCommand),
        );

        let assignment = MaskAssigner::new(self.options.retirement).assign(&registry, self.prior)?;
        let components = ComponentTable::new(&assignment);

        let mut dependencies = DependencyMap::new();
        for unit in &units {
            for (system, names) in &unit.dependencies {
                dependencies.extend(system, names.iter().cloned());
            }
        }
        let systems =
            SystemBinder::new(self.options.unresolved).bind(&registry, &components, &dependencies)?;
        let archetypes = bind_archetypes(self.archetypes, &components)?;

        let tables = BindingTables::new(
            components,
            systems,
            registry.entities(Category::GlobalCommand),
            registry.entities(Category::LocalCommand),
            archetypes,
        );

        Ok(GenerationOutput {
            tables,
            mapping: assignment.mapping,
        })
    }
}
