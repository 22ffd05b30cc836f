//! The ecsbind analysis core
//!
//! Takes type declarations discovered in an ECS codebase, sorts them into components, systems
//! and commands, and derives the bit-mask binding tables the ECS runtime uses to match systems
//! against entities.
//!
//! A generation run flows through these stages, in order:
//!  1. [`classify`] - every [`TypeDeclaration`] gets zero or one [`Category`]
//!  2. [`registry`] - classified entities are deduplicated per category
//!  3. [`assign`] - components get stable ordinals and single-bit [`Mask`]s
//!  4. [`binder`] - system dependencies are folded into union masks
//!  5. [`tables`] - everything is assembled into [`BindingTables`]
//!
//! [`pipeline::Generation`] drives all of them.

pub mod assign;
pub mod binder;
pub mod classify;
pub mod error;
pub mod index;
pub mod mask;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod tables;

pub use assign::{Assignment, ComponentRecord, MaskAssigner, PriorMapping, RetirementPolicy};
pub use binder::{DependencyMap, DependencySource, SystemBinder, SystemRecord, UnresolvedPolicy};
pub use classify::{Category, ClassifiedEntity, Classifier, Markers};
pub use error::{AnalysisError, DependentKind, DuplicateDefinition, UnresolvedDependency};
pub use index::SymbolIndex;
pub use mask::Mask;
pub use model::{CompilationUnit, DeclKind, SourceModel, TypeDeclaration};
pub use pipeline::{Generation, GenerationOptions, GenerationOutput};
pub use registry::{Registry, RegistryBuilder};
pub use tables::{
    ArchetypeBinding, ArchetypeDefinition, BindingTables, CommandRecord, CommandScope,
    CommandTable, ComponentTable,
};
