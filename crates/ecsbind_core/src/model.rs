//! Input model, as handed over by a source model provider

use ahash::AHashMap;
use std::{convert::Infallible, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Struct,
    /// Never classified, but can link a declaration to a marker through its own bases.
    Interface,
}

/// A single user-defined type, with the facts relevant to classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    pub kind: DeclKind,
    /// Base class and implemented interfaces, as written at the declaration.
    pub base_type_references: Vec<String>,
    pub is_abstract: bool,
    /// Name of the compilation unit (or referenced assembly) the declaration came from.
    pub origin_assembly: String,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base_type_references: Vec::new(),
            is_abstract: false,
            origin_assembly: String::new(),
        }
    }

    pub fn with_bases<I, S>(mut self, bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_type_references
            .extend(bases.into_iter().map(Into::into));
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_assembly = origin.into();
        self
    }

    /// The declaration's own name, normalized with [`identifier`].
    pub fn identifier(&self) -> &str {
        identifier(&self.name)
    }
}

/// One independently scannable part of the program (a project, a crate, an assembly).
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub name: String,
    /// Merge order key. Units are always merged sorted by this path.
    pub path: PathBuf,
    pub declarations: Vec<TypeDeclaration>,
    /// System name -> names of the components it reads or writes.
    pub dependencies: AHashMap<String, Vec<String>>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Adds a declaration, stamping it with this unit's name as its origin.
    pub fn declare(&mut self, declaration: TypeDeclaration) -> &mut Self {
        let declaration = declaration.with_origin(self.name.clone());
        self.declarations.push(declaration);
        self
    }

    pub fn depend<I, S>(&mut self, system: impl Into<String>, components: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .entry(system.into())
            .or_default()
            .extend(components.into_iter().map(Into::into));
        self
    }
}

/// Provider of the declarations of a whole program.
pub trait SourceModel {
    type Error;

    /// Every compilation unit of the program, in any order.
    fn compilation_units(&self) -> Result<Vec<CompilationUnit>, Self::Error>;

    /// Declarations known only from compiled metadata, such as the framework defining the
    /// marker types.
    fn referenced_metadata(&self) -> Result<Vec<TypeDeclaration>, Self::Error> {
        Ok(Vec::new())
    }
}

impl SourceModel for [CompilationUnit] {
    type Error = Infallible;

    fn compilation_units(&self) -> Result<Vec<CompilationUnit>, Infallible> {
        Ok(self.to_vec())
    }
}

/// Reduces a type reference to the bare identifier used for symbol comparison.
///
/// Generic arguments and namespace/path qualification are dropped, nothing else is touched. Two
/// references denote the same symbol only if their identifiers are *equal*.
///
/// ```
/// use ecsbind_core::model::identifier;
///
/// assert_eq!(identifier("BaseComponent"), "BaseComponent");
/// assert_eq!(identifier(" HECSFramework.Core.BaseSystem "), "BaseSystem");
/// assert_eq!(identifier("crate::ecs::ICommand<T>"), "ICommand");
/// assert_eq!(identifier("Dictionary<string, List<int>>"), "Dictionary");
/// ```
pub fn identifier(reference: &str) -> &str {
    let reference = reference.trim();
    let without_generics = match reference.find('<') {
        Some(at) => &reference[..at],
        None => reference,
    };
    let without_generics = without_generics.trim_end();

    let start = without_generics
        .rfind(|c: char| c == '.' || c == ':')
        .map(|at| at + 1)
        .unwrap_or(0);
    &without_generics[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_never_matches_by_substring() {
        assert_ne!(identifier("IGlobalCommand"), "ICommand");
        assert_ne!(identifier("BaseComponentHelper"), "BaseComponent");
        assert_eq!(identifier("global::ICommand"), "ICommand");
    }

    #[test]
    fn declare_stamps_origin() {
        let mut unit = CompilationUnit::new("Gameplay", "units/gameplay.toml");
        unit.declare(
            TypeDeclaration::new("Position", DeclKind::Class).with_bases(["BaseComponent"]),
        );

        assert_eq!(unit.declarations[0].origin_assembly, "Gameplay");
    }

    #[test]
    fn in_memory_source() {
        let units = [CompilationUnit::new("A", "a"), CompilationUnit::new("B", "b")];
        let source: &[CompilationUnit] = &units;

        assert_eq!(source.compilation_units().unwrap().len(), 2);
        assert!(source.referenced_metadata().unwrap().is_empty());
    }
}
