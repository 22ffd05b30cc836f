use crate::model::{identifier, CompilationUnit, TypeDeclaration};
use ahash::AHashMap;

/// Name lookup over every known declaration, in source or in referenced metadata.
///
/// Marker types usually live in a referenced framework rather than the scanned sources, so the
/// base walk has to be able to step into declarations that are only known as metadata.
#[derive(Debug, Default)]
pub struct SymbolIndex<'a> {
    by_identifier: AHashMap<&'a str, Vec<&'a TypeDeclaration>>,
}

impl<'a> SymbolIndex<'a> {
    pub fn new(units: &'a [CompilationUnit], metadata: &'a [TypeDeclaration]) -> Self {
        let mut index = Self::default();
        for unit in units {
            for declaration in &unit.declarations {
                index.insert(declaration);
            }
        }
        for declaration in metadata {
            index.insert(declaration);
        }
        index
    }

    fn insert(&mut self, declaration: &'a TypeDeclaration) {
        self.by_identifier
            .entry(declaration.identifier())
            .or_default()
            .push(declaration);
    }

    /// All declarations a reference may denote. Empty if the symbol isn't known.
    pub fn resolve(&self, reference: &str) -> &[&'a TypeDeclaration] {
        self.by_identifier
            .get(identifier(reference))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }
}
