//! Symbol dumps: the declarations of one compilation unit, as exported by a language front end

use crate::{
    manifest::{read_toml, ManifestError},
    progress::{Operation, Progress, ProgressEvent},
};
use ecsbind_core::{CompilationUnit, DeclKind, SourceModel, TypeDeclaration};
use rayon::prelude::*;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Instant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpedKind {
    #[default]
    Class,
    Struct,
    Interface,
}

impl From<DumpedKind> for DeclKind {
    fn from(kind: DumpedKind) -> Self {
        match kind {
            DumpedKind::Class => DeclKind::Class,
            DumpedKind::Struct => DeclKind::Struct,
            DumpedKind::Interface => DeclKind::Interface,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpedType {
    pub name: String,
    #[serde(default)]
    pub kind: DumpedKind,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolDump {
    pub name: String,
    #[serde(default)]
    pub types: Vec<DumpedType>,
    /// System name -> component names
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl SymbolDump {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        read_toml(path)
    }

    fn declarations(types: Vec<DumpedType>) -> impl Iterator<Item = TypeDeclaration> {
        types.into_iter().map(|ty| {
            TypeDeclaration::new(ty.name, ty.kind.into())
                .with_bases(ty.bases)
                .with_abstract(ty.is_abstract)
        })
    }

    pub fn into_unit(self, path: impl Into<PathBuf>) -> CompilationUnit {
        let mut unit = CompilationUnit::new(self.name, path);
        for declaration in Self::declarations(self.types) {
            unit.declare(declaration);
        }
        for (system, components) in self.dependencies {
            unit.depend(system, components);
        }
        unit
    }

    /// Declarations of a metadata dump. Dependencies are ignored, metadata types are never
    /// classified.
    pub fn into_metadata(self) -> Vec<TypeDeclaration> {
        let origin = self.name;
        Self::declarations(self.types)
            .map(|declaration| declaration.with_origin(origin.clone()))
            .collect()
    }
}

/// A [`SourceModel`] over symbol dump files.
pub struct DumpSource<'p> {
    pub units: Vec<PathBuf>,
    pub metadata: Vec<PathBuf>,
    pub progress: &'p dyn Progress,
    started: Instant,
}

impl<'p> DumpSource<'p> {
    pub fn new(units: Vec<PathBuf>, metadata: Vec<PathBuf>, progress: &'p dyn Progress) -> Self {
        Self {
            units,
            metadata,
            progress,
            started: Instant::now(),
        }
    }

    fn report(&self, operation: Operation, path: &Path) {
        let unit = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.progress.report(&ProgressEvent {
            operation,
            elapsed: self.started.elapsed(),
            unit,
        });
    }
}

impl<'p> SourceModel for DumpSource<'p> {
    type Error = ManifestError;

    fn compilation_units(&self) -> Result<Vec<CompilationUnit>, ManifestError> {
        self.units
            .par_iter()
            .map(|path| {
                let unit = SymbolDump::load(path)?.into_unit(path.clone());
                self.report(Operation::Load, path);
                Ok(unit)
            })
            .collect()
    }

    fn referenced_metadata(&self) -> Result<Vec<TypeDeclaration>, ManifestError> {
        let mut declarations = Vec::new();
        for path in &self.metadata {
            declarations.extend(SymbolDump::load(path)?.into_metadata());
            self.report(Operation::Resolve, path);
        }
        Ok(declarations)
    }
}
