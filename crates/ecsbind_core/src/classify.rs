//! Declaration classification

use crate::{
    index::SymbolIndex,
    model::{identifier, CompilationUnit, DeclKind, TypeDeclaration},
};
use ahash::AHashSet;
use log::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Component,
    System,
    GlobalCommand,
    LocalCommand,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Component,
        Category::System,
        Category::GlobalCommand,
        Category::LocalCommand,
    ];

    pub const fn index(self) -> usize {
        match self {
            Category::Component => 0,
            Category::System => 1,
            Category::GlobalCommand => 2,
            Category::LocalCommand => 3,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Component => "component",
            Category::System => "system",
            Category::GlobalCommand => "global command",
            Category::LocalCommand => "local command",
        })
    }
}

/// Names of the four marker types. Compared by identifier, see [`identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Markers {
    pub component: String,
    pub system: String,
    pub global_command: String,
    pub local_command: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            component: "BaseComponent".into(),
            system: "BaseSystem".into(),
            global_command: "IGlobalCommand".into(),
            local_command: "ICommand".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEntity {
    pub name: String,
    pub category: Category,
    pub declaration: TypeDeclaration,
}

pub struct Classifier<'m, 'i> {
    markers: &'m Markers,
    index: &'i SymbolIndex<'i>,
}

impl<'m, 'i> Classifier<'m, 'i> {
    pub fn new(markers: &'m Markers, index: &'i SymbolIndex<'i>) -> Self {
        Self { markers, index }
    }

    /// Determines the category of a single declaration, if it has one.
    pub fn classify(&self, declaration: &TypeDeclaration) -> Option<Category> {
        match declaration.kind {
            DeclKind::Class if declaration.is_abstract => None,
            DeclKind::Class => {
                if self.reaches(declaration, &self.markers.component) {
                    Some(Category::Component)
                } else if self.reaches(declaration, &self.markers.system) {
                    Some(Category::System)
                } else {
                    None
                }
            }
            DeclKind::Struct => {
                // Global goes first and wins, a struct is never in both command tables
                if self.reaches(declaration, &self.markers.global_command) {
                    Some(Category::GlobalCommand)
                } else if self.reaches(declaration, &self.markers.local_command) {
                    Some(Category::LocalCommand)
                } else {
                    None
                }
            }
            DeclKind::Interface => None,
        }
    }

    /// Classifies every declaration of the unit, keeping declaration order.
    pub fn classify_unit(&self, unit: &CompilationUnit) -> Vec<ClassifiedEntity> {
        let classified: Vec<_> = unit
            .declarations
            .iter()
            .filter_map(|declaration| {
                let category = self.classify(declaration)?;
                debug!("Found {category} `{}` in `{}`", declaration.name, unit.name);
                Some(ClassifiedEntity {
                    name: declaration.name.clone(),
                    category,
                    declaration: declaration.clone(),
                })
            })
            .collect();

        trace!(
            "Unit `{}`: {} of {} declarations classified",
            unit.name,
            classified.len(),
            unit.declarations.len()
        );
        classified
    }

    /// Checks whether `marker` is a base of the declaration, directly or through any chain of
    /// known intermediate declarations (abstract ones included).
    fn reaches(&self, declaration: &TypeDeclaration, marker: &str) -> bool {
        let marker = identifier(marker);

        let mut visited = AHashSet::new();
        visited.insert(declaration.identifier());
        let mut pending: Vec<&str> = declaration
            .base_type_references
            .iter()
            .map(String::as_str)
            .collect();

        while let Some(reference) = pending.pop() {
            let base = identifier(reference);
            if base == marker {
                return true;
            }
            if !visited.insert(base) {
                continue;
            }

            for &resolved in self.index.resolve(base) {
                pending.extend(resolved.base_type_references.iter().map(String::as_str));
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, bases: &[&str]) -> TypeDeclaration {
        TypeDeclaration::new(name, DeclKind::Class).with_bases(bases.iter().copied())
    }

    fn structure(name: &str, bases: &[&str]) -> TypeDeclaration {
        TypeDeclaration::new(name, DeclKind::Struct).with_bases(bases.iter().copied())
    }

    fn classify_all(declarations: Vec<TypeDeclaration>) -> Vec<(String, Category)> {
        let mut unit = CompilationUnit::new("Test", "test");
        for declaration in declarations {
            unit.declare(declaration);
        }
        let units = vec![unit];
        let index = SymbolIndex::new(&units, &[]);
        let markers = Markers::default();
        Classifier::new(&markers, &index)
            .classify_unit(&units[0])
            .into_iter()
            .map(|e| (e.name, e.category))
            .collect()
    }

    #[test]
    fn direct_markers() {
        let found = classify_all(vec![
            class("Position", &["BaseComponent"]),
            class("MoveSystem", &["BaseSystem"]),
            structure("Quit", &["IGlobalCommand"]),
            structure("Damage", &["ICommand"]),
            class("Plain", &[]),
        ]);

        assert_eq!(
            found,
            vec![
                ("Position".into(), Category::Component),
                ("MoveSystem".into(), Category::System),
                ("Quit".into(), Category::GlobalCommand),
                ("Damage".into(), Category::LocalCommand),
            ]
        );
    }

    #[test]
    fn transitive_through_abstract_intermediate() {
        let found = classify_all(vec![
            class("ActorComponent", &["BaseComponent"]).with_abstract(true),
            class("RenderComponent", &["ActorComponent"]).with_abstract(true),
            class("MeshComponent", &["RenderComponent", "IDisposable"]),
        ]);

        assert_eq!(found, vec![("MeshComponent".into(), Category::Component)]);
    }

    #[test]
    fn similar_names_are_not_markers() {
        let found = classify_all(vec![
            class("Helper", &["BaseComponentHelper"]),
            class("Other", &["MyBaseSystem"]),
            structure("Thing", &["ICommandFactory"]),
        ]);

        assert!(found.is_empty());
    }

    #[test]
    fn global_command_is_never_local() {
        let found = classify_all(vec![
            structure("Both", &["ICommand", "IGlobalCommand"]),
            structure("Global", &["IGlobalCommand"]),
            structure("Local", &["ICommand"]),
            structure("Neither", &["IEquatable<Neither>"]),
        ]);

        assert_eq!(
            found,
            vec![
                ("Both".into(), Category::GlobalCommand),
                ("Global".into(), Category::GlobalCommand),
                ("Local".into(), Category::LocalCommand),
            ]
        );
    }

    #[test]
    fn commands_through_interfaces() {
        let found = classify_all(vec![
            TypeDeclaration::new("INetworkCommand", DeclKind::Interface)
                .with_bases(["IGlobalCommand"]),
            structure("Sync", &["INetworkCommand"]),
        ]);

        assert_eq!(found, vec![("Sync".into(), Category::GlobalCommand)]);
    }

    #[test]
    fn classes_are_not_commands_and_structs_are_not_components() {
        let found = classify_all(vec![
            class("CommandClass", &["ICommand"]),
            structure("ComponentStruct", &["BaseComponent"]),
        ]);

        assert!(found.is_empty());
    }

    #[test]
    fn cyclic_bases_terminate() {
        let found = classify_all(vec![class("A", &["B"]), class("B", &["A"])]);
        assert!(found.is_empty());
    }

    #[test]
    fn markers_from_metadata_chain() {
        let mut unit = CompilationUnit::new("Game", "game");
        unit.declare(class("Health", &["Framework.Components.SyncedComponent"]));
        let units = vec![unit];
        let metadata = vec![
            class("Framework.Components.SyncedComponent", &["BaseComponent"]).with_abstract(true),
        ];
        let index = SymbolIndex::new(&units, &metadata);
        let markers = Markers::default();
        let classifier = Classifier::new(&markers, &index);

        assert_eq!(
            classifier.classify(&units[0].declarations[0]),
            Some(Category::Component)
        );
    }
}
