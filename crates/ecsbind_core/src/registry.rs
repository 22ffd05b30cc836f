//! Per-category, order-preserving storage of classified entities

use crate::{
    classify::{Category, ClassifiedEntity},
    error::{AnalysisError, DuplicateDefinition},
};
use ahash::AHashMap;
use log::*;

#[derive(Debug, Default)]
struct CategoryList {
    entries: Vec<ClassifiedEntity>,
    by_name: AHashMap<String, usize>,
}

/// A registry that's still being filled. Call [`RegistryBuilder::freeze`] once all entities are
/// in.
///
/// Duplicates are never inserted. They are remembered instead, so that a single failed run
/// reports every collision at once.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    categories: [CategoryList; 4],
    duplicates: Vec<DuplicateDefinition>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the entity, unless its name is already taken within its category.
    pub fn insert(&mut self, entity: ClassifiedEntity) -> Result<(), DuplicateDefinition> {
        let list = &mut self.categories[entity.category.index()];

        if let Some(&existing) = list.by_name.get(&entity.name) {
            let first = &list.entries[existing];
            let duplicate = DuplicateDefinition {
                category: entity.category,
                name: entity.name,
                first_origin: first.declaration.origin_assembly.clone(),
                second_origin: entity.declaration.origin_assembly,
            };
            self.duplicates.push(duplicate.clone());
            return Err(duplicate);
        }

        list.by_name.insert(entity.name.clone(), list.entries.len());
        list.entries.push(entity);
        Ok(())
    }

    /// Finishes the registry. Fails if any insertion collided.
    pub fn freeze(self) -> Result<Registry, AnalysisError> {
        if !self.duplicates.is_empty() {
            return Err(AnalysisError::DuplicateDefinitions(self.duplicates));
        }

        Ok(Registry {
            categories: self.categories,
        })
    }
}

/// Frozen, deduplicated classification results of one generation run.
#[derive(Debug)]
pub struct Registry {
    categories: [CategoryList; 4],
}

impl Registry {
    /// Merges classified entities in arrival order.
    ///
    /// The arrival order is the discovery order, it decides component ordinals for components
    /// that have none assigned yet.
    pub fn merge<I>(entities: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = ClassifiedEntity>,
    {
        let mut builder = RegistryBuilder::new();
        for entity in entities {
            if let Err(duplicate) = builder.insert(entity) {
                debug!("{duplicate}");
            }
        }
        builder.freeze()
    }

    /// Entities of the category, in discovery order.
    pub fn entities(&self, category: Category) -> &[ClassifiedEntity] {
        &self.categories[category.index()].entries
    }

    pub fn get(&self, category: Category, name: &str) -> Option<&ClassifiedEntity> {
        let list = &self.categories[category.index()];
        list.by_name.get(name).map(|&i| &list.entries[i])
    }

    pub fn contains(&self, category: Category, name: &str) -> bool {
        self.categories[category.index()].by_name.contains_key(name)
    }

    pub fn count(&self, category: Category) -> usize {
        self.categories[category.index()].entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|list| list.entries.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeclKind, TypeDeclaration};

    fn entity(name: &str, category: Category, origin: &str) -> ClassifiedEntity {
        ClassifiedEntity {
            name: name.into(),
            category,
            declaration: TypeDeclaration::new(name, DeclKind::Class).with_origin(origin),
        }
    }

    #[test]
    fn keeps_discovery_order() {
        let registry = Registry::merge([
            entity("Velocity", Category::Component, "A"),
            entity("MoveSystem", Category::System, "A"),
            entity("Position", Category::Component, "B"),
        ])
        .unwrap();

        let names: Vec<_> = registry
            .entities(Category::Component)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["Velocity", "Position"]);
        assert_eq!(registry.count(Category::System), 1);
        assert!(registry.contains(Category::System, "MoveSystem"));
        assert!(!registry.contains(Category::Component, "MoveSystem"));
    }

    #[test]
    fn same_name_in_different_categories_is_fine() {
        let registry = Registry::merge([
            entity("Jump", Category::GlobalCommand, "A"),
            entity("Jump", Category::Component, "A"),
        ])
        .unwrap();

        assert!(registry.get(Category::Component, "Jump").is_some());
        assert!(registry.get(Category::GlobalCommand, "Jump").is_some());
    }

    #[test]
    fn collisions_are_all_reported() {
        let err = Registry::merge([
            entity("Position", Category::Component, "Gameplay"),
            entity("Position", Category::Component, "Physics"),
            entity("MoveSystem", Category::System, "Gameplay"),
            entity("MoveSystem", Category::System, "Ai"),
        ])
        .unwrap_err();

        let AnalysisError::DuplicateDefinitions(duplicates) = err else {
            panic!("expected duplicate definitions");
        };
        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0].name, "Position");
        assert_eq!(duplicates[0].first_origin, "Gameplay");
        assert_eq!(duplicates[0].second_origin, "Physics");
        assert_eq!(duplicates[1].category, Category::System);
    }

    #[test]
    fn insert_rejects_without_overwriting() {
        let mut builder = RegistryBuilder::new();
        builder
            .insert(entity("Position", Category::Component, "First"))
            .unwrap();
        assert!(builder
            .insert(entity("Position", Category::Component, "Second"))
            .is_err());

        assert!(builder.freeze().is_err());
    }

    #[test]
    fn empty_registry() {
        let registry = Registry::merge(Vec::<ClassifiedEntity>::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.entities(Category::Component).is_empty());
    }
}
