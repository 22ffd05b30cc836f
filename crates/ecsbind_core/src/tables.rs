//! The exported binding tables
//!
//! Everything in here is plain data. Turning it into files is the job of an emitter.

use crate::{
    assign::{Assignment, ComponentRecord},
    binder::SystemRecord,
    classify::{Category, ClassifiedEntity},
    error::{AnalysisError, DependentKind, UnresolvedDependency},
    mask::Mask,
};
use ahash::{AHashMap, AHashSet};
use ecsbind_utils::Fnv1a;
use serde::{Deserialize, Serialize};

/// Name <-> ordinal <-> mask lookup over the components of one run.
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    width: usize,
    records: Vec<ComponentRecord>,
    by_name: AHashMap<String, usize>,
    by_ordinal: AHashMap<u32, usize>,
}

impl ComponentTable {
    pub fn new(assignment: &Assignment) -> Self {
        let records = assignment.records.clone();
        let by_name = records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.name.clone(), i))
            .collect();
        let by_ordinal = records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.ordinal, i))
            .collect();

        Self {
            width: assignment.width,
            records,
            by_name,
            by_ordinal,
        }
    }

    /// Mask width in words.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Records, sorted by ordinal.
    pub fn records(&self) -> &[ComponentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.get(name).map(|record| record.ordinal)
    }

    pub fn name_of(&self, ordinal: u32) -> Option<&str> {
        self.by_ordinal
            .get(&ordinal)
            .map(|&i| self.records[i].name.as_str())
    }

    pub fn mask_of(&self, ordinal: u32) -> Option<&Mask> {
        self.by_ordinal.get(&ordinal).map(|&i| &self.records[i].mask)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentRecord> {
        self.by_name.get(name).map(|&i| &self.records[i])
    }

    /// Registered ordinals whose bit is set in the mask. Bits of unknown ordinals are ignored.
    pub fn ordinals_in(&self, mask: &Mask) -> Vec<u32> {
        mask.iter_ones()
            .filter(|ordinal| self.by_ordinal.contains_key(ordinal))
            .collect()
    }

    /// Union of the named components' masks, or the names that aren't registered.
    pub fn union_of<'n, I>(&self, names: I) -> Result<Mask, Vec<&'n str>>
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut mask = Mask::empty(self.width);
        let mut missing = Vec::new();

        for name in names {
            match self.get(name) {
                Some(record) => mask |= &record.mask,
                None => missing.push(name),
            }
        }

        if missing.is_empty() {
            Ok(mask)
        } else {
            Err(missing)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandScope {
    Global,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    pub name: String,
    pub scope: CommandScope,
}

/// One of the two command registries. Both are independent of each other.
#[derive(Debug, Clone)]
pub struct CommandTable {
    records: Vec<CommandRecord>,
    names: AHashSet<String>,
}

impl CommandTable {
    pub fn new<'e, I>(scope: CommandScope, entities: I) -> Self
    where
        I: IntoIterator<Item = &'e ClassifiedEntity>,
    {
        let records: Vec<_> = entities
            .into_iter()
            .map(|entity| CommandRecord {
                name: entity.name.clone(),
                scope,
            })
            .collect();
        let names = records.iter().map(|record| record.name.clone()).collect();

        Self { records, names }
    }

    pub fn records(&self) -> &[CommandRecord] {
        &self.records
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A declaratively supplied entity template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArchetypeDefinition {
    pub name: String,
    #[serde(default)]
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchetypeBinding {
    pub name: String,
    pub components: Vec<String>,
    pub mask: Mask,
}

/// Resolves archetype definitions into union masks. Unknown components are fatal.
pub fn bind_archetypes(
    definitions: &[ArchetypeDefinition],
    components: &ComponentTable,
) -> Result<Vec<ArchetypeBinding>, AnalysisError> {
    let mut seen = AHashSet::new();
    let mut unresolved = Vec::new();
    let mut bindings = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if !seen.insert(definition.name.as_str()) {
            return Err(AnalysisError::DuplicateArchetype(definition.name.clone()));
        }

        match components.union_of(definition.components.iter().map(String::as_str)) {
            Ok(mask) => bindings.push(ArchetypeBinding {
                name: definition.name.clone(),
                components: definition.components.clone(),
                mask,
            }),
            Err(missing) => {
                unresolved.extend(missing.into_iter().map(|dependency| UnresolvedDependency {
                    kind: DependentKind::Archetype,
                    owner: definition.name.clone(),
                    dependency: dependency.to_string(),
                }))
            }
        }
    }

    if unresolved.is_empty() {
        Ok(bindings)
    } else {
        Err(AnalysisError::UnresolvedDependencies(unresolved))
    }
}

/// The complete output of a generation run.
#[derive(Debug, Clone)]
pub struct BindingTables {
    pub components: ComponentTable,
    pub systems: Vec<SystemRecord>,
    pub global_commands: CommandTable,
    pub local_commands: CommandTable,
    pub archetypes: Vec<ArchetypeBinding>,
}

impl BindingTables {
    pub fn new(
        components: ComponentTable,
        systems: Vec<SystemRecord>,
        global: &[ClassifiedEntity],
        local: &[ClassifiedEntity],
        archetypes: Vec<ArchetypeBinding>,
    ) -> Self {
        debug_assert!(global.iter().all(|e| e.category == Category::GlobalCommand));
        debug_assert!(local.iter().all(|e| e.category == Category::LocalCommand));

        Self {
            components,
            systems,
            global_commands: CommandTable::new(CommandScope::Global, global),
            local_commands: CommandTable::new(CommandScope::Local, local),
            archetypes,
        }
    }

    pub fn system(&self, name: &str) -> Option<&SystemRecord> {
        self.systems.iter().find(|system| system.name == name)
    }

    pub fn archetype(&self, name: &str) -> Option<&ArchetypeBinding> {
        self.archetypes.iter().find(|archetype| archetype.name == name)
    }

    /// FNV-1a over `(ordinal, name)` of every component in ordinal order. A runtime compiled
    /// against other tables can compare this to detect a layout mismatch.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = Fnv1a::new();
        for record in self.components.records() {
            hasher.write_u32(record.ordinal);
            hasher.write(record.name.as_bytes());
            hasher.write(&[0]);
        }
        hasher.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
            && self.systems.is_empty()
            && self.global_commands.is_empty()
            && self.local_commands.is_empty()
            && self.archetypes.is_empty()
    }
}
