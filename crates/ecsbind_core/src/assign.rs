//! Component ordinal and mask assignment
//!
//! Ordinals decide bit positions, and bit positions end up compiled into whatever consumes the
//! mask table. Because of that, a component keeps its ordinal for as long as it's known to the
//! persisted [`PriorMapping`], and an ordinal once handed out is never handed out again.

use crate::{
    classify::Category,
    error::AnalysisError,
    mask::{Mask, WORD_BITS},
    registry::Registry,
};
use ahash::AHashMap;
use ecsbind_utils::words_for_bits;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PRIOR_MAPPING_VERSION: u32 = 1;

/// Ordinal assignments persisted between generation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorMapping {
    #[serde(default = "prior_mapping_version")]
    pub version: u32,
    /// High-water mark. Every ordinal below this one has been handed out at some point.
    pub next_ordinal: u32,
    #[serde(default)]
    pub components: BTreeMap<String, u32>,
}

fn prior_mapping_version() -> u32 {
    PRIOR_MAPPING_VERSION
}

impl Default for PriorMapping {
    fn default() -> Self {
        Self {
            version: PRIOR_MAPPING_VERSION,
            next_ordinal: 0,
            components: BTreeMap::new(),
        }
    }
}

impl PriorMapping {
    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.components.get(name).copied()
    }

    /// Checks the mapping for problems that would break mask injectivity.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.version != PRIOR_MAPPING_VERSION {
            return Err(AnalysisError::InvalidPriorMapping(format!(
                "unsupported version {} (expected {PRIOR_MAPPING_VERSION})",
                self.version
            )));
        }

        let mut owners: AHashMap<u32, &str> = AHashMap::with_capacity(self.components.len());
        for (name, &ordinal) in &self.components {
            if let Some(other) = owners.insert(ordinal, name) {
                return Err(AnalysisError::InvalidPriorMapping(format!(
                    "components `{other}` and `{name}` share ordinal {ordinal}"
                )));
            }
        }
        Ok(())
    }

    /// The lowest ordinal that's safe to hand out, even if `next_ordinal` is stale.
    fn first_free_ordinal(&self) -> Result<u32, AnalysisError> {
        let past_highest = match self.components.values().max() {
            Some(&highest) => highest.checked_add(1).ok_or_else(|| {
                AnalysisError::InvalidPriorMapping(format!(
                    "ordinal {highest} leaves no room for new components"
                ))
            })?,
            None => 0,
        };

        if past_highest > self.next_ordinal {
            warn!(
                "Prior mapping's next ordinal {} is below its highest assigned one, using {}",
                self.next_ordinal, past_highest
            );
        }
        Ok(self.next_ordinal.max(past_highest))
    }
}

/// What happens to prior mapping entries of components that weren't discovered this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetirementPolicy {
    /// They stay in the mapping, and get their old ordinal back if they reappear.
    #[default]
    Reserve,
    /// They're dropped from the mapping. Their ordinals are still never reused.
    Retire,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentRecord {
    pub name: String,
    pub ordinal: u32,
    pub mask: Mask,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    /// Present components, sorted by ordinal.
    pub records: Vec<ComponentRecord>,
    /// Mask width of this run, in words.
    pub width: usize,
    /// The mapping to persist for the next run.
    pub mapping: PriorMapping,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaskAssigner {
    pub retirement: RetirementPolicy,
}

impl MaskAssigner {
    pub fn new(retirement: RetirementPolicy) -> Self {
        Self { retirement }
    }

    /// Assigns ordinals to every registered component.
    ///
    /// Known names keep their prior ordinal, new ones get fresh ordinals in discovery order.
    pub fn assign(
        &self,
        registry: &Registry,
        prior: Option<&PriorMapping>,
    ) -> Result<Assignment, AnalysisError> {
        let empty = PriorMapping::default();
        let prior = prior.unwrap_or(&empty);
        prior.validate()?;

        let mut next_ordinal = prior.first_free_ordinal()?;
        let mut assigned = Vec::with_capacity(registry.count(Category::Component));

        for entity in registry.entities(Category::Component) {
            let ordinal = match prior.ordinal_of(&entity.name) {
                Some(ordinal) => ordinal,
                None => {
                    let ordinal = next_ordinal;
                    next_ordinal = next_ordinal.checked_add(1).ok_or_else(|| {
                        AnalysisError::InvalidPriorMapping("component ordinals exhausted".into())
                    })?;
                    debug!("Assigned new ordinal {ordinal} to `{}`", entity.name);
                    ordinal
                }
            };
            assigned.push((entity.name.clone(), ordinal));
        }

        let mut mapping = PriorMapping {
            version: PRIOR_MAPPING_VERSION,
            next_ordinal,
            components: match self.retirement {
                RetirementPolicy::Reserve => prior.components.clone(),
                RetirementPolicy::Retire => BTreeMap::new(),
            },
        };
        mapping.components.extend(assigned.iter().cloned());

        if self.retirement == RetirementPolicy::Retire {
            for name in prior.components.keys() {
                if !mapping.components.contains_key(name) {
                    info!("Retiring component `{name}`, its ordinal won't be reused");
                }
            }
        }

        let width = assigned
            .iter()
            .map(|&(_, ordinal)| ordinal as usize + 1)
            .max()
            .map(words_for_bits)
            .unwrap_or(0);
        debug_assert!(width * WORD_BITS as usize >= assigned.len());

        let mut records: Vec<_> = assigned
            .into_iter()
            .map(|(name, ordinal)| ComponentRecord {
                mask: Mask::single(ordinal, width),
                name,
                ordinal,
            })
            .collect();
        records.sort_by_key(|record| record.ordinal);

        Ok(Assignment {
            records,
            width,
            mapping,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::ClassifiedEntity,
        model::{DeclKind, TypeDeclaration},
    };

    fn registry(names: &[&str]) -> Registry {
        Registry::merge(names.iter().map(|&name| ClassifiedEntity {
            name: name.into(),
            category: Category::Component,
            declaration: TypeDeclaration::new(name, DeclKind::Class),
        }))
        .unwrap()
    }

    fn ordinals(assignment: &Assignment) -> Vec<(&str, u32)> {
        assignment
            .records
            .iter()
            .map(|r| (r.name.as_str(), r.ordinal))
            .collect()
    }

    #[test]
    fn fresh_run_is_contiguous_in_discovery_order() {
        let assignment = MaskAssigner::default()
            .assign(&registry(&["Position", "Velocity", "Health"]), None)
            .unwrap();

        assert_eq!(
            ordinals(&assignment),
            [("Position", 0), ("Velocity", 1), ("Health", 2)]
        );
        assert_eq!(assignment.width, 1);
        assert_eq!(assignment.mapping.next_ordinal, 3);
    }

    #[test]
    fn masks_are_distinct_single_bits() {
        let names: Vec<String> = (0..130).map(|i| format!("C{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let assignment = MaskAssigner::default()
            .assign(&registry(&names), None)
            .unwrap();

        assert_eq!(assignment.width, 3);
        assert_eq!(assignment.records.len(), 130);
        for (i, a) in assignment.records.iter().enumerate() {
            assert_eq!(a.mask.count_ones(), 1);
            assert!(a.mask.has(a.ordinal));
            assert_eq!(a.mask.width(), 3);
            for b in &assignment.records[i + 1..] {
                assert_ne!(a.mask, b.mask);
            }
        }
    }

    #[test]
    fn rerun_with_prior_mapping_is_stable() {
        let components = registry(&["Position", "Velocity", "Health"]);
        let first = MaskAssigner::default().assign(&components, None).unwrap();
        let second = MaskAssigner::default()
            .assign(&components, Some(&first.mapping))
            .unwrap();

        assert_eq!(first.records, second.records);
        assert_eq!(first.mapping, second.mapping);
    }

    #[test]
    fn new_component_is_appended() {
        let first = MaskAssigner::default()
            .assign(&registry(&["Position", "Velocity"]), None)
            .unwrap();
        // Discovered first this time, still ends up last
        let second = MaskAssigner::default()
            .assign(
                &registry(&["Health", "Position", "Velocity"]),
                Some(&first.mapping),
            )
            .unwrap();

        assert_eq!(
            ordinals(&second),
            [("Position", 0), ("Velocity", 1), ("Health", 2)]
        );
    }

    #[test]
    fn missing_components_keep_their_ordinal_reserved() {
        let first = MaskAssigner::default()
            .assign(&registry(&["Position", "Velocity", "Health"]), None)
            .unwrap();
        let second = MaskAssigner::default()
            .assign(&registry(&["Position", "Health", "Armor"]), Some(&first.mapping))
            .unwrap();

        assert_eq!(
            ordinals(&second),
            [("Position", 0), ("Health", 2), ("Armor", 3)]
        );
        assert_eq!(second.mapping.ordinal_of("Velocity"), Some(1));

        let third = MaskAssigner::default()
            .assign(&registry(&["Velocity"]), Some(&second.mapping))
            .unwrap();
        assert_eq!(ordinals(&third), [("Velocity", 1)]);
    }

    #[test]
    fn retired_ordinals_are_not_reused() {
        let first = MaskAssigner::default()
            .assign(&registry(&["Position", "Velocity"]), None)
            .unwrap();
        let second = MaskAssigner::new(RetirementPolicy::Retire)
            .assign(&registry(&["Position"]), Some(&first.mapping))
            .unwrap();

        assert_eq!(second.mapping.ordinal_of("Velocity"), None);
        assert_eq!(second.mapping.next_ordinal, 2);

        let third = MaskAssigner::default()
            .assign(&registry(&["Position", "Velocity"]), Some(&second.mapping))
            .unwrap();
        assert_eq!(ordinals(&third), [("Position", 0), ("Velocity", 2)]);
    }

    #[test]
    fn width_follows_highest_ordinal() {
        let prior = PriorMapping {
            next_ordinal: 64,
            components: [("Late".to_string(), 63)].into_iter().collect(),
            ..Default::default()
        };
        let assignment = MaskAssigner::default()
            .assign(&registry(&["Late", "Fresh"]), Some(&prior))
            .unwrap();

        assert_eq!(ordinals(&assignment), [("Late", 63), ("Fresh", 64)]);
        assert_eq!(assignment.width, 2);
        assert_eq!(assignment.records[1].mask.words(), &[0, 1]);
    }

    #[test]
    fn stale_high_water_mark_is_repaired() {
        let prior = PriorMapping {
            next_ordinal: 0,
            components: [("Position".to_string(), 4)].into_iter().collect(),
            ..Default::default()
        };
        let assignment = MaskAssigner::default()
            .assign(&registry(&["Velocity"]), Some(&prior))
            .unwrap();

        assert_eq!(ordinals(&assignment), [("Velocity", 5)]);
    }

    #[test]
    fn exhausted_ordinals_are_rejected() {
        let prior = PriorMapping {
            next_ordinal: 0,
            components: [("Late".to_string(), u32::MAX)].into_iter().collect(),
            ..Default::default()
        };
        let err = MaskAssigner::default()
            .assign(&registry(&["Fresh"]), Some(&prior))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPriorMapping(_)));

        let prior = PriorMapping {
            next_ordinal: 0,
            components: [("A".to_string(), 0), ("Late".to_string(), u32::MAX)]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let err = MaskAssigner::default()
            .assign(&registry(&["A", "Fresh"]), Some(&prior))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPriorMapping(_)));
    }

    #[test]
    fn conflicting_prior_mapping_is_rejected() {
        let prior = PriorMapping {
            next_ordinal: 2,
            components: [("A".to_string(), 1), ("B".to_string(), 1)]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let err = MaskAssigner::default()
            .assign(&registry(&["A"]), Some(&prior))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPriorMapping(_)));
    }

    #[test]
    fn no_components() {
        let assignment = MaskAssigner::default().assign(&registry(&[]), None).unwrap();

        assert!(assignment.records.is_empty());
        assert_eq!(assignment.width, 0);
        assert_eq!(assignment.mapping, PriorMapping::default());
    }
}
