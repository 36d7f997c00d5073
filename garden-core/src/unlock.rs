//! The unlock graph: which memories open up when another is completed.

use crate::memory::{Memory, MemoryId};
use std::collections::{BTreeMap, HashMap};

/// Mapping from a memory to the memories its completion unlocks.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockGraph {
    successors: HashMap<MemoryId, Vec<MemoryId>>,
}

impl UnlockGraph {
    /// Chain the memories in their given order: each one unlocks the next.
    pub fn sequential(memories: &[Memory]) -> Self {
        let mut successors = HashMap::with_capacity(memories.len());
        for (i, memory) in memories.iter().enumerate() {
            let next = memories.get(i + 1).map(|m| vec![m.id]).unwrap_or_default();
            successors.insert(memory.id, next);
        }
        Self { successors }
    }

    /// Use an explicit rule set, e.g. for branching paths.
    pub fn from_rules(rules: BTreeMap<MemoryId, Vec<MemoryId>>) -> Self {
        Self {
            successors: rules.into_iter().collect(),
        }
    }

    /// Explicit rules if given, otherwise the sequential chain.
    pub fn build(memories: &[Memory], rules: Option<&BTreeMap<MemoryId, Vec<MemoryId>>>) -> Self {
        match rules {
            Some(rules) => Self::from_rules(rules.clone()),
            None => Self::sequential(memories),
        }
    }

    /// Successors of `id`, in rule order. Empty for unknown ids.
    pub fn successors(&self, id: MemoryId) -> &[MemoryId] {
        self.successors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every successor id that does not name one of `memories`.
    pub fn dangling(&self, memories: &[Memory]) -> Vec<(MemoryId, MemoryId)> {
        let mut dangling: Vec<_> = self
            .successors
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (*from, *to)))
            .filter(|(_, to)| !memories.iter().any(|m| m.id == *to))
            .collect();
        dangling.sort();
        dangling
    }

    pub fn len(&self) -> usize {
        self.successors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }
}
