// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The archetype graph: interns archetypes by signature hash and caches the
//! add/remove edges between them, plus the reverse index used by the query
//! primitive.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::archetype::{Archetype, ArchetypeIndex};
use crate::component::{ComponentId, ComponentRegistry};

/// Signature of an archetype: a sorted set of data-component ids plus a
/// sorted set of tag ids. Two archetypes are the same iff both sets match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub data: Vec<ComponentId>,
    pub tags: Vec<ComponentId>,
}

impl Signature {
    pub fn empty() -> Self {
        Self::default()
    }

    fn canonicalize(&mut self) {
        self.data.sort_unstable();
        self.data.dedup();
        self.tags.sort_unstable();
        self.tags.dedup();
    }

    fn with_added(&self, component: ComponentId, is_tag: bool) -> Self {
        let mut sig = self.clone();
        if is_tag {
            sig.tags.push(component);
        } else {
            sig.data.push(component);
        }
        sig.canonicalize();
        sig
    }

    fn with_removed(&self, component: ComponentId) -> Self {
        let mut sig = self.clone();
        sig.data.retain(|&c| c != component);
        sig.tags.retain(|&c| c != component);
        sig
    }
}

/// Owns every archetype in a world and the indices used to find them:
/// signature -> archetype, and component -> archetypes containing it.
pub struct ArchetypeGraph {
    archetypes: Vec<Archetype>,
    by_signature: FxHashMap<Signature, ArchetypeIndex>,
    /// Reverse index: component id -> set of archetypes whose data
    /// signature contains it. Used by the query primitive.
    containing: FxHashMap<ComponentId, FxHashSet<ArchetypeIndex>>,
}

impl ArchetypeGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            archetypes: Vec::with_capacity(16),
            by_signature: FxHashMap::default(),
            containing: FxHashMap::default(),
        };
        // The empty archetype always exists at index 0; every freshly
        // created entity starts there.
        graph.intern(&Signature::empty(), &ComponentRegistry::new());
        graph
    }

    pub fn get(&self, index: ArchetypeIndex) -> Option<&Archetype> {
        self.archetypes.get(index)
    }

    pub fn get_mut(&mut self, index: ArchetypeIndex) -> Option<&mut Archetype> {
        self.archetypes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArchetypeIndex, &Archetype)> {
        self.archetypes.iter().enumerate()
    }

    /// Find or create the archetype for `signature`, registering it in the
    /// reverse index on first creation.
    pub fn intern(&mut self, signature: &Signature, registry: &ComponentRegistry) -> ArchetypeIndex {
        let mut canon = signature.clone();
        canon.canonicalize();

        if let Some(&index) = self.by_signature.get(&canon) {
            return index;
        }

        let infos = canon
            .data
            .iter()
            .map(|&id| registry.info(id).expect("component must be registered before interning").clone())
            .collect::<Vec<_>>();
        let tag_set: FxHashSet<ComponentId> = canon.tags.iter().copied().collect();

        let archetype = Archetype::new(canon.data.clone(), &infos, tag_set, FxHashSet::default());
        let index = self.archetypes.len();
        self.archetypes.push(archetype);
        self.by_signature.insert(canon.clone(), index);

        for &component in canon.data.iter().chain(canon.tags.iter()) {
            self.containing.entry(component).or_default().insert(index);
        }

        tracing::debug!(archetype = index, data = canon.data.len(), tags = canon.tags.len(), "interned new archetype");
        index
    }

    fn signature_of(&self, index: ArchetypeIndex) -> Signature {
        let archetype = &self.archetypes[index];
        Signature {
            data: archetype.component_ids().to_vec(),
            tags: archetype.tag_set().iter().copied().collect(),
        }
    }

    /// Resolve (and cache) the archetype reached by adding `component` to
    /// the archetype at `from`.
    pub fn add_edge(&mut self, from: ArchetypeIndex, component: ComponentId, is_tag: bool, registry: &ComponentRegistry) -> ArchetypeIndex {
        if let Some(&cached) = self.archetypes[from].add_edges.get(&component) {
            return cached;
        }
        let new_signature = self.signature_of(from).with_added(component, is_tag);
        let dest = self.intern(&new_signature, registry);
        self.archetypes[from].add_edges.insert(component, dest);
        dest
    }

    /// Resolve (and cache) the archetype reached by removing `component`
    /// from the archetype at `from`.
    pub fn remove_edge(&mut self, from: ArchetypeIndex, component: ComponentId, registry: &ComponentRegistry) -> ArchetypeIndex {
        if let Some(&cached) = self.archetypes[from].remove_edges.get(&component) {
            return cached;
        }
        let new_signature = self.signature_of(from).with_removed(component);
        let dest = self.intern(&new_signature, registry);
        self.archetypes[from].remove_edges.insert(component, dest);
        dest
    }

    /// Copy every data component shared between the archetypes at `src` and
    /// `dst` from `src_row` to `dst_row`. Grounded on the same
    /// `split_at_mut` trick the teacher's `World::move_entity` uses to hold
    /// two `&mut Archetype` borrows into the same backing `Vec` at once.
    pub(crate) fn copy_shared_columns(&mut self, src: ArchetypeIndex, src_row: usize, dst: ArchetypeIndex, dst_row: usize) {
        debug_assert_ne!(src, dst);
        let (src_arch, dst_arch) = if src < dst {
            let (left, right) = self.archetypes.split_at_mut(dst);
            (&left[src], &mut right[0])
        } else {
            let (left, right) = self.archetypes.split_at_mut(src);
            (&right[0], &mut left[dst])
        };
        src_arch.copy_shared_columns_into(src_row, dst_arch, dst_row);
    }

    /// Archetypes whose data signature is a superset of `components`. Each
    /// archetype appears at most once; iteration order is unspecified but
    /// stable for the lifetime of this call.
    pub fn archetypes_with(&self, components: &[ComponentId]) -> Vec<ArchetypeIndex> {
        if components.is_empty() {
            return (0..self.archetypes.len()).collect();
        }

        // Intersect the reverse index starting from the rarest component to
        // keep the working set small.
        let mut sets: Vec<&FxHashSet<ArchetypeIndex>> = Vec::with_capacity(components.len());
        for component in components {
            match self.containing.get(component) {
                Some(set) => sets.push(set),
                None => return Vec::new(),
            }
        }
        sets.sort_by_key(|s| s.len());

        let mut result: Vec<ArchetypeIndex> = sets[0].iter().copied().collect();
        for set in &sets[1..] {
            result.retain(|index| set.contains(index));
        }
        result
    }
}

impl Default for ArchetypeGraph {
    fn default() -> Self {
        Self::new()
    }
}
