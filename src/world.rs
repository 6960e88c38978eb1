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

//! The central `World`: wires the entity index, component registry and
//! archetype graph together into the entity operations from section 4.5 of
//! the design (`add_component`, `remove_component`, `delete_entity`, ...).

use std::mem;

use rustc_hash::FxHashSet;

use crate::archetype::{Archetype, ArchetypeIndex};
use crate::component::{Component, ComponentId, ComponentRegistry};
use crate::entity::{EntityId, EntityIndex, EntityLocation, DEFAULT_VERSION_BITS};
use crate::error::{EcsError, Result};
use crate::graph::ArchetypeGraph;

/// Index of the archetype that holds entities with no components.
const EMPTY_ARCHETYPE: ArchetypeIndex = 0;

/// Central ECS world: owns every entity, archetype and component column.
///
/// The world is not thread-safe by design (see the concurrency model in the
/// design doc) -- every operation takes `&mut self` and runs to completion
/// synchronously.
pub struct World {
    entities: EntityIndex,
    registry: ComponentRegistry,
    graph: ArchetypeGraph,
}

impl World {
    /// Create a new world with generational entity versioning enabled at
    /// the default 16-bit width.
    pub fn new() -> Self {
        Self::with_entity_versioning(true, DEFAULT_VERSION_BITS)
    }

    /// Create a world with an explicit entity-versioning policy. Passing
    /// `versioning = false` trades away stale-handle detection for handles
    /// that are bitwise-stable across recycling.
    pub fn with_entity_versioning(versioning: bool, version_bits: u32) -> Self {
        Self {
            entities: EntityIndex::new(versioning, version_bits),
            registry: ComponentRegistry::new(),
            graph: ArchetypeGraph::new(),
        }
    }

    // ---------------------------------------------------------------
    // Component registration
    // ---------------------------------------------------------------

    /// Register `T`, returning its stable id. Idempotent.
    pub fn register_component<T: Component>(&mut self) -> ComponentId {
        self.registry.register::<T>()
    }

    // ---------------------------------------------------------------
    // Entity lifecycle
    // ---------------------------------------------------------------

    /// Create a new entity with no components, placed in the empty archetype.
    pub fn create_entity(&mut self) -> EntityId {
        let entity = self.entities.add();
        let row = self
            .graph
            .get_mut(EMPTY_ARCHETYPE)
            .expect("empty archetype always exists")
            .append_entity(entity);
        self.entities.set_location(entity, EntityLocation { archetype: EMPTY_ARCHETYPE, row });
        entity
    }

    /// Whether `entity` is a currently-live handle.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Delete an entity and free its row. Silent no-op if `entity` is dead.
    pub fn delete_entity(&mut self, entity: EntityId) {
        let Some(location) = self.entities.location(entity) else {
            return;
        };
        let archetype = self
            .graph
            .get_mut(location.archetype)
            .expect("live entity must point at an existing archetype");
        // Nothing is carried anywhere -- the entity is being discarded
        // entirely, so every column drops its value normally.
        let swapped = archetype.swap_remove_row(location.row, &FxHashSet::default());
        if let Some(swapped_entity) = swapped {
            self.entities.set_location(swapped_entity, location);
        }
        self.entities.remove(entity);
    }

    pub fn location(&self, entity: EntityId) -> Option<EntityLocation> {
        self.entities.location(entity)
    }

    // ---------------------------------------------------------------
    // Component access
    // ---------------------------------------------------------------

    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        let Some(location) = self.entities.location(entity) else {
            return false;
        };
        let Some(id) = self.registry.id_of::<T>() else {
            return false;
        };
        self.graph
            .get(location.archetype)
            .map(|archetype| archetype.has_component(id))
            .unwrap_or(false)
    }

    /// Returns `None` if the entity is dead, the type was never registered,
    /// or the entity's archetype has no such component.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        let location = self.entities.location(entity)?;
        let id = self.registry.id_of::<T>()?;
        let archetype = self.graph.get(location.archetype)?;

        if mem::size_of::<T>() == 0 {
            return if archetype.has_component(id) {
                // SAFETY: T is zero-sized, so dereferencing a dangling,
                // well-aligned pointer reads no memory.
                Some(unsafe { &*std::ptr::NonNull::<T>::dangling().as_ptr() })
            } else {
                None
            };
        }

        archetype.get_column(id)?.get::<T>(location.row)
    }

    /// Like [`get_component`](Self::get_component), but distinguishes *why*
    /// no reference came back instead of collapsing every case to `None`.
    /// Does not auto-register `T` -- a type that was never registered is
    /// reported as [`EcsError::RegistrationMissing`] rather than silently
    /// treated as absent.
    pub fn try_get_component<T: Component>(&self, entity: EntityId) -> Result<&T> {
        let id = self.registry.id_of::<T>().ok_or(EcsError::RegistrationMissing)?;
        let location = self.entities.location(entity).ok_or(EcsError::MissingComponent)?;
        let archetype = self
            .graph
            .get(location.archetype)
            .expect("live entity must point at an existing archetype");

        if mem::size_of::<T>() == 0 {
            return if archetype.has_component(id) {
                // SAFETY: see get_component.
                Ok(unsafe { &*std::ptr::NonNull::<T>::dangling().as_ptr() })
            } else {
                Err(EcsError::MissingComponent)
            };
        }

        match archetype.get_column(id) {
            Some(column) => column.get::<T>(location.row).ok_or(EcsError::MissingComponent),
            // Registered as a tag, not as data: the archetype's
            // representation of `T` does not match what a non-zero-sized
            // `T` expects.
            None if archetype.has_component(id) => Err(EcsError::TypeMismatch),
            None => Err(EcsError::MissingComponent),
        }
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        let location = self.entities.location(entity)?;
        let id = self.registry.id_of::<T>()?;
        let archetype = self.graph.get_mut(location.archetype)?;

        if mem::size_of::<T>() == 0 {
            return if archetype.has_component(id) {
                // SAFETY: see get_component.
                Some(unsafe { &mut *std::ptr::NonNull::<T>::dangling().as_ptr() })
            } else {
                None
            };
        }

        archetype.get_column_mut(id)?.get_mut::<T>(location.row)
    }

    /// Add (or overwrite) a component on `entity`. Silent no-op if `entity`
    /// is dead.
    ///
    /// Moves the entity to a new archetype unless it already carries `T`, in
    /// which case the existing value is overwritten in place.
    pub fn add_component<T: Component>(&mut self, entity: EntityId, value: T) {
        // Registration happens unconditionally, before the liveness check:
        // auto-registering `T` is part of this method's contract regardless
        // of whether `entity` turns out to be dead.
        let component_id = self.registry.register::<T>();
        let Some(location) = self.entities.location(entity) else {
            return;
        };
        let is_tag = mem::size_of::<T>() == 0;
        let old_index = location.archetype;
        let old_row = location.row;

        let already_present = self
            .graph
            .get(old_index)
            .expect("live entity must point at an existing archetype")
            .has_component(component_id);

        if already_present {
            if !is_tag {
                if let Some(column) = self
                    .graph
                    .get_mut(old_index)
                    .and_then(|archetype| archetype.get_column_mut(component_id))
                {
                    column.write_overwrite(old_row, value);
                }
            }
            return;
        }

        let new_index = self.graph.add_edge(old_index, component_id, is_tag, &self.registry);
        self.move_entity(entity, old_index, old_row, new_index);

        if !is_tag {
            let new_row = self
                .entities
                .location(entity)
                .expect("entity was just moved")
                .row;
            self.graph
                .get_mut(new_index)
                .expect("destination archetype was just interned")
                .get_column_mut(component_id)
                .expect("destination archetype was interned with a column for this component")
                .write_init(new_row, value);
        }
    }

    /// Remove a component from `entity`. Silent no-op if `entity` is dead or
    /// does not carry `T` (or `T` was never registered).
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) {
        let Some(location) = self.entities.location(entity) else {
            return;
        };
        let Some(component_id) = self.registry.id_of::<T>() else {
            return;
        };
        let old_index = location.archetype;
        let has_it = self
            .graph
            .get(old_index)
            .expect("live entity must point at an existing archetype")
            .has_component(component_id);
        if !has_it {
            return;
        }

        let new_index = self.graph.remove_edge(old_index, component_id, &self.registry);
        self.move_entity(entity, old_index, location.row, new_index);
    }

    /// Mark `T` disabled on `entity` without moving it to a new archetype.
    /// Silent no-op if the entity is dead or does not carry `T`.
    pub fn disable_component<T: Component>(&mut self, entity: EntityId) {
        self.set_disabled::<T>(entity, true);
    }

    pub fn enable_component<T: Component>(&mut self, entity: EntityId) {
        self.set_disabled::<T>(entity, false);
    }

    fn set_disabled<T: Component>(&mut self, entity: EntityId, disabled: bool) {
        let Some(location) = self.entities.location(entity) else {
            return;
        };
        let Some(component_id) = self.registry.id_of::<T>() else {
            return;
        };
        if let Some(archetype) = self.graph.get_mut(location.archetype) {
            if archetype.has_component(component_id) {
                archetype.set_disabled(component_id, disabled);
            }
        }
    }

    /// Move `entity` from `(old_index, old_row)` to `new_index`.
    ///
    /// Ordering follows the spec exactly: append into the destination
    /// before swap-removing from the source, so the entity is never
    /// transiently missing from the world, then fix up the swapped-in
    /// entity's location last.
    fn move_entity(&mut self, entity: EntityId, old_index: ArchetypeIndex, old_row: usize, new_index: ArchetypeIndex) {
        debug_assert_ne!(old_index, new_index);

        let new_row = self
            .graph
            .get_mut(new_index)
            .expect("destination archetype must already be interned")
            .append_entity(entity);

        self.graph.copy_shared_columns(old_index, old_row, new_index, new_row);

        // Components present in both archetypes had their value carried into
        // the destination by the copy above; the source's swap-remove must
        // not also drop them, or the destination's copy becomes a
        // use-after-free (Rc/Arc) or a double-free (String/Vec/Box).
        let carried: FxHashSet<ComponentId> = {
            let old_archetype = self.graph.get(old_index).expect("source archetype must still exist");
            let new_archetype = self.graph.get(new_index).expect("destination archetype must already be interned");
            old_archetype
                .component_ids()
                .iter()
                .copied()
                .filter(|&id| new_archetype.has_component(id))
                .collect()
        };

        // The entity is now reachable from its new archetype; update its
        // location before touching the old archetype so it is never
        // observably absent from the world.
        self.entities.set_location(entity, EntityLocation { archetype: new_index, row: new_row });

        let swapped = self
            .graph
            .get_mut(old_index)
            .expect("source archetype must still exist")
            .swap_remove_row(old_row, &carried);
        if let Some(swapped_entity) = swapped {
            self.entities.set_location(swapped_entity, EntityLocation { archetype: old_index, row: old_row });
        }
    }

    // ---------------------------------------------------------------
    // Query primitive
    // ---------------------------------------------------------------

    /// Archetypes whose data signature is a superset of `components`. This
    /// is the sole query primitive the core exposes; filters like "has X
    /// and not Y" are composed on top of it.
    pub fn archetypes_with(&self, components: &[ComponentId]) -> Vec<ArchetypeIndex> {
        self.graph.archetypes_with(components)
    }

    pub fn archetype(&self, index: ArchetypeIndex) -> Option<&Archetype> {
        self.graph.get(index)
    }

    pub fn archetype_count(&self) -> usize {
        self.graph.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Contiguous typed slice of every value of `T` stored by `archetype`,
    /// in entity order. `None` if the archetype has no column for `T`.
    pub fn get_table<T: Component>(&self, archetype: ArchetypeIndex) -> Option<&[T]> {
        let id = self.registry.id_of::<T>()?;
        Some(self.graph.get(archetype)?.get_column(id)?.as_slice::<T>())
    }

    pub fn get_table_mut<T: Component>(&mut self, archetype: ArchetypeIndex) -> Option<&mut [T]> {
        let id = self.registry.id_of::<T>()?;
        Some(self.graph.get_mut(archetype)?.get_column_mut(id)?.as_slice_mut::<T>())
    }

    pub fn component_id<T: Component>(&self) -> Option<ComponentId> {
        self.registry.id_of::<T>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
