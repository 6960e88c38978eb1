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

//! Archetype storage: one byte-column per data component, kept in lockstep
//! with the entity vector under append / swap-remove.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::component::{Component, ComponentId, ComponentTypeInfo};
use crate::entity::EntityId;
use crate::utils::fnv1a_ids;

/// Index of an archetype within the owning [`crate::graph::ArchetypeGraph`].
pub type ArchetypeIndex = usize;

/// Type-erased, byte-addressed storage for one component type's data across
/// every entity in an archetype. Row `i` holds the bytes for the entity at
/// position `i` of the archetype's entity vector.
pub struct ComponentColumn {
    data: Vec<u8>,
    item_size: usize,
    drop_fn: Option<unsafe fn(*mut u8)>,
}

impl ComponentColumn {
    pub(crate) fn new(info: &ComponentTypeInfo) -> Self {
        debug_assert!(info.size > 0, "tags do not get a column");
        Self {
            data: Vec::new(),
            item_size: info.size,
            drop_fn: info.drop_fn,
        }
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.data.len() / self.item_size
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append one uninitialised row. The caller must write a value into it
    /// before it is read.
    fn grow_uninit(&mut self) {
        let new_len = self.data.len() + self.item_size;
        self.data.resize(new_len, 0);
    }

    /// Write a value into a row that has never held a valid value (e.g. one
    /// produced by `grow_uninit`). Does not run any destructor on the prior
    /// bytes -- they are not a live `T`.
    pub fn write_init<T: Component>(&mut self, row: usize, value: T) {
        debug_assert_eq!(self.item_size, std::mem::size_of::<T>());
        let offset = row * self.item_size;
        debug_assert!(offset + self.item_size <= self.data.len());
        unsafe {
            let ptr = self.data.as_mut_ptr().add(offset) as *mut T;
            std::ptr::write(ptr, value);
        }
    }

    /// Overwrite a row that already holds a live value, dropping the old one first.
    pub fn write_overwrite<T: Component>(&mut self, row: usize, value: T) {
        debug_assert_eq!(self.item_size, std::mem::size_of::<T>());
        let offset = row * self.item_size;
        debug_assert!(offset + self.item_size <= self.data.len());
        unsafe {
            let ptr = self.data.as_mut_ptr().add(offset) as *mut T;
            std::ptr::drop_in_place(ptr);
            std::ptr::write(ptr, value);
        }
    }

    pub fn get<T: Component>(&self, row: usize) -> Option<&T> {
        let offset = row * self.item_size;
        if offset + self.item_size > self.data.len() {
            return None;
        }
        Some(unsafe { &*(self.data.as_ptr().add(offset) as *const T) })
    }

    pub fn get_mut<T: Component>(&mut self, row: usize) -> Option<&mut T> {
        let offset = row * self.item_size;
        if offset + self.item_size > self.data.len() {
            return None;
        }
        Some(unsafe { &mut *(self.data.as_mut_ptr().add(offset) as *mut T) })
    }

    /// Raw slice view of every row, typed as `T`. Length equals `len()`.
    ///
    /// # Panics
    /// Panics (in debug builds) if `T`'s size does not match the column's
    /// item size -- callers must have checked the column belongs to `T`.
    pub fn as_slice<T: Component>(&self) -> &[T] {
        debug_assert_eq!(self.item_size, std::mem::size_of::<T>());
        unsafe { std::slice::from_raw_parts(self.data.as_ptr() as *const T, self.len()) }
    }

    pub fn as_slice_mut<T: Component>(&mut self) -> &mut [T] {
        debug_assert_eq!(self.item_size, std::mem::size_of::<T>());
        let len = self.len();
        unsafe { std::slice::from_raw_parts_mut(self.data.as_mut_ptr() as *mut T, len) }
    }

    /// Copy the bytes of `src_row` in `self` into `dst_row` of `dst`. Used to
    /// carry a shared component across an archetype move. Requires both
    /// columns to hold the same component type (same item size).
    fn copy_row_into(&self, src_row: usize, dst: &mut ComponentColumn, dst_row: usize) {
        debug_assert_eq!(self.item_size, dst.item_size);
        let src_off = src_row * self.item_size;
        let dst_off = dst_row * dst.item_size;
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.data.as_ptr().add(src_off),
                dst.data.as_mut_ptr().add(dst_off),
                self.item_size,
            );
        }
    }

    /// Remove `row`, swapping the last row into its place and shrinking the
    /// column by one element.
    ///
    /// `skip_drop` must be `true` when the value at `row` has already had
    /// its ownership transferred elsewhere (carried into another archetype
    /// by `copy_row_into`) -- in that case the bytes are discarded without
    /// running their destructor, since the destructor's one legitimate run
    /// belongs to the copy that now owns them. Otherwise the destructor for
    /// the discarded occupant of `row` runs here.
    fn swap_remove(&mut self, row: usize, skip_drop: bool) {
        let last = self.len() - 1;
        let row_offset = row * self.item_size;
        let last_offset = last * self.item_size;
        unsafe {
            if !skip_drop {
                if let Some(drop_fn) = self.drop_fn {
                    drop_fn(self.data.as_mut_ptr().add(row_offset));
                }
            }
            if row != last {
                std::ptr::copy_nonoverlapping(
                    self.data.as_ptr().add(last_offset),
                    self.data.as_mut_ptr().add(row_offset),
                    self.item_size,
                );
            }
        }
        self.data.truncate(last_offset);
    }
}

impl Drop for ComponentColumn {
    fn drop(&mut self) {
        if let Some(drop_fn) = self.drop_fn {
            for i in 0..self.len() {
                let offset = i * self.item_size;
                unsafe {
                    drop_fn(self.data.as_mut_ptr().add(offset));
                }
            }
        }
    }
}

/// One archetype: a group of entities sharing an identical component
/// signature, its columns, its tag/disabled sets, and cached add/remove
/// transitions to neighboring archetypes.
pub struct Archetype {
    id: u64,
    component_ids: Vec<ComponentId>,
    tag_set: FxHashSet<ComponentId>,
    disabled_set: FxHashSet<ComponentId>,
    entities: Vec<EntityId>,
    columns: Vec<ComponentColumn>,
    column_index: FxHashMap<ComponentId, usize>,
    pub(crate) add_edges: FxHashMap<ComponentId, ArchetypeIndex>,
    pub(crate) remove_edges: FxHashMap<ComponentId, ArchetypeIndex>,
}

impl Archetype {
    /// Build a new archetype for the given signature. `component_ids` must
    /// already be sorted ascending (invariant A3); `infos` supplies the
    /// matching size/drop metadata, in the same order, for every *data*
    /// component (tags are carried in `tag_set` only, since they have no
    /// column storage).
    pub(crate) fn new(
        component_ids: Vec<ComponentId>,
        infos: &[ComponentTypeInfo],
        tag_set: FxHashSet<ComponentId>,
        disabled_set: FxHashSet<ComponentId>,
    ) -> Self {
        debug_assert!(component_ids.windows(2).all(|w| w[0] < w[1]), "signature must be sorted");
        debug_assert_eq!(component_ids.len(), infos.len());

        let mut columns = Vec::with_capacity(component_ids.len());
        let mut column_index = FxHashMap::default();
        for (i, (&id, info)) in component_ids.iter().zip(infos).enumerate() {
            columns.push(ComponentColumn::new(info));
            column_index.insert(id, i);
        }

        let id = Self::hash_signature(&component_ids, &tag_set);

        Self {
            id,
            component_ids,
            tag_set,
            disabled_set,
            entities: Vec::new(),
            columns,
            column_index,
            add_edges: FxHashMap::default(),
            remove_edges: FxHashMap::default(),
        }
    }

    /// FNV-1a over the sorted data-component ids followed by the sorted tag
    /// ids, insensitive to insertion order (invariant A3).
    pub(crate) fn hash_signature(component_ids: &[ComponentId], tag_set: &FxHashSet<ComponentId>) -> u64 {
        let mut tags: Vec<u64> = tag_set.iter().map(|t| t.to_bits()).collect();
        tags.sort_unstable();
        let mut bits: Vec<u64> = component_ids.iter().map(|c| c.to_bits()).collect();
        bits.extend(tags);
        fnv1a_ids(&bits)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn component_ids(&self) -> &[ComponentId] {
        &self.component_ids
    }

    pub fn tag_set(&self) -> &FxHashSet<ComponentId> {
        &self.tag_set
    }

    pub fn disabled_set(&self) -> &FxHashSet<ComponentId> {
        &self.disabled_set
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether this archetype's signature contains `component` as data or tag.
    pub fn has_component(&self, component: ComponentId) -> bool {
        self.column_index.contains_key(&component) || self.tag_set.contains(&component)
    }

    pub fn is_disabled(&self, component: ComponentId) -> bool {
        self.disabled_set.contains(&component)
    }

    pub(crate) fn set_disabled(&mut self, component: ComponentId, disabled: bool) {
        if disabled {
            self.disabled_set.insert(component);
        } else {
            self.disabled_set.remove(&component);
        }
    }

    pub fn column_index(&self, component: ComponentId) -> Option<usize> {
        self.column_index.get(&component).copied()
    }

    pub fn get_column(&self, component: ComponentId) -> Option<&ComponentColumn> {
        let idx = self.column_index(component)?;
        self.columns.get(idx)
    }

    pub fn get_column_mut(&mut self, component: ComponentId) -> Option<&mut ComponentColumn> {
        let idx = self.column_index.get(&component).copied()?;
        self.columns.get_mut(idx)
    }

    /// Append a fresh row for `entity`: push the entity and grow every data
    /// column by one uninitialised element. Returns the new row index.
    pub(crate) fn append_entity(&mut self, entity: EntityId) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in &mut self.columns {
            column.grow_uninit();
        }
        debug_assert!(self.check_column_lengths());
        row
    }

    /// Swap-remove `row` from the entity vector and every column. Returns
    /// the entity that was swapped into `row`, if any (the caller must
    /// update that entity's index location).
    ///
    /// `carried` names the components whose value at `row` has already been
    /// copied into a destination archetype by `copy_shared_columns_into` as
    /// part of an archetype move -- those columns are discarded here
    /// *without* running their destructor, since the copy now owns the
    /// value. Pass an empty set (e.g. when deleting an entity outright) to
    /// drop every column normally.
    pub(crate) fn swap_remove_row(&mut self, row: usize, carried: &FxHashSet<ComponentId>) -> Option<EntityId> {
        debug_assert!(row < self.entities.len());
        self.entities.swap_remove(row);
        for (&component_id, &column_idx) in &self.column_index {
            let skip_drop = carried.contains(&component_id);
            self.columns[column_idx].swap_remove(row, skip_drop);
        }
        debug_assert!(self.check_column_lengths());
        if row < self.entities.len() {
            Some(self.entities[row])
        } else {
            None
        }
    }

    /// Copy every data component shared between `self` and `dst` from
    /// `src_row` to `dst_row`. Used when moving an entity across an
    /// add/remove edge: components untouched by the transition are carried
    /// over byte-for-byte.
    pub(crate) fn copy_shared_columns_into(&self, src_row: usize, dst: &mut Archetype, dst_row: usize) {
        for (&component, &src_idx) in &self.column_index {
            if let Some(&dst_idx) = dst.column_index.get(&component) {
                self.columns[src_idx].copy_row_into(src_row, &mut dst.columns[dst_idx], dst_row);
            }
        }
    }

    fn check_column_lengths(&self) -> bool {
        self.columns.iter().all(|c| c.len() == self.entities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentRegistry;

    fn build_archetype(registry: &mut ComponentRegistry, ids: &[ComponentId]) -> Archetype {
        let infos: Vec<ComponentTypeInfo> = ids.iter().map(|id| registry.info(*id).unwrap().clone()).collect();
        Archetype::new(ids.to_vec(), &infos, FxHashSet::default(), FxHashSet::default())
    }

    #[test]
    fn append_and_swap_remove_keep_columns_in_lockstep() {
        let mut registry = ComponentRegistry::new();
        let pos_id = registry.register::<(f32, f32)>();
        let mut arch = build_archetype(&mut registry, &[pos_id]);

        let e0 = EntityId::from_bits(1);
        let e1 = EntityId::from_bits(2);
        let e2 = EntityId::from_bits(3);

        let r0 = arch.append_entity(e0);
        arch.get_column_mut(pos_id).unwrap().write_init(r0, (1.0f32, 1.0f32));
        let r1 = arch.append_entity(e1);
        arch.get_column_mut(pos_id).unwrap().write_init(r1, (2.0f32, 2.0f32));
        let r2 = arch.append_entity(e2);
        arch.get_column_mut(pos_id).unwrap().write_init(r2, (3.0f32, 3.0f32));

        let swapped = arch.swap_remove_row(0, &FxHashSet::default());
        assert_eq!(swapped, Some(e2));
        assert_eq!(arch.len(), 2);
        // e2's data should now occupy row 0.
        let val: &(f32, f32) = arch.get_column(pos_id).unwrap().get(0).unwrap();
        assert_eq!(*val, (3.0f32, 3.0f32));
    }

    #[test]
    fn signature_hash_is_insensitive_to_component_order() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<u8>();
        let b = registry.register::<u16>();

        let mut sig1 = vec![a, b];
        sig1.sort();
        let mut sig2 = vec![b, a];
        sig2.sort();

        assert_eq!(
            Archetype::hash_signature(&sig1, &FxHashSet::default()),
            Archetype::hash_signature(&sig2, &FxHashSet::default())
        );
    }

    #[test]
    fn signature_hash_differs_between_data_and_tag_partition() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<u8>();

        let as_data = Archetype::hash_signature(&[a], &FxHashSet::default());
        let mut as_tag_set = FxHashSet::default();
        as_tag_set.insert(a);
        let as_tag = Archetype::hash_signature(&[], &as_tag_set);

        assert_ne!(as_data, as_tag);
    }
}
