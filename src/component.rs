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

//! Component identity: the registry that maps a Rust type to a stable
//! [`ComponentId`] plus the size/alignment/drop metadata archetypes need to
//! store it.

use std::any::TypeId;
use std::hash::{Hash, Hasher};
use std::mem;

use rustc_hash::{FxHashMap, FxHasher};

/// Marker trait for components.
///
/// Components must be `'static` (no borrowed data) and safely shareable
/// across the (single-threaded) world.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// Opaque identifier for a registered component type.
///
/// Derived deterministically by hashing the type's [`TypeId`], so repeated
/// registrations of the same type always yield the same id within a
/// process, without needing any mutable counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn of_type(type_id: TypeId) -> Self {
        let mut hasher = FxHasher::default();
        type_id.hash(&mut hasher);
        ComponentId(hasher.finish())
    }

    /// Raw 64-bit value, for use as a map key or archetype-signature element.
    pub fn to_bits(self) -> u64 {
        self.0
    }
}

/// Size, alignment and drop metadata for a registered component type.
///
/// `size == 0` marks the type as a tag: it participates in archetype
/// identity but occupies no column.
#[derive(Clone)]
pub struct ComponentTypeInfo {
    pub size: usize,
    pub align: usize,
    pub type_id: TypeId,
    pub(crate) drop_fn: Option<unsafe fn(*mut u8)>,
}

impl ComponentTypeInfo {
    fn of<T: Component>() -> Self {
        Self {
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            type_id: TypeId::of::<T>(),
            drop_fn: if mem::needs_drop::<T>() {
                Some(|ptr| unsafe { std::ptr::drop_in_place(ptr as *mut T) })
            } else {
                None
            },
        }
    }

    /// Whether this component type is a zero-sized tag.
    pub fn is_tag(&self) -> bool {
        self.size == 0
    }
}

/// Per-world registry mapping component types to stable ids.
#[derive(Default)]
pub struct ComponentRegistry {
    by_type: FxHashMap<TypeId, ComponentId>,
    info: FxHashMap<ComponentId, ComponentTypeInfo>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, returning its id. Idempotent: a type that is already
    /// registered returns the same id and leaves the registry unchanged.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.by_type.get(&type_id) {
            return id;
        }
        let id = ComponentId::of_type(type_id);
        self.by_type.insert(type_id, id);
        self.info.insert(id, ComponentTypeInfo::of::<T>());
        tracing::trace!(type_name = std::any::type_name::<T>(), "registered component type");
        id
    }

    /// Look up the id for `T` without registering it.
    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    pub fn info(&self, id: ComponentId) -> Option<&ComponentTypeInfo> {
        self.info.get(&id)
    }

    /// 0 marks a tag. `None` means the id was never registered.
    pub fn size_of(&self, id: ComponentId) -> Option<usize> {
        self.info.get(&id).map(|info| info.size)
    }

    pub fn is_registered(&self, type_id: TypeId) -> bool {
        self.by_type.contains_key(&type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position {
        #[allow(dead_code)]
        x: f32,
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<Position>();
        let b = registry.register::<Position>();
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_types_get_distinct_ids() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<Position>();
        let b = registry.register::<u32>();
        assert_ne!(a, b);
    }

    #[test]
    fn zero_sized_type_is_reported_as_a_tag() {
        struct Marker;
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Marker>();
        assert_eq!(registry.size_of(id), Some(0));
        assert!(registry.info(id).unwrap().is_tag());
    }
}
