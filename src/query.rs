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

//! Query ergonomics built on top of [`crate::World::archetypes_with`], the
//! core's sole query primitive. Everything here -- `with`/`without`
//! filtering -- is a thin composition layer; it holds no storage of its own.

use crate::archetype::ArchetypeIndex;
use crate::component::{Component, ComponentId};
use crate::world::World;

/// Builds a list of matching archetypes from required and excluded
/// component types, then hands back their indices for use with
/// [`World::get_table`]/[`World::get_table_mut`].
pub struct Query<'w> {
    world: &'w World,
    include: Vec<ComponentId>,
    exclude: Vec<ComponentId>,
    /// Set once a `with::<T>()` names a type that was never registered:
    /// no archetype can possibly match, so `run` short-circuits to empty.
    impossible: bool,
}

impl<'w> Query<'w> {
    pub fn new(world: &'w World) -> Self {
        Self { world, include: Vec::new(), exclude: Vec::new(), impossible: false }
    }

    /// Require entities to carry `T`.
    pub fn with<T: Component>(mut self) -> Self {
        match self.world.component_id::<T>() {
            Some(id) => self.include.push(id),
            None => self.impossible = true,
        }
        self
    }

    /// Exclude entities that carry `T`. A never-registered type excludes
    /// nothing, since no entity can carry it.
    pub fn without<T: Component>(mut self) -> Self {
        if let Some(id) = self.world.component_id::<T>() {
            self.exclude.push(id);
        }
        self
    }

    /// Resolve the archetypes matching this query's filters.
    pub fn run(self) -> Vec<ArchetypeIndex> {
        if self.impossible {
            return Vec::new();
        }
        let mut matches = self.world.archetypes_with(&self.include);
        if !self.exclude.is_empty() {
            matches.retain(|&index| {
                let archetype = self.world.archetype(index).expect("index came from archetypes_with");
                !self.exclude.iter().any(|&id| archetype.has_component(id))
            });
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;
    struct Frozen;

    #[test]
    fn with_and_without_compose_on_top_of_the_primitive() {
        let mut world = World::new();

        let moving = world.create_entity();
        world.add_component(moving, Position);
        world.add_component(moving, Velocity);

        let frozen = world.create_entity();
        world.add_component(frozen, Position);
        world.add_component(frozen, Velocity);
        world.add_component(frozen, Frozen);

        let matches = Query::new(&world).with::<Position>().with::<Velocity>().without::<Frozen>().run();

        let total: usize = matches.iter().filter_map(|&i| world.archetype(i)).map(|a| a.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn querying_an_unregistered_type_yields_nothing() {
        struct NeverRegistered;
        let world = World::new();
        let matches = Query::new(&world).with::<NeverRegistered>().run();
        assert!(matches.is_empty());
    }
}
