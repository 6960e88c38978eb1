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

//! Archetype ECS core - sparse-set entity index, archetype storage and graph.
//!
//! Covers entity/component/archetype bookkeeping only: no scheduler, no
//! parallel system execution, no persistence. See `DESIGN.md` for the
//! boundary and the reasoning behind it.

pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod graph;
pub mod query;
pub mod utils;
pub mod world;

pub use archetype::{Archetype, ArchetypeIndex};
pub use component::{Component, ComponentId, ComponentRegistry};
pub use entity::{EntityId, EntityLocation};
pub use error::{EcsError, Result};
pub use graph::{ArchetypeGraph, Signature};
pub use query::Query;
pub use world::World;
