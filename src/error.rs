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

//! Error types.
//!
//! Mutating operations on a dead entity or a missing component are silent
//! no-ops by contract (see `World::add_component`, `World::remove_component`).
//! `EcsError` exists only for the handful of operations that can genuinely
//! fail: querying a component whose type was never registered, or asking
//! for a typed slice whose column does not match.

use std::fmt;

/// ECS error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// `get_component`/`get_component_mut` found a live entity but no column
    /// for the requested type on its archetype.
    MissingComponent,

    /// A component type was used before being registered and the caller
    /// opted out of auto-registration.
    RegistrationMissing,

    /// A typed table/slice was requested for a type the archetype does not
    /// store a column for.
    TypeMismatch,
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::MissingComponent => write!(f, "entity does not have the requested component"),
            EcsError::RegistrationMissing => write!(f, "component type was used before registration"),
            EcsError::TypeMismatch => write!(f, "archetype has no column matching the requested type"),
        }
    }
}

impl std::error::Error for EcsError {}

/// Result type alias.
pub type Result<T> = std::result::Result<T, EcsError>;
