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

//! Entity-lifecycle behaviour observed through the public `World` API rather
//! than the internal `EntityIndex` directly.

use archetype_ecs::World;

#[test]
fn recycled_handles_are_rejected_once_stale() {
    let mut world = World::new();

    let e1 = world.create_entity();
    let e2 = world.create_entity();
    world.delete_entity(e1);

    let recycled = world.create_entity();
    assert_ne!(recycled, e1);
    assert!(world.is_alive(recycled));
    assert!(world.is_alive(e2));
    assert!(!world.is_alive(e1));

    // The stale handle must not be able to delete the slot it used to name.
    world.delete_entity(e1);
    assert!(world.is_alive(recycled));
}

#[test]
fn many_entities_survive_interleaved_create_and_delete() {
    let mut world = World::new();
    let mut alive = Vec::new();

    for i in 0..500 {
        let e = world.create_entity();
        alive.push(e);
        if i % 3 == 0 && alive.len() > 2 {
            let victim = alive.remove(alive.len() / 2);
            world.delete_entity(victim);
        }
    }

    for &e in &alive {
        assert!(world.is_alive(e));
    }
    assert_eq!(world.entity_count(), alive.len());
}
