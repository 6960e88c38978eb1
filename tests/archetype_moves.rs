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

//! Cross-archetype moves exercised from outside the crate: adding and
//! removing components must carry surviving data along and never disturb
//! unrelated entities.

use archetype_ecs::World;

#[derive(Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

struct Velocity {
    dx: f32,
    dy: f32,
}

struct Name(String);

#[test]
fn data_survives_several_add_remove_cycles() {
    let mut world = World::new();
    let e = world.create_entity();

    world.add_component(e, Position { x: 1.0, y: 2.0 });
    world.add_component(e, Velocity { dx: 0.5, dy: -0.5 });
    world.add_component(e, Name("hero".to_string()));

    world.remove_component::<Velocity>(e);
    assert_eq!(world.get_component::<Position>(e).unwrap().x, 1.0);
    assert_eq!(world.get_component::<Name>(e).unwrap().0, "hero");

    world.add_component(e, Velocity { dx: 9.0, dy: 9.0 });
    assert_eq!(world.get_component::<Velocity>(e).unwrap().dx, 9.0);
    assert_eq!(world.get_component::<Position>(e).unwrap().x, 1.0);

    world.remove_component::<Name>(e);
    world.remove_component::<Position>(e);
    world.remove_component::<Velocity>(e);
    assert!(!world.has_component::<Position>(e));
    assert!(!world.has_component::<Velocity>(e));
    assert!(!world.has_component::<Name>(e));
}

#[test]
fn unrelated_entities_are_unaffected_by_a_neighbors_move() {
    let mut world = World::new();

    let bystander = world.create_entity();
    world.add_component(bystander, Position { x: 100.0, y: 200.0 });
    world.add_component(bystander, Velocity { dx: 1.0, dy: 1.0 });

    let mover = world.create_entity();
    world.add_component(mover, Position { x: 0.0, y: 0.0 });
    world.add_component(mover, Velocity { dx: 1.0, dy: 1.0 });

    world.remove_component::<Velocity>(mover);
    world.add_component(mover, Name("renamed".to_string()));

    assert_eq!(*world.get_component::<Position>(bystander).unwrap(), Position { x: 100.0, y: 200.0 });
    assert_eq!(world.get_component::<Velocity>(bystander).unwrap().dx, 1.0);
}

#[test]
fn dropping_a_component_with_a_destructor_runs_it_exactly_once() {
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counted(Rc<RefCell<u32>>);
    impl Drop for Counted {
        fn drop(&mut self) {
            *self.0.borrow_mut() += 1;
        }
    }

    let drop_count = Rc::new(RefCell::new(0));
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component(e, Counted(drop_count.clone()));
    assert_eq!(*drop_count.borrow(), 0);

    world.remove_component::<Counted>(e);
    assert_eq!(*drop_count.borrow(), 1);

    let e2 = world.create_entity();
    world.add_component(e2, Counted(drop_count.clone()));
    world.delete_entity(e2);
    assert_eq!(*drop_count.borrow(), 2);
}

#[test]
fn a_carried_drop_component_survives_a_move_and_drops_exactly_once() {
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counted(Rc<RefCell<u32>>);
    impl Drop for Counted {
        fn drop(&mut self) {
            *self.0.borrow_mut() += 1;
        }
    }

    let drop_count = Rc::new(RefCell::new(0));
    let mut world = World::new();
    let e = world.create_entity();

    world.add_component(e, Counted(drop_count.clone()));
    world.add_component(e, Position { x: 1.0, y: 2.0 });
    // Counted is carried across this move (present in both the old and new
    // archetype); only Position's absence changes the signature.
    world.add_component(e, Velocity { dx: 0.0, dy: 0.0 });
    assert_eq!(*drop_count.borrow(), 0, "carried value must not be dropped by the move");

    world.remove_component::<Velocity>(e);
    assert_eq!(*drop_count.borrow(), 0, "still carried, still not dropped");
    assert_eq!(world.get_component::<Position>(e).unwrap().x, 1.0);

    world.delete_entity(e);
    assert_eq!(*drop_count.borrow(), 1, "final discard must drop exactly once");
}
