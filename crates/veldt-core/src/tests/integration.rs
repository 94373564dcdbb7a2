//! End-to-end scenarios: tick loop discipline, collision resolution,
//! placement search, and persistence.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use quadrille::Aabb;

use crate::entity::{Entity, EntityFlags, EntityId, MapEntityIndex, Wall};
use crate::error::MapError;
use crate::io::{NodeReader, NodeWriter};
use crate::map::persist::map_file_name;
use crate::map::placement::Placement;
use crate::map::{Map, MapExtension, MapIndex};
use crate::tests::helpers::{test_map, test_map_with_clock, Critter, CritterFactory, ManualClock};

fn solid(pos: Vec2) -> Critter {
    Critter::new(pos, Vec2::new(20.0, 20.0))
}

mod registry_tests {
    use super::*;

    #[test]
    fn every_member_is_spatially_indexed() {
        let mut map = test_map();
        let wall = map.add_wall(Wall::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0)));
        let c1 = map.add_dynamic(Box::new(solid(Vec2::new(40.0, 40.0))));
        let c2 = map.add_dynamic(Box::new(solid(Vec2::new(300.0, 300.0))));
        map.remove_entity(c1);

        assert_eq!(map.entity_count(), 2);
        assert_eq!(map.spatial().len(), map.entity_count());
        for (id, entity) in map.entities() {
            assert!(map.spatial().contains(id));
            assert_eq!(map.spatial().aabb_of(id), Some(entity.aabb()));
        }
        assert!(!map.spatial().contains(c1));
        let _ = (wall, c2);
    }

    #[test]
    fn slot_indices_recycle_lowest_first() {
        let mut map = test_map();
        let a = map.add_dynamic(Box::new(solid(Vec2::new(10.0, 10.0))));
        let b = map.add_dynamic(Box::new(solid(Vec2::new(40.0, 10.0))));
        let c = map.add_dynamic(Box::new(solid(Vec2::new(70.0, 10.0))));
        assert_eq!(map.index_of(a), Some(MapEntityIndex::new(0)));
        assert_eq!(map.index_of(b), Some(MapEntityIndex::new(1)));
        assert_eq!(map.index_of(c), Some(MapEntityIndex::new(2)));

        map.remove_entity(b);
        let d = map.add_dynamic(Box::new(solid(Vec2::new(100.0, 10.0))));
        assert_eq!(map.index_of(d), Some(MapEntityIndex::new(1)));
        assert_eq!(map.dynamic_entity_id(MapEntityIndex::new(1)), Some(d));
    }

    #[test]
    fn conflicting_slot_evicts_the_occupant() {
        let mut map = test_map();
        let first = map.add_dynamic_at(Box::new(solid(Vec2::new(10.0, 10.0))), MapEntityIndex::new(4));
        let second = map.add_dynamic_at(Box::new(solid(Vec2::new(50.0, 10.0))), MapEntityIndex::new(4));

        assert!(map.entity(first).is_none());
        assert_eq!(map.dynamic_entity_id(MapEntityIndex::new(4)), Some(second));
        assert_eq!(map.entity_count(), 1);
        assert!(!map.spatial().contains(first));
    }

    #[test]
    fn join_order_is_observable() {
        let mut map = test_map();
        let w = map.add_wall(Wall::new(Vec2::new(0.0, 0.0), Vec2::new(32.0, 32.0)));
        let c = map.add_dynamic(Box::new(solid(Vec2::new(64.0, 64.0))));
        assert_eq!(map.entity_at(0), Some(w));
        assert_eq!(map.entity_at(1), Some(c));
    }

    #[test]
    fn entities_are_clamped_into_the_map_on_join() {
        let mut map = test_map();
        let id = map.add_dynamic(Box::new(solid(Vec2::new(-10.0, 950.0))));
        let aabb = map.entity(id).unwrap().aabb();
        assert_eq!(aabb.min, Vec2::new(0.0, 940.0));
        assert_eq!(map.spatial().aabb_of(id), Some(aabb));
    }

    #[test]
    #[should_panic(expected = "was not on the map")]
    fn removing_a_missing_entity_asserts() {
        let mut map = test_map();
        map.remove_entity(EntityId::new(999));
    }
}

mod update_loop_tests {
    use super::*;

    #[test]
    fn removing_an_earlier_entity_skips_nobody() {
        let mut map = test_map();
        let a = solid(Vec2::new(10.0, 10.0));
        let log_a = a.log_handle();
        let a_id = map.add_dynamic(Box::new(a));

        let target = Rc::new(Cell::new(Some(a_id)));
        let target2 = Rc::clone(&target);
        let b = solid(Vec2::new(200.0, 10.0)).with_script(move |map| {
            if let Some(id) = target2.take() {
                map.remove_entity(id);
            }
        });
        let log_b = b.log_handle();
        map.add_dynamic(Box::new(b));

        let c = solid(Vec2::new(400.0, 10.0));
        let log_c2 = c.log_handle();
        map.add_dynamic(Box::new(c));

        map.update(10);

        assert_eq!(log_a.borrow().updates, 1);
        assert_eq!(log_b.borrow().updates, 1);
        assert_eq!(log_c2.borrow().updates, 1);
        assert!(map.entity(a_id).is_none());
    }

    #[test]
    fn removing_a_later_entity_never_runs_it() {
        let mut map = test_map();
        let victim = Rc::new(Cell::new(None));
        let victim2 = Rc::clone(&victim);
        let a = solid(Vec2::new(10.0, 10.0)).with_script(move |map| {
            if let Some(id) = victim2.take() {
                map.remove_entity(id);
            }
        });
        let log_a = a.log_handle();
        map.add_dynamic(Box::new(a));

        let b = solid(Vec2::new(200.0, 10.0));
        let log_b = b.log_handle();
        map.add_dynamic(Box::new(b));

        let c = solid(Vec2::new(400.0, 10.0));
        let log_c = c.log_handle();
        let c_id = map.add_dynamic(Box::new(c));
        victim.set(Some(c_id));

        map.update(10);

        assert_eq!(log_a.borrow().updates, 1);
        assert_eq!(log_b.borrow().updates, 1);
        assert_eq!(log_c.borrow().updates, 0);
        assert!(map.entity(c_id).is_none());
    }

    #[test]
    fn an_entity_may_remove_itself() {
        let mut map = test_map();
        let own = Rc::new(Cell::new(None));
        let own2 = Rc::clone(&own);
        let a = solid(Vec2::new(10.0, 10.0)).with_script(move |map| {
            if let Some(id) = own2.take() {
                map.remove_entity(id);
            }
        });
        let log_a = a.log_handle();
        let a_id = map.add_dynamic(Box::new(a));
        own.set(Some(a_id));

        let b = solid(Vec2::new(200.0, 10.0));
        let log_b = b.log_handle();
        map.add_dynamic(Box::new(b));

        map.update(10);

        assert_eq!(log_a.borrow().updates, 1);
        assert_eq!(log_b.borrow().updates, 1);
        assert!(map.entity(a_id).is_none());
        assert!(!map.spatial().contains(a_id));
        assert_eq!(map.entity_count(), 1);
    }

    #[test]
    fn disposed_entities_are_reaped_after_their_update() {
        let mut map = test_map();
        let a = solid(Vec2::new(10.0, 10.0));
        let log = a.log_handle();
        let dispose = a.dispose_handle();
        let id = map.add_dynamic(Box::new(a));

        dispose.set(true);
        map.update(10);

        assert_eq!(log.borrow().updates, 1);
        assert!(map.entity(id).is_none());
        assert_eq!(map.entity_count(), 0);
        assert!(!map.spatial().contains(id));
    }

    #[test]
    fn disposed_non_updateable_entities_are_reaped_too() {
        let mut map = test_map();
        let a = solid(Vec2::new(10.0, 10.0)).with_flags(EntityFlags::empty());
        let log = a.log_handle();
        let dispose = a.dispose_handle();
        let id = map.add_dynamic(Box::new(a));

        dispose.set(true);
        map.update(10);

        // Never ticked, reaped anyway.
        assert_eq!(log.borrow().updates, 0);
        assert!(map.entity(id).is_none());
        assert_eq!(map.entity_count(), 0);
        assert!(!map.spatial().contains(id));
    }

    #[test]
    fn movement_is_clamped_at_the_map_edge() {
        let mut map = test_map();
        let a = solid(Vec2::new(940.0, 100.0)).with_step(Vec2::new(50.0, 0.0));
        let id = map.add_dynamic(Box::new(a));

        map.update(10);

        let aabb = map.entity(id).unwrap().aabb();
        assert_eq!(aabb.min, Vec2::new(940.0, 100.0));
        assert_eq!(map.spatial().aabb_of(id), Some(aabb));
    }
}

mod collision_tests {
    use super::*;

    #[test]
    fn wall_overlap_resolves_along_the_axis_of_least_overlap() {
        let mut map = test_map();
        map.add_wall(Wall::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0)));
        let a = solid(Vec2::new(95.0, 90.0));
        let log = a.log_handle();
        let id = map.add_dynamic(Box::new(a));

        map.update(10);

        // 10 units of overlap vertically beats 15 horizontally.
        assert_eq!(log.borrow().wall_hits, vec![Vec2::new(0.0, -10.0)]);
        let aabb = map.entity(id).unwrap().aabb();
        assert_eq!(aabb.min, Vec2::new(95.0, 80.0));
        assert!(map.is_valid_placement(&aabb));
    }

    #[test]
    fn wall_pass_is_skipped_without_the_collide_flag() {
        let mut map = test_map();
        map.add_wall(Wall::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0)));
        let a = solid(Vec2::new(95.0, 90.0)).with_flags(EntityFlags::UPDATEABLE);
        let log = a.log_handle();
        let id = map.add_dynamic(Box::new(a));

        map.update(10);

        assert!(log.borrow().wall_hits.is_empty());
        assert_eq!(map.entity(id).unwrap().aabb().min, Vec2::new(95.0, 90.0));
    }

    #[test]
    fn both_parties_hear_about_an_entity_contact() {
        let mut map = test_map();
        let a = solid(Vec2::new(100.0, 100.0));
        let log_a = a.log_handle();
        let a_id = map.add_dynamic(Box::new(a));

        // Passive bystander: collides with nothing on its own.
        let b = solid(Vec2::new(110.0, 100.0)).with_flags(EntityFlags::empty());
        let log_b = b.log_handle();
        let b_id = map.add_dynamic(Box::new(b));

        map.update(10);

        let expected = Vec2::new(-10.0, 0.0);
        assert_eq!(log_a.borrow().pushed_into, vec![expected]);
        assert_eq!(log_b.borrow().pushed_from, vec![expected]);
        // The engine reports displacement; it does not apply it.
        assert_eq!(map.entity(a_id).unwrap().aabb().min, Vec2::new(100.0, 100.0));
        assert_eq!(map.entity(b_id).unwrap().aabb().min, Vec2::new(110.0, 100.0));
    }

    #[test]
    fn touching_boxes_do_not_collide() {
        let mut map = test_map();
        map.add_wall(Wall::new(Vec2::new(120.0, 100.0), Vec2::new(50.0, 50.0)));
        let a = solid(Vec2::new(100.0, 100.0));
        let log = a.log_handle();
        map.add_dynamic(Box::new(a));

        map.update(10);

        assert!(log.borrow().wall_hits.is_empty());
    }
}

mod boundary_tests {
    use super::*;

    #[test]
    fn keep_in_map_trims_an_offset() {
        let mut map = test_map();
        let id = map.add_dynamic(Box::new(solid(Vec2::new(10.0, 10.0))));
        let trimmed = map.keep_in_map(id, Vec2::new(-50.0, 30.0));
        assert_eq!(trimmed, Vec2::new(-10.0, 30.0));
    }

    #[test]
    fn safe_teleport_clamps_the_destination() {
        let mut map = test_map();
        let id = map.add_dynamic(Box::new(solid(Vec2::new(10.0, 10.0))));
        map.safe_teleport(id, Vec2::new(2000.0, -50.0));
        let aabb = map.entity(id).unwrap().aabb();
        assert_eq!(aabb.min, Vec2::new(940.0, 0.0));
        assert_eq!(map.spatial().aabb_of(id), Some(aabb));
    }

    #[test]
    fn a_wall_added_out_of_bounds_is_clamped_inside() {
        let mut map = test_map();
        let id = map.add_wall(Wall::new(Vec2::new(1000.0, -30.0), Vec2::new(50.0, 50.0)));

        let aabb = map.entity(id).unwrap().aabb();
        assert_eq!(aabb.min, Vec2::new(910.0, 0.0));
        assert!(map.is_in_boundaries(&aabb));
        // The static index files the clamped box, not the requested one.
        assert_eq!(map.spatial().walls_in_rect(&aabb), vec![id]);
    }

    #[test]
    fn resizing_an_entity_keeps_it_queryable_across_its_new_footprint() {
        let mut map = test_map();
        let id = map.add_dynamic(Box::new(solid(Vec2::new(10.0, 10.0))));
        map.safe_resize(id, Vec2::new(500.0, 500.0));

        assert_eq!(map.spatial().dynamics_at_point(Vec2::new(400.0, 400.0)), vec![id]);
    }

    #[test]
    fn shrinking_the_map_removes_what_no_longer_fits() {
        let mut map = test_map();
        let far_wall = map.add_wall(Wall::new(Vec2::new(800.0, 800.0), Vec2::new(50.0, 50.0)));
        let near = map.add_dynamic(Box::new(solid(Vec2::new(100.0, 100.0))));

        map.set_dimensions(Vec2::new(512.0, 512.0));

        assert!(map.entity(far_wall).is_none());
        assert!(map.entity(near).is_some());
        assert_eq!(map.entity_count(), 1);
        assert!(map
            .spatial()
            .walls_in_rect(&Aabb::from_min_size(Vec2::ZERO, Vec2::new(512.0, 512.0)))
            .is_empty());
    }

    #[test]
    fn growing_the_map_keeps_everything_queryable() {
        let mut map = test_map();
        let wall = map.add_wall(Wall::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0)));
        map.set_dimensions(Vec2::new(2048.0, 2048.0));
        let hits = map
            .spatial()
            .walls_in_rect(&Aabb::from_min_size(Vec2::new(90.0, 90.0), Vec2::new(100.0, 100.0)));
        assert_eq!(hits, vec![wall]);
    }

    mod clamp_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Wherever a safe teleport is asked to go, the entity lands
            /// fully inside the map and the spatial index agrees.
            #[test]
            fn safe_teleport_always_lands_inside(
                x in -2000.0f32..4000.0,
                y in -2000.0f32..4000.0,
            ) {
                let mut map = test_map();
                let critter = Critter::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
                let id = map.add_dynamic(Box::new(critter));
                map.safe_teleport(id, Vec2::new(x, y));

                let aabb = map.entity(id).unwrap().aabb();
                prop_assert!(map.is_in_boundaries(&aabb));
                prop_assert_eq!(map.spatial().aabb_of(id), Some(aabb));
            }

            /// A trimmed offset never moves the entity out of bounds.
            #[test]
            fn keep_in_map_offsets_stay_inside(
                dx in -2000.0f32..2000.0,
                dy in -2000.0f32..2000.0,
            ) {
                let mut map = test_map();
                let critter = Critter::new(Vec2::new(400.0, 400.0), Vec2::new(20.0, 20.0));
                let id = map.add_dynamic(Box::new(critter));
                let trimmed = map.keep_in_map(id, Vec2::new(dx, dy));

                let aabb = map.entity(id).unwrap().aabb().translated(trimmed);
                prop_assert!(map.is_in_boundaries(&aabb));
            }
        }
    }

    #[test]
    fn snap_to_walls_suggests_the_flush_position() {
        let mut map = test_map();
        map.add_wall(Wall::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0)));
        let id = map.add_dynamic(Box::new(solid(Vec2::new(152.0, 120.0))));
        let snapped = map.snap_to_walls(id, 10.0).unwrap();
        assert_eq!(snapped, Vec2::new(150.0, 120.0));
    }
}

mod placement_tests {
    use super::*;

    #[test]
    fn an_unobstructed_box_is_valid_as_is() {
        let map = test_map();
        let rect = Aabb::from_min_size(Vec2::new(110.0, 110.0), Vec2::new(20.0, 20.0));
        assert_eq!(map.find_valid_placement(&rect), Placement::Valid);
    }

    #[test]
    fn a_blocked_box_relocates_to_the_nearest_candidate() {
        let mut map = test_map();
        map.add_wall(Wall::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0)));
        let rect = Aabb::from_min_size(Vec2::new(110.0, 110.0), Vec2::new(20.0, 20.0));

        let Placement::Relocated(pos) = map.find_valid_placement(&rect) else {
            panic!("expected relocation");
        };
        assert_eq!(pos, Vec2::new(110.0, 79.0));
        assert!(map.is_valid_placement(&Aabb::from_min_size(pos, rect.size())));
    }

    #[test]
    fn a_fully_walled_map_has_no_placement() {
        let mut map = test_map();
        map.add_wall(Wall::new(Vec2::ZERO, Vec2::new(960.0, 960.0)));
        let rect = Aabb::from_min_size(Vec2::new(110.0, 110.0), Vec2::new(20.0, 20.0));
        assert_eq!(map.find_valid_placement(&rect), Placement::NotFound);
    }

    #[test]
    fn out_of_bounds_boxes_are_invalid() {
        let map = test_map();
        let rect = Aabb::from_min_size(Vec2::new(-5.0, 10.0), Vec2::new(20.0, 20.0));
        assert!(!map.is_valid_placement(&rect));
        // Flush against the edge is still inside.
        let edge = Aabb::from_min_size(Vec2::new(940.0, 940.0), Vec2::new(20.0, 20.0));
        assert!(map.is_valid_placement(&edge));
    }
}

mod persistence_tests {
    use super::*;

    fn populated_map() -> Map {
        let mut map = test_map();
        map.set_name("hillside");
        map.set_music(Some("overture".to_owned()));
        map.set_indoors(true);
        map.add_wall(Wall::new(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0)));
        map.add_wall(Wall::new(Vec2::new(300.0, 200.0), Vec2::new(64.0, 32.0)));
        map.add_dynamic(Box::new(solid(Vec2::new(50.0, 60.0))));
        map.add_dynamic_at(
            Box::new(Critter::new(Vec2::new(200.0, 220.0), Vec2::new(16.0, 16.0))),
            MapEntityIndex::new(5),
        );
        map
    }

    #[test]
    fn a_map_survives_a_save_and_load() {
        let map = populated_map();
        let doc = map.write_document(&CritterFactory).unwrap();
        let loaded = Map::from_document(
            &doc,
            MapIndex::new(2),
            Box::new(ManualClock::new()),
            &CritterFactory,
            true,
            None,
        )
        .unwrap();

        assert_eq!(loaded.name(), "hillside");
        assert_eq!(loaded.music(), Some("overture"));
        assert!(loaded.indoors());
        assert_eq!(loaded.size(), Vec2::new(960.0, 960.0));
        assert_eq!(loaded.entity_count(), 4);
        assert_eq!(loaded.dynamic_count(), 2);

        let c0 = loaded.dynamic_entity(MapEntityIndex::new(0)).unwrap();
        assert_eq!(c0.position(), Vec2::new(50.0, 60.0));
        let c5 = loaded.dynamic_entity(MapEntityIndex::new(5)).unwrap();
        assert_eq!(c5.position(), Vec2::new(200.0, 220.0));
        assert_eq!(c5.size(), Vec2::new(16.0, 16.0));

        let walls: Vec<Aabb> = loaded
            .entities()
            .filter_map(|(_, e)| e.as_wall().map(Wall::aabb))
            .collect();
        assert_eq!(walls.len(), 2);
        assert_eq!(walls[0].min, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn dynamic_entities_can_be_skipped_at_load() {
        let map = populated_map();
        let doc = map.write_document(&CritterFactory).unwrap();
        let loaded = Map::from_document(
            &doc,
            MapIndex::new(2),
            Box::new(ManualClock::new()),
            &CritterFactory,
            false,
            None,
        )
        .unwrap();

        assert_eq!(loaded.dynamic_count(), 0);
        assert_eq!(loaded.entity_count(), 2);
    }

    #[test]
    fn files_round_trip_on_disk() {
        let dir = std::env::temp_dir().join(format!("veldt-roundtrip-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(map_file_name(MapIndex::new(1)));

        let map = populated_map();
        map.save_to(&path, &CritterFactory).unwrap();
        let loaded = Map::load_from(
            &path,
            MapIndex::new(1),
            Box::new(ManualClock::new()),
            &CritterFactory,
            true,
            None,
        )
        .unwrap();
        assert_eq!(loaded.entity_count(), 4);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn loading_a_missing_file_reports_file_not_found() {
        let err = Map::load_from(
            std::path::Path::new("/nonexistent/7.json"),
            MapIndex::new(7),
            Box::new(ManualClock::new()),
            &CritterFactory,
            true,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, MapError::FileNotFound(_)));
    }

    #[test]
    fn a_truncated_document_fails_loudly() {
        let doc = serde_json::json!({"Map": {"Header": {"Name": "x"}}});
        let err = Map::from_document(
            &doc,
            MapIndex::new(1),
            Box::new(ManualClock::new()),
            &CritterFactory,
            true,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, MapError::MissingKey(_)));
    }
}

mod extension_tests {
    use super::*;

    struct CountingExt {
        added: Rc<Cell<u32>>,
        removed: Rc<Cell<u32>>,
        spawns: Rc<Cell<u32>>,
    }

    impl MapExtension for CountingExt {
        fn entity_added(&mut self, _id: EntityId, _entity: &Entity) {
            self.added.set(self.added.get() + 1);
        }

        fn entity_removed(&mut self, _id: EntityId) {
            self.removed.set(self.removed.get() + 1);
        }

        fn save_misc(&self, w: &mut NodeWriter) -> Result<(), MapError> {
            w.write_u32("Spawns", self.spawns.get());
            Ok(())
        }

        fn load_misc(&mut self, r: &NodeReader<'_>) -> Result<(), MapError> {
            self.spawns.set(r.read_u32("Spawns")?);
            Ok(())
        }
    }

    #[test]
    fn lifecycle_hooks_fire_for_every_entity() {
        let added = Rc::new(Cell::new(0));
        let removed = Rc::new(Cell::new(0));
        let mut map = test_map();
        map.set_extension(Box::new(CountingExt {
            added: Rc::clone(&added),
            removed: Rc::clone(&removed),
            spawns: Rc::new(Cell::new(0)),
        }));

        map.add_wall(Wall::new(Vec2::ZERO, Vec2::new(32.0, 32.0)));
        let id = map.add_dynamic(Box::new(solid(Vec2::new(100.0, 100.0))));
        map.remove_entity(id);

        assert_eq!(added.get(), 2);
        assert_eq!(removed.get(), 1);
    }

    #[test]
    fn the_misc_section_round_trips_through_the_extension() {
        let mut map = test_map();
        map.set_extension(Box::new(CountingExt {
            added: Rc::new(Cell::new(0)),
            removed: Rc::new(Cell::new(0)),
            spawns: Rc::new(Cell::new(9)),
        }));
        let doc = map.write_document(&CritterFactory).unwrap();

        let spawns = Rc::new(Cell::new(0));
        let ext = CountingExt {
            added: Rc::new(Cell::new(0)),
            removed: Rc::new(Cell::new(0)),
            spawns: Rc::clone(&spawns),
        };
        let _loaded = Map::from_document(
            &doc,
            MapIndex::new(1),
            Box::new(ManualClock::new()),
            &CritterFactory,
            true,
            Some(Box::new(ext)),
        )
        .unwrap();
        assert_eq!(spawns.get(), 9);
    }
}

mod timer_tests {
    use super::*;

    #[test]
    fn a_paused_map_does_not_age() {
        let (mut map, clock) = test_map_with_clock();
        assert!(map.is_updating());

        clock.advance(100);
        assert_eq!(map.live_time_ms(), 100);

        map.set_updating(false);
        clock.advance(500);
        assert_eq!(map.live_time_ms(), 100);

        map.set_updating(true);
        clock.advance(25);
        assert_eq!(map.live_time_ms(), 125);
    }
}
