//! Map tick loop and collision resolution.

use glam::Vec2;
use tracing::error;

use crate::entity::{Entity, EntityFlags, EntityId};
use crate::map::Map;

impl Map {
    /// Advances the map by one tick.
    ///
    /// Each updateable entity is detached from the map, runs its own logic
    /// with full mutable access to the map, and is re-attached afterwards
    /// unless it removed itself. Entities reporting
    /// [`is_disposed`](crate::entity::DynamicEntity::is_disposed) are reaped
    /// here, whether or not they take part in the update list. After an
    /// entity's logic runs, the engine clamps it into the map and resolves
    /// its collisions.
    ///
    /// The iteration tolerates arbitrary insertions and removals from
    /// entity logic: the cursor only advances when the entity at it is the
    /// one that just ran, so removing an earlier entity never skips a later
    /// one and nothing is updated twice.
    pub fn update(&mut self, delta_ms: u32) {
        let mut i = 0;
        while i < self.updateables.len() {
            let current = self.updateables[i];
            if let Some(mut entity) = self.storage.remove(&current) {
                if let Entity::Dynamic(d) = &mut entity {
                    d.update(self, delta_ms);
                }
                // If the entity removed itself, its bookkeeping is already
                // gone; dropping it here completes the removal.
                if self.order.contains(&current) {
                    let disposed =
                        matches!(&entity, Entity::Dynamic(d) if d.is_disposed());
                    self.storage.insert(current, entity);
                    if disposed {
                        self.remove_entity(current);
                    } else {
                        self.sync_spatial(current);
                        self.check_collisions(current);
                    }
                }
            }
            if i < self.updateables.len() && self.updateables[i] == current {
                i += 1;
            }
        }

        // Dynamic entities outside the update list never pass through the
        // loop above, so their disposal is polled in a separate sweep.
        let disposed: Vec<EntityId> = self
            .dynamics
            .iter()
            .map(|(_, id)| id)
            .filter(|id| {
                matches!(self.storage.get(id), Some(Entity::Dynamic(d)) if d.is_disposed())
            })
            .collect();
        for id in disposed {
            self.remove_entity(id);
        }
    }

    /// Clamps an entity into the map and resolves its wall and entity
    /// collisions.
    ///
    /// Wall overlaps are resolved by minimum translational distance, one
    /// wall at a time, re-reading the entity's box after each push so later
    /// walls see the corrected position. Entity-versus-entity contacts are
    /// reported to both parties with the same displacement; neither side is
    /// moved by the engine.
    pub fn check_collisions(&mut self, id: EntityId) {
        let Some(entity) = self.storage.get(&id) else {
            error!(%id, "check_collisions: no such entity");
            return;
        };
        if entity.is_wall() {
            return;
        }

        let aabb = entity.aabb();
        let mut shift = Vec2::ZERO;
        if aabb.min.x < 0.0 {
            shift.x = -aabb.min.x;
        } else if aabb.max.x > self.width {
            shift.x = self.width - aabb.max.x;
        }
        if aabb.min.y < 0.0 {
            shift.y = -aabb.min.y;
        } else if aabb.max.y > self.height {
            shift.y = self.height - aabb.max.y;
        }
        if shift != Vec2::ZERO {
            if let Some(d) = self.storage.get_mut(&id).and_then(Entity::as_dynamic_mut) {
                let target = d.position() + shift;
                d.teleport(target);
            }
            self.sync_spatial(id);
        }

        self.resolve_wall_collisions(id);
        self.resolve_entity_collisions(id);
    }

    fn resolve_wall_collisions(&mut self, id: EntityId) {
        let (aabb, flags) = match self.storage.get(&id) {
            Some(Entity::Dynamic(d)) => (d.aabb(), d.flags()),
            _ => return,
        };
        if !flags.contains(EntityFlags::COLLIDES_AGAINST_WALLS) {
            return;
        }
        let walls = self.spatial.walls_in_rect(&aabb);
        if walls.is_empty() {
            return;
        }

        // Detach the mover so it and the walls can be borrowed at once.
        let Some(mut entity) = self.storage.remove(&id) else {
            return;
        };
        if let Entity::Dynamic(d) = &mut entity {
            for wall_id in walls {
                let Some(wall) = self.storage.get(&wall_id).and_then(Entity::as_wall) else {
                    continue;
                };
                let displacement = quadrille::mtd(&d.aabb(), &wall.aabb());
                if displacement != Vec2::ZERO {
                    d.collide_with_wall(wall, displacement);
                }
            }
        }
        self.storage.insert(id, entity);
        self.sync_spatial(id);
    }

    fn resolve_entity_collisions(&mut self, id: EntityId) {
        let aabb = match self.storage.get(&id) {
            Some(Entity::Dynamic(d)) => d.aabb(),
            _ => return,
        };
        let others = self.spatial.dynamics_in_rect_where(&aabb, |k, _| *k != id);
        if others.is_empty() {
            return;
        }

        let Some(mut entity) = self.storage.remove(&id) else {
            return;
        };
        let mut touched = Vec::new();
        if let Entity::Dynamic(mover) = &mut entity {
            for other_id in others {
                let Some(other) = self
                    .storage
                    .get_mut(&other_id)
                    .and_then(Entity::as_dynamic_mut)
                else {
                    continue;
                };
                let displacement = quadrille::mtd(&mover.aabb(), &other.aabb());
                if displacement != Vec2::ZERO {
                    mover.collide_into(other, displacement);
                    other.collide_from(mover.as_mut(), displacement);
                    touched.push(other_id);
                }
            }
        }
        self.storage.insert(id, entity);
        self.sync_spatial(id);
        for other_id in touched {
            self.sync_spatial(other_id);
        }
    }
}
