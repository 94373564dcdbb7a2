//! The map: entity registry, boundaries, and the services built on them.

pub(crate) mod dynamic_table;
pub mod persist;
pub mod placement;
mod update;

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use quadrille::Aabb;
use tracing::error;

use crate::entity::{DynamicEntity, Entity, EntityFlags, EntityId, MapEntityIndex, Wall};
use crate::error::MapError;
use crate::io::{NodeReader, NodeWriter};
use crate::spatial::SpatialManager;
use crate::time::{Stopwatch, TimeSource};

use dynamic_table::DynamicEntityTable;

/// Identifier of a map within a world, doubling as its file name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct MapIndex(u16);

impl MapIndex {
    /// Creates a map index from a raw value.
    #[must_use]
    pub fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the raw index value.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for MapIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map{}", self.0)
    }
}

impl From<u16> for MapIndex {
    fn from(index: u16) -> Self {
        Self(index)
    }
}

/// Game-specific behavior plugged into a map by composition.
///
/// The engine owns the registry and the tick loop; a game hooks entity
/// lifecycle events and contributes its own section to the map file.
pub trait MapExtension {
    /// An entity finished joining the map.
    fn entity_added(&mut self, _id: EntityId, _entity: &Entity) {}

    /// An entity left the map. Only the id is reported; the entity itself
    /// may already be detached when removal happens mid-update.
    fn entity_removed(&mut self, _id: EntityId) {}

    /// Writes the game's `Misc` section. The writer is positioned inside
    /// that node.
    ///
    /// # Errors
    ///
    /// Implementations may fail the save.
    fn save_misc(&self, _w: &mut NodeWriter) -> Result<(), MapError> {
        Ok(())
    }

    /// Reads the game's `Misc` section.
    ///
    /// # Errors
    ///
    /// Implementations may fail the load.
    fn load_misc(&mut self, _r: &NodeReader<'_>) -> Result<(), MapError> {
        Ok(())
    }
}

/// A single game map owning its entities, spatial index, and clock.
pub struct Map {
    index: MapIndex,
    name: String,
    music: Option<String>,
    indoors: bool,
    width: f32,
    height: f32,

    next_id: u64,
    storage: BTreeMap<EntityId, Entity>,
    /// Every entity on the map, in join order. This is the list the update
    /// loop and persistence iterate.
    order: Vec<EntityId>,
    updateables: Vec<EntityId>,
    dynamics: DynamicEntityTable,
    spatial: SpatialManager,

    time: Box<dyn TimeSource>,
    live_timer: Stopwatch,
    extension: Option<Box<dyn MapExtension>>,
}

impl Map {
    /// Creates an empty map of the given size, updating from the start.
    #[must_use]
    pub fn new(index: MapIndex, size: Vec2, time: Box<dyn TimeSource>) -> Self {
        let mut live_timer = Stopwatch::new();
        live_timer.start(time.now_ms());
        Self {
            index,
            name: String::new(),
            music: None,
            indoors: false,
            width: size.x,
            height: size.y,
            next_id: 0,
            storage: BTreeMap::new(),
            order: Vec::new(),
            updateables: Vec::new(),
            dynamics: DynamicEntityTable::new(),
            spatial: SpatialManager::new(size),
            time,
            live_timer,
            extension: None,
        }
    }

    /// Installs the game-side extension. Replaces any previous one.
    pub fn set_extension(&mut self, extension: Box<dyn MapExtension>) {
        self.extension = Some(extension);
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    // ---- accessors -------------------------------------------------------

    /// The map's index within its world.
    #[must_use]
    pub fn index(&self) -> MapIndex {
        self.index
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the display name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Background music identifier, if any.
    #[must_use]
    pub fn music(&self) -> Option<&str> {
        self.music.as_deref()
    }

    /// Sets or clears the background music identifier.
    pub fn set_music(&mut self, music: Option<String>) {
        self.music = music;
    }

    /// Whether the map is flagged as indoors.
    #[must_use]
    pub fn indoors(&self) -> bool {
        self.indoors
    }

    /// Sets the indoors flag.
    pub fn set_indoors(&mut self, indoors: bool) {
        self.indoors = indoors;
    }

    /// Map width in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Map height in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Map size in world units.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Read access to the spatial index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialManager {
        &self.spatial
    }

    /// Number of entities on the map.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.order.len()
    }

    /// Number of dynamic entities on the map.
    #[must_use]
    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    /// The entity with the given id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.storage.get(&id)
    }

    /// Mutable access to the entity with the given id. After moving a
    /// dynamic entity this way, call [`sync_spatial`](Self::sync_spatial).
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.storage.get_mut(&id)
    }

    /// All entities in join order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.order
            .iter()
            .filter_map(|id| self.storage.get(id).map(|e| (*id, e)))
    }

    /// The id at position `i` of the join-order list.
    #[must_use]
    pub fn entity_at(&self, i: usize) -> Option<EntityId> {
        if i >= self.order.len() {
            debug_assert!(false, "entity list index {i} out of range");
            error!(index = i, len = self.order.len(), "entity list index out of range");
            return None;
        }
        Some(self.order[i])
    }

    /// The dynamic entity occupying `index`, if any.
    #[must_use]
    pub fn dynamic_entity(&self, index: MapEntityIndex) -> Option<&dyn DynamicEntity> {
        let id = self.dynamics.get(index)?;
        self.storage.get(&id).and_then(Entity::as_dynamic)
    }

    /// Mutable access to the dynamic entity occupying `index`.
    pub fn dynamic_entity_mut(&mut self, index: MapEntityIndex) -> Option<&mut dyn DynamicEntity> {
        let id = self.dynamics.get(index)?;
        self.storage.get_mut(&id).and_then(Entity::as_dynamic_mut)
    }

    /// The id of the dynamic entity occupying `index`, if any.
    #[must_use]
    pub fn dynamic_entity_id(&self, index: MapEntityIndex) -> Option<EntityId> {
        self.dynamics.get(index)
    }

    /// The slot index held by a dynamic entity.
    #[must_use]
    pub fn index_of(&self, id: EntityId) -> Option<MapEntityIndex> {
        self.dynamics.index_of(id)
    }

    /// Dynamic entities in ascending slot order.
    pub fn dynamic_entities(&self) -> impl Iterator<Item = (MapEntityIndex, EntityId)> + '_ {
        self.dynamics.iter()
    }

    // ---- registry --------------------------------------------------------

    /// Adds a wall to the map.
    pub fn add_wall(&mut self, wall: Wall) -> EntityId {
        self.add_entity(Entity::Wall(wall))
    }

    /// Adds a dynamic entity, assigning it the lowest free slot index.
    pub fn add_dynamic(&mut self, entity: Box<dyn DynamicEntity>) -> EntityId {
        self.add_entity(Entity::Dynamic(entity))
    }

    /// Adds any entity to the map.
    ///
    /// The entity is indexed spatially, clamped into the map boundaries,
    /// and, for dynamic entities, given a slot index and enrolled in the
    /// update loop when its flags ask for it.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = self.alloc_id();
        debug_assert!(!self.order.contains(&id), "fresh id already in entity list");
        match &mut entity {
            Entity::Wall(w) => {
                // Walls are plain data with no teleport path, so the
                // boundary clamp happens before the static index sees them.
                let aabb = w.aabb();
                let target = self.boundary_clamped_min(&aabb);
                if target != aabb.min {
                    *w = Wall::new(target, aabb.size());
                }
                self.spatial.insert_wall(id, w.aabb());
            }
            Entity::Dynamic(d) => {
                self.dynamics.insert(id);
                self.spatial.insert_dynamic(id, d.aabb());
                if d.flags().contains(EntityFlags::UPDATEABLE) {
                    self.updateables.push(id);
                }
            }
        }
        self.order.push(id);
        self.storage.insert(id, entity);
        self.force_in_boundaries(id);
        if let Some(ext) = self.extension.as_mut() {
            if let Some(e) = self.storage.get(&id) {
                ext.entity_added(id, e);
            }
        }
        id
    }

    /// Adds a dynamic entity at a specific slot index, as dictated by a
    /// server or a map file.
    ///
    /// A conflicting occupant is a protocol violation: it is logged at error
    /// severity, removed, and replaced rather than silently kept.
    pub fn add_dynamic_at(
        &mut self,
        entity: Box<dyn DynamicEntity>,
        index: MapEntityIndex,
    ) -> EntityId {
        if let Some(existing) = self.dynamics.get(index) {
            error!(%index, %existing, "slot already occupied; evicting existing entity");
            self.remove_entity(existing);
        }
        let id = self.alloc_id();
        self.dynamics.insert_at(id, index);
        self.spatial.insert_dynamic(id, entity.aabb());
        if entity.flags().contains(EntityFlags::UPDATEABLE) {
            self.updateables.push(id);
        }
        self.order.push(id);
        self.storage.insert(id, Entity::Dynamic(entity));
        self.force_in_boundaries(id);
        if let Some(ext) = self.extension.as_mut() {
            if let Some(e) = self.storage.get(&id) {
                ext.entity_added(id, e);
            }
        }
        id
    }

    /// Removes an entity from the map, returning it.
    ///
    /// Removing an id that is not on the map is a programming error: it is
    /// asserted in debug builds, logged, and ignored in release builds.
    /// Returns `None` if the entity is currently detached for its own
    /// update; its bookkeeping is still torn down and the update loop will
    /// drop it instead of re-attaching it.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let Some(pos) = self.order.iter().position(|&e| e == id) else {
            debug_assert!(false, "removed entity {id} was not on the map");
            error!(%id, "tried to remove an entity that is not on the map");
            return None;
        };
        self.order.remove(pos);
        if let Some(upos) = self.updateables.iter().position(|&e| e == id) {
            self.updateables.remove(upos);
        }
        self.dynamics.remove_id(id);
        self.spatial.remove(id);
        let entity = self.storage.remove(&id);
        if let Some(ext) = self.extension.as_mut() {
            ext.entity_removed(id);
        }
        entity
    }

    /// Re-reads a dynamic entity's box into the spatial index. Call after
    /// moving or resizing an entity outside the update loop.
    pub fn sync_spatial(&mut self, id: EntityId) {
        if let Some(Entity::Dynamic(d)) = self.storage.get(&id) {
            self.spatial.update_dynamic(id, d.aabb());
        }
    }

    // ---- boundaries ------------------------------------------------------

    /// Whether a point lies inside the map.
    #[must_use]
    pub fn is_in_boundaries_point(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width && p.y < self.height
    }

    /// Whether a box lies fully inside the map. Touching an edge counts as
    /// inside.
    #[must_use]
    pub fn is_in_boundaries(&self, rect: &Aabb) -> bool {
        rect.min.x >= 0.0
            && rect.min.y >= 0.0
            && rect.max.x <= self.width
            && rect.max.y <= self.height
    }

    /// Where an entity's minimum corner must move so the box sits inside
    /// the map, snapped to the nearest edge.
    fn boundary_clamped_min(&self, aabb: &Aabb) -> Vec2 {
        let mut target = aabb.min;
        if aabb.min.x < 0.0 {
            target.x = 0.0;
        }
        if aabb.min.y < 0.0 {
            target.y = 0.0;
        }
        if aabb.max.x > self.width {
            target.x = self.width - aabb.size().x;
        }
        if aabb.max.y > self.height {
            target.y = self.height - aabb.size().y;
        }
        target
    }

    /// Teleports an entity back inside the map if any part of it sticks
    /// out.
    pub fn force_in_boundaries(&mut self, id: EntityId) {
        let Some(entity) = self.storage.get(&id) else {
            error!(%id, "force_in_boundaries: no such entity");
            return;
        };
        let aabb = entity.aabb();
        let target = self.boundary_clamped_min(&aabb);
        if target != aabb.min {
            if let Some(d) = self.storage.get_mut(&id).and_then(Entity::as_dynamic_mut) {
                d.teleport(target);
                self.sync_spatial(id);
            }
        }
    }

    /// Trims a proposed movement offset so the entity stays inside the map.
    #[must_use]
    pub fn keep_in_map(&self, id: EntityId, offset: Vec2) -> Vec2 {
        let Some(entity) = self.storage.get(&id) else {
            error!(%id, "keep_in_map: no such entity");
            return offset;
        };
        let aabb = entity.aabb();
        let mut out = offset;
        if aabb.min.x + out.x < 0.0 {
            out.x = -aabb.min.x;
        } else if aabb.max.x + out.x > self.width {
            out.x = self.width - aabb.max.x;
        }
        if aabb.min.y + out.y < 0.0 {
            out.y = -aabb.min.y;
        } else if aabb.max.y + out.y > self.height {
            out.y = self.height - aabb.max.y;
        }
        out
    }

    /// Teleports a dynamic entity, clamping the destination so it lands
    /// fully inside the map.
    pub fn safe_teleport(&mut self, id: EntityId, position: Vec2) {
        let map_size = Vec2::new(self.width, self.height);
        let Some(d) = self.storage.get_mut(&id).and_then(Entity::as_dynamic_mut) else {
            error!(%id, "safe_teleport: no such dynamic entity");
            return;
        };
        let limit = (map_size - d.size()).max(Vec2::ZERO);
        d.teleport(position.clamp(Vec2::ZERO, limit));
        self.sync_spatial(id);
    }

    /// Resizes a dynamic entity, capping the size at the map's and pushing
    /// the entity back inside if the new box sticks out.
    pub fn safe_resize(&mut self, id: EntityId, size: Vec2) {
        let Some(d) = self.storage.get_mut(&id).and_then(Entity::as_dynamic_mut) else {
            error!(%id, "safe_resize: no such dynamic entity");
            return;
        };
        let capped = size.min(Vec2::new(self.width, self.height));
        d.resize(capped);
        self.force_in_boundaries(id);
        self.sync_spatial(id);
    }

    /// Changes the map's dimensions.
    ///
    /// Entities that no longer fit inside the new bounds are removed and
    /// dropped; the spatial index is rebuilt for the new area.
    pub fn set_dimensions(&mut self, size: Vec2) {
        if size == self.size() {
            return;
        }
        let doomed: Vec<EntityId> = self
            .entities()
            .filter(|(_, e)| {
                let aabb = e.aabb();
                aabb.max.x > size.x || aabb.max.y > size.y
            })
            .map(|(id, _)| id)
            .collect();
        for id in doomed {
            self.remove_entity(id);
        }
        self.width = size.x;
        self.height = size.y;
        self.spatial.resize(size);
    }

    /// Suggests a position for an entity snapped to any walls within
    /// `max_diff` of its edges. Used by editors; does not move the entity.
    #[must_use]
    pub fn snap_to_walls(&self, id: EntityId, max_diff: f32) -> Option<Vec2> {
        let entity = self.storage.get(&id)?;
        let aabb = entity.aabb();
        let mut out = aabb.min;
        let search = aabb.expanded(max_diff / 2.0);
        for wall_id in self.spatial.walls_in_rect_where(&search, |k, _| *k != id) {
            let Some(w) = self.storage.get(&wall_id).and_then(Entity::as_wall) else {
                continue;
            };
            let wall = w.aabb();
            if (aabb.min.y - wall.max.y).abs() < max_diff {
                out.y = wall.max.y;
            }
            if (aabb.max.y - wall.min.y).abs() < max_diff {
                out.y = wall.min.y - aabb.size().y;
            }
            if (aabb.min.x - wall.max.x).abs() < max_diff {
                out.x = wall.max.x;
            }
            if (aabb.max.x - wall.min.x).abs() < max_diff {
                out.x = wall.min.x - aabb.size().x;
            }
        }
        Some(out)
    }

    // ---- time ------------------------------------------------------------

    /// Current reading of the map's time source, in milliseconds.
    #[must_use]
    pub fn current_time(&self) -> u32 {
        self.time.now_ms()
    }

    /// Whether the map is accruing live time.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.live_timer.is_running()
    }

    /// Pauses or resumes the map's live timer. A paused map does not age.
    pub fn set_updating(&mut self, updating: bool) {
        let now = self.time.now_ms();
        if updating {
            self.live_timer.start(now);
        } else {
            self.live_timer.stop(now);
        }
    }

    /// Total milliseconds the map has spent live.
    #[must_use]
    pub fn live_time_ms(&self) -> u32 {
        self.live_timer.elapsed(self.time.now_ms())
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("size", &self.size())
            .field("entities", &self.order.len())
            .field("dynamics", &self.dynamics.len())
            .finish_non_exhaustive()
    }
}
