//! Entity model: identifiers, walls, and the dynamic entity trait.

use std::fmt;

use bitflags::bitflags;
use glam::Vec2;
use quadrille::Aabb;
use serde::{Deserialize, Serialize};

use crate::map::Map;

/// Map-wide unique entity identifier.
///
/// Allocated monotonically by the owning [`Map`] and never reused for the
/// lifetime of that map, so a stale id held across a removal can only miss,
/// never alias a different entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an entity id from a raw value.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Stable per-map slot index of a dynamic entity.
///
/// Unlike [`EntityId`], slot indices are recycled: removing a dynamic entity
/// frees its slot and the next insertion takes the lowest free one. They are
/// the identity used by the wire and file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapEntityIndex(u16);

impl MapEntityIndex {
    /// Creates a slot index from a raw value.
    #[must_use]
    pub fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the raw slot value.
    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for MapEntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

impl From<u16> for MapEntityIndex {
    fn from(index: u16) -> Self {
        Self(index)
    }
}

bitflags! {
    /// Behavior flags reported by a dynamic entity.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EntityFlags: u8 {
        /// Wall overlaps are resolved for this entity during collision checks.
        const COLLIDES_AGAINST_WALLS = 1 << 0;
        /// The entity receives [`DynamicEntity::update`] every tick.
        const UPDATEABLE = 1 << 1;
    }
}

impl Default for EntityFlags {
    fn default() -> Self {
        Self::COLLIDES_AGAINST_WALLS | Self::UPDATEABLE
    }
}

/// An immovable axis-aligned collision wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    aabb: Aabb,
}

impl Wall {
    /// Creates a wall from a top-left corner and size.
    #[must_use]
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            aabb: Aabb::from_min_size(position, size),
        }
    }

    /// The wall's bounding box.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Top-left corner.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.aabb.min
    }

    /// Width and height.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.aabb.size()
    }
}

/// A movable, simulated entity owned by a [`Map`].
///
/// Implementors own their position and size; the engine observes them
/// through [`position`](Self::position)/[`size`](Self::size) and moves them
/// through [`teleport`](Self::teleport). After mutating an entity outside a
/// tick, call [`Map::sync_spatial`] so the spatial index catches up.
pub trait DynamicEntity {
    /// Current top-left corner.
    fn position(&self) -> Vec2;

    /// Current width and height.
    fn size(&self) -> Vec2;

    /// Moves the entity to an absolute position without any collision or
    /// boundary handling.
    fn teleport(&mut self, position: Vec2);

    /// Changes the entity's size. The default ignores the request; entities
    /// with a fixed footprint need not implement it.
    fn resize(&mut self, _size: Vec2) {}

    /// Behavior flags. Defaults to colliding against walls and updating.
    fn flags(&self) -> EntityFlags {
        EntityFlags::default()
    }

    /// Per-tick logic, called once per [`Map::update`] when the
    /// [`UPDATEABLE`](EntityFlags::UPDATEABLE) flag is set. The entity is
    /// detached from the map for the duration of the call, so it may freely
    /// add or remove other entities, or remove itself.
    fn update(&mut self, _map: &mut Map, _delta_ms: u32) {}

    /// Polled once per tick after [`update`](Self::update); returning `true`
    /// makes the engine remove and drop the entity.
    fn is_disposed(&self) -> bool {
        false
    }

    /// Called when this entity moved into `other`. `displacement` is the
    /// minimum translation that would separate the two.
    fn collide_into(&mut self, _other: &mut dyn DynamicEntity, _displacement: Vec2) {}

    /// Called when `other` moved into this entity, with the same
    /// `displacement` that was reported to the mover.
    fn collide_from(&mut self, _other: &mut dyn DynamicEntity, _displacement: Vec2) {}

    /// Called when this entity overlaps a wall. The default applies the
    /// separating displacement, pushing the entity out along the axis of
    /// least overlap.
    fn collide_with_wall(&mut self, _wall: &Wall, displacement: Vec2) {
        let target = self.position() + displacement;
        self.teleport(target);
    }

    /// Current bounding box.
    fn aabb(&self) -> Aabb {
        Aabb::from_min_size(self.position(), self.size())
    }
}

/// Anything a map can own: a wall or a boxed dynamic entity.
pub enum Entity {
    /// An immovable collision wall.
    Wall(Wall),
    /// A simulated entity.
    Dynamic(Box<dyn DynamicEntity>),
}

impl Entity {
    /// `true` for the [`Entity::Wall`] variant.
    #[must_use]
    pub fn is_wall(&self) -> bool {
        matches!(self, Self::Wall(_))
    }

    /// The wall, if this is one.
    #[must_use]
    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Self::Wall(w) => Some(w),
            Self::Dynamic(_) => None,
        }
    }

    /// The dynamic entity, if this is one.
    #[must_use]
    pub fn as_dynamic(&self) -> Option<&dyn DynamicEntity> {
        match self {
            Self::Dynamic(d) => Some(d.as_ref()),
            Self::Wall(_) => None,
        }
    }

    /// Mutable access to the dynamic entity, if this is one.
    pub fn as_dynamic_mut(&mut self) -> Option<&mut dyn DynamicEntity> {
        match self {
            Self::Dynamic(d) => Some(d.as_mut()),
            Self::Wall(_) => None,
        }
    }

    /// Current bounding box, regardless of variant.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        match self {
            Self::Wall(w) => w.aabb(),
            Self::Dynamic(d) => d.aabb(),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wall(w) => f.debug_tuple("Wall").field(&w.aabb()).finish(),
            Self::Dynamic(d) => f.debug_tuple("Dynamic").field(&d.aabb()).finish(),
        }
    }
}
