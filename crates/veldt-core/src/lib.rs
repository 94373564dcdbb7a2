//! Core map engine for 2D tile-free worlds.
//!
//! A [`Map`] owns every entity on it: immovable [`Wall`]s and boxed
//! [`DynamicEntity`] trait objects. Walls live in a build-once spatial grid,
//! dynamic entities in a churn-friendly one; both are wrapped by
//! [`SpatialManager`] so callers ask one facade for "what is here".
//!
//! The engine is deliberately single-threaded per map. A tick is
//! [`Map::update`]: every updateable entity runs its own logic (which may
//! move it, or add and remove other entities), then the engine clamps it
//! into the map, resolves wall overlaps by minimum translational distance,
//! and dispatches entity-versus-entity contact callbacks.
//!
//! Persistence is a structured reader/writer pair ([`io::NodeWriter`],
//! [`io::NodeReader`]) over JSON, with dynamic entity payloads delegated to
//! a caller-supplied [`DynamicEntityFactory`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod entity;
pub mod error;
pub mod io;
pub mod map;
pub mod spatial;
pub mod time;

#[cfg(test)]
mod tests;

pub use entity::{DynamicEntity, Entity, EntityFlags, EntityId, MapEntityIndex, Wall};
pub use error::MapError;
pub use map::persist::{
    index_from_path, is_valid_map_file, map_file_name, next_free_map_index,
    DynamicEntityFactory, MAP_FILE_SUFFIX,
};
pub use map::placement::{Placement, PLACEMENT_SEARCH_PADDING};
pub use map::{Map, MapExtension, MapIndex};
pub use spatial::SpatialManager;
pub use time::{MonotonicTime, Stopwatch, TimeSource};

// Re-export the spatial substrate so downstream crates do not need a direct
// dependency to name `Aabb` or the grid types.
pub use quadrille;
pub use quadrille::Aabb;
