//! Map file format: structured save/load and map file naming.
//!
//! A map file is a single JSON document with a fixed node layout:
//! `Map/Header` (name, music, dimensions, indoors flag), `Map/Walls`,
//! `Map/DynamicEntities`, and `Map/Misc` for the game extension's own data.
//! Dynamic entity payloads are opaque to the engine; a
//! [`DynamicEntityFactory`] writes and reads them.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use glam::Vec2;
use serde_json::Value;

use crate::entity::{DynamicEntity, Entity, MapEntityIndex, Wall};
use crate::error::MapError;
use crate::io::{NodeReader, NodeWriter};
use crate::map::{Map, MapExtension, MapIndex};
use crate::time::TimeSource;

/// File extension of map files, without the dot.
pub const MAP_FILE_SUFFIX: &str = "json";

const ROOT_NODE: &str = "Map";
const HEADER_NODE: &str = "Header";
const WALL_NODE: &str = "Wall";
const DYNAMIC_NODE: &str = "DynamicEntity";
const MISC_NODE: &str = "Misc";

/// Serializes dynamic entities for map files.
///
/// The engine stores dynamic entities as trait objects and cannot name
/// their concrete types; the game supplies a factory that can.
pub trait DynamicEntityFactory {
    /// Writes one entity's payload. The writer is positioned inside the
    /// entity's record; the engine has already written the `Index` key.
    ///
    /// # Errors
    ///
    /// Implementations may reject entities they cannot serialize.
    fn write(&self, w: &mut NodeWriter, entity: &dyn DynamicEntity) -> Result<(), MapError>;

    /// Reconstructs one entity from its record.
    ///
    /// # Errors
    ///
    /// Implementations may reject malformed records.
    fn read(&self, r: &NodeReader<'_>) -> Result<Box<dyn DynamicEntity>, MapError>;
}

impl Map {
    /// Serializes the map to a document.
    ///
    /// Walls are written in join order, dynamic entities in ascending slot
    /// order, so saving an untouched map is deterministic.
    ///
    /// # Errors
    ///
    /// Propagates factory and extension failures.
    pub fn write_document(&self, factory: &dyn DynamicEntityFactory) -> Result<Value, MapError> {
        let mut w = NodeWriter::new(ROOT_NODE);

        w.begin_node(HEADER_NODE);
        w.write_str("Name", &self.name);
        w.write_str("Music", self.music.as_deref().unwrap_or(""));
        w.write_f32("Width", self.width);
        w.write_f32("Height", self.height);
        w.write_bool("Indoors", self.indoors);
        w.end_node(HEADER_NODE)?;

        let walls = self
            .entities()
            .filter_map(|(_, e)| e.as_wall());
        w.write_many(WALL_NODE, walls, |w, wall| {
            let aabb = wall.aabb();
            w.write_f32("X", aabb.min.x);
            w.write_f32("Y", aabb.min.y);
            w.write_f32("Width", aabb.size().x);
            w.write_f32("Height", aabb.size().y);
            Ok(())
        })?;

        let dynamics: Vec<(MapEntityIndex, &dyn DynamicEntity)> = self
            .dynamic_entities()
            .filter_map(|(index, id)| {
                self.entity(id).and_then(Entity::as_dynamic).map(|d| (index, d))
            })
            .collect();
        w.write_many(DYNAMIC_NODE, dynamics, |w, (index, entity)| {
            w.write_u32("Index", u32::from(index.as_u16()));
            factory.write(w, entity)
        })?;

        w.begin_node(MISC_NODE);
        if let Some(ext) = self.extension.as_ref() {
            ext.save_misc(&mut w)?;
        }
        w.end_node(MISC_NODE)?;

        w.finish()
    }

    /// Reconstructs a map from a document.
    ///
    /// Dynamic entity records are always parsed so a corrupt file fails
    /// loudly, but the entities are only added to the map when
    /// `load_dynamic_entities` is set; a server re-spawns them from its own
    /// data instead.
    ///
    /// # Errors
    ///
    /// Any missing or mistyped node, or a factory or extension failure.
    pub fn from_document(
        doc: &Value,
        index: MapIndex,
        time: Box<dyn TimeSource>,
        factory: &dyn DynamicEntityFactory,
        load_dynamic_entities: bool,
        extension: Option<Box<dyn MapExtension>>,
    ) -> Result<Self, MapError> {
        let root = NodeReader::from_root(doc, ROOT_NODE)?;
        let header = root.node(HEADER_NODE)?;
        let name = header.read_str("Name")?.to_owned();
        let music = header.read_str("Music")?;
        let width = header.read_f32("Width")?;
        let height = header.read_f32("Height")?;
        let indoors = header.read_bool("Indoors")?;

        let mut map = Map::new(index, Vec2::new(width, height), time);
        map.name = name;
        map.music = if music.is_empty() {
            None
        } else {
            Some(music.to_owned())
        };
        map.indoors = indoors;
        // The extension goes in before entities so it sees every add.
        map.extension = extension;

        let walls = root.read_many(WALL_NODE, |r| {
            let min = Vec2::new(r.read_f32("X")?, r.read_f32("Y")?);
            let size = Vec2::new(r.read_f32("Width")?, r.read_f32("Height")?);
            Ok(Wall::new(min, size))
        })?;
        for wall in walls {
            map.add_wall(wall);
        }

        let dynamics = root.read_many(DYNAMIC_NODE, |r| {
            let slot = MapEntityIndex::new(r.read_u16("Index")?);
            let entity = factory.read(r)?;
            Ok((slot, entity))
        })?;
        if load_dynamic_entities {
            for (slot, entity) in dynamics {
                map.add_dynamic_at(entity, slot);
            }
        }

        if let Some(misc) = root.opt_node(MISC_NODE) {
            if let Some(ext) = map.extension.as_mut() {
                ext.load_misc(&misc)?;
            }
        }

        Ok(map)
    }

    /// Saves the map to a file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Filesystem failures and anything [`write_document`](Self::write_document)
    /// reports.
    pub fn save_to(&self, path: &Path, factory: &dyn DynamicEntityFactory) -> Result<(), MapError> {
        let doc = self.write_document(factory)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }

    /// Loads a map from a file.
    ///
    /// # Errors
    ///
    /// [`MapError::FileNotFound`] if the path does not exist, plus anything
    /// [`from_document`](Self::from_document) reports.
    pub fn load_from(
        path: &Path,
        index: MapIndex,
        time: Box<dyn TimeSource>,
        factory: &dyn DynamicEntityFactory,
        load_dynamic_entities: bool,
        extension: Option<Box<dyn MapExtension>>,
    ) -> Result<Self, MapError> {
        if !path.is_file() {
            return Err(MapError::FileNotFound(path.to_owned()));
        }
        let doc: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        Self::from_document(&doc, index, time, factory, load_dynamic_entities, extension)
    }
}

/// File name for a map index, e.g. `3.json`.
#[must_use]
pub fn map_file_name(index: MapIndex) -> String {
    format!("{}.{MAP_FILE_SUFFIX}", index.as_u16())
}

/// Parses a map index from a file path. The file must carry the map
/// suffix and a positive numeric stem.
#[must_use]
pub fn index_from_path(path: &Path) -> Option<MapIndex> {
    if path.extension().and_then(OsStr::to_str) != Some(MAP_FILE_SUFFIX) {
        return None;
    }
    let raw: u16 = path.file_stem()?.to_str()?.parse().ok()?;
    if raw == 0 {
        return None;
    }
    Some(MapIndex::new(raw))
}

/// Whether a path names an existing, correctly named map file.
#[must_use]
pub fn is_valid_map_file(path: &Path) -> bool {
    path.is_file() && index_from_path(path).is_some()
}

/// Lowest map index, starting from 1, with no file in `dir`.
///
/// # Errors
///
/// Filesystem failures while listing the directory.
pub fn next_free_map_index(dir: &Path) -> Result<MapIndex, MapError> {
    let mut used = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(index) = index_from_path(&entry.path()) {
            used.insert(index.as_u16());
        }
    }
    let mut candidate = 1;
    while used.contains(&candidate) {
        candidate += 1;
    }
    Ok(MapIndex::new(candidate))
}
