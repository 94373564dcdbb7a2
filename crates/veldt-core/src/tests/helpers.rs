//! Shared test fixtures: a scriptable dynamic entity, its factory, and a
//! manually driven clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;

use crate::entity::{DynamicEntity, EntityFlags, Wall};
use crate::error::MapError;
use crate::io::{NodeReader, NodeWriter};
use crate::map::persist::DynamicEntityFactory;
use crate::map::{Map, MapIndex};
use crate::time::TimeSource;

/// Observations recorded by a [`Critter`], shared with the test that
/// created it.
#[derive(Debug, Default)]
pub struct CritterLog {
    pub updates: u32,
    pub wall_hits: Vec<Vec2>,
    pub pushed_into: Vec<Vec2>,
    pub pushed_from: Vec<Vec2>,
}

/// A minimal dynamic entity: moves by a fixed step each tick, logs every
/// collision callback, and can run an arbitrary script against the map.
pub struct Critter {
    pub pos: Vec2,
    pub size: Vec2,
    pub step: Vec2,
    pub flags: EntityFlags,
    pub log: Rc<RefCell<CritterLog>>,
    pub dispose_flag: Rc<Cell<bool>>,
    pub script: Option<Box<dyn FnMut(&mut Map)>>,
}

impl Critter {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            step: Vec2::ZERO,
            flags: EntityFlags::default(),
            log: Rc::new(RefCell::new(CritterLog::default())),
            dispose_flag: Rc::new(Cell::new(false)),
            script: None,
        }
    }

    pub fn with_step(mut self, step: Vec2) -> Self {
        self.step = step;
        self
    }

    pub fn with_flags(mut self, flags: EntityFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_script(mut self, script: impl FnMut(&mut Map) + 'static) -> Self {
        self.script = Some(Box::new(script));
        self
    }

    pub fn log_handle(&self) -> Rc<RefCell<CritterLog>> {
        Rc::clone(&self.log)
    }

    pub fn dispose_handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.dispose_flag)
    }
}

impl DynamicEntity for Critter {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn teleport(&mut self, position: Vec2) {
        self.pos = position;
    }

    fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    fn flags(&self) -> EntityFlags {
        self.flags
    }

    fn update(&mut self, map: &mut Map, _delta_ms: u32) {
        self.log.borrow_mut().updates += 1;
        self.pos += self.step;
        if let Some(script) = self.script.as_mut() {
            script(map);
        }
    }

    fn is_disposed(&self) -> bool {
        self.dispose_flag.get()
    }

    fn collide_into(&mut self, _other: &mut dyn DynamicEntity, displacement: Vec2) {
        self.log.borrow_mut().pushed_into.push(displacement);
    }

    fn collide_from(&mut self, _other: &mut dyn DynamicEntity, displacement: Vec2) {
        self.log.borrow_mut().pushed_from.push(displacement);
    }

    fn collide_with_wall(&mut self, _wall: &Wall, displacement: Vec2) {
        self.log.borrow_mut().wall_hits.push(displacement);
        self.pos += displacement;
    }
}

/// Persists [`Critter`]s as their position and size.
pub struct CritterFactory;

impl DynamicEntityFactory for CritterFactory {
    fn write(&self, w: &mut NodeWriter, entity: &dyn DynamicEntity) -> Result<(), MapError> {
        let pos = entity.position();
        let size = entity.size();
        w.write_f32("X", pos.x);
        w.write_f32("Y", pos.y);
        w.write_f32("Width", size.x);
        w.write_f32("Height", size.y);
        Ok(())
    }

    fn read(&self, r: &NodeReader<'_>) -> Result<Box<dyn DynamicEntity>, MapError> {
        let pos = Vec2::new(r.read_f32("X")?, r.read_f32("Y")?);
        let size = Vec2::new(r.read_f32("Width")?, r.read_f32("Height")?);
        Ok(Box::new(Critter::new(pos, size)))
    }
}

/// Clock the test advances by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<u32>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        self.0.set(self.0.get() + ms);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

/// A 960x960 map with a manual clock, the standard fixture.
pub fn test_map() -> Map {
    Map::new(
        MapIndex::new(1),
        Vec2::new(960.0, 960.0),
        Box::new(ManualClock::new()),
    )
}

pub fn test_map_with_clock() -> (Map, ManualClock) {
    let clock = ManualClock::new();
    let map = Map::new(
        MapIndex::new(1),
        Vec2::new(960.0, 960.0),
        Box::new(clock.clone()),
    );
    (map, clock)
}
