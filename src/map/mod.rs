pub mod procgen;

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap};
use serde::{Deserialize, Serialize};
use specs::Entity;

use crate::ecs::WorldStore;
use crate::ecs::components::{MapShape, MemoryTiles, Tiles, VisibleTiles};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileKind {
    #[default]
    Void,
    Wall,
    Floor,
}

impl TileKind {
    pub fn name(self) -> &'static str {
        match self {
            TileKind::Void => "void",
            TileKind::Wall => "wall",
            TileKind::Floor => "floor",
        }
    }

    /// Zero means the tile can not be entered.
    pub fn walk_cost(self) -> i32 {
        match self {
            TileKind::Void | TileKind::Wall => 0,
            TileKind::Floor => 1,
        }
    }

    pub fn transparent(self) -> bool {
        !matches!(self, TileKind::Wall)
    }

    pub fn glyph(self) -> char {
        match self {
            TileKind::Void => ' ',
            TileKind::Wall => '#',
            TileKind::Floor => '.',
        }
    }
}

/// Row-major 2-D array, indexed the same way as `Algorithm2D`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: i32, height: i32, fill: T) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            cells: vec![fill; size],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    fn idx(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, point: Point) -> Option<&T> {
        self.idx(point).map(|idx| &self.cells[idx])
    }

    pub fn set(&mut self, point: Point, value: T) {
        if let Some(idx) = self.idx(point) {
            self.cells[idx] = value;
        }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.iter_mut().for_each(|cell| *cell = value.clone());
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + use<T> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Point::new(x, y)))
    }
}

impl Grid<bool> {
    pub fn is_set(&self, point: Point) -> bool {
        self.get(point).copied().unwrap_or(false)
    }
}

/// Identifies a floor so it can be generated on demand and found again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapKey {
    Tombs(i32),
}

impl MapKey {
    pub fn depth(self) -> i32 {
        match self {
            MapKey::Tombs(depth) => depth,
        }
    }

    fn generate(self, store: &mut WorldStore) -> Entity {
        match self {
            MapKey::Tombs(depth) => procgen::generate_dungeon(store, depth),
        }
    }
}

/// Creates a blank map entity: all void, nothing seen or remembered.
pub fn new_map(store: &mut WorldStore, width: i32, height: i32) -> Entity {
    let map = store.create();
    store.insert(map, MapShape { height, width });
    store.insert(map, Tiles(Grid::new(width, height, TileKind::Void)));
    store.insert(map, VisibleTiles(Grid::new(width, height, false)));
    store.insert(map, MemoryTiles(Grid::new(width, height, TileKind::Void)));
    map
}

/// Returns the map for `key`, generating and caching it on first use.
pub fn get_map(store: &mut WorldStore, key: MapKey) -> Entity {
    if let Some(map) = store.cached_map(key) {
        return map;
    }
    let map = key.generate(store);
    store.insert(map, key);
    store.cache_map(key, map);
    log::debug!("generated {key:?} as {map:?}");
    map
}

/// Opacity view over a tile grid for field-of-view scans.
pub struct SightMap<'a> {
    tiles: &'a Grid<TileKind>,
}

impl<'a> SightMap<'a> {
    pub fn new(tiles: &'a Grid<TileKind>) -> Self {
        Self { tiles }
    }
}

impl BaseMap for SightMap<'_> {
    fn is_opaque(&self, idx: usize) -> bool {
        self.tiles
            .cells()
            .get(idx)
            .map_or(true, |tile| !tile.transparent())
    }
}

impl Algorithm2D for SightMap<'_> {
    fn dimensions(&self) -> Point {
        Point::new(self.tiles.width(), self.tiles.height())
    }

    fn in_bounds(&self, point: Point) -> bool {
        self.tiles.in_bounds(point)
    }
}
