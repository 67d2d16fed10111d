use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use specs::prelude::{Component, DenseVecStorage, HashMapStorage, NullStorage, VecStorage};
use specs::Entity;

use crate::map::{Grid, MapKey, TileKind};

/// Tile coordinate plus the map entity that contains it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub map: Entity,
}

impl Position {
    pub const fn new(x: i32, y: i32, map: Entity) -> Self {
        Self { x, y, map }
    }

    pub fn at(point: Point, map: Entity) -> Self {
        Self::new(point.x, point.y, map)
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn offset(&self, delta: Point) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.map)
    }

    pub fn distance_squared(&self, other: &Position) -> i32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl Component for Position {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graphic {
    pub glyph: char,
    pub color: [u8; 3],
}

impl Graphic {
    pub const fn new(glyph: char, color: [u8; 3]) -> Self {
        Self { glyph, color }
    }
}

impl Component for Graphic {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

impl Component for Name {
    type Storage = VecStorage<Self>;
}

macro_rules! stat_component {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
            pub struct $name(pub i32);

            impl Component for $name {
                type Storage = DenseVecStorage<Self>;
            }
        )*
    };
}

stat_component!(
    Hp,
    MaxHp,
    Power,
    Defense,
    PowerBonus,
    DefenseBonus,
    RewardXp,
    Level,
    Xp,
    Floor,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapShape {
    pub height: i32,
    pub width: i32,
}

impl Component for MapShape {
    type Storage = HashMapStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiles(pub Grid<TileKind>);

impl Component for Tiles {
    type Storage = HashMapStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleTiles(pub Grid<bool>);

impl Component for VisibleTiles {
    type Storage = HashMapStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTiles(pub Grid<TileKind>);

impl Component for MemoryTiles {
    type Storage = HashMapStorage<Self>;
}

impl Component for MapKey {
    type Storage = HashMapStorage<Self>;
}

/// Map a staircase leads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination(pub MapKey);

impl Component for Destination {
    type Storage = HashMapStorage<Self>;
}

/// Floor-indexed step table: the value for a floor is the one attached to
/// the highest key not above it, or zero below the first key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTable(pub Vec<(i32, i32)>);

impl StepTable {
    pub fn at(&self, floor: i32) -> i32 {
        self.0
            .iter()
            .take_while(|(key, _)| *key <= floor)
            .last()
            .map_or(0, |(_, value)| *value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnWeight(pub StepTable);

impl Component for SpawnWeight {
    type Storage = DenseVecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
}

impl Component for EquipSlot {
    type Storage = DenseVecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedKey(pub char);

impl Component for AssignedKey {
    type Storage = DenseVecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count(pub u32);

impl Component for Count {
    type Storage = DenseVecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemUse {
    Potion { heal: i32 },
    LightningScroll { damage: i32, max_range: i32 },
    FireballScroll { damage: i32, radius: i32 },
}

impl Component for ItemUse {
    type Storage = DenseVecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateKey(pub String);

impl Component for TemplateKey {
    type Storage = HashMapStorage<Self>;
}

/// Where the player last saw this entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LastSeen(pub Position);

impl Component for LastSeen {
    type Storage = DenseVecStorage<Self>;
}

/// Creation counter; query results are ordered by it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Serial(pub u64);

impl Component for Serial {
    type Storage = VecStorage<Self>;
}

macro_rules! tag_component {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $name;

            impl Component for $name {
                type Storage = NullStorage<Self>;
            }
        )*
    };
}

tag_component!(
    IsPlayer,
    IsActor,
    IsItem,
    IsAlive,
    IsBlocking,
    IsGhost,
    IsTemplate,
    UpStairs,
    DownStairs,
);
