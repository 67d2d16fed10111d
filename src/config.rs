use serde::{Deserialize, Serialize};

pub const DEFAULT_MAP_WIDTH: i32 = 80;
pub const DEFAULT_MAP_HEIGHT: i32 = 45;

/// Tuning values shared by every subsystem. Stored as a resource of the
/// world store so callers never reach for globals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub fov_radius: i32,
    pub inventory_capacity: usize,
    pub path: PathCosts,
    pub generator: GeneratorConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            fov_radius: 10,
            inventory_capacity: 26,
            path: PathCosts::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathCosts {
    pub cardinal: i32,
    pub diagonal: i32,
    /// Added to the walk cost of tiles holding a blocking entity. Higher
    /// values spread hunters around a target instead of queueing them.
    pub crowd_penalty: i32,
}

impl Default for PathCosts {
    fn default() -> Self {
        Self {
            cardinal: 2,
            diagonal: 3,
            crowd_penalty: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub map_width: i32,
    pub map_height: i32,
    pub max_rooms: usize,
    pub room_min_size: i32,
    pub room_max_size: i32,
    pub max_iterations: u32,
    pub extra_corridors: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            max_rooms: 20,
            room_min_size: 6,
            room_max_size: 10,
            max_iterations: 100_000,
            extra_corridors: 3,
        }
    }
}
