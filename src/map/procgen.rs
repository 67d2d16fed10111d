//! Random-walk room placement, corridors, stairs and population.

use bracket_geometry::prelude::{LineAlg, Point, Rect, line2d};
use bracket_random::prelude::RandomNumberGenerator;
use specs::Entity;

use super::{Grid, MapKey, TileKind, new_map};
use crate::ai::Ai;
use crate::config::GeneratorConfig;
use crate::data::{self, MAX_ITEMS_BY_FLOOR, MAX_MONSTERS_BY_FLOOR};
use crate::ecs::WorldStore;
use crate::ecs::components::{
    Destination, DownStairs, Floor, Graphic, IsActor, IsItem, Name, Position, StepTable, Tiles,
    UpStairs,
};

const FREE_TILE_ATTEMPTS: usize = 16;
const STAIRS_COLOR: [u8; 3] = [255, 255, 255];

const WALK_DIRECTIONS: [Point; 4] = [
    Point { x: 1, y: 0 },
    Point { x: -1, y: 0 },
    Point { x: 0, y: 1 },
    Point { x: 0, y: -1 },
];

/// Rooms and carved tiles before anything is spawned.
#[derive(Clone, Debug)]
pub struct Layout {
    pub tiles: Grid<TileKind>,
    pub rooms: Vec<Rect>,
}

impl Layout {
    fn carve(&mut self, point: Point) {
        self.tiles.set(point, TileKind::Floor);
    }

    fn carve_room(&mut self, room: &Rect) {
        for y in room.y1 + 1..room.y2 {
            for x in room.x1 + 1..room.x2 {
                self.carve(Point::new(x, y));
            }
        }
    }

    /// L-shaped tunnel between two points, bending at a random corner.
    fn carve_tunnel(&mut self, rng: &mut RandomNumberGenerator, start: Point, end: Point) {
        let corner = if rng.range(0, 2) == 0 {
            Point::new(end.x, start.y)
        } else {
            Point::new(start.x, end.y)
        };
        for (from, to) in [(start, corner), (corner, end)] {
            for point in line2d(LineAlg::Bresenham, from, to) {
                self.carve(point);
            }
            self.carve(from);
            self.carve(to);
        }
    }

    /// Turns every void tile touching a floor tile into wall.
    fn wall_in(&mut self) {
        let floor = self.tiles.clone();
        for point in floor.points() {
            if floor.get(point) != Some(&TileKind::Void) {
                continue;
            }
            let touches_floor = (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| Point::new(point.x + dx, point.y + dy)))
                .any(|near| floor.get(near) == Some(&TileKind::Floor));
            if touches_floor {
                self.tiles.set(point, TileKind::Wall);
            }
        }
    }
}

fn random_inner_point(rng: &mut RandomNumberGenerator, room: &Rect) -> Point {
    Point::new(
        rng.range(room.x1 + 1, room.x2),
        rng.range(room.y1 + 1, room.y2),
    )
}

fn center_distance(a: &Rect, b: &Rect) -> i32 {
    let (ca, cb) = (a.center(), b.center());
    (ca.x - cb.x).pow(2) + (ca.y - cb.y).pow(2)
}

/// Carves rooms by random-walking from existing rooms until a free spot
/// appears, then joins each new room to its nearest neighbour.
pub fn carve_layout(rng: &mut RandomNumberGenerator, config: &GeneratorConfig) -> Layout {
    let (width, height) = (config.map_width, config.map_height);
    let mut layout = Layout {
        tiles: Grid::new(width, height, TileKind::Void),
        rooms: Vec::new(),
    };
    let room_size = |rng: &mut RandomNumberGenerator| {
        (
            rng.range(config.room_min_size, config.room_max_size + 1),
            rng.range(config.room_min_size, config.room_max_size + 1),
        )
    };

    let (room_w, room_h) = room_size(rng);
    let seed_room = Rect::with_size(
        rng.range(0, (width - room_w).max(1)),
        rng.range(0, (height - room_h).max(1)),
        room_w,
        room_h,
    );
    layout.carve_room(&seed_room);
    layout.rooms.push(seed_room);

    let mut budget = config.max_iterations;
    'rooms: for _ in 0..config.max_rooms {
        let from = layout.rooms[rng.range(0, layout.rooms.len() as i32) as usize];
        let (room_w, room_h) = room_size(rng);
        let space = Point::new(width - room_w, height - room_h);
        if space.x <= 0 || space.y <= 0 {
            continue;
        }
        let mut cursor = Point::new(from.x1.clamp(0, space.x - 1), from.y1.clamp(0, space.y - 1));
        loop {
            if budget == 0 {
                log::warn!(
                    "room placement ran out of iterations with {} rooms",
                    layout.rooms.len()
                );
                break 'rooms;
            }
            let step = WALK_DIRECTIONS[rng.range(0, WALK_DIRECTIONS.len() as i32) as usize];
            let next = Point::new(cursor.x + step.x, cursor.y + step.y);
            if next.x < 0 || next.x >= space.x || next.y < 0 || next.y >= space.y {
                continue;
            }
            cursor = next;
            budget -= 1;

            let candidate = Rect::with_size(cursor.x, cursor.y, room_w, room_h);
            if layout.rooms.iter().any(|room| room.intersect(&candidate)) {
                continue;
            }
            let nearest = layout
                .rooms
                .iter()
                .min_by_key(|room| center_distance(room, &candidate))
                .copied()
                .unwrap_or(from);
            layout.carve_room(&candidate);
            layout.carve_tunnel(rng, nearest.center(), candidate.center());
            layout.rooms.push(candidate);
            break;
        }
    }

    if layout.rooms.len() > 1 {
        for _ in 0..config.extra_corridors {
            let count = layout.rooms.len() as i32;
            let a = layout.rooms[rng.range(0, count) as usize];
            let b = layout.rooms[rng.range(0, count) as usize];
            if a != b {
                layout.carve_tunnel(rng, a.center(), b.center());
            }
        }
    }

    layout.wall_in();
    layout
}

/// Builds, furnishes and returns a new map for dungeon floor `depth`.
pub fn generate_dungeon(store: &mut WorldStore, depth: i32) -> Entity {
    let config = store.config().generator.clone();
    let layout = carve_layout(&mut store.rng(), &config);
    let map = new_map(store, config.map_width, config.map_height);
    store.insert(map, Tiles(layout.tiles.clone()));
    store.insert(map, Floor(depth));

    let up = layout.rooms[0].center();
    let down = match layout.rooms.last() {
        Some(last) if layout.rooms.len() > 1 => last.center(),
        _ => {
            let room = layout.rooms[0];
            let mut pick = up;
            for _ in 0..FREE_TILE_ATTEMPTS {
                pick = random_inner_point(&mut store.rng(), &room);
                if pick != up {
                    break;
                }
            }
            pick
        }
    };
    let up_destination = (depth > 1).then(|| MapKey::Tombs(depth - 1));
    spawn_stairs(store, Position::at(up, map), StairsKind::Up, up_destination);
    spawn_stairs(
        store,
        Position::at(down, map),
        StairsKind::Down,
        Some(MapKey::Tombs(depth + 1)),
    );

    let interior = layout.rooms.len().saturating_sub(1);
    for room in layout.rooms.iter().take(interior).skip(1) {
        populate_room(store, map, room, depth);
    }

    log::debug!(
        "floor {depth}: {} rooms, {} tiles of floor",
        layout.rooms.len(),
        layout
            .tiles
            .cells()
            .iter()
            .filter(|tile| **tile == TileKind::Floor)
            .count()
    );
    map
}

#[derive(Copy, Clone, Debug)]
enum StairsKind {
    Up,
    Down,
}

fn spawn_stairs(
    store: &mut WorldStore,
    position: Position,
    kind: StairsKind,
    destination: Option<MapKey>,
) -> Entity {
    let stairs = store.create();
    match kind {
        StairsKind::Up => {
            store.insert(stairs, Graphic::new('<', STAIRS_COLOR));
            store.insert(stairs, Name("upward stairs".to_string()));
            store.tag::<UpStairs>(stairs);
        }
        StairsKind::Down => {
            store.insert(stairs, Graphic::new('>', STAIRS_COLOR));
            store.insert(stairs, Name("downward stairs".to_string()));
            store.tag::<DownStairs>(stairs);
        }
    }
    if let Some(destination) = destination {
        store.insert(stairs, Destination(destination));
    }
    store.set_position(stairs, position);
    stairs
}

fn populate_room(store: &mut WorldStore, map: Entity, room: &Rect, depth: i32) {
    let max_monsters = StepTable(MAX_MONSTERS_BY_FLOOR.to_vec()).at(depth);
    let max_items = StepTable(MAX_ITEMS_BY_FLOOR.to_vec()).at(depth);
    let monsters = store.roll(0, max_monsters + 1);
    let items = store.roll(0, max_items + 1);

    for _ in 0..monsters {
        let Some(template) = data::pick_weighted::<IsActor>(store, depth) else {
            break;
        };
        if let Some(position) = free_tile(store, map, room) {
            let monster = data::spawn_actor(store, template, position);
            store.insert(monster, Ai::default());
        }
    }
    for _ in 0..items {
        let Some(template) = data::pick_weighted::<IsItem>(store, depth) else {
            break;
        };
        if let Some(position) = free_tile(store, map, room) {
            data::spawn_item(store, template, position);
        }
    }
}

fn free_tile(store: &WorldStore, map: Entity, room: &Rect) -> Option<Position> {
    (0..FREE_TILE_ATTEMPTS)
        .map(|_| Position::at(random_inner_point(&mut store.rng(), room), map))
        .find(|position| store.is_vacant(position))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::*;
    use crate::ecs::components::{IsAlive, IsTemplate, SpawnWeight};
    use crate::ecs::query::Query;
    use crate::ecs::relations::Relation;
    use crate::map::get_map;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            map_width: 50,
            map_height: 30,
            max_rooms: 8,
            ..GeneratorConfig::default()
        }
    }

    fn reachable(tiles: &Grid<TileKind>, from: Point, to: Point) -> bool {
        let mut seen = Grid::new(tiles.width(), tiles.height(), false);
        let mut queue = VecDeque::from([from]);
        seen.set(from, true);
        while let Some(point) = queue.pop_front() {
            if point == to {
                return true;
            }
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let next = Point::new(point.x + dx, point.y + dy);
                    if tiles.get(next).is_some_and(|tile| tile.walk_cost() > 0)
                        && !seen.is_set(next)
                    {
                        seen.set(next, true);
                        queue.push_back(next);
                    }
                }
            }
        }
        false
    }

    #[test]
    fn same_seed_same_layout() {
        let config = small_config();
        let a = carve_layout(&mut RandomNumberGenerator::seeded(42), &config);
        let b = carve_layout(&mut RandomNumberGenerator::seeded(42), &config);
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a.rooms, b.rooms);
    }

    #[test]
    fn rooms_stay_inside_the_map_and_never_overlap() {
        let config = small_config();
        let layout = carve_layout(&mut RandomNumberGenerator::seeded(7), &config);
        assert!(layout.rooms.len() > 1);
        for (i, room) in layout.rooms.iter().enumerate() {
            assert!(room.x1 >= 0 && room.y1 >= 0);
            assert!(room.x2 < config.map_width && room.y2 < config.map_height);
            for other in &layout.rooms[i + 1..] {
                assert!(!room.intersect(other));
            }
        }
    }

    #[test]
    fn floor_is_always_walled_in() {
        let layout = carve_layout(&mut RandomNumberGenerator::seeded(11), &small_config());
        for point in layout.tiles.points() {
            if layout.tiles.get(point) != Some(&TileKind::Floor) {
                continue;
            }
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let near = Point::new(point.x + dx, point.y + dy);
                    assert_ne!(layout.tiles.get(near), Some(&TileKind::Void), "{near:?}");
                }
            }
        }
    }

    #[test]
    fn tiny_budget_stops_early_with_the_seed_room() {
        let config = GeneratorConfig {
            max_iterations: 0,
            ..small_config()
        };
        let layout = carve_layout(&mut RandomNumberGenerator::seeded(3), &config);
        assert_eq!(layout.rooms.len(), 1);
    }

    #[test]
    fn first_floor_has_a_dead_end_upstairs_and_a_way_down() {
        let mut store = WorldStore::new(21);
        crate::data::init_templates(&mut store);
        let map = get_map(&mut store, MapKey::Tombs(1));

        let up = store.query(&Query::new().with::<UpStairs>().related(Relation::IsIn, map));
        let down = store.query(&Query::new().with::<DownStairs>().related(Relation::IsIn, map));
        assert_eq!(up.len(), 1);
        assert_eq!(down.len(), 1);
        assert_eq!(store.get::<Destination>(up[0]), None);
        assert_eq!(
            store.get::<Destination>(down[0]),
            Some(Destination(MapKey::Tombs(2)))
        );
        assert_eq!(store.get::<Floor>(map), Some(Floor(1)));
    }

    #[test]
    fn maps_are_cached_by_key() {
        let mut store = WorldStore::new(21);
        crate::data::init_templates(&mut store);
        let first = get_map(&mut store, MapKey::Tombs(1));
        let second = get_map(&mut store, MapKey::Tombs(2));
        assert_ne!(first, second);
        assert_eq!(get_map(&mut store, MapKey::Tombs(1)), first);

        let up = store.query(&Query::new().with::<UpStairs>().related(Relation::IsIn, second));
        assert_eq!(
            store.get::<Destination>(up[0]),
            Some(Destination(MapKey::Tombs(1)))
        );
    }

    #[test]
    fn spawned_monsters_are_live_instances_on_floor() {
        let mut store = WorldStore::new(5);
        crate::data::init_templates(&mut store);
        let map = get_map(&mut store, MapKey::Tombs(1));
        let Some(Tiles(tiles)) = store.get::<Tiles>(map) else {
            unreachable!();
        };

        for monster in store.query(&Query::new().with::<Ai>().related(Relation::IsIn, map)) {
            assert!(store.has::<IsAlive>(monster));
            assert!(!store.has::<IsTemplate>(monster));
            assert!(!store.has::<SpawnWeight>(monster));
            let Some(position) = store.get::<Position>(monster) else {
                unreachable!();
            };
            assert_eq!(tiles.get(position.point()), Some(&TileKind::Floor));
            let template = store.target(monster, Relation::IsA);
            assert!(template.is_some_and(|t| store.has::<IsTemplate>(t)));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn stairs_are_always_connected(seed in any::<u64>(), depth in 1i32..8) {
            let mut store = WorldStore::new(seed);
            crate::data::init_templates(&mut store);
            let map = get_map(&mut store, MapKey::Tombs(depth));
            let Some(Tiles(tiles)) = store.get::<Tiles>(map) else {
                unreachable!();
            };
            let up = store.query(&Query::new().with::<UpStairs>().related(Relation::IsIn, map));
            let down = store.query(&Query::new().with::<DownStairs>().related(Relation::IsIn, map));
            prop_assert_eq!(up.len(), 1);
            prop_assert_eq!(down.len(), 1);
            let (Some(up), Some(down)) = (
                store.get::<Position>(up[0]),
                store.get::<Position>(down[0]),
            ) else {
                unreachable!();
            };
            prop_assert!(up != down);
            prop_assert!(reachable(&tiles, up.point(), down.point()));
        }
    }
}
