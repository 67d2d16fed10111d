use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap, a_star_search};
use smallvec::SmallVec;
use specs::Entity;

use crate::config::PathCosts;
use crate::ecs::WorldStore;
use crate::ecs::components::{IsBlocking, Position, Tiles};
use crate::ecs::query::Query;
use crate::ecs::relations::Relation;
use crate::map::Grid;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Per-tile step costs for one map. Zero marks an impassable tile.
pub struct CostMap {
    cost: Grid<i32>,
    costs: PathCosts,
}

impl CostMap {
    /// Walk costs of the map's tiles, with a penalty on every tile holding
    /// a blocking entity.
    pub fn for_map(store: &WorldStore, map: Entity) -> Self {
        let costs = store.config().path;
        let Some(Tiles(tiles)) = store.get::<Tiles>(map) else {
            panic!("{map:?} is not a map");
        };
        let mut cost = Grid::new(tiles.width(), tiles.height(), 0);
        for point in tiles.points() {
            if let Some(tile) = tiles.get(point) {
                cost.set(point, tile.walk_cost());
            }
        }
        let blockers = store.query(
            &Query::new()
                .with::<IsBlocking>()
                .related(Relation::IsIn, map),
        );
        for blocker in blockers {
            let Some(position) = store.get::<Position>(blocker) else {
                continue;
            };
            let point = position.point();
            if let Some(current) = cost.get(point).copied() {
                if current > 0 {
                    cost.set(point, current + costs.crowd_penalty);
                }
            }
        }
        Self { cost, costs }
    }

    pub fn cost_at(&self, point: Point) -> i32 {
        self.cost.get(point).copied().unwrap_or(0)
    }
}

impl BaseMap for CostMap {
    fn is_opaque(&self, _idx: usize) -> bool {
        false
    }

    fn get_available_exits(&self, idx: usize) -> SmallVec<[(usize, f32); 10]> {
        let mut exits = SmallVec::new();
        let point = self.index_to_point2d(idx);
        for (dx, dy) in NEIGHBOURS {
            let dest = Point::new(point.x + dx, point.y + dy);
            let cost = self.cost_at(dest);
            if cost <= 0 {
                continue;
            }
            let step = if dx != 0 && dy != 0 {
                self.costs.diagonal
            } else {
                self.costs.cardinal
            };
            exits.push((self.point2d_to_index(dest), (cost * step) as f32));
        }
        exits
    }

    fn get_pathing_distance(&self, idx1: usize, idx2: usize) -> f32 {
        let p1 = self.index_to_point2d(idx1);
        let p2 = self.index_to_point2d(idx2);
        let dx = (p1.x - p2.x).abs();
        let dy = (p1.y - p2.y).abs();
        let (low, high) = (dx.min(dy), dx.max(dy));
        let diagonal = self.costs.diagonal.min(2 * self.costs.cardinal);
        (self.costs.cardinal * (high - low) + diagonal * low) as f32
    }
}

impl Algorithm2D for CostMap {
    fn dimensions(&self) -> Point {
        Point::new(self.cost.width(), self.cost.height())
    }

    fn in_bounds(&self, point: Point) -> bool {
        self.cost.in_bounds(point)
    }
}

/// Cheapest route from the actor to `dest` on the actor's map, without the
/// starting tile. Empty when there is no route.
pub fn path_to(store: &WorldStore, actor: Entity, dest: Point) -> Vec<Point> {
    let Some(start) = store.get::<Position>(actor) else {
        return Vec::new();
    };
    let map = CostMap::for_map(store, start.map);
    if !map.in_bounds(dest) || start.point() == dest {
        return Vec::new();
    }
    let path = a_star_search(
        map.point2d_to_index(start.point()),
        map.point2d_to_index(dest),
        &map,
    );
    if !path.success {
        return Vec::new();
    }
    path.steps
        .into_iter()
        .skip(1)
        .map(|idx| map.index_to_point2d(idx))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{map_from_rows, open_room, spawn_fighter};

    #[test]
    fn path_excludes_start_and_ends_at_destination() {
        let mut store = WorldStore::new(5);
        let map = open_room(&mut store, 8, 1);
        let walker = spawn_fighter(&mut store, Position::new(1, 1, map), "orc", 10, 3, 0);

        let path = path_to(&store, walker, Point::new(5, 1));
        assert_eq!(
            path,
            vec![
                Point::new(2, 1),
                Point::new(3, 1),
                Point::new(4, 1),
                Point::new(5, 1)
            ]
        );
    }

    #[test]
    fn unreachable_destination_gives_empty_path() {
        let mut store = WorldStore::new(5);
        let map = map_from_rows(&mut store, &["#######", "#..#..#", "#######"]);
        let walker = spawn_fighter(&mut store, Position::new(1, 1, map), "orc", 10, 3, 0);

        assert!(path_to(&store, walker, Point::new(5, 1)).is_empty());
        assert!(path_to(&store, walker, Point::new(1, 1)).is_empty());
    }

    #[test]
    fn blocking_actors_make_tiles_costlier() {
        let mut store = WorldStore::new(5);
        let map = open_room(&mut store, 5, 3);
        spawn_fighter(&mut store, Position::new(3, 2, map), "troll", 16, 4, 1);
        let costs = CostMap::for_map(&store, map);

        assert_eq!(costs.cost_at(Point::new(3, 2)), 11);
        assert_eq!(costs.cost_at(Point::new(2, 2)), 1);
        assert_eq!(costs.cost_at(Point::new(0, 0)), 0);
    }

    #[test]
    fn path_goes_around_a_blocking_actor() {
        let mut store = WorldStore::new(5);
        let map = open_room(&mut store, 5, 3);
        let walker = spawn_fighter(&mut store, Position::new(1, 2, map), "orc", 10, 3, 0);
        let troll_at = Point::new(3, 2);
        spawn_fighter(&mut store, Position::at(troll_at, map), "troll", 16, 4, 1);

        let path = path_to(&store, walker, Point::new(5, 2));
        assert_eq!(path.last(), Some(&Point::new(5, 2)));
        assert!(!path.contains(&troll_at));
        for pair in path.windows(2) {
            assert!((pair[0].x - pair[1].x).abs() <= 1 && (pair[0].y - pair[1].y).abs() <= 1);
        }
    }
}
