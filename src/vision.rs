//! Field of view, tile memory and ghost bookkeeping.

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, FieldOfViewAlg};
use specs::Entity;

use crate::ecs::WorldStore;
use crate::ecs::components::{
    Graphic, IsGhost, LastSeen, MemoryTiles, Name, Position, Tiles, VisibleTiles,
};
use crate::ecs::query::Query;
use crate::ecs::relations::Relation;
use crate::map::{Grid, SightMap};

/// Symmetric shadowcasting from `origin`. Tiles outside the map block sight
/// and are never reported; walls bounding the view are visible.
pub fn compute_fov<M: Algorithm2D>(origin: Point, radius: i32, map: &M) -> Grid<bool> {
    let size = map.dimensions();
    let mut visible = Grid::new(size.x, size.y, false);
    if !map.in_bounds(origin) {
        return visible;
    }
    for point in FieldOfViewAlg::SymmetricShadowcasting.field_of_view_set(origin, radius, map) {
        visible.set(point, true);
    }
    visible
}

/// Recomputes what `viewer` sees on its map, refreshes tile memory and
/// updates ghosts. With `clear` set, visibility is blanked instead.
pub fn update_fov(store: &mut WorldStore, viewer: Entity, clear: bool) {
    let Some(position) = store.get::<Position>(viewer) else {
        panic!("{viewer:?} has no position to see from");
    };
    let map = position.map;
    let Some(Tiles(tiles)) = store.get::<Tiles>(map) else {
        panic!("{map:?} is not a map");
    };
    let blank = || Grid::new(tiles.width(), tiles.height(), false);
    let old = store
        .get::<VisibleTiles>(map)
        .map_or_else(blank, |VisibleTiles(visible)| visible);
    let new = if clear {
        blank()
    } else {
        let radius = store.config().fov_radius;
        compute_fov(position.point(), radius, &SightMap::new(&tiles))
    };

    store.insert(map, VisibleTiles(new.clone()));
    store.modify::<MemoryTiles, _>(map, |MemoryTiles(memory)| {
        for point in new.points() {
            if new.is_set(point) {
                if let Some(tile) = tiles.get(point) {
                    memory.set(point, *tile);
                }
            }
        }
    });

    let ghosts = store.query(
        &Query::new()
            .with::<IsGhost>()
            .related(Relation::IsIn, map),
    );
    for ghost in ghosts {
        let Some(at) = store.get::<Position>(ghost) else {
            continue;
        };
        if old.is_set(at.point()) && new.is_set(at.point()) {
            store.destroy(ghost);
        }
    }

    let tracked = store.query(
        &Query::new()
            .with::<Graphic>()
            .related(Relation::IsIn, map)
            .without::<IsGhost>(),
    );
    for entity in tracked {
        if entity == viewer {
            continue;
        }
        let Some(at) = store.get::<Position>(entity) else {
            continue;
        };
        if new.is_set(at.point()) {
            store.insert(entity, LastSeen(at));
        } else if let Some(LastSeen(seen)) = store.remove::<LastSeen>(entity) {
            if !new.is_set(seen.point()) {
                spawn_ghost(store, entity, seen);
            }
        }
    }
}

fn spawn_ghost(store: &mut WorldStore, of: Entity, at: Position) -> Entity {
    let ghost = store.create();
    store.tag::<IsGhost>(ghost);
    if let Some(graphic) = store.get::<Graphic>(of) {
        store.insert(ghost, graphic);
    }
    if let Some(name) = store.get::<Name>(of) {
        store.insert(ghost, name);
    }
    store.set_position(ghost, at);
    ghost
}

/// Ghosts left behind on the same tile as `position`.
pub fn ghosts_at(store: &WorldStore, position: Position) -> Vec<Entity> {
    store.query(&Query::new().with::<IsGhost>().at(position))
}
