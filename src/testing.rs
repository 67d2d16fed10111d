//! Small hand-drawn worlds for unit tests.

use bracket_geometry::prelude::Point;
use specs::Entity;

use crate::ecs::WorldStore;
use crate::ecs::components::{
    Defense, Graphic, Hp, IsActor, IsAlive, IsBlocking, IsPlayer, Level, MaxHp, Name, Position,
    Power, Tiles, Xp,
};
use crate::map::{TileKind, new_map};

/// `#` is wall, `.` is floor, anything else is void.
pub(crate) fn map_from_rows(store: &mut WorldStore, rows: &[&str]) -> Entity {
    let height = rows.len() as i32;
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0) as i32;
    let map = new_map(store, width, height);
    store.modify::<Tiles, _>(map, |Tiles(tiles)| {
        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                let tile = match glyph {
                    '#' => TileKind::Wall,
                    '.' => TileKind::Floor,
                    _ => TileKind::Void,
                };
                tiles.set(Point::new(x as i32, y as i32), tile);
            }
        }
    });
    map
}

/// A walled room of `width` x `height` floor tiles, offset by one.
pub(crate) fn open_room(store: &mut WorldStore, width: usize, height: usize) -> Entity {
    let wall = "#".repeat(width + 2);
    let inner = format!("#{}#", ".".repeat(width));
    let mut rows = vec![wall.as_str()];
    rows.extend(std::iter::repeat_n(inner.as_str(), height));
    rows.push(wall.as_str());
    map_from_rows(store, &rows)
}

pub(crate) fn spawn_fighter(
    store: &mut WorldStore,
    position: Position,
    name: &str,
    hp: i32,
    power: i32,
    defense: i32,
) -> Entity {
    let actor = store.create();
    store.insert(actor, Name(name.to_string()));
    store.insert(actor, Graphic::new(name.chars().next().unwrap_or('?'), [255, 255, 255]));
    store.insert(actor, Hp(hp));
    store.insert(actor, MaxHp(hp));
    store.insert(actor, Power(power));
    store.insert(actor, Defense(defense));
    store.tag::<IsActor>(actor);
    store.tag::<IsAlive>(actor);
    store.tag::<IsBlocking>(actor);
    store.insert(actor, position);
    actor
}

pub(crate) fn spawn_player(store: &mut WorldStore, position: Position) -> Entity {
    let player = spawn_fighter(store, position, "player", 30, 2, 1);
    store.insert(player, Graphic::new('@', [255, 255, 255]));
    store.insert(player, Level(1));
    store.insert(player, Xp(0));
    store.tag::<IsPlayer>(player);
    player
}
