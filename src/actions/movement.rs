use bracket_geometry::prelude::Point;
use specs::Entity;

use super::ActionResult;
use crate::combat::{apply_damage, melee_damage};
use crate::ecs::WorldStore;
use crate::ecs::components::{IsAlive, IsBlocking, IsPlayer, MapShape, Position, Tiles};
use crate::ecs::query::Query;
use crate::ecs::resources::MessageKind;

fn here(store: &WorldStore, actor: Entity) -> Position {
    match store.get::<Position>(actor) {
        Some(position) => position,
        None => panic!("{actor:?} acts without a position"),
    }
}

fn is_step(direction: Point) -> bool {
    direction.x.abs() <= 1 && direction.y.abs() <= 1
}

pub fn wait(_store: &mut WorldStore, _actor: Entity) -> ActionResult {
    ActionResult::success()
}

/// Steps one tile. Checks run in order and the first failure wins; nothing
/// is written unless all pass.
pub fn move_by(store: &mut WorldStore, actor: Entity, direction: Point) -> ActionResult {
    if !is_step(direction) {
        return ActionResult::Impossible("Invalid direction.".to_string());
    }
    if direction == Point::new(0, 0) {
        return wait(store, actor);
    }
    let dest = here(store, actor).offset(direction);
    let Some(MapShape { width, height }) = store.get::<MapShape>(dest.map) else {
        panic!("{:?} is not a map", dest.map);
    };
    if dest.x < 0 || dest.x >= width || dest.y < 0 || dest.y >= height {
        return ActionResult::Impossible("Out of bounds.".to_string());
    }
    let tile = store
        .get::<Tiles>(dest.map)
        .and_then(|Tiles(tiles)| tiles.get(dest.point()).copied())
        .unwrap_or_default();
    if tile.walk_cost() == 0 {
        return ActionResult::Impossible(format!("Blocked by {}.", tile.name()));
    }
    if !store
        .query(&Query::new().with::<IsBlocking>().at(dest))
        .is_empty()
    {
        return ActionResult::Impossible("Something is in the way.".to_string());
    }

    store.set_position(actor, dest);
    ActionResult::success()
}

pub fn melee(store: &mut WorldStore, actor: Entity, direction: Point) -> ActionResult {
    if !is_step(direction) || direction == Point::new(0, 0) {
        return ActionResult::Impossible("Invalid direction.".to_string());
    }
    let dest = here(store, actor).offset(direction);
    let targets = store.query(&Query::new().with::<IsAlive>().at(dest));
    let &[target] = targets.as_slice() else {
        return ActionResult::Impossible("Nothing there to attack.".to_string());
    };

    let damage = melee_damage(store, actor, target);
    let kind = if store.has::<IsPlayer>(actor) {
        MessageKind::PlayerAttack
    } else {
        MessageKind::EnemyAttack
    };
    let description = format!("{} attacks {}", store.name_of(actor), store.name_of(target));
    if damage > 0 {
        store.add_message(format!("{description} for {damage} hit points."), kind);
        apply_damage(store, target, damage, Some(actor));
    } else {
        store.add_message(format!("{description} but does no damage."), kind);
    }
    ActionResult::success()
}

pub fn bump(store: &mut WorldStore, actor: Entity, direction: Point) -> ActionResult {
    if direction == Point::new(0, 0) {
        return wait(store, actor);
    }
    let dest = here(store, actor).offset(direction);
    if store.query(&Query::new().with::<IsAlive>().at(dest)).is_empty() {
        move_by(store, actor, direction)
    } else {
        melee(store, actor, direction)
    }
}

/// Remaining tiles of a route, walked one step per turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FollowPath {
    path: Vec<Point>,
}

impl FollowPath {
    pub fn new(path: Vec<Point>) -> Self {
        Self { path }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn steps(&self) -> &[Point] {
        &self.path
    }

    /// Takes the next step. Any failure throws the rest of the route away.
    pub fn follow(&mut self, store: &mut WorldStore, actor: Entity) -> ActionResult {
        if self.path.is_empty() {
            return ActionResult::Impossible("No path.".to_string());
        }
        let from = here(store, actor).point();
        let next = self.path.remove(0);
        let result = move_by(store, actor, Point::new(next.x - from.x, next.y - from.y));
        if !result.is_success() {
            self.path.clear();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Hp, Power};
    use crate::testing::{map_from_rows, open_room, spawn_fighter, spawn_player};

    #[test]
    fn walking_into_a_wall_is_refused_and_changes_nothing() {
        let mut store = WorldStore::new(2);
        let map = open_room(&mut store, 3, 3);
        let start = Position::new(1, 1, map);
        let player = spawn_player(&mut store, start);

        assert_eq!(
            move_by(&mut store, player, Point::new(-1, 0)),
            ActionResult::Impossible("Blocked by wall.".to_string())
        );
        assert_eq!(store.get::<Position>(player), Some(start));
        assert_eq!(store.entities_at(&start), vec![player]);
    }

    #[test]
    fn checks_run_in_order() {
        let mut store = WorldStore::new(2);
        let map = map_from_rows(&mut store, &["..", ".."]);
        let player = spawn_player(&mut store, Position::new(0, 0, map));
        spawn_fighter(&mut store, Position::new(1, 0, map), "orc", 10, 3, 0);

        assert_eq!(
            move_by(&mut store, player, Point::new(2, 0)),
            ActionResult::Impossible("Invalid direction.".to_string())
        );
        assert_eq!(
            move_by(&mut store, player, Point::new(-1, 0)),
            ActionResult::Impossible("Out of bounds.".to_string())
        );
        assert_eq!(
            move_by(&mut store, player, Point::new(1, 0)),
            ActionResult::Impossible("Something is in the way.".to_string())
        );
        assert!(move_by(&mut store, player, Point::new(1, 1)).is_success());
        assert_eq!(store.get::<Position>(player), Some(Position::new(1, 1, map)));
    }

    #[test]
    fn void_blocks_like_a_wall() {
        let mut store = WorldStore::new(2);
        let map = map_from_rows(&mut store, &[". ."]);
        let player = spawn_player(&mut store, Position::new(0, 0, map));
        assert_eq!(
            move_by(&mut store, player, Point::new(1, 0)),
            ActionResult::Impossible("Blocked by void.".to_string())
        );
    }

    #[test]
    fn bump_picks_melee_move_or_refusal() {
        let mut store = WorldStore::new(2);
        let map = open_room(&mut store, 3, 3);
        let player = spawn_player(&mut store, Position::new(2, 2, map));
        store.insert(player, Power(5));
        let orc = spawn_fighter(&mut store, Position::new(3, 2, map), "orc", 10, 3, 2);

        assert!(bump(&mut store, player, Point::new(1, 0)).is_success());
        assert_eq!(store.get::<Hp>(orc), Some(Hp(7)));
        assert_eq!(store.get::<Position>(player), Some(Position::new(2, 2, map)));
        assert_eq!(
            store.messages().last_text(),
            Some("player attacks orc for 3 hit points.")
        );

        assert!(bump(&mut store, player, Point::new(0, -1)).is_success());
        assert_eq!(store.get::<Position>(player), Some(Position::new(2, 1, map)));

        assert_eq!(
            bump(&mut store, player, Point::new(0, -1)),
            ActionResult::Impossible("Blocked by wall.".to_string())
        );
    }

    #[test]
    fn melee_without_a_target_is_impossible() {
        let mut store = WorldStore::new(2);
        let map = open_room(&mut store, 3, 3);
        let player = spawn_player(&mut store, Position::new(2, 2, map));
        assert_eq!(
            melee(&mut store, player, Point::new(1, 0)),
            ActionResult::Impossible("Nothing there to attack.".to_string())
        );
    }

    #[test]
    fn blows_only_reach_adjacent_tiles() {
        let mut store = WorldStore::new(2);
        let map = open_room(&mut store, 4, 3);
        let player = spawn_player(&mut store, Position::new(1, 2, map));
        let orc = spawn_fighter(&mut store, Position::new(3, 2, map), "orc", 10, 3, 0);

        for action in [bump, melee] {
            assert_eq!(
                action(&mut store, player, Point::new(2, 0)),
                ActionResult::Impossible("Invalid direction.".to_string())
            );
        }
        assert_eq!(store.get::<Hp>(orc), Some(Hp(10)));
        assert_eq!(store.get::<Position>(player), Some(Position::new(1, 2, map)));
    }

    #[test]
    fn weak_blows_do_no_damage() {
        let mut store = WorldStore::new(2);
        let map = open_room(&mut store, 3, 3);
        let rat = spawn_fighter(&mut store, Position::new(1, 1, map), "rat", 2, 1, 0);
        let troll = spawn_fighter(&mut store, Position::new(2, 1, map), "troll", 16, 4, 3);

        assert!(melee(&mut store, rat, Point::new(1, 0)).is_success());
        assert_eq!(store.get::<Hp>(troll), Some(Hp(16)));
        assert_eq!(store.messages().entries[0].kind, MessageKind::EnemyAttack);
        assert_eq!(
            store.messages().last_text(),
            Some("rat attacks troll but does no damage.")
        );
    }

    #[test]
    fn blocked_path_is_dropped() {
        let mut store = WorldStore::new(2);
        let map = open_room(&mut store, 5, 1);
        let walker = spawn_fighter(&mut store, Position::new(1, 1, map), "orc", 10, 3, 0);
        spawn_fighter(&mut store, Position::new(3, 1, map), "troll", 16, 4, 1);
        let mut path = FollowPath::new(vec![
            Point::new(2, 1),
            Point::new(3, 1),
            Point::new(4, 1),
        ]);

        assert!(path.follow(&mut store, walker).is_success());
        assert!(!path.follow(&mut store, walker).is_success());
        assert!(path.is_empty());
        assert_eq!(
            path.follow(&mut store, walker),
            ActionResult::Impossible("No path.".to_string())
        );
        assert_eq!(store.get::<Position>(walker), Some(Position::new(2, 1, map)));
    }
}
