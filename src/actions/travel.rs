use specs::Entity;

use super::ActionResult;
use crate::ecs::WorldStore;
use crate::ecs::components::{Destination, DownStairs, IsPlayer, Position, UpStairs};
use crate::ecs::query::Query;
use crate::ecs::relations::Relation;
use crate::ecs::resources::MessageKind;
use crate::map::{MapKey, get_map};
use crate::vision::update_fov;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StairKind {
    Down,
    Up,
}

impl StairKind {
    fn opposite(self) -> Self {
        match self {
            StairKind::Down => StairKind::Up,
            StairKind::Up => StairKind::Down,
        }
    }

    fn query(self) -> Query {
        match self {
            StairKind::Down => Query::new().with::<DownStairs>(),
            StairKind::Up => Query::new().with::<UpStairs>(),
        }
    }
}

pub fn take_stairs(store: &mut WorldStore, actor: Entity, kind: StairKind) -> ActionResult {
    let stairs = store
        .get::<Position>(actor)
        .and_then(|here| store.query_one(&kind.query().at(here)));
    let Some(stairs) = stairs else {
        let direction = match kind {
            StairKind::Down => "downward",
            StairKind::Up => "upward",
        };
        return ActionResult::Impossible(format!("There are no {direction} stairs here!"));
    };
    let Some(Destination(destination)) = store.get::<Destination>(stairs) else {
        return ActionResult::Impossible("You can not leave yet.".to_string());
    };
    let message = match kind {
        StairKind::Down => "You descend the stairs.",
        StairKind::Up => "You ascend the stairs.",
    };
    move_level(store, actor, destination, kind.opposite(), message)
}

/// Moves `actor` onto the `exit` stairs of the map for `destination`,
/// generating the map first if it was never visited.
pub fn move_level(
    store: &mut WorldStore,
    actor: Entity,
    destination: MapKey,
    exit: StairKind,
    message: &str,
) -> ActionResult {
    let map = get_map(store, destination);
    let arrival = store
        .query_one(&exit.query().related(Relation::IsIn, map))
        .and_then(|stairs| store.get::<Position>(stairs));
    let Some(arrival) = arrival else {
        return ActionResult::Impossible(format!("{destination:?} has no {exit:?} stairs."));
    };

    if store.has::<IsPlayer>(actor) && store.has::<Position>(actor) {
        update_fov(store, actor, true);
    }
    store.add_message(message, MessageKind::Normal);
    store.set_position(actor, arrival);
    log::debug!("{actor:?} moved to {destination:?} at {arrival:?}");
    ActionResult::success()
}
