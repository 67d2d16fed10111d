//! Things an actor can do in one turn.

mod inventory;
mod movement;
mod travel;

use bracket_geometry::prelude::Point;
use specs::Entity;

use crate::ai::HostileAi;
use crate::ecs::WorldStore;
use crate::map::MapKey;
use crate::states::State;

pub use self::inventory::{apply_item, apply_item_at, drop_item, pickup_item};
pub use self::movement::{FollowPath, bump, melee, move_by, wait};
pub use self::travel::{StairKind, move_level, take_stairs};

/// Outcome of an action. Only `Success` spends the turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionResult {
    Success(Option<String>),
    Impossible(String),
    Poll(State),
}

impl ActionResult {
    pub fn success() -> Self {
        ActionResult::Success(None)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Move(Point),
    Melee(Point),
    /// Attacks a living actor in the direction, otherwise moves there.
    Bump(Point),
    Wait,
    FollowPath(FollowPath),
    Hostile(HostileAi),
    PickupItem,
    ApplyItem(Entity),
    ApplyItemAt { item: Entity, target: Point },
    DropItem(Entity),
    TakeStairs(StairKind),
    MoveLevel {
        destination: MapKey,
        exit: StairKind,
        message: String,
    },
}

impl Action {
    pub fn perform(&mut self, store: &mut WorldStore, actor: Entity) -> ActionResult {
        match self {
            Action::Move(direction) => move_by(store, actor, *direction),
            Action::Melee(direction) => melee(store, actor, *direction),
            Action::Bump(direction) => bump(store, actor, *direction),
            Action::Wait => wait(store, actor),
            Action::FollowPath(path) => path.follow(store, actor),
            Action::Hostile(ai) => ai.act(store, actor),
            Action::PickupItem => pickup_item(store, actor),
            Action::ApplyItem(item) => apply_item(store, actor, *item),
            Action::ApplyItemAt { item, target } => apply_item_at(store, actor, *item, *target),
            Action::DropItem(item) => drop_item(store, actor, *item),
            Action::TakeStairs(kind) => take_stairs(store, actor, *kind),
            Action::MoveLevel {
                destination,
                exit,
                message,
            } => move_level(store, actor, *destination, *exit, message),
        }
    }
}
