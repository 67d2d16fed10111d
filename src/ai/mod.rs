pub mod pathfinding;

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use specs::prelude::{Component, DenseVecStorage};
use specs::Entity;

use crate::actions::{ActionResult, FollowPath, melee, wait};
use crate::ecs::WorldStore;
use crate::ecs::components::{IsPlayer, Position, VisibleTiles};
use crate::ecs::query::Query;

pub use self::pathfinding::{CostMap, path_to};

/// Behavior run for a non-player actor once per player turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ai {
    Hostile(HostileAi),
}

impl Default for Ai {
    fn default() -> Self {
        Ai::Hostile(HostileAi::default())
    }
}

impl Component for Ai {
    type Storage = DenseVecStorage<Self>;
}

impl Ai {
    pub fn act(&mut self, store: &mut WorldStore, actor: Entity) -> ActionResult {
        match self {
            Ai::Hostile(hostile) => hostile.act(store, actor),
        }
    }
}

/// Chases the player while it can see them and attacks when adjacent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostileAi {
    #[serde(skip)]
    pub path: FollowPath,
}

impl HostileAi {
    pub fn act(&mut self, store: &mut WorldStore, actor: Entity) -> ActionResult {
        let Some(player) = store.query_one(&Query::new().with::<IsPlayer>()) else {
            return wait(store, actor);
        };
        let (Some(here), Some(target)) = (
            store.get::<Position>(actor),
            store.get::<Position>(player),
        ) else {
            return wait(store, actor);
        };

        let in_view = store
            .get::<VisibleTiles>(here.map)
            .is_some_and(|VisibleTiles(visible)| visible.is_set(here.point()));
        if in_view && target.map == here.map {
            let (dx, dy) = (target.x - here.x, target.y - here.y);
            if dx.abs().max(dy.abs()) <= 1 {
                return melee(store, actor, Point::new(dx, dy));
            }
            self.path = FollowPath::new(path_to(store, actor, target.point()));
        }
        if !self.path.is_empty() {
            return self.path.follow(store, actor);
        }
        wait(store, actor)
    }
}
