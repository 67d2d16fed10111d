use specs::Entity;

use crate::config::CoreConfig;
use crate::data::{init_templates, spawn_actor};
use crate::ecs::WorldStore;
use crate::ecs::components::{IsPlayer, Level, Position, UpStairs, Xp};
use crate::ecs::query::Query;
use crate::ecs::relations::Relation;
use crate::ecs::resources::{MessageKind, MessageLog};
use crate::ecs::snapshot::WorldSnapshot;
use crate::error::{CoreError, Result};
use crate::items::{add_to_inventory, equip_item};
use crate::map::{MapKey, get_map};
use crate::script::ScriptedInput;
use crate::states::{Input, State};
use crate::vision::update_fov;

const STARTING_GEAR: [&str; 2] = ["dagger", "leather_armor"];

/// A running game: the world, the player in it, and the interaction state.
pub struct Game {
    pub store: WorldStore,
    pub player: Entity,
    pub state: State,
}

impl Game {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, CoreConfig::default())
    }

    /// Generates the first floor and puts a freshly equipped player on its
    /// up stairs.
    pub fn with_config(seed: u64, config: CoreConfig) -> Self {
        let mut store = WorldStore::with_config(seed, config);
        init_templates(&mut store);
        let map = get_map(&mut store, MapKey::Tombs(1));
        let start = store
            .query_one(&Query::new().with::<UpStairs>().related(Relation::IsIn, map))
            .and_then(|stairs| store.get::<Position>(stairs));
        let Some(start) = start else {
            panic!("first floor has no up stairs");
        };
        let Some(template) = store.template("player") else {
            panic!("player template is missing");
        };

        let player = spawn_actor(&mut store, template, start);
        store.tag::<IsPlayer>(player);
        store.insert(player, Level(1));
        store.insert(player, Xp(0));
        for key in STARTING_GEAR {
            let Some(template) = store.template(key) else {
                panic!("{key} template is missing");
            };
            let item = store.instantiate(template);
            if let Err(err) = add_to_inventory(&mut store, player, item) {
                panic!("starting gear does not fit: {err}");
            }
            equip_item(&mut store, player, item);
        }

        store.replace_messages(MessageLog::default());
        update_fov(&mut store, player, false);
        store.add_message(
            "Hello and welcome, adventurer, to yet another dungeon!",
            MessageKind::Welcome,
        );
        log::debug!("new game with seed {seed}, player {player:?} at {start:?}");

        Self {
            store,
            player,
            state: State::InGame,
        }
    }

    pub fn handle(&mut self, input: Input) {
        let state = std::mem::replace(&mut self.state, State::InGame);
        self.state = state.handle_input(&mut self.store, self.player, input);
    }

    /// Feeds every scripted input in order, stopping early on game over.
    pub fn play_script(&mut self, script: ScriptedInput) {
        for input in script {
            if self.is_over() {
                break;
            }
            self.handle(input);
        }
    }

    pub fn is_over(&self) -> bool {
        self.state == State::GameOver
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.store)
    }

    /// Resumes a saved game in the `InGame` state.
    pub fn restore(snapshot: &WorldSnapshot) -> Result<Self> {
        let store = snapshot.restore()?;
        let player = store
            .query_one(&Query::new().with::<IsPlayer>())
            .ok_or(CoreError::MissingPlayer)?;
        Ok(Self {
            store,
            player,
            state: State::InGame,
        })
    }
}
