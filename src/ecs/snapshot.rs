//! Serializable copy of a world store.
//!
//! Templates are never saved: restoring rebuilds them from code and
//! re-links instances by template key.

use std::collections::HashMap;
use std::fmt;

use bracket_random::prelude::RandomNumberGenerator;
use serde::{Deserialize, Serialize};
use specs::Entity;
use specs::prelude::Component;

use super::WorldStore;
use super::components::{
    AssignedKey, Count, Defense, DefenseBonus, Destination, DownStairs, EquipSlot, Floor, Graphic,
    Hp, IsActor, IsAlive, IsBlocking, IsGhost, IsItem, IsPlayer, IsTemplate, ItemUse, LastSeen,
    Level, MapShape, MaxHp, MemoryTiles, Name, Position, Power, PowerBonus, RewardXp, TemplateKey,
    Tiles, UpStairs, VisibleTiles, Xp,
};
use super::query::Query;
use super::relations::Relation;
use super::resources::MessageLog;
use crate::ai::Ai;
use crate::config::CoreConfig;
use crate::data::init_templates;
use crate::error::{CoreError, Result};
use crate::map::MapKey;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagKind {
    Player,
    Actor,
    Item,
    Alive,
    Blocking,
    Ghost,
    UpStairs,
    DownStairs,
}

impl TagKind {
    const ALL: [TagKind; 8] = [
        TagKind::Player,
        TagKind::Actor,
        TagKind::Item,
        TagKind::Alive,
        TagKind::Blocking,
        TagKind::Ghost,
        TagKind::UpStairs,
        TagKind::DownStairs,
    ];

    fn is_on(self, store: &WorldStore, entity: Entity) -> bool {
        match self {
            TagKind::Player => store.has::<IsPlayer>(entity),
            TagKind::Actor => store.has::<IsActor>(entity),
            TagKind::Item => store.has::<IsItem>(entity),
            TagKind::Alive => store.has::<IsAlive>(entity),
            TagKind::Blocking => store.has::<IsBlocking>(entity),
            TagKind::Ghost => store.has::<IsGhost>(entity),
            TagKind::UpStairs => store.has::<UpStairs>(entity),
            TagKind::DownStairs => store.has::<DownStairs>(entity),
        }
    }

    fn apply(self, store: &mut WorldStore, entity: Entity) {
        match self {
            TagKind::Player => store.tag::<IsPlayer>(entity),
            TagKind::Actor => store.tag::<IsActor>(entity),
            TagKind::Item => store.tag::<IsItem>(entity),
            TagKind::Alive => store.tag::<IsAlive>(entity),
            TagKind::Blocking => store.tag::<IsBlocking>(entity),
            TagKind::Ghost => store.tag::<IsGhost>(entity),
            TagKind::UpStairs => store.tag::<UpStairs>(entity),
            TagKind::DownStairs => store.tag::<DownStairs>(entity),
        }
    }
}

/// A position whose map is given by index into the saved entity list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub x: i32,
    pub y: i32,
    pub map: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavedRef {
    Entity(usize),
    Template(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedEntity {
    pub position: Option<SavedPosition>,
    pub last_seen: Option<SavedPosition>,
    pub graphic: Option<Graphic>,
    pub name: Option<Name>,
    pub hp: Option<Hp>,
    pub max_hp: Option<MaxHp>,
    pub power: Option<Power>,
    pub defense: Option<Defense>,
    pub power_bonus: Option<PowerBonus>,
    pub defense_bonus: Option<DefenseBonus>,
    pub reward_xp: Option<RewardXp>,
    pub level: Option<Level>,
    pub xp: Option<Xp>,
    pub floor: Option<Floor>,
    pub map_shape: Option<MapShape>,
    pub tiles: Option<Tiles>,
    pub visible_tiles: Option<VisibleTiles>,
    pub memory_tiles: Option<MemoryTiles>,
    pub map_key: Option<MapKey>,
    pub destination: Option<Destination>,
    pub equip_slot: Option<EquipSlot>,
    pub assigned_key: Option<AssignedKey>,
    pub count: Option<Count>,
    pub item_use: Option<ItemUse>,
    pub ai: Option<Ai>,
    pub tags: Vec<TagKind>,
    /// Outgoing edges. `IsIn` edges implied by the position are left out.
    pub relations: Vec<(Relation, SavedRef)>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub config: CoreConfig,
    pub entities: Vec<SavedEntity>,
    pub messages: MessageLog,
    /// Generator state at capture time; the restored game continues it.
    pub rng: RandomNumberGenerator,
}

impl fmt::Debug for WorldSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldSnapshot")
            .field("config", &self.config)
            .field("entities", &self.entities)
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

impl WorldSnapshot {
    /// Saves every non-template entity, in creation order.
    pub fn capture(store: &WorldStore) -> Self {
        let entities = store.query(&Query::new().without::<IsTemplate>());
        let index: HashMap<Entity, usize> = entities
            .iter()
            .enumerate()
            .map(|(idx, entity)| (*entity, idx))
            .collect();
        let saved_position = |position: Position| {
            index.get(&position.map).map(|map| SavedPosition {
                x: position.x,
                y: position.y,
                map: *map,
            })
        };
        let saved_ref = |target: Entity| -> Option<SavedRef> {
            if let Some(idx) = index.get(&target) {
                return Some(SavedRef::Entity(*idx));
            }
            store
                .get::<TemplateKey>(target)
                .map(|TemplateKey(key)| SavedRef::Template(key))
        };

        let saved = entities
            .iter()
            .map(|&entity| {
                let position = store.get::<Position>(entity);
                let relations = Relation::ALL
                    .into_iter()
                    .filter(|label| !(*label == Relation::IsIn && position.is_some()))
                    .flat_map(|label| {
                        store
                            .relations()
                            .targets(entity, label)
                            .filter_map(|target| saved_ref(target).map(|r| (label, r)))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                SavedEntity {
                    position: position.and_then(saved_position),
                    last_seen: store
                        .get::<LastSeen>(entity)
                        .and_then(|LastSeen(seen)| saved_position(seen)),
                    graphic: store.get(entity),
                    name: store.get(entity),
                    hp: store.get(entity),
                    max_hp: store.get(entity),
                    power: store.get(entity),
                    defense: store.get(entity),
                    power_bonus: store.get(entity),
                    defense_bonus: store.get(entity),
                    reward_xp: store.get(entity),
                    level: store.get(entity),
                    xp: store.get(entity),
                    floor: store.get(entity),
                    map_shape: store.get(entity),
                    tiles: store.get(entity),
                    visible_tiles: store.get(entity),
                    memory_tiles: store.get(entity),
                    map_key: store.get(entity),
                    destination: store.get(entity),
                    equip_slot: store.get(entity),
                    assigned_key: store.get(entity),
                    count: store.get(entity),
                    item_use: store.get(entity),
                    ai: store.get(entity),
                    tags: TagKind::ALL
                        .into_iter()
                        .filter(|tag| tag.is_on(store, entity))
                        .collect(),
                    relations,
                }
            })
            .collect();

        Self {
            config: store.config().clone(),
            entities: saved,
            messages: store.messages().clone(),
            rng: store.rng_state(),
        }
    }

    /// Rebuilds a store: fresh templates first, then every saved entity in
    /// its saved order, positions replayed through the change hook.
    pub fn restore(&self) -> Result<WorldStore> {
        let mut store = WorldStore::with_config(0, self.config.clone());
        init_templates(&mut store);
        let entities: Vec<Entity> = self.entities.iter().map(|_| store.create()).collect();
        let lookup = |idx: usize| entities.get(idx).copied().ok_or(CoreError::DanglingEntity(idx));

        for (saved, &entity) in self.entities.iter().zip(&entities) {
            load(&mut store, entity, &saved.graphic);
            load(&mut store, entity, &saved.name);
            load(&mut store, entity, &saved.hp);
            load(&mut store, entity, &saved.max_hp);
            load(&mut store, entity, &saved.power);
            load(&mut store, entity, &saved.defense);
            load(&mut store, entity, &saved.power_bonus);
            load(&mut store, entity, &saved.defense_bonus);
            load(&mut store, entity, &saved.reward_xp);
            load(&mut store, entity, &saved.level);
            load(&mut store, entity, &saved.xp);
            load(&mut store, entity, &saved.floor);
            load(&mut store, entity, &saved.map_shape);
            load(&mut store, entity, &saved.tiles);
            load(&mut store, entity, &saved.visible_tiles);
            load(&mut store, entity, &saved.memory_tiles);
            load(&mut store, entity, &saved.map_key);
            load(&mut store, entity, &saved.destination);
            load(&mut store, entity, &saved.equip_slot);
            load(&mut store, entity, &saved.assigned_key);
            load(&mut store, entity, &saved.count);
            load(&mut store, entity, &saved.item_use);
            load(&mut store, entity, &saved.ai);
            for tag in &saved.tags {
                tag.apply(&mut store, entity);
            }
            if let Some(key) = saved.map_key {
                store.cache_map(key, entity);
            }
        }

        for (saved, &entity) in self.entities.iter().zip(&entities) {
            if let Some(at) = saved.position {
                store.set_position(entity, Position::new(at.x, at.y, lookup(at.map)?));
            }
            if let Some(seen) = saved.last_seen {
                store.insert(entity, LastSeen(Position::new(seen.x, seen.y, lookup(seen.map)?)));
            }
            for (label, target) in &saved.relations {
                let target = match target {
                    SavedRef::Entity(idx) => lookup(*idx)?,
                    SavedRef::Template(key) => store
                        .template(key)
                        .ok_or_else(|| CoreError::UnknownTemplate(key.clone()))?,
                };
                store.relate(entity, *label, target);
            }
        }

        store.replace_messages(self.messages.clone());
        store.set_rng(self.rng.clone());
        log::debug!("restored {} entities", entities.len());
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn load<T: Component + Clone>(store: &mut WorldStore, entity: Entity, value: &Option<T>) {
    if let Some(value) = value {
        store.insert(entity, value.clone());
    }
}
