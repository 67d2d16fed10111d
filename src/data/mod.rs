//! Actor and item databases, kept as template entities in the world store.

pub mod items;
pub mod monsters;

use specs::Entity;
use specs::prelude::Component;

use crate::ecs::WorldStore;
use crate::ecs::components::{
    Count, Defense, DefenseBonus, Graphic, Hp, IsActor, IsAlive, IsBlocking, IsItem, IsTemplate,
    MaxHp, Name, Position, Power, PowerBonus, RewardXp, SpawnWeight, StepTable,
};
use crate::ecs::query::Query;

use self::items::{ITEMS, ItemKind, ItemTemplate};
use self::monsters::{MONSTERS, MonsterTemplate, PLAYER};

/// Most monsters a room may hold, by floor.
pub const MAX_MONSTERS_BY_FLOOR: &[(i32, i32)] = &[(1, 2), (4, 3), (6, 5)];
/// Most items a room may hold, by floor.
pub const MAX_ITEMS_BY_FLOOR: &[(i32, i32)] = &[(1, 1), (4, 2)];

/// (Re)defines every template. Existing templates under the same keys are
/// replaced.
pub fn init_templates(store: &mut WorldStore) {
    define_monster(store, &PLAYER);
    for monster in &MONSTERS {
        define_monster(store, monster);
    }
    for item in &ITEMS {
        define_item(store, item);
    }
}

fn define_monster(store: &mut WorldStore, monster: &MonsterTemplate) -> Entity {
    let template = store.define_template(monster.key);
    store.tag::<IsActor>(template);
    store.insert(template, Name(monster.name.to_string()));
    store.insert(template, Graphic::new(monster.glyph, monster.color));
    store.insert(template, Hp(monster.hp));
    store.insert(template, MaxHp(monster.hp));
    store.insert(template, Power(monster.power));
    store.insert(template, Defense(monster.defense));
    store.insert(template, RewardXp(monster.reward_xp));
    if !monster.spawn_weight.is_empty() {
        store.insert(template, SpawnWeight(StepTable(monster.spawn_weight.to_vec())));
    }
    template
}

fn define_item(store: &mut WorldStore, item: &ItemTemplate) -> Entity {
    let template = store.define_template(item.key);
    store.tag::<IsItem>(template);
    store.insert(template, Name(item.name.to_string()));
    store.insert(template, Graphic::new(item.glyph, item.color));
    match item.kind {
        ItemKind::Consumable(item_use) => {
            store.insert(template, item_use);
            store.insert(template, Count(1));
        }
        ItemKind::Equipment {
            slot,
            power_bonus,
            defense_bonus,
        } => {
            store.insert(template, slot);
            if power_bonus != 0 {
                store.insert(template, PowerBonus(power_bonus));
            }
            if defense_bonus != 0 {
                store.insert(template, DefenseBonus(defense_bonus));
            }
        }
    }
    if !item.spawn_weight.is_empty() {
        store.insert(template, SpawnWeight(StepTable(item.spawn_weight.to_vec())));
    }
    template
}

/// Places a new living, blocking actor built from `template`.
pub fn spawn_actor(store: &mut WorldStore, template: Entity, position: Position) -> Entity {
    let actor = store.instantiate(template);
    store.tag::<IsActor>(actor);
    store.tag::<IsAlive>(actor);
    store.tag::<IsBlocking>(actor);
    store.set_position(actor, position);
    actor
}

pub fn spawn_item(store: &mut WorldStore, template: Entity, position: Position) -> Entity {
    let item = store.instantiate(template);
    store.set_position(item, position);
    item
}

/// Weighted draw among the templates tagged `T` that may appear on `floor`.
pub fn pick_weighted<T: Component>(store: &WorldStore, floor: i32) -> Option<Entity> {
    let candidates: Vec<(Entity, i32)> = store
        .query(
            &Query::new()
                .with::<IsTemplate>()
                .with::<T>()
                .with::<SpawnWeight>(),
        )
        .into_iter()
        .filter_map(|template| {
            let SpawnWeight(table) = store.get::<SpawnWeight>(template)?;
            let weight = table.at(floor);
            (weight > 0).then_some((template, weight))
        })
        .collect();
    let total: i32 = candidates.iter().map(|(_, weight)| weight).sum();
    if total <= 0 {
        return None;
    }
    let mut roll = store.roll(0, total);
    for (template, weight) in candidates {
        if roll < weight {
            return Some(template);
        }
        roll -= weight;
    }
    None
}
