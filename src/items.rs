//! Inventory, stacking, equipment and item effects.

use bracket_geometry::prelude::Point;
use specs::Entity;

use crate::actions::ActionResult;
use crate::combat::{apply_damage, heal};
use crate::ecs::WorldStore;
use crate::ecs::components::{
    AssignedKey, Count, EquipSlot, Hp, IsActor, IsAlive, IsItem, ItemUse, LastSeen, Name,
    Position, VisibleTiles,
};
use crate::ecs::query::Query;
use crate::ecs::relations::Relation;
use crate::ecs::resources::MessageKind;
use crate::error::{CoreError, Result};
use crate::states::State;

/// Items carried by `holder`, ordered by their menu letter.
pub fn inventory(store: &WorldStore, holder: Entity) -> Vec<Entity> {
    let mut items = store.query(
        &Query::new()
            .with::<IsItem>()
            .related(Relation::IsIn, holder),
    );
    items.sort_by_key(|item| store.get::<AssignedKey>(*item).map(|AssignedKey(key)| key));
    items
}

pub fn item_by_key(store: &WorldStore, holder: Entity, key: char) -> Option<Entity> {
    inventory(store, holder)
        .into_iter()
        .find(|item| store.get::<AssignedKey>(*item) == Some(AssignedKey(key)))
}

/// Inventory label: count prefix for stacks and an `(E)` mark on worn gear.
pub fn describe(store: &WorldStore, item: Entity) -> String {
    let mut name = store.name_of(item);
    let count = count_of(store, item);
    if count != 1 {
        name = format!("{count}x{name}");
    }
    if is_equipped(store, item) {
        name.push_str(" (E)");
    }
    name
}

fn count_of(store: &WorldStore, item: Entity) -> u32 {
    store.get::<Count>(item).map_or(1, |Count(count)| count)
}

pub fn is_equipped(store: &WorldStore, item: Entity) -> bool {
    store.target(item, Relation::EquippedBy).is_some()
}

/// Two items merge into one stack when they share a name and a template
/// and neither is equipment.
pub fn can_stack(store: &WorldStore, item: Entity, other: Entity) -> bool {
    item != other
        && !store.has::<EquipSlot>(item)
        && !store.has::<EquipSlot>(other)
        && store.get::<Name>(item) == store.get::<Name>(other)
        && store.target(item, Relation::IsA) == store.target(other, Relation::IsA)
}

/// Moves `item` from the floor into `holder`'s pack, stacking when possible.
pub fn add_to_inventory(store: &mut WorldStore, holder: Entity, item: Entity) -> Result<()> {
    let held = inventory(store, holder);
    let name = store.name_of(item);
    if let Some(stack) = held.iter().copied().find(|held| can_stack(store, item, *held)) {
        let extra = count_of(store, item);
        store.insert(stack, Count(count_of(store, stack) + extra));
        store.destroy(item);
        store.add_message(format!("You picked up the {name}!"), MessageKind::Normal);
        return Ok(());
    }

    let capacity = store.config().inventory_capacity;
    let free_key = ('a'..='z').find(|key| {
        !held
            .iter()
            .any(|held| store.get::<AssignedKey>(*held) == Some(AssignedKey(*key)))
    });
    let Some(key) = free_key.filter(|_| held.len() < capacity) else {
        return Err(CoreError::FullInventory);
    };

    store.clear_position(item);
    store.remove::<LastSeen>(item);
    store.relate_exclusive(item, Relation::IsIn, holder);
    store.insert(item, AssignedKey(key));
    store.add_message(format!("You picked up the {name}!"), MessageKind::Normal);
    Ok(())
}

/// Uses up one of the stack, destroying the item when none are left.
pub fn consume_item(store: &mut WorldStore, item: Entity) {
    let left = count_of(store, item).saturating_sub(1);
    if left == 0 {
        store.destroy(item);
    } else {
        store.insert(item, Count(left));
    }
}

/// Puts `item` on `actor`, taking off whatever was worn in the same slot.
pub fn equip_item(store: &mut WorldStore, actor: Entity, item: Entity) {
    let Some(slot) = store.get::<EquipSlot>(item) else {
        panic!("{item:?} can not be equipped");
    };
    let worn = store.sources(Relation::EquippedBy, actor);
    for other in worn {
        if other != item && store.get::<EquipSlot>(other) == Some(slot) {
            unequip_item(store, other);
        }
    }
    store.relate_exclusive(item, Relation::EquippedBy, actor);
    store.relate_exclusive(item, Relation::Affecting, actor);
}

pub fn unequip_item(store: &mut WorldStore, item: Entity) {
    store.unrelate(item, Relation::EquippedBy, None);
    store.unrelate(item, Relation::Affecting, None);
}

/// Runs the item's use behavior. `target` is the chosen tile for targeted
/// items; without one they ask for a position first.
pub fn use_item(
    store: &mut WorldStore,
    actor: Entity,
    item: Entity,
    target: Option<Point>,
) -> ActionResult {
    let Some(item_use) = store.get::<ItemUse>(item) else {
        return ActionResult::Impossible(format!("Can not use the {}", store.name_of(item)));
    };
    match item_use {
        ItemUse::Potion { heal: amount } => {
            let name = store.name_of(item);
            store.add_message(format!("You consume the {name}!"), MessageKind::Normal);
            heal(store, actor, amount);
            consume_item(store, item);
            ActionResult::success()
        }
        ItemUse::LightningScroll { damage, max_range } => {
            lightning(store, actor, item, damage, max_range)
        }
        ItemUse::FireballScroll { damage, radius } => match target {
            None => {
                let cursor = store
                    .get::<Position>(actor)
                    .map_or(Point::new(0, 0), |position| position.point());
                ActionResult::Poll(State::PositionSelect { item, cursor })
            }
            Some(target) => fireball(store, actor, item, target, damage, radius),
        },
    }
}

fn is_visible(store: &WorldStore, position: Position) -> bool {
    store
        .get::<VisibleTiles>(position.map)
        .is_some_and(|VisibleTiles(visible)| visible.is_set(position.point()))
}

fn lightning(
    store: &mut WorldStore,
    actor: Entity,
    item: Entity,
    damage: i32,
    max_range: i32,
) -> ActionResult {
    let Some(origin) = store.get::<Position>(actor) else {
        return ActionResult::Impossible("No target visible.".to_string());
    };
    let nearest = store
        .query(
            &Query::new()
                .with::<IsActor>()
                .with::<IsAlive>()
                .related(Relation::IsIn, origin.map),
        )
        .into_iter()
        .filter(|target| *target != actor)
        .filter_map(|target| store.get::<Position>(target).map(|at| (target, at)))
        .filter(|(_, at)| is_visible(store, *at))
        .min_by_key(|(_, at)| origin.distance_squared(at));
    let Some((target, at)) = nearest else {
        return ActionResult::Impossible("No target visible.".to_string());
    };
    if origin.distance_squared(&at) > max_range * max_range {
        return ActionResult::Impossible("No target in range.".to_string());
    }

    let name = store.name_of(target);
    store.add_message(
        format!("A lightning bolt strikes the {name} with a loud thunder, for {damage} damage!"),
        MessageKind::PlayerAttack,
    );
    apply_damage(store, target, damage, Some(actor));
    consume_item(store, item);
    ActionResult::success()
}

fn fireball(
    store: &mut WorldStore,
    actor: Entity,
    item: Entity,
    target: Point,
    damage: i32,
    radius: i32,
) -> ActionResult {
    let Some(origin) = store.get::<Position>(actor) else {
        return ActionResult::Impossible("Target is out of view.".to_string());
    };
    let center = Position::at(target, origin.map);
    if !is_visible(store, center) {
        return ActionResult::Impossible("Target is out of view.".to_string());
    }
    let victims: Vec<Entity> = store
        .query(
            &Query::new()
                .with::<IsActor>()
                .with::<IsAlive>()
                .with::<Hp>()
                .related(Relation::IsIn, origin.map),
        )
        .into_iter()
        .filter(|victim| {
            store
                .get::<Position>(*victim)
                .is_some_and(|at| center.distance_squared(&at) <= radius * radius)
        })
        .collect();
    if victims.is_empty() {
        return ActionResult::Impossible("There are no targets in the radius.".to_string());
    }
    for victim in victims {
        let name = store.name_of(victim);
        store.add_message(
            format!("The {name} is engulfed in a fiery explosion, taking {damage} damage!"),
            MessageKind::PlayerAttack,
        );
        apply_damage(store, victim, damage, Some(actor));
    }
    consume_item(store, item);
    ActionResult::success()
}
