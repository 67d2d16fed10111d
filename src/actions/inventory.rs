use bracket_geometry::prelude::Point;
use specs::Entity;

use super::ActionResult;
use crate::ecs::WorldStore;
use crate::ecs::components::{AssignedKey, EquipSlot, IsItem, ItemUse, Position};
use crate::ecs::query::Query;
use crate::ecs::relations::Relation;
use crate::ecs::resources::MessageKind;
use crate::items::{add_to_inventory, equip_item, is_equipped, unequip_item, use_item};

pub fn pickup_item(store: &mut WorldStore, actor: Entity) -> ActionResult {
    let Some(here) = store.get::<Position>(actor) else {
        return ActionResult::Impossible("There is nothing here to pick up.".to_string());
    };
    let Some(item) = store.query_one(&Query::new().with::<IsItem>().at(here)) else {
        return ActionResult::Impossible("There is nothing here to pick up.".to_string());
    };
    match add_to_inventory(store, actor, item) {
        Ok(()) => ActionResult::success(),
        Err(err) => ActionResult::Impossible(err.to_string()),
    }
}

/// Equips or takes off gear, otherwise runs the item's use behavior.
pub fn apply_item(store: &mut WorldStore, actor: Entity, item: Entity) -> ActionResult {
    let name = store.name_of(item);
    if store.has::<EquipSlot>(item) {
        if is_equipped(store, item) {
            unequip_item(store, item);
            store.add_message(format!("You unequip the {name}."), MessageKind::Normal);
        } else {
            equip_item(store, actor, item);
            store.add_message(format!("You equip the {name}."), MessageKind::Normal);
        }
        return ActionResult::success();
    }
    if store.has::<ItemUse>(item) {
        return use_item(store, actor, item, None);
    }
    ActionResult::Impossible(format!("Can not use the {name}"))
}

pub fn apply_item_at(
    store: &mut WorldStore,
    actor: Entity,
    item: Entity,
    target: Point,
) -> ActionResult {
    use_item(store, actor, item, Some(target))
}

pub fn drop_item(store: &mut WorldStore, actor: Entity, item: Entity) -> ActionResult {
    assert!(
        store.related(item, Relation::IsIn, actor),
        "{item:?} is not carried by {actor:?}"
    );
    let Some(here) = store.get::<Position>(actor) else {
        panic!("{actor:?} drops an item without a position");
    };
    let name = store.name_of(item);
    store.add_message(format!("You drop the {name}!"), MessageKind::Normal);
    unequip_item(store, item);
    store.unrelate(item, Relation::IsIn, None);
    store.remove::<AssignedKey>(item);
    store.set_position(item, here);
    ActionResult::success()
}
