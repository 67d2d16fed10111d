//! Interaction states layered over the action pipeline.

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use specs::Entity;

use crate::actions::{Action, StairKind};
use crate::combat::{LevelUpChoice, apply_level_up, can_level_up};
use crate::ecs::WorldStore;
use crate::ecs::components::{AssignedKey, MapShape, Position};
use crate::ecs::resources::MessageKind;
use crate::items::{describe, inventory, item_by_key};
use crate::turn::do_player_action;

/// Discrete events produced by whatever reads the keyboard.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Input {
    Direction(Point),
    Wait,
    Pickup,
    OpenInventory,
    OpenDrop,
    Descend,
    Ascend,
    Select(char),
    Confirm,
    Cancel,
    Choose(LevelUpChoice),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemPurpose {
    Apply,
    Drop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    InGame,
    /// Inventory menu; `items` is the list shown when it opened.
    ItemSelect {
        purpose: ItemPurpose,
        items: Vec<Entity>,
    },
    /// Targeting cursor for an item that needs a tile.
    PositionSelect { item: Entity, cursor: Point },
    LevelUp,
    GameOver,
}

impl State {
    pub fn handle_input(self, store: &mut WorldStore, player: Entity, input: Input) -> State {
        match self {
            State::InGame => in_game(store, player, input),
            State::ItemSelect { purpose, items } => match input {
                Input::Select(key) => select_item(store, player, purpose, key)
                    .unwrap_or(State::ItemSelect { purpose, items }),
                Input::Cancel => State::InGame,
                _ => State::ItemSelect { purpose, items },
            },
            State::PositionSelect { item, cursor } => match input {
                Input::Direction(delta) => State::PositionSelect {
                    item,
                    cursor: move_cursor(store, player, cursor, delta),
                },
                Input::Confirm => do_player_action(
                    store,
                    player,
                    Action::ApplyItemAt {
                        item,
                        target: cursor,
                    },
                ),
                Input::Cancel => State::InGame,
                _ => State::PositionSelect { item, cursor },
            },
            State::LevelUp => match input {
                Input::Choose(choice) => {
                    apply_level_up(store, player, choice);
                    if can_level_up(store, player) {
                        State::LevelUp
                    } else {
                        State::InGame
                    }
                }
                _ => State::LevelUp,
            },
            State::GameOver => State::GameOver,
        }
    }

    /// Overlay lines a host draws on top of the map; empty for `InGame`.
    pub fn render(&self, store: &WorldStore, player: Entity) -> Vec<String> {
        match self {
            State::InGame => Vec::new(),
            State::ItemSelect { purpose, items } => {
                let title = match purpose {
                    ItemPurpose::Apply => "Select an item to use",
                    ItemPurpose::Drop => "Select an item to drop",
                };
                let mut lines = vec![title.to_string()];
                for &item in items {
                    let key = store
                        .get::<AssignedKey>(item)
                        .map_or('?', |AssignedKey(key)| key);
                    lines.push(format!("{key}: {}", describe(store, item)));
                }
                lines
            }
            State::PositionSelect { cursor, .. } => {
                vec![format!("Select a target ({}, {})", cursor.x, cursor.y)]
            }
            State::LevelUp => {
                let mut lines = vec!["Level up! Select an attribute to increase.".to_string()];
                for (n, choice) in LevelUpChoice::ALL.iter().enumerate() {
                    lines.push(format!("{}: {}", n + 1, choice.describe(store, player)));
                }
                lines
            }
            State::GameOver => vec!["You died!".to_string()],
        }
    }
}

fn in_game(store: &mut WorldStore, player: Entity, input: Input) -> State {
    let action = match input {
        Input::Direction(direction) => Action::Bump(direction),
        Input::Wait => Action::Wait,
        Input::Pickup => Action::PickupItem,
        Input::Descend => Action::TakeStairs(StairKind::Down),
        Input::Ascend => Action::TakeStairs(StairKind::Up),
        Input::OpenInventory => return open_menu(store, player, ItemPurpose::Apply),
        Input::OpenDrop => return open_menu(store, player, ItemPurpose::Drop),
        Input::Select(_) | Input::Confirm | Input::Cancel | Input::Choose(_) => {
            return State::InGame;
        }
    };
    do_player_action(store, player, action)
}

fn open_menu(store: &mut WorldStore, player: Entity, purpose: ItemPurpose) -> State {
    let items = inventory(store, player);
    if items.is_empty() {
        store.add_message("Your inventory is empty.", MessageKind::Impossible);
        return State::InGame;
    }
    State::ItemSelect { purpose, items }
}

fn select_item(
    store: &mut WorldStore,
    player: Entity,
    purpose: ItemPurpose,
    key: char,
) -> Option<State> {
    let Some(item) = item_by_key(store, player, key) else {
        store.add_message("Invalid entry.", MessageKind::Impossible);
        return None;
    };
    let action = match purpose {
        ItemPurpose::Apply => Action::ApplyItem(item),
        ItemPurpose::Drop => Action::DropItem(item),
    };
    Some(do_player_action(store, player, action))
}

fn move_cursor(store: &WorldStore, player: Entity, cursor: Point, delta: Point) -> Point {
    let shape = store
        .get::<Position>(player)
        .and_then(|here| store.get::<MapShape>(here.map));
    let Some(MapShape { width, height }) = shape else {
        return cursor;
    };
    Point::new(
        (cursor.x + delta.x).clamp(0, width - 1),
        (cursor.y + delta.y).clamp(0, height - 1),
    )
}
