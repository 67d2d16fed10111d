//! One player turn: the player's action, then every hostile on the map.

use specs::Entity;

use crate::actions::{Action, ActionResult};
use crate::ai::Ai;
use crate::combat::can_level_up;
use crate::ecs::WorldStore;
use crate::ecs::components::{Hp, Position};
use crate::ecs::query::Query;
use crate::ecs::relations::Relation;
use crate::ecs::resources::MessageKind;
use crate::states::State;
use crate::vision::update_fov;

fn is_dead(store: &WorldStore, player: Entity) -> bool {
    store.get::<Hp>(player).is_some_and(|Hp(hp)| hp <= 0)
}

/// Performs `action` for the player. Enemies only move after a successful
/// action, and always see the field of view it produced.
pub fn do_player_action(store: &mut WorldStore, player: Entity, mut action: Action) -> State {
    if is_dead(store, player) {
        return State::GameOver;
    }

    let result = action.perform(store, player);
    let succeeded = result.is_success();
    match result {
        ActionResult::Success(message) => {
            update_fov(store, player, false);
            if let Some(message) = message {
                store.add_message(message, MessageKind::Normal);
            }
            if let Some(Position { map, .. }) = store.get::<Position>(player) {
                handle_enemy_turns(store, map);
            }
        }
        ActionResult::Impossible(reason) => {
            store.add_message(reason, MessageKind::Impossible);
        }
        ActionResult::Poll(state) => return state,
    }

    if is_dead(store, player) {
        State::GameOver
    } else if succeeded && can_level_up(store, player) {
        State::LevelUp
    } else {
        State::InGame
    }
}

/// Runs the behavior of every AI actor on `map`, in creation order.
pub fn handle_enemy_turns(store: &mut WorldStore, map: Entity) {
    let actors = store.query(&Query::new().with::<Ai>().related(Relation::IsIn, map));
    for actor in actors {
        let Some(mut ai) = store.get::<Ai>(actor) else {
            continue;
        };
        let result = ai.act(store, actor);
        log::trace!("{} ({actor:?}): {result:?}", store.name_of(actor));
        if store.has::<Ai>(actor) {
            store.insert(actor, ai);
        }
    }
}

#[cfg(test)]
mod tests {
    use bracket_geometry::prelude::Point;

    use super::*;
    use crate::combat::level_of;
    use crate::ecs::components::{Name, RewardXp, Xp};
    use crate::testing::{open_room, spawn_fighter, spawn_player};

    fn spawn_orc(store: &mut WorldStore, at: Position) -> Entity {
        let orc = spawn_fighter(store, at, "orc", 10, 3, 0);
        store.insert(orc, Ai::default());
        orc
    }

    #[test]
    fn enemies_answer_a_successful_action() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 8, 1);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        let orc = spawn_orc(&mut store, Position::new(5, 1, map));

        let state = do_player_action(&mut store, player, Action::Wait);
        assert_eq!(state, State::InGame);
        assert_eq!(store.get::<Position>(orc), Some(Position::new(4, 1, map)));
        let Some(Ai::Hostile(hostile)) = store.get::<Ai>(orc) else {
            panic!("orc lost its ai");
        };
        assert_eq!(
            hostile.path.steps(),
            &[Point::new(3, 1), Point::new(2, 1), Point::new(1, 1)]
        );
    }

    #[test]
    fn impossible_actions_cost_no_turn() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 8, 1);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        let orc = spawn_orc(&mut store, Position::new(5, 1, map));

        let state = do_player_action(&mut store, player, Action::Move(Point::new(0, -1)));
        assert_eq!(state, State::InGame);
        assert_eq!(store.get::<Position>(orc), Some(Position::new(5, 1, map)));
        let last = store.messages().entries.last().cloned();
        assert!(last.is_some_and(|message| message.kind == MessageKind::Impossible
            && message.text == "Blocked by wall."));
    }

    #[test]
    fn enemies_act_in_creation_order() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 3, 3);
        let player = spawn_player(&mut store, Position::new(2, 2, map));
        let first = spawn_orc(&mut store, Position::new(3, 3, map));
        let second = spawn_orc(&mut store, Position::new(1, 1, map));
        store.insert(first, Name("first".to_string()));
        store.insert(second, Name("second".to_string()));

        do_player_action(&mut store, player, Action::Wait);
        let texts: Vec<String> = store
            .messages()
            .entries
            .iter()
            .map(|message| message.text.clone())
            .collect();
        assert_eq!(
            texts,
            vec![
                "first attacks player for 2 hit points.".to_string(),
                "second attacks player for 2 hit points.".to_string(),
            ]
        );
    }

    #[test]
    fn dying_ends_the_game_and_stops_further_actions() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 3, 3);
        let player = spawn_player(&mut store, Position::new(2, 2, map));
        store.insert(player, Hp(1));
        let orc = spawn_orc(&mut store, Position::new(3, 3, map));

        assert_eq!(do_player_action(&mut store, player, Action::Wait), State::GameOver);
        assert!(store.messages().contains("You died!"));
        assert_eq!(
            do_player_action(&mut store, player, Action::Move(Point::new(-1, 0))),
            State::GameOver
        );
        assert_eq!(store.get::<Position>(player), Some(Position::new(2, 2, map)));
        assert!(store.has::<Ai>(orc));
    }

    #[test]
    fn a_kill_that_crosses_a_threshold_opens_the_level_up() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 4, 4);
        let player = spawn_player(&mut store, Position::new(2, 2, map));
        store.insert(player, Xp(180));
        let victim = spawn_fighter(&mut store, Position::new(3, 2, map), "rat", 1, 0, 0);
        store.insert(victim, RewardXp(30));

        let state = do_player_action(&mut store, player, Action::Bump(Point::new(1, 0)));
        assert_eq!(state, State::LevelUp);
        assert_eq!(store.get::<Xp>(player), Some(Xp(210)));
    }

    #[test]
    fn one_check_per_action_even_after_a_huge_award() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 4, 4);
        let player = spawn_player(&mut store, Position::new(2, 2, map));
        let victim = spawn_fighter(&mut store, Position::new(3, 2, map), "dragon", 1, 0, 0);
        store.insert(victim, RewardXp(1000));

        let state = do_player_action(&mut store, player, Action::Bump(Point::new(1, 0)));
        assert_eq!(state, State::LevelUp);
        assert_eq!(level_of(&store, player), 1);
    }
}
