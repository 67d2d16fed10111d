//! Damage, death and experience.

use serde::{Deserialize, Serialize};
use specs::Entity;

use crate::ai::Ai;
use crate::ecs::WorldStore;
use crate::ecs::components::{
    Defense, DefenseBonus, Graphic, Hp, IsAlive, IsBlocking, IsPlayer, Level, MaxHp, Name,
    Position, Power, PowerBonus, RewardXp, Xp,
};
use crate::ecs::relations::Relation;
use crate::ecs::resources::MessageKind;
use crate::vision::ghosts_at;

const CORPSE_GLYPH: char = '%';
const CORPSE_COLOR: [u8; 3] = [191, 0, 0];

pub fn attack_power(store: &WorldStore, actor: Entity) -> i32 {
    let base = store.get::<Power>(actor).map_or(0, |Power(power)| power);
    store
        .sources(Relation::Affecting, actor)
        .into_iter()
        .filter_map(|source| store.get::<PowerBonus>(source))
        .fold(base, |total, PowerBonus(bonus)| total + bonus)
}

pub fn defense_power(store: &WorldStore, actor: Entity) -> i32 {
    let base = store.get::<Defense>(actor).map_or(0, |Defense(defense)| defense);
    store
        .sources(Relation::Affecting, actor)
        .into_iter()
        .filter_map(|source| store.get::<DefenseBonus>(source))
        .fold(base, |total, DefenseBonus(bonus)| total + bonus)
}

pub fn melee_damage(store: &WorldStore, attacker: Entity, target: Entity) -> i32 {
    (attack_power(store, attacker) - defense_power(store, target)).max(0)
}

/// Subtracts `amount` HP and kills the target once it reaches zero.
pub fn apply_damage(store: &mut WorldStore, target: Entity, amount: i32, blame: Option<Entity>) {
    let Some(hp) = store.modify::<Hp, _>(target, |Hp(hp)| {
        *hp -= amount;
        *hp
    }) else {
        return;
    };
    if hp <= 0 && store.has::<IsAlive>(target) {
        die(store, target, blame);
    }
}

/// Turns `entity` into an inert corpse, crediting `blame` with its reward.
pub fn die(store: &mut WorldStore, entity: Entity, blame: Option<Entity>) {
    let name = store.name_of(entity);
    if store.has::<IsPlayer>(entity) {
        store.add_message("You died!", MessageKind::PlayerDie);
    } else {
        store.add_message(format!("{name} is dead!"), MessageKind::EnemyDie);
    }

    if let Some(blame) = blame {
        let reward = store.get::<RewardXp>(entity).map_or(0, |RewardXp(xp)| xp);
        if store.modify::<Xp, _>(blame, |Xp(xp)| *xp += reward).is_none() {
            store.insert(blame, Xp(reward));
        }
        let blame_name = store.name_of(blame);
        store.add_message(
            format!("{blame_name} gains {reward} experience points."),
            MessageKind::Normal,
        );
    }

    if let Some(position) = store.get::<Position>(entity) {
        for ghost in ghosts_at(store, position) {
            store.destroy(ghost);
        }
    }
    store.insert(entity, Graphic::new(CORPSE_GLYPH, CORPSE_COLOR));
    store.insert(entity, Name(format!("remains of {name}")));
    store.remove::<Ai>(entity);
    store.untag::<IsBlocking>(entity);
    store.untag::<IsAlive>(entity);
    log::debug!("{name} ({entity:?}) died");
}

/// Restores up to `amount` HP without passing max HP. Returns what was
/// actually restored.
pub fn heal(store: &mut WorldStore, entity: Entity, amount: i32) -> i32 {
    let (Some(Hp(old)), Some(MaxHp(max))) = (store.get::<Hp>(entity), store.get::<MaxHp>(entity))
    else {
        log::info!("{entity:?} has no HP/MaxHP to heal");
        return 0;
    };
    let new = (old + amount).min(max).max(old);
    store.insert(entity, Hp(new));
    new - old
}

pub fn level_of(store: &WorldStore, actor: Entity) -> i32 {
    store.get::<Level>(actor).map_or(1, |Level(level)| level)
}

pub fn xp_of(store: &WorldStore, actor: Entity) -> i32 {
    store.get::<Xp>(actor).map_or(0, |Xp(xp)| xp)
}

/// Experience needed to leave the actor's current level.
pub fn required_xp(store: &WorldStore, actor: Entity) -> i32 {
    200 + (level_of(store, actor) - 1) * 150
}

pub fn can_level_up(store: &WorldStore, actor: Entity) -> bool {
    xp_of(store, actor) >= required_xp(store, actor)
}

/// Spends one threshold of experience on one level. Does nothing when the
/// threshold is not reached.
pub fn level_up(store: &mut WorldStore, actor: Entity) -> bool {
    if !can_level_up(store, actor) {
        return false;
    }
    let required = required_xp(store, actor);
    let level = level_of(store, actor) + 1;
    store.insert(actor, Xp(xp_of(store, actor) - required));
    store.insert(actor, Level(level));
    store.add_message(format!("You advance to level {level}!"), MessageKind::LevelUp);
    true
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelUpChoice {
    Constitution,
    Strength,
    Agility,
}

impl LevelUpChoice {
    pub const ALL: [LevelUpChoice; 3] = [
        LevelUpChoice::Constitution,
        LevelUpChoice::Strength,
        LevelUpChoice::Agility,
    ];

    pub fn describe(self, store: &WorldStore, actor: Entity) -> String {
        match self {
            LevelUpChoice::Constitution => {
                let max = store.get::<MaxHp>(actor).map_or(0, |MaxHp(max)| max);
                format!("Constitution (+20 HP, from {max})")
            }
            LevelUpChoice::Strength => {
                let power = store.get::<Power>(actor).map_or(0, |Power(power)| power);
                format!("Strength (+1 attack, from {power})")
            }
            LevelUpChoice::Agility => {
                let defense = store.get::<Defense>(actor).map_or(0, |Defense(defense)| defense);
                format!("Agility (+1 defense, from {defense})")
            }
        }
    }
}

/// Levels the actor up and applies the chosen stat increase.
pub fn apply_level_up(store: &mut WorldStore, actor: Entity, choice: LevelUpChoice) -> bool {
    if !level_up(store, actor) {
        return false;
    }
    match choice {
        LevelUpChoice::Constitution => {
            let max = store.get::<MaxHp>(actor).map_or(0, |MaxHp(max)| max) + 20;
            store.insert(actor, MaxHp(max));
            let hp = store.get::<Hp>(actor).map_or(0, |Hp(hp)| hp) + 20;
            store.insert(actor, Hp(hp.min(max)));
            store.add_message("Your health improves!", MessageKind::Normal);
        }
        LevelUpChoice::Strength => {
            let power = store.get::<Power>(actor).map_or(0, |Power(power)| power) + 1;
            store.insert(actor, Power(power));
            store.add_message("You feel stronger!", MessageKind::Normal);
        }
        LevelUpChoice::Agility => {
            let defense = store.get::<Defense>(actor).map_or(0, |Defense(defense)| defense) + 1;
            store.insert(actor, Defense(defense));
            store.add_message("Your movements are getting swifter!", MessageKind::Normal);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::ecs::components::{IsGhost, LastSeen};
    use crate::testing::{open_room, spawn_fighter, spawn_player};

    #[test]
    fn attack_with_five_power_against_two_defense_deals_three() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let attacker = spawn_fighter(&mut store, Position::new(1, 1, map), "orc", 10, 5, 0);
        let target = spawn_fighter(&mut store, Position::new(2, 1, map), "troll", 10, 0, 2);

        let damage = melee_damage(&store, attacker, target);
        apply_damage(&mut store, target, damage, Some(attacker));

        assert_eq!(damage, 3);
        assert_eq!(store.get::<Hp>(target), Some(Hp(7)));
        assert!(store.has::<IsAlive>(target));
    }

    #[test]
    fn equipment_bonuses_count_only_while_affecting() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let actor = spawn_fighter(&mut store, Position::new(1, 1, map), "player", 30, 2, 1);
        let sword = store.create();
        store.insert(sword, PowerBonus(4));
        let mail = store.create();
        store.insert(mail, DefenseBonus(3));

        store.relate(sword, Relation::Affecting, actor);
        store.relate(mail, Relation::Affecting, actor);
        assert_eq!(attack_power(&store, actor), 6);
        assert_eq!(defense_power(&store, actor), 4);

        store.unrelate(sword, Relation::Affecting, Some(actor));
        assert_eq!(attack_power(&store, actor), 2);
    }

    #[test]
    fn killing_blow_leaves_a_corpse_and_pays_experience() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        let orc_at = Position::new(2, 1, map);
        let orc = spawn_fighter(&mut store, orc_at, "orc", 4, 3, 0);
        store.insert(orc, RewardXp(35));
        store.insert(orc, Ai::default());
        store.insert(orc, LastSeen(orc_at));
        let ghost = store.create();
        store.tag::<IsGhost>(ghost);
        store.set_position(ghost, orc_at);

        apply_damage(&mut store, orc, 10, Some(player));

        assert!(!store.has::<IsAlive>(orc));
        assert!(!store.has::<IsBlocking>(orc));
        assert!(!store.has::<Ai>(orc));
        assert!(store.is_alive(orc));
        assert_eq!(store.name_of(orc), "remains of orc");
        assert_eq!(store.get::<Graphic>(orc).map(|g| g.glyph), Some('%'));
        assert_eq!(store.get::<Xp>(player), Some(Xp(35)));
        assert!(!store.is_alive(ghost));
        assert!(store.messages().contains("orc is dead!"));
        assert!(store.messages().contains("player gains 35 experience points."));
    }

    #[test]
    fn corpses_do_not_die_twice() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        let orc = spawn_fighter(&mut store, Position::new(2, 1, map), "orc", 1, 3, 0);
        store.insert(orc, RewardXp(35));

        apply_damage(&mut store, orc, 5, Some(player));
        apply_damage(&mut store, orc, 5, Some(player));

        assert_eq!(store.get::<Xp>(player), Some(Xp(35)));
        assert_eq!(store.name_of(orc), "remains of orc");
    }

    #[test]
    fn player_death_has_its_own_message() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        apply_damage(&mut store, player, 30, None);
        assert_eq!(store.messages().last_text(), Some("You died!"));
        assert_eq!(store.messages().entries[0].kind, MessageKind::PlayerDie);
    }

    #[test]
    fn heal_clamps_to_max_hp() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        store.insert(player, Hp(27));
        assert_eq!(heal(&mut store, player, 4), 3);
        assert_eq!(store.get::<Hp>(player), Some(Hp(30)));
        assert_eq!(heal(&mut store, player, 4), 0);

        let rock = store.create();
        assert_eq!(heal(&mut store, rock, 4), 0);
    }

    #[test]
    fn crossing_the_threshold_grants_one_level() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        store.insert(player, Xp(180));
        assert!(!can_level_up(&store, player));

        store.modify::<Xp, _>(player, |Xp(xp)| *xp += 30);
        assert!(can_level_up(&store, player));
        assert!(level_up(&mut store, player));

        assert_eq!(store.get::<Level>(player), Some(Level(2)));
        assert_eq!(store.get::<Xp>(player), Some(Xp(10)));
        assert_eq!(required_xp(&store, player), 350);
        assert!(!level_up(&mut store, player));
    }

    #[test]
    fn level_up_choices_raise_one_stat() {
        let mut store = WorldStore::new(3);
        let map = open_room(&mut store, 5, 5);
        let player = spawn_player(&mut store, Position::new(1, 1, map));
        store.insert(player, Xp(200 + 350 + 500 + 40));

        assert!(apply_level_up(&mut store, player, LevelUpChoice::Constitution));
        assert_eq!(store.get::<MaxHp>(player), Some(MaxHp(50)));
        assert_eq!(store.get::<Hp>(player), Some(Hp(50)));
        assert!(apply_level_up(&mut store, player, LevelUpChoice::Strength));
        assert_eq!(store.get::<Power>(player), Some(Power(3)));
        assert!(apply_level_up(&mut store, player, LevelUpChoice::Agility));
        assert_eq!(store.get::<Defense>(player), Some(Defense(2)));
        assert_eq!(store.get::<Level>(player), Some(Level(4)));
        assert_eq!(store.get::<Xp>(player), Some(Xp(40)));
        assert!(!apply_level_up(&mut store, player, LevelUpChoice::Strength));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn melee_damage_is_never_negative(power in -20i32..40, defense in -20i32..40, bonus in 0i32..10) {
            let mut store = WorldStore::new(3);
            let map = open_room(&mut store, 3, 3);
            let attacker = spawn_fighter(&mut store, Position::new(1, 1, map), "a", 10, power, 0);
            let target = spawn_fighter(&mut store, Position::new(2, 1, map), "b", 100, 0, defense);
            let armor = store.create();
            store.insert(armor, DefenseBonus(bonus));
            store.relate(armor, Relation::Affecting, target);

            let damage = melee_damage(&store, attacker, target);
            prop_assert!(damage >= 0);
            apply_damage(&mut store, target, damage, None);
            prop_assert_eq!(store.get::<Hp>(target), Some(Hp(100 - damage)));
        }
    }
}
