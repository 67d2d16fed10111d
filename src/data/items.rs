use crate::ecs::components::{EquipSlot, ItemUse};

#[derive(Clone, Debug)]
pub struct ItemTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub glyph: char,
    pub color: [u8; 3],
    pub kind: ItemKind,
    pub spawn_weight: &'static [(i32, i32)],
}

#[derive(Clone, Copy, Debug)]
pub enum ItemKind {
    Consumable(ItemUse),
    Equipment {
        slot: EquipSlot,
        power_bonus: i32,
        defense_bonus: i32,
    },
}

impl ItemTemplate {
    pub const fn new(
        key: &'static str,
        name: &'static str,
        glyph: char,
        color: [u8; 3],
        kind: ItemKind,
        spawn_weight: &'static [(i32, i32)],
    ) -> Self {
        Self {
            key,
            name,
            glyph,
            color,
            kind,
            spawn_weight,
        }
    }
}

const POTION_COLOR: [u8; 3] = [127, 0, 255];
const BLADE_COLOR: [u8; 3] = [0, 191, 255];
const ARMOR_COLOR: [u8; 3] = [139, 69, 19];

const fn weapon(power_bonus: i32) -> ItemKind {
    ItemKind::Equipment {
        slot: EquipSlot::Weapon,
        power_bonus,
        defense_bonus: 0,
    }
}

const fn armor(defense_bonus: i32) -> ItemKind {
    ItemKind::Equipment {
        slot: EquipSlot::Armor,
        power_bonus: 0,
        defense_bonus,
    }
}

pub const ITEMS: [ItemTemplate; 7] = [
    ItemTemplate::new(
        "health_potion",
        "Health Potion",
        '!',
        POTION_COLOR,
        ItemKind::Consumable(ItemUse::Potion { heal: 4 }),
        &[(1, 35)],
    ),
    ItemTemplate::new(
        "lightning_scroll",
        "Lightning Scroll",
        '~',
        [255, 255, 0],
        ItemKind::Consumable(ItemUse::LightningScroll {
            damage: 20,
            max_range: 5,
        }),
        &[(3, 25)],
    ),
    ItemTemplate::new(
        "fireball_scroll",
        "Fireball Scroll",
        '~',
        [255, 0, 0],
        ItemKind::Consumable(ItemUse::FireballScroll {
            damage: 12,
            radius: 3,
        }),
        &[(6, 25)],
    ),
    ItemTemplate::new("dagger", "Dagger", '/', BLADE_COLOR, weapon(2), &[]),
    ItemTemplate::new("sword", "Sword", '/', BLADE_COLOR, weapon(4), &[(4, 5)]),
    ItemTemplate::new(
        "leather_armor",
        "Leather Armor",
        '[',
        ARMOR_COLOR,
        armor(1),
        &[],
    ),
    ItemTemplate::new(
        "chain_mail",
        "Chain Mail",
        '[',
        ARMOR_COLOR,
        armor(3),
        &[(6, 15)],
    ),
];
